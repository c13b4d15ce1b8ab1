//! # Free Page List

use alloc::boxed::Box;
use alloc::vec;
use kernel_sync::SpinLock;
use log::error;

/// Link slot of one page in the free list.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Link {
    /// The page is allocated and not on the list.
    Detached,
    /// The page is on the list; the payload is the next free page, if any.
    Free(Option<usize>),
}

struct FreeRun {
    head: Option<usize>,
    links: Box<[Link]>,
    len: usize,
}

/// Intrusive singly-linked stack of unused page indices.
///
/// Each page owns exactly one link slot, indexed by its page index, so the
/// list needs no storage beyond the table itself. Pushing a page that is
/// already linked is fatal: it would create a cycle and hand the same page
/// out twice.
///
/// Pops return the most recently pushed page first (LIFO).
pub struct PageFreeList {
    inner: SpinLock<FreeRun>,
}

impl PageFreeList {
    /// An empty list able to hold `pages` page indices.
    #[must_use]
    pub fn new(pages: usize) -> Self {
        Self {
            inner: SpinLock::new(
                FreeRun {
                    head: None,
                    links: vec![Link::Detached; pages].into_boxed_slice(),
                    len: 0,
                },
                "kmem",
            ),
        }
    }

    /// Link `index` in as the new head.
    ///
    /// # Panics
    /// If `index` is already on the list.
    pub fn push(&self, index: usize) {
        let mut run = self.inner.lock();
        if run.links[index] != Link::Detached {
            drop(run);
            error!("page {index} pushed onto the free list twice");
            panic!("kfree: page already free");
        }
        run.links[index] = Link::Free(run.head);
        run.head = Some(index);
        run.len += 1;
    }

    /// Unlink and return the head, if any.
    pub fn pop(&self) -> Option<usize> {
        let mut run = self.inner.lock();
        let index = run.head?;
        let Link::Free(next) = run.links[index] else {
            unreachable!("free-list head {index} is detached");
        };
        run.links[index] = Link::Detached;
        run.head = next;
        run.len -= 1;
        Some(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `index` is currently on the list.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        matches!(self.inner.lock().links[index], Link::Free(_))
    }
}
