//! # Physical Page Allocator
//!
//! Hands out whole pages from the managed [`PhysicalRange`] and tracks how
//! many owners each page has, so a page can be shared between address spaces
//! (copy-on-write after `fork`) and is reclaimed only when its last owner
//! lets go.
//!
//! ```text
//!             allocate()                    free() / count reaches 0
//!  ┌────────┐  pop head, 0 → 1, fill 0x05   ┌────────────┐
//!  │  free  │ ────────────────────────────▶ │ allocated  │ ◀─┐ increment()
//!  │ count 0│ ◀──────────────────────────── │ count ≥ 1  │ ──┘ free() while > 1
//!  └────────┘  fill 0x01, push head          └────────────┘
//! ```
//!
//! Two independent locks are involved: the free-list lock and the
//! reference-count lock. They are never held at the same time.

use crate::address::PhysicalPage;
use crate::frames::{PageBytes, PageFrames};
use crate::free_list::PageFreeList;
use crate::range::PhysicalRange;
use crate::refcount::PageRefcountTable;
use crate::AllocError;
use kernel_info::memory::{ALLOC_FILL, FREE_FILL};
use log::{debug, error, info};

pub struct PhysicalPageAllocator {
    range: PhysicalRange,
    free_list: PageFreeList,
    refcounts: PageRefcountTable,
    frames: PageFrames,
}

impl PhysicalPageAllocator {
    /// Take ownership of every page in `range` and make all of them free.
    ///
    /// Every page is first given a count of 1 and then passed through
    /// [`free`](Self::free), so boot seeds the free list through exactly the
    /// same path as runtime reclamation. Pages are freed in ascending order,
    /// which leaves the highest page at the head of the list.
    #[must_use]
    pub fn new(range: PhysicalRange) -> Self {
        let pages = range.page_count();
        let allocator = Self {
            range,
            free_list: PageFreeList::new(pages),
            refcounts: PageRefcountTable::new(pages),
            frames: PageFrames::new(pages),
        };

        allocator.refcounts.set_all(1);
        for page in range.pages() {
            allocator.free(page);
        }

        info!(
            "Physical page allocator managing {pages} pages at {}..{}",
            range.first_page().base(),
            range.end()
        );
        allocator
    }

    #[inline]
    #[must_use]
    pub const fn range(&self) -> PhysicalRange {
        self.range
    }

    #[inline]
    #[must_use]
    pub const fn total_pages(&self) -> usize {
        self.range.page_count()
    }

    /// Number of pages currently on the free list.
    #[must_use]
    pub fn free_pages(&self) -> usize {
        self.free_list.len()
    }

    /// Allocate one page, with a reference count of exactly 1.
    ///
    /// The page is filled with [`ALLOC_FILL`] before it is returned.
    ///
    /// # Errors
    /// [`AllocError::OutOfMemory`] if no page is free.
    ///
    /// # Panics
    /// If the popped page did not have a count of 0, which means the free list
    /// and the reference counts disagree.
    pub fn allocate(&self) -> Result<PhysicalPage, AllocError> {
        let Some(index) = self.free_list.pop() else {
            debug!("kalloc: no free pages left");
            return Err(AllocError::OutOfMemory);
        };

        let count = self.refcounts.increment(index);
        if count != 1 {
            error!(
                "kalloc: page {} on the free list had {} references",
                self.range.page_at(index),
                count - 1
            );
            panic!("kalloc: not a free page");
        }

        self.frames.fill(index, ALLOC_FILL);
        Ok(self.range.page_at(index))
    }

    /// Drop one reference to `page`; reclaim it when none remain.
    ///
    /// Reclaiming fills the page with [`FREE_FILL`] and pushes it onto the
    /// head of the free list.
    ///
    /// # Panics
    /// If `page` is not managed by this allocator, or its count is already 0.
    pub fn free(&self, page: PhysicalPage) {
        let index = self.index_of(page);
        if self.refcounts.decrement(index) == 0 {
            self.frames.fill(index, FREE_FILL);
            self.free_list.push(index);
        }
    }

    /// Current reference count of `page`.
    ///
    /// # Panics
    /// If `page` is not managed by this allocator.
    #[must_use]
    pub fn refcount(&self, page: PhysicalPage) -> u32 {
        self.refcounts.get(self.index_of(page))
    }

    /// Add an owner to an allocated `page`, e.g. when `fork` shares it
    /// instead of copying. Returns the new count.
    ///
    /// # Panics
    /// If `page` is not managed by this allocator, or is free.
    pub fn increment(&self, page: PhysicalPage) -> u32 {
        let index = self.index_of(page);
        let Some(count) = self.refcounts.share(index) else {
            error!("incre_rc: page {page} is on the free list");
            panic!("incre_rc: free page");
        };
        count
    }

    /// Remove one of several owners from `page`. Returns the new count,
    /// which is at least 1.
    ///
    /// The last owner must let go through [`free`](Self::free), which
    /// reclaims the page.
    ///
    /// # Panics
    /// If `page` is not managed by this allocator, or its count is 0 or 1.
    pub fn decrement(&self, page: PhysicalPage) -> u32 {
        match self.refcounts.unshare(self.index_of(page)) {
            Ok(count) => count,
            Err(0) => {
                error!("decre_rc: page {page} is on the free list");
                panic!("decre_rc: negative reference");
            }
            Err(_) => {
                error!("decre_rc: page {page} has a single owner, which must free it");
                panic!("decre_rc: last reference");
            }
        }
    }

    /// Read the contents of `page`.
    ///
    /// # Panics
    /// If `page` is not managed by this allocator.
    pub fn with_page<R>(&self, page: PhysicalPage, f: impl FnOnce(&PageBytes) -> R) -> R {
        self.frames.with(self.index_of(page), f)
    }

    /// Modify the contents of `page`.
    ///
    /// # Panics
    /// If `page` is not managed by this allocator.
    pub fn with_page_mut<R>(&self, page: PhysicalPage, f: impl FnOnce(&mut PageBytes) -> R) -> R {
        self.frames.with_mut(self.index_of(page), f)
    }

    fn index_of(&self, page: PhysicalPage) -> usize {
        match self.range.index_of(page) {
            Some(index) => index,
            None => {
                error!(
                    "page {page} is outside the managed range {}..{}",
                    self.range.first_page().base(),
                    self.range.end()
                );
                panic!("kfree");
            }
        }
    }
}
