//! # Page Contents

use alloc::boxed::Box;
use kernel_info::memory::PAGE_SIZE;
use kernel_sync::SpinLock;

/// Bytes in one page.
#[allow(clippy::cast_possible_truncation)]
pub const PAGE_LEN: usize = PAGE_SIZE as usize;

/// Contents of one physical page.
pub type PageBytes = [u8; PAGE_LEN];

/// Backing store for the contents of every managed page.
///
/// Each page has its own short lock, taken only for the duration of a copy
/// or fill; page ownership itself is tracked by the reference counts, not
/// by these locks.
pub struct PageFrames {
    frames: Box<[SpinLock<Box<PageBytes>>]>,
}

impl PageFrames {
    #[must_use]
    pub fn new(pages: usize) -> Self {
        Self {
            frames: (0..pages)
                .map(|_| SpinLock::new(Box::new([0; PAGE_LEN]), "page"))
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Overwrite the whole page with `byte`.
    pub fn fill(&self, index: usize, byte: u8) {
        self.frames[index].lock().fill(byte);
    }

    pub fn with<R>(&self, index: usize, f: impl FnOnce(&PageBytes) -> R) -> R {
        let frame = self.frames[index].lock();
        f(&frame)
    }

    pub fn with_mut<R>(&self, index: usize, f: impl FnOnce(&mut PageBytes) -> R) -> R {
        let mut frame = self.frames[index].lock();
        f(&mut frame)
    }
}
