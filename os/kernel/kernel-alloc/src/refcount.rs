//! # Page Reference Counts

use alloc::boxed::Box;
use alloc::vec;
use kernel_sync::SpinLock;
use log::error;

/// One reference count per managed page, all behind a single lock.
///
/// Counts of different pages share the lock, so every increment and decrement
/// is totally ordered per page (and, incidentally, across pages). The lock is
/// independent of the free-list lock and the two are never held together.
///
/// ### Invariants
/// - A count never goes below zero; an attempt to do so is fatal.
pub struct PageRefcountTable {
    counts: SpinLock<Box<[u32]>>,
}

impl PageRefcountTable {
    /// A table of `pages` zero counts.
    #[must_use]
    pub fn new(pages: usize) -> Self {
        Self {
            counts: SpinLock::new(vec![0; pages].into_boxed_slice(), "kcnt"),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> u32 {
        self.counts.lock()[index]
    }

    /// Add one reference; returns the new count.
    pub fn increment(&self, index: usize) -> u32 {
        let mut counts = self.counts.lock();
        counts[index] += 1;
        counts[index]
    }

    /// Drop one reference; returns the new count.
    ///
    /// # Panics
    /// If the count is already zero.
    pub fn decrement(&self, index: usize) -> u32 {
        let remaining = {
            let mut counts = self.counts.lock();
            let remaining = counts[index].checked_sub(1);
            if let Some(count) = remaining {
                counts[index] = count;
            }
            remaining
        };
        // Panic outside the lock so the table stays usable for diagnostics.
        let Some(remaining) = remaining else {
            error!("page {index}: reference count would drop below zero");
            panic!("decre_rc: negative reference");
        };
        remaining
    }

    /// Add a reference to a page that already has an owner.
    ///
    /// Returns the new count, or `None` without touching the table if the
    /// page is free.
    pub fn share(&self, index: usize) -> Option<u32> {
        let mut counts = self.counts.lock();
        if counts[index] == 0 {
            return None;
        }
        counts[index] += 1;
        Some(counts[index])
    }

    /// Drop a reference that is not the last one.
    ///
    /// # Errors
    /// The current count, unchanged, if it is 0 or 1.
    pub fn unshare(&self, index: usize) -> Result<u32, u32> {
        let mut counts = self.counts.lock();
        match counts[index] {
            count @ (0 | 1) => Err(count),
            count => {
                counts[index] = count - 1;
                Ok(count - 1)
            }
        }
    }

    /// Overwrite every count; only used while seeding the allocator at boot.
    pub(crate) fn set_all(&self, value: u32) {
        self.counts.lock().fill(value);
    }
}
