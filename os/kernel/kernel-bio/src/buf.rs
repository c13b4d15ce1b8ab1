//! # Buffers

use crate::block::{BlockData, BlockId};
use crate::cache::BufferCache;
use crate::device::BlockDevice;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use kernel_info::param::BSIZE;
use kernel_sync::{SleepLock, SleepLockGuard};
use log::error;

/// One slot of the buffer pool.
///
/// The slot's identity and reference count live in the bucket that owns it;
/// the slot itself only carries the block contents and whether they are
/// current.
pub(crate) struct BufferSlot {
    /// Contents match the disk. Set by the holder of `data` after a read,
    /// cleared under a bucket lock when the slot is recycled for another block.
    valid: AtomicBool,
    data: SleepLock<BlockData>,
}

impl BufferSlot {
    pub(crate) const fn new() -> Self {
        Self {
            valid: AtomicBool::new(false),
            data: SleepLock::new([0; BSIZE], "buffer"),
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    pub(crate) fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::Release);
    }

    pub(crate) fn lock(&self) -> SleepLockGuard<'_, BlockData> {
        self.data.lock()
    }
}

/// A locked buffer holding valid contents of one block.
///
/// Returned by [`BufferCache::read`]. While the guard lives, the calling
/// thread is the only one that can touch the buffer's data, and the buffer
/// cannot be recycled for another block. Dropping the guard releases it, the
/// same as [`BufferCache::release`].
pub struct BufGuard<'a, D: BlockDevice> {
    cache: &'a BufferCache<D>,
    slot: usize,
    block: BlockId,
    /// `None` once released.
    data: Option<SleepLockGuard<'a, BlockData>>,
}

impl<'a, D: BlockDevice> BufGuard<'a, D> {
    pub(crate) fn new(
        cache: &'a BufferCache<D>,
        slot: usize,
        block: BlockId,
        data: SleepLockGuard<'a, BlockData>,
    ) -> Self {
        Self {
            cache,
            slot,
            block,
            data: Some(data),
        }
    }

    /// Index of the buffer in the pool.
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    #[must_use]
    pub const fn block(&self) -> BlockId {
        self.block
    }

    /// Whether the calling thread holds this buffer's lock.
    #[must_use]
    pub fn holding(&self) -> bool {
        self.data.as_ref().is_some_and(SleepLockGuard::holding)
    }

    #[must_use]
    pub fn data(&self) -> &BlockData {
        match &self.data {
            Some(data) => &**data,
            None => unreachable!("buffer used after release"),
        }
    }

    pub fn data_mut(&mut self) -> &mut BlockData {
        match &mut self.data {
            Some(data) => &mut **data,
            None => unreachable!("buffer used after release"),
        }
    }

    pub(crate) const fn cache(&self) -> &'a BufferCache<D> {
        self.cache
    }

    /// Give up the lock, then the reservation.
    pub(crate) fn release(&mut self) {
        let Some(data) = self.data.take() else {
            return;
        };
        if !data.holding() {
            error!("brelse: buffer {} ({}) not locked by caller", self.slot, self.block);
            panic!("brelse");
        }
        drop(data);
        self.cache.unreserve(self.slot, self.block);
    }
}

impl<D: BlockDevice> Drop for BufGuard<'_, D> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<D: BlockDevice> fmt::Debug for BufGuard<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufGuard")
            .field("slot", &self.slot)
            .field("block", &self.block)
            .finish_non_exhaustive()
    }
}

/// A reservation that keeps one block resident without locking it.
///
/// Obtained from [`BufferCache::pin`] and given back to
/// [`BufferCache::unpin`]. The token is neither `Clone` nor `Copy`, so each
/// pin is undone exactly once.
#[derive(Debug, Eq, PartialEq)]
#[must_use = "a pinned buffer stays resident until the pin is given back"]
pub struct Pin {
    /// Identity of the cache that issued the pin.
    pub(crate) cache: u64,
    pub(crate) slot: usize,
    pub(crate) block: BlockId,
}

impl Pin {
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    #[must_use]
    pub const fn block(&self) -> BlockId {
        self.block
    }
}
