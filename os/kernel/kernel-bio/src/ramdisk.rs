//! # In-Memory Disk

use crate::block::{BlockData, BlockId};
use crate::device::BlockDevice;
use core::sync::atomic::{AtomicUsize, Ordering};
use kernel_info::param::BSIZE;
use kernel_sync::SpinLock;
use std::collections::BTreeMap;
use std::time::Duration;

/// A disk that keeps its blocks in memory.
///
/// Blocks that were never written read back as zeros. Every transfer is
/// counted, which is how a caller tells a cache hit (no read) from a miss
/// (one read).
pub struct RamDisk {
    blocks: SpinLock<BTreeMap<BlockId, Box<BlockData>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    latency: Option<Duration>,
}

impl RamDisk {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            blocks: SpinLock::new(BTreeMap::new(), "ramdisk"),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            latency: None,
        }
    }

    /// Make every transfer sleep for `latency`, like a real device would.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of completed reads.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of completed writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Store `data` at `block` without counting a transfer, e.g. to format a disk image.
    pub fn load(&self, block: BlockId, data: &BlockData) {
        self.blocks.lock().insert(block, Box::new(*data));
    }

    /// The current contents of `block`, without counting a transfer.
    pub fn snapshot(&self, block: BlockId) -> BlockData {
        self.blocks
            .lock()
            .get(&block)
            .map_or([0; BSIZE], |data| **data)
    }

    fn delay(&self) {
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
    }
}

impl Default for RamDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block: BlockId, buf: &mut BlockData) {
        self.delay();
        match self.blocks.lock().get(&block) {
            Some(data) => buf.copy_from_slice(&data[..]),
            None => buf.fill(0),
        }
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    fn write_block(&self, block: BlockId, buf: &BlockData) {
        self.delay();
        self.blocks.lock().insert(block, Box::new(*buf));
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}
