use crate::block::{BlockData, BlockId};

/// The disk driver as seen by the buffer cache.
///
/// Both transfers are synchronous: they return once the data has been moved.
/// A driver that cannot complete a transfer has no way to report it and must
/// panic; the cache never retries.
///
/// The cache calls these only while it holds the buffer's sleep lock and no
/// spin lock, so an implementation is free to block.
pub trait BlockDevice: Send + Sync {
    /// Fill `buf` with the contents of `block`.
    fn read_block(&self, block: BlockId, buf: &mut BlockData);

    /// Write `buf` to `block`.
    fn write_block(&self, block: BlockId, buf: &BlockData);
}

impl<D: BlockDevice + ?Sized> BlockDevice for &D {
    fn read_block(&self, block: BlockId, buf: &mut BlockData) {
        (**self).read_block(block, buf);
    }

    fn write_block(&self, block: BlockId, buf: &BlockData) {
        (**self).write_block(block, buf);
    }
}
