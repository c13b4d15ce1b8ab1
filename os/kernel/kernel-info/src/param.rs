//! # Kernel Table Sizes

/// Size of a disk block in bytes.
pub const BSIZE: usize = 1024;

/// Max number of blocks any file system operation writes.
pub const MAXOPBLOCKS: usize = 10;

/// Max data blocks in the on-disk log.
pub const LOGSIZE: usize = MAXOPBLOCKS * 3;

/// Number of buffers in the disk block cache.
pub const NBUF: usize = MAXOPBLOCKS * 3;

/// Number of hash buckets the block cache is partitioned into.
///
/// A prime keeps consecutive block numbers spread across buckets.
pub const NBUCKETS: usize = 13;

/// Device number of the file system root disk.
pub const ROOTDEV: u32 = 1;

const _: () = {
    assert!(BSIZE.is_power_of_two());
    assert!(NBUF >= LOGSIZE, "the log must fit into the buffer cache");
    assert!(NBUCKETS > 0);
};
