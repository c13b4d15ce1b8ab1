use crate::block::BlockId;

/// A [`BcacheConfig`](crate::BcacheConfig) that cannot back a cache.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("the buffer cache needs at least one buffer")]
    ZeroBuffers,
    #[error("the buffer cache needs at least one bucket")]
    ZeroBuckets,
}

/// A broken buffer cache invariant found by [`BufferCache::audit`](crate::BufferCache::audit).
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    #[error("buffer {slot} is not in any bucket")]
    Orphaned { slot: usize },
    #[error("buffer {slot} is in bucket {first} and bucket {second}")]
    SharedSlot {
        slot: usize,
        first: usize,
        second: usize,
    },
    #[error("block {block} is cached by buffers {first} and {second}")]
    DuplicateBlock {
        block: BlockId,
        first: usize,
        second: usize,
    },
    #[error("referenced buffer {slot} sits in bucket {bucket} instead of its home bucket")]
    Misplaced { slot: usize, bucket: usize },
    #[error("recency list of bucket {bucket} is inconsistent")]
    BrokenLinks { bucket: usize },
}
