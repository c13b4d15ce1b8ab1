use crate::ConfigError;
use kernel_info::param::{NBUCKETS, NBUF};

/// Geometry of a [`BufferCache`](crate::BufferCache).
///
/// Both numbers trade memory for concurrency: more buffers keep more blocks
/// resident, more buckets spread lookups over more locks.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BcacheConfig {
    /// Number of buffers in the pool.
    pub buffers: usize,
    /// Number of independently locked buckets.
    pub buckets: usize,
}

impl BcacheConfig {
    #[must_use]
    pub const fn new(buffers: usize, buckets: usize) -> Self {
        Self { buffers, buckets }
    }

    /// # Errors
    /// [`ConfigError`] if either dimension is zero.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.buffers == 0 {
            return Err(ConfigError::ZeroBuffers);
        }
        if self.buckets == 0 {
            return Err(ConfigError::ZeroBuckets);
        }
        Ok(())
    }
}

impl Default for BcacheConfig {
    fn default() -> Self {
        Self::new(NBUF, NBUCKETS)
    }
}
