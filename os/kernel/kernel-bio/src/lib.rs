//! # Block I/O
//!
//! The buffer cache that sits between the file system and the disk driver.
//! It keeps a fixed number of block-sized buffers, makes sure a block is
//! cached by at most one of them, and serializes access to each buffer.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   BufferCache<D>                    │
//! │   read / commit / release / pin / unpin / audit     │
//! └──────────┬───────────────────────────┬──────────────┘
//!            │                           │
//! ┌──────────▼──────────┐     ┌──────────▼──────────┐     ┌─────────────┐
//! │    BucketTable      │     │   buffer slots      │     │ BlockDevice │
//! │ B × SpinLock<       │     │ N × SleepLock<data> │────▶│ (RamDisk,   │
//! │   RecencyList>      │     │     + valid flag    │     │  virtio, …) │
//! │ identity + refcnt   │     └─────────────────────┘     └─────────────┘
//! └─────────────────────┘
//! ```
//!
//! Identity and reservation counts are guarded by the bucket spin locks;
//! block contents are guarded by the per-buffer sleep locks. A thread never
//! holds a bucket lock while waiting for a buffer or talking to the device.
//!
//! ## Usage
//!
//! ```
//! use kernel_bio::{BcacheConfig, BlockId, BufferCache, RamDisk};
//!
//! let cache = BufferCache::new(RamDisk::new(), BcacheConfig::default()).unwrap();
//! let mut buf = cache.read(BlockId::new(0, 7));
//! buf.data_mut()[..4].copy_from_slice(b"xv6!");
//! cache.commit(&buf);
//! cache.release(buf);
//! assert_eq!(&cache.device().snapshot(BlockId::new(0, 7))[..4], b"xv6!");
//! ```

mod block;
mod bucket;
mod buf;
mod cache;
mod config;
mod device;
mod error;
mod ramdisk;

pub use block::{BlockData, BlockId};
pub use bucket::{BucketTable, BufferTag, RecencyList};
pub use buf::{BufGuard, Pin};
pub use cache::{BufferCache, CacheStats};
pub use config::BcacheConfig;
pub use device::BlockDevice;
pub use error::{AuditError, ConfigError};
pub use ramdisk::RamDisk;
