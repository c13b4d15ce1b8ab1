//! # Buffer Cache
//!
//! ## Lookup
//!
//! ```text
//!  read(block)
//!     │
//!     ▼
//!  lock home = bucket[blockno % B]
//!     │
//!     ├── cached here? ───────── yes ──▶ refcnt += 1 ──────────────────┐
//!     │                                                                │
//!     ▼ no                                                             │
//!  unreferenced buffer in home, scanning from the LRU end?             │
//!     ├── yes ──▶ retag, refcnt = 1, invalid, move to MRU end ─────────┤
//!     ▼ no                                                             │
//!  for every other bucket, wrapping upward from home:                  │
//!     unreferenced buffer there?                                       │
//!     ├── yes ──▶ retag, refcnt = 1, invalid, move to home's MRU end ──┤
//!     ▼ none anywhere                                                  │
//!  panic "bget: no buffers"                                            ▼
//!                                                unlock buckets, lock the buffer,
//!                                                read from disk if invalid
//! ```
//!
//! ## Lock order
//!
//! Bucket locks are spin locks and are never held while a buffer lock is taken
//! or a disk transfer runs. At most two bucket locks are held at once, always
//! acquired in ascending bucket order. When the scan reaches a bucket below the
//! home bucket, the home lock is dropped, the lower bucket is locked, and the
//! home bucket is locked and searched again, because another thread may have
//! cached the block in the meantime.
//!
//! ## Release
//!
//! A buffer whose last holder lets go moves to the *least* recently used end of
//! its bucket, so it is the first one recycled by the next miss there.

use crate::block::BlockId;
use crate::bucket::{BucketTable, BufferTag, RecencyList};
use crate::buf::{BufGuard, BufferSlot, Pin};
use crate::config::BcacheConfig;
use crate::device::BlockDevice;
use crate::error::{AuditError, ConfigError};
use core::ptr;
use core::sync::atomic::{AtomicU64, Ordering};
use log::{debug, error, info, trace};
use std::collections::BTreeMap;

/// Snapshot of the lookup counters of a [`BufferCache`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    /// Lookups that found the block cached.
    pub hits: u64,
    /// Lookups that recycled a buffer.
    pub misses: u64,
    /// Misses served by a buffer taken from a bucket other than the block's home.
    pub foreign_recycles: u64,
}

/// Source of [`BufferCache`] identities, so a [`Pin`] can name its issuer.
static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    foreign_recycles: AtomicU64,
}

/// A fixed pool of block buffers in front of a [`BlockDevice`].
///
/// At most one buffer ever caches a given block, and at most one thread at a
/// time holds a given buffer. The pool never grows: when every buffer is held
/// or pinned, the next miss panics.
pub struct BufferCache<D: BlockDevice> {
    id: u64,
    device: D,
    config: BcacheConfig,
    buckets: BucketTable,
    slots: Box<[BufferSlot]>,
    counters: Counters,
}

impl<D: BlockDevice> BufferCache<D> {
    /// Build an empty cache in front of `device`.
    ///
    /// Buffers start without a block and are dealt round-robin over the buckets.
    ///
    /// # Errors
    /// [`ConfigError`] if `config` has no buffers or no buckets.
    pub fn new(device: D, config: BcacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let buckets = BucketTable::new(config.buckets, config.buffers);
        for slot in 0..config.buffers {
            buckets
                .lock(slot % config.buckets)
                .push_front(slot, BufferTag::UNASSIGNED);
        }

        info!(
            "Buffer cache: {} buffers of {} bytes in {} buckets",
            config.buffers,
            kernel_info::param::BSIZE,
            config.buckets
        );

        Ok(Self {
            id: NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed),
            device,
            config,
            buckets,
            slots: (0..config.buffers).map(|_| BufferSlot::new()).collect(),
            counters: Counters::default(),
        })
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> BcacheConfig {
        self.config
    }

    #[inline]
    #[must_use]
    pub const fn device(&self) -> &D {
        &self.device
    }

    /// Return a locked buffer with the current contents of `block`.
    ///
    /// Blocks until no other thread holds the buffer. Reads the block from
    /// the device if the buffer does not hold it yet.
    ///
    /// # Panics
    /// With `"bget: no buffers"` if every buffer is held or pinned.
    pub fn read(&self, block: BlockId) -> BufGuard<'_, D> {
        let slot = self.reserve(block);
        let buffer = &self.slots[slot];
        let mut data = buffer.lock();
        if !buffer.is_valid() {
            self.device.read_block(block, &mut data);
            buffer.set_valid(true);
        }
        BufGuard::new(self, slot, block, data)
    }

    /// Write the buffer's contents to its block on the device.
    ///
    /// # Panics
    /// With `"bwrite"` if the calling thread does not hold the buffer.
    pub fn commit(&self, buf: &BufGuard<'_, D>) {
        if !ptr::eq(buf.cache(), self) || !buf.holding() {
            error!("bwrite: buffer {} ({}) not locked by caller", buf.slot(), buf.block());
            panic!("bwrite");
        }
        self.device.write_block(buf.block(), buf.data());
    }

    /// Unlock the buffer and drop the caller's reservation.
    ///
    /// # Panics
    /// With `"brelse"` if the calling thread does not hold the buffer.
    pub fn release(&self, mut buf: BufGuard<'_, D>) {
        if !ptr::eq(buf.cache(), self) {
            error!("brelse: buffer {} ({}) belongs to another cache", buf.slot(), buf.block());
            panic!("brelse");
        }
        buf.release();
    }

    /// Keep the buffer's block resident after the guard is released.
    ///
    /// # Panics
    /// If `buf` belongs to another cache.
    pub fn pin(&self, buf: &BufGuard<'_, D>) -> Pin {
        assert!(ptr::eq(buf.cache(), self), "bpin: buffer belongs to another cache");
        let (slot, block) = (buf.slot(), buf.block());
        let mut bucket = self.buckets.lock(self.buckets.home(block));
        match bucket.tag_mut(slot) {
            Some(tag) if tag.block == Some(block) => tag.refcnt += 1,
            _ => unreachable!("held buffer {slot} ({block}) is not in its home bucket"),
        }
        Pin {
            cache: self.id,
            slot,
            block,
        }
    }

    /// Give back a pin.
    ///
    /// # Panics
    /// With `"bunpin"` if the pin was issued by another cache or the buffer
    /// is not pinned.
    pub fn unpin(&self, pin: Pin) {
        let Pin { cache, slot, block } = pin;
        if cache != self.id {
            error!("bunpin: buffer {slot} ({block}) was pinned in another cache");
            panic!("bunpin");
        }
        let mut bucket = self.buckets.lock(self.buckets.home(block));
        match bucket.tag_mut(slot) {
            Some(tag) if tag.block == Some(block) && tag.refcnt > 0 => tag.refcnt -= 1,
            _ => {
                drop(bucket);
                error!("bunpin: buffer {slot} ({block}) is not pinned");
                panic!("bunpin");
            }
        }
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            foreign_recycles: self.counters.foreign_recycles.load(Ordering::Relaxed),
        }
    }

    /// Check the bucket partition with every bucket locked.
    ///
    /// Returns the number of buffers in each bucket.
    ///
    /// # Errors
    /// The first broken invariant found: a buffer in no bucket or in two, two
    /// buffers caching the same block, a referenced buffer outside its home
    /// bucket, or a recency list whose links disagree with its length.
    pub fn audit(&self) -> Result<Vec<usize>, AuditError> {
        let buckets: Vec<_> = (0..self.buckets.len())
            .map(|bucket| self.buckets.lock(bucket))
            .collect();

        let mut owner: Vec<Option<usize>> = vec![None; self.slots.len()];
        let mut cached: BTreeMap<BlockId, usize> = BTreeMap::new();
        for (bucket, list) in buckets.iter().enumerate() {
            if list.iter().count() != list.len() {
                return Err(AuditError::BrokenLinks { bucket });
            }
            for (slot, tag) in list.iter() {
                if let Some(first) = owner[slot].replace(bucket) {
                    return Err(AuditError::SharedSlot {
                        slot,
                        first,
                        second: bucket,
                    });
                }
                let Some(block) = tag.block else {
                    continue;
                };
                if let Some(first) = cached.insert(block, slot) {
                    return Err(AuditError::DuplicateBlock {
                        block,
                        first,
                        second: slot,
                    });
                }
                if tag.refcnt > 0 && self.buckets.home(block) != bucket {
                    return Err(AuditError::Misplaced { slot, bucket });
                }
            }
        }
        if let Some(slot) = owner.iter().position(Option::is_none) {
            return Err(AuditError::Orphaned { slot });
        }

        Ok(buckets.iter().map(|list| list.len()).collect())
    }

    /// Find or recycle a buffer for `block` and take a reference to it.
    fn reserve(&self, block: BlockId) -> usize {
        let nbuckets = self.buckets.len();
        let home = self.buckets.home(block);
        let mut bucket = self.buckets.lock(home);

        if let Some(slot) = self.hit(&mut bucket, block) {
            trace!("bget: {block} cached in buffer {slot}");
            return slot;
        }
        if let Some(slot) = self.recycle_local(&mut bucket, block) {
            trace!("bget: {block} recycles buffer {slot} of bucket {home}");
            return slot;
        }

        for step in 1..nbuckets {
            let other = (home + step) % nbuckets;
            let mut victims = if other > home {
                self.buckets.lock(other)
            } else {
                drop(bucket);
                let victims = self.buckets.lock(other);
                bucket = self.buckets.lock(home);
                if let Some(slot) = self.hit(&mut bucket, block) {
                    trace!("bget: {block} cached in buffer {slot} while relocking");
                    return slot;
                }
                if let Some(slot) = self.recycle_local(&mut bucket, block) {
                    trace!("bget: {block} recycles buffer {slot} of bucket {home}");
                    return slot;
                }
                victims
            };

            if let Some(slot) = self.recycle_foreign(&mut victims, &mut bucket, block) {
                debug!("bget: {block} takes buffer {slot} from bucket {other}");
                return slot;
            }
        }

        drop(bucket);
        error!("bget: every buffer is in use, none left for {block}");
        panic!("bget: no buffers");
    }

    fn hit(&self, bucket: &mut RecencyList, block: BlockId) -> Option<usize> {
        let slot = bucket.find(block)?;
        if let Some(tag) = bucket.tag_mut(slot) {
            tag.refcnt += 1;
        }
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        Some(slot)
    }

    /// Retag the least recently used free buffer of the home bucket.
    fn recycle_local(&self, bucket: &mut RecencyList, block: BlockId) -> Option<usize> {
        let slot = bucket.lru_unreferenced()?;
        bucket.remove(slot);
        self.claim(bucket, slot, block);
        Some(slot)
    }

    /// Move the least recently used free buffer of `victims` into `home`.
    fn recycle_foreign(
        &self,
        victims: &mut RecencyList,
        home: &mut RecencyList,
        block: BlockId,
    ) -> Option<usize> {
        let slot = victims.lru_unreferenced()?;
        victims.remove(slot);
        self.claim(home, slot, block);
        self.counters
            .foreign_recycles
            .fetch_add(1, Ordering::Relaxed);
        Some(slot)
    }

    /// Give an unlinked, unreferenced buffer to `block` and link it at the
    /// most recently used end of its home bucket.
    fn claim(&self, home: &mut RecencyList, slot: usize, block: BlockId) {
        self.slots[slot].set_valid(false);
        home.push_front(
            slot,
            BufferTag {
                block: Some(block),
                refcnt: 1,
            },
        );
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop one reference taken by [`Self::read`].
    pub(crate) fn unreserve(&self, slot: usize, block: BlockId) {
        let mut bucket = self.buckets.lock(self.buckets.home(block));
        let remaining = match bucket.tag_mut(slot) {
            Some(tag) if tag.block == Some(block) && tag.refcnt > 0 => {
                tag.refcnt -= 1;
                tag.refcnt
            }
            _ => {
                drop(bucket);
                error!("brelse: buffer {slot} ({block}) is not reserved");
                panic!("brelse");
            }
        };
        if remaining == 0 {
            bucket.move_to_back(slot);
        }
    }
}
