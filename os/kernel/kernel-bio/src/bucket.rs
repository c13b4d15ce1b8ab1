//! # Buckets and Recency Lists
//!
//! The buffer pool is partitioned into buckets. Each bucket is a recency list
//! of the buffers it currently owns, most recently used at the head and least
//! recently used at the tail, behind its own spin lock.
//!
//! ```text
//!   head (MRU)                                 tail (LRU)
//!      │                                           │
//!      ▼                                           ▼
//!   ┌──────┐ next ┌──────┐ next ┌──────┐ next ┌──────┐
//!   │slot 4│ ───▶ │slot 0│ ───▶ │slot 9│ ───▶ │slot 2│
//!   │      │ ◀─── │      │ ◀─── │      │ ◀─── │      │
//!   └──────┘ prev └──────┘ prev └──────┘ prev └──────┘
//! ```
//!
//! Links are slot indices into a per-bucket node table, so a buffer moves
//! between buckets by being unlinked from one table and linked into another.

use crate::block::BlockId;
use kernel_sync::{SpinLock, SpinLockGuard};

/// Identity and reservation count of one buffer.
///
/// Lives in the node of the bucket that owns the buffer and is only touched
/// under that bucket's lock.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BufferTag {
    /// The cached block; `None` until the buffer is first used.
    pub block: Option<BlockId>,
    /// Number of holders and pins. A buffer is only recycled at zero.
    pub refcnt: u32,
}

impl BufferTag {
    pub const UNASSIGNED: Self = Self {
        block: None,
        refcnt: 0,
    };
}

#[derive(Copy, Clone, Debug)]
struct Node {
    tag: BufferTag,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly-linked recency list over buffer slots.
pub struct RecencyList {
    nodes: Box<[Option<Node>]>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl RecencyList {
    /// An empty list that can hold any of `slots` buffer slots.
    #[must_use]
    pub fn new(slots: usize) -> Self {
        Self {
            nodes: vec![None; slots].into_boxed_slice(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn contains(&self, slot: usize) -> bool {
        self.nodes[slot].is_some()
    }

    pub fn tag_mut(&mut self, slot: usize) -> Option<&mut BufferTag> {
        self.nodes[slot].as_mut().map(|node| &mut node.tag)
    }

    /// Link `slot` in at the most recently used end.
    ///
    /// # Panics
    /// If `slot` is already a member.
    pub fn push_front(&mut self, slot: usize, tag: BufferTag) {
        assert!(!self.contains(slot), "slot {slot} linked twice");
        self.nodes[slot] = Some(Node {
            tag,
            prev: None,
            next: self.head,
        });
        match self.head {
            Some(old) => self.node_mut(old).prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
        self.len += 1;
    }

    /// Link `slot` in at the least recently used end.
    ///
    /// # Panics
    /// If `slot` is already a member.
    pub fn push_back(&mut self, slot: usize, tag: BufferTag) {
        assert!(!self.contains(slot), "slot {slot} linked twice");
        self.nodes[slot] = Some(Node {
            tag,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(old) => self.node_mut(old).next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
    }

    /// Unlink `slot` and hand back its tag, or `None` if it is not a member.
    pub fn remove(&mut self, slot: usize) -> Option<BufferTag> {
        let node = self.nodes[slot].take()?;
        match node.prev {
            Some(prev) => self.node_mut(prev).next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.node_mut(next).prev = node.prev,
            None => self.tail = node.prev,
        }
        self.len -= 1;
        Some(node.tag)
    }

    /// Move a member to the least recently used end.
    pub fn move_to_back(&mut self, slot: usize) {
        if let Some(tag) = self.remove(slot) {
            self.push_back(slot, tag);
        }
    }

    /// The member caching `block`, if any.
    #[must_use]
    pub fn find(&self, block: BlockId) -> Option<usize> {
        self.iter()
            .find(|&(_, tag)| tag.block == Some(block))
            .map(|(slot, _)| slot)
    }

    /// The least recently used member that nobody holds or pins.
    #[must_use]
    pub fn lru_unreferenced(&self) -> Option<usize> {
        let mut cursor = self.tail;
        while let Some(slot) = cursor {
            let node = self.node(slot);
            if node.tag.refcnt == 0 {
                return Some(slot);
            }
            cursor = node.prev;
        }
        None
    }

    /// Members from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &BufferTag)> + '_ {
        let mut cursor = self.head;
        core::iter::from_fn(move || {
            let slot = cursor?;
            let node = self.node(slot);
            cursor = node.next;
            Some((slot, &node.tag))
        })
    }

    fn node(&self, slot: usize) -> &Node {
        match &self.nodes[slot] {
            Some(node) => node,
            None => unreachable!("slot {slot} is linked but has no node"),
        }
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node {
        match &mut self.nodes[slot] {
            Some(node) => node,
            None => unreachable!("slot {slot} is linked but has no node"),
        }
    }
}

/// The buckets of one buffer cache.
pub struct BucketTable {
    buckets: Box<[SpinLock<RecencyList>]>,
}

impl BucketTable {
    /// `buckets` empty buckets, each able to hold any of `slots` buffers.
    #[must_use]
    pub fn new(buckets: usize, slots: usize) -> Self {
        Self {
            buckets: (0..buckets)
                .map(|_| SpinLock::new(RecencyList::new(slots), "bcache.bucket"))
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The bucket `block` hashes to.
    #[must_use]
    pub fn home(&self, block: BlockId) -> usize {
        block.blockno as usize % self.buckets.len()
    }

    pub fn lock(&self, bucket: usize) -> SpinLockGuard<'_, RecencyList> {
        self.buckets[bucket].lock()
    }
}
