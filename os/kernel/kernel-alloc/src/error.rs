use crate::address::PhysicalAddress;

/// Recoverable failure of [`PhysicalPageAllocator::allocate`](crate::PhysicalPageAllocator::allocate).
///
/// The caller decides how to fail (e.g. `fork` returns -1, a page fault kills
/// the faulting process); the kernel itself keeps running.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    #[error("out of physical memory")]
    OutOfMemory,
}

/// The physical range handed to the allocator at boot is unusable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    #[error("physical range {start}..{end} is inverted")]
    InvalidRange {
        start: PhysicalAddress,
        end: PhysicalAddress,
    },
    #[error("physical range {start}..{end} holds no whole page")]
    EmptyRange {
        start: PhysicalAddress,
        end: PhysicalAddress,
    },
}
