//! # Physical Memory Layout

/// Bytes per physical page.
pub const PAGE_SIZE: u64 = 4096;

/// Bits of offset within a page.
pub const PAGE_SHIFT: u32 = 12;

/// Start of RAM; the kernel is loaded here.
pub const KERNBASE: u64 = 0x8000_0000;

/// End of the RAM the page allocator may hand out.
pub const PHYSTOP: u64 = KERNBASE + 128 * 1024 * 1024;

/// Byte written over every page returned to the free list.
///
/// Catches dangling references into freed memory.
pub const FREE_FILL: u8 = 0x01;

/// Byte written over every page handed out by the allocator.
///
/// Catches readers that assume freshly allocated memory is zeroed.
pub const ALLOC_FILL: u8 = 0x05;

const _: () = {
    assert!(PAGE_SIZE == 1 << PAGE_SHIFT);
    assert!(KERNBASE.is_multiple_of(PAGE_SIZE));
    assert!(PHYSTOP.is_multiple_of(PAGE_SIZE));
    assert!(PHYSTOP > KERNBASE);
    assert!(FREE_FILL != ALLOC_FILL);
};
