//! # Physical Addresses and Pages
//!
//! Thin, `Copy` wrappers that keep raw `u64` physical addresses and page bases
//! apart at compile time. A [`PhysicalPage`] is always page aligned; a
//! [`PhysicalAddress`] may point anywhere.

use core::fmt;
use core::ops::Add;
use kernel_info::memory::PAGE_SIZE;

/// Physical memory address.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u64);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The page that contains this address (lower bits zeroed).
    #[inline]
    #[must_use]
    pub const fn page(self) -> PhysicalPage {
        PhysicalPage(self.0 & !(PAGE_SIZE - 1))
    }

    /// Round up to the next page boundary; aligned addresses are unchanged.
    ///
    /// Returns `None` if rounding would overflow.
    #[inline]
    #[must_use]
    pub const fn page_round_up(self) -> Option<Self> {
        match self.0.checked_add(PAGE_SIZE - 1) {
            Some(v) => Some(Self(v & !(PAGE_SIZE - 1))),
            None => None,
        }
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA(0x{:016X})", self.0)
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl Add<u64> for PhysicalAddress {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

/// Base address of one physical page.
///
/// ### Invariants
/// - The low `PAGE_SHIFT` bits are always zero.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalPage(u64);

impl PhysicalPage {
    /// Page that contains `addr` (aligns down).
    #[inline]
    #[must_use]
    pub const fn containing(addr: PhysicalAddress) -> Self {
        addr.page()
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        PhysicalAddress(self.0)
    }
}

impl fmt::Debug for PhysicalPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalPage({:#018X})", self.0)
    }
}

impl fmt::Display for PhysicalPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}/4K", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_aligns_down() {
        let pa = PhysicalAddress::new(0x8000_1234);
        assert_eq!(pa.page().base().as_u64(), 0x8000_1000);
        assert_eq!(PhysicalPage::containing(pa), pa.page());
        assert_eq!(pa.page().base() + 0x234, pa);
    }

    #[test]
    fn round_up_keeps_aligned_addresses() {
        let aligned = PhysicalAddress::new(0x8000_2000);
        assert_eq!(aligned.page_round_up(), Some(aligned));
        assert_eq!(
            PhysicalAddress::new(0x8000_2001).page_round_up(),
            Some(PhysicalAddress::new(0x8000_3000))
        );
        assert_eq!(PhysicalAddress::new(u64::MAX).page_round_up(), None);
    }
}
