//! # Managed Physical Range

use crate::InitError;
use crate::address::{PhysicalAddress, PhysicalPage};
use kernel_info::memory::{KERNBASE, PAGE_SHIFT, PAGE_SIZE, PHYSTOP};

/// The physical memory window handed to the page allocator at boot.
///
/// `start` is rounded up to a page boundary; a page belongs to the range when
/// `page + PAGE_SIZE <= end`. Pages are identified inside the range by their
/// index from the first page, which is what the allocator's tables are keyed by.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PhysicalRange {
    first: PhysicalPage,
    pages: usize,
}

impl PhysicalRange {
    /// Describe `[start, end)`.
    ///
    /// # Errors
    /// - [`InitError::InvalidRange`] if `end < start`.
    /// - [`InitError::EmptyRange`] if no whole page fits.
    pub fn new(start: PhysicalAddress, end: PhysicalAddress) -> Result<Self, InitError> {
        if end < start {
            return Err(InitError::InvalidRange { start, end });
        }
        let Some(first) = start.page_round_up() else {
            return Err(InitError::EmptyRange { start, end });
        };
        let span = end.as_u64().saturating_sub(first.as_u64());
        let pages = usize::try_from(span >> PAGE_SHIFT).unwrap_or(usize::MAX);
        if pages == 0 {
            return Err(InitError::EmptyRange { start, end });
        }
        Ok(Self {
            first: first.page(),
            pages,
        })
    }

    /// `KERNBASE..PHYSTOP`, the whole RAM of the machine.
    ///
    /// # Errors
    /// Never fails for the compiled-in layout; the `Result` mirrors [`Self::new`].
    pub fn kernel_ram() -> Result<Self, InitError> {
        Self::new(PhysicalAddress::new(KERNBASE), PhysicalAddress::new(PHYSTOP))
    }

    /// A window of `pages` pages starting at `start` (rounded up).
    ///
    /// # Errors
    /// See [`Self::new`].
    pub fn with_pages(start: PhysicalAddress, pages: usize) -> Result<Self, InitError> {
        let len = (pages as u64).saturating_mul(PAGE_SIZE);
        let first = start.page_round_up().unwrap_or(start);
        Self::new(start, PhysicalAddress::new(first.as_u64().saturating_add(len)))
    }

    #[inline]
    #[must_use]
    pub const fn first_page(&self) -> PhysicalPage {
        self.first
    }

    #[inline]
    #[must_use]
    pub const fn page_count(&self) -> usize {
        self.pages
    }

    /// First address past the last managed page.
    #[inline]
    #[must_use]
    pub fn end(&self) -> PhysicalAddress {
        self.first.base() + (self.pages as u64) * PAGE_SIZE
    }

    /// Index of `page` within the range, if it is managed.
    #[must_use]
    pub fn index_of(&self, page: PhysicalPage) -> Option<usize> {
        let base = page.base().as_u64();
        let first = self.first.base().as_u64();
        if base < first {
            return None;
        }
        let index = usize::try_from((base - first) >> PAGE_SHIFT).ok()?;
        (index < self.pages).then_some(index)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, page: PhysicalPage) -> bool {
        self.index_of(page).is_some()
    }

    /// The page at `index`.
    ///
    /// # Panics
    /// If `index` is outside the range.
    #[must_use]
    pub fn page_at(&self, index: usize) -> PhysicalPage {
        assert!(index < self.pages, "page index {index} out of range");
        (self.first.base() + (index as u64) * PAGE_SIZE).page()
    }

    /// All managed pages in ascending address order.
    pub fn pages(&self) -> impl Iterator<Item = PhysicalPage> + '_ {
        (0..self.pages).map(|i| self.page_at(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_rounded_up_and_partial_tail_dropped() {
        // 0x8000_0010 rounds up to 0x8000_1000; the tail at 0x8000_3800 holds no whole page.
        let r = PhysicalRange::new(
            PhysicalAddress::new(0x8000_0010),
            PhysicalAddress::new(0x8000_3800),
        )
        .unwrap();
        assert_eq!(r.first_page().base().as_u64(), 0x8000_1000);
        assert_eq!(r.page_count(), 2);
        assert_eq!(r.end().as_u64(), 0x8000_3000);
    }

    #[test]
    fn index_round_trips_for_managed_pages_only() {
        let r = PhysicalRange::with_pages(PhysicalAddress::new(KERNBASE), 4).unwrap();
        for (i, page) in r.pages().enumerate() {
            assert_eq!(r.index_of(page), Some(i));
        }
        assert_eq!(r.index_of(PhysicalAddress::new(KERNBASE - PAGE_SIZE).page()), None);
        assert_eq!(r.index_of(r.end().page()), None);
    }

    #[test]
    fn empty_and_inverted_ranges_are_rejected() {
        let a = PhysicalAddress::new(KERNBASE);
        assert!(matches!(
            PhysicalRange::new(a, a + 100),
            Err(InitError::EmptyRange { .. })
        ));
        assert!(matches!(
            PhysicalRange::new(a + PAGE_SIZE, a),
            Err(InitError::InvalidRange { .. })
        ));
    }

    #[test]
    fn kernel_ram_covers_kernbase_to_phystop() {
        let r = PhysicalRange::kernel_ram().unwrap();
        assert_eq!(r.first_page().base().as_u64(), KERNBASE);
        assert_eq!(r.end().as_u64(), PHYSTOP);
    }
}
