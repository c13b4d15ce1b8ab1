use core::ops::Range;
use kernel_alloc::PhysicalAddress;
use kernel_bio::BcacheConfig;
use kernel_info::memory::KERNBASE;
use log::LevelFilter;

/// Size of the physical memory window handed to the page allocator when the
/// kernel runs hosted.
pub const HOSTED_MEMORY: u64 = 4 * 1024 * 1024;

/// Everything [`Kernel::boot`](crate::Kernel::boot) needs to know.
#[derive(Clone, Debug)]
pub struct BootConfig {
    /// Physical memory given to the page allocator. `start` is rounded up to
    /// a page boundary.
    pub memory: Range<PhysicalAddress>,
    /// Buffer cache geometry.
    pub bcache: BcacheConfig,
    /// Most verbose level the console logger prints.
    pub log_level: LevelFilter,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            memory: PhysicalAddress::new(KERNBASE)..PhysicalAddress::new(KERNBASE + HOSTED_MEMORY),
            bcache: BcacheConfig::default(),
            log_level: LevelFilter::Info,
        }
    }
}
