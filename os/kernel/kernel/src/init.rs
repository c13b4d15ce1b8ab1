use crate::{BootConfig, BootError};
use kernel_alloc::{PhysicalPageAllocator, PhysicalRange};
use kernel_bio::{BlockDevice, BufferCache};
use kernel_console::ConsoleLogger;
use log::{LevelFilter, info};

/// The kernel's shared resource managers.
pub struct Kernel<D: BlockDevice> {
    pages: PhysicalPageAllocator,
    bcache: BufferCache<D>,
}

impl<D: BlockDevice> Kernel<D> {
    /// Bring up the page allocator and the buffer cache in front of `disk`.
    ///
    /// # Errors
    /// - [`BootError::BufferCache`] if the cache geometry is unusable.
    /// - [`BootError::Memory`] if the memory window holds no page.
    pub fn boot(config: &BootConfig, disk: D) -> Result<Self, BootError> {
        info!("Booting kernel services ...");
        let bcache = BufferCache::new(disk, config.bcache)?;
        let range = PhysicalRange::new(config.memory.start, config.memory.end)?;
        let pages = PhysicalPageAllocator::new(range);
        info!(
            "Kernel services up: {} free pages, {} buffers",
            pages.free_pages(),
            bcache.config().buffers
        );
        Ok(Self { pages, bcache })
    }

    #[inline]
    #[must_use]
    pub const fn pages(&self) -> &PhysicalPageAllocator {
        &self.pages
    }

    #[inline]
    #[must_use]
    pub const fn bcache(&self) -> &BufferCache<D> {
        &self.bcache
    }
}

/// Install the console logger.
///
/// # Errors
/// [`BootError::ConsoleTaken`] if a logger is already installed.
pub fn init_console(level: LevelFilter) -> Result<(), BootError> {
    ConsoleLogger::new(level)
        .init()
        .map_err(|_| BootError::ConsoleTaken)
}
