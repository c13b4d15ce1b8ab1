use kernel_alloc::InitError;
use kernel_bio::ConfigError;

/// Why the kernel could not come up.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootError {
    #[error(transparent)]
    Memory(#[from] InitError),
    #[error(transparent)]
    BufferCache(#[from] ConfigError),
    #[error("a console logger is already installed")]
    ConsoleTaken,
}
