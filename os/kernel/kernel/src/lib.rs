//! # Kernel Services
//!
//! Boot wiring for the kernel's two resource managers. Both are owned by a
//! single [`Kernel`] value that is built once at boot and lives as long as
//! the kernel; subsystems get it by reference instead of through globals.
//!
//! ```text
//!   BootConfig ──▶ Kernel::boot(disk)
//!                      │
//!        ┌─────────────┴──────────────┐
//!        ▼                            ▼
//!  PhysicalPageAllocator        BufferCache<D>
//!  (kernel-alloc)               (kernel-bio) ──▶ D: BlockDevice
//! ```

mod config;
mod error;
mod init;

pub use config::{BootConfig, HOSTED_MEMORY};
pub use error::BootError;
pub use init::{Kernel, init_console};
