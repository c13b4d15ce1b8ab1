//! # Kernel Parameters and Memory Layout
//!
//! This crate is the single source of the compile-time constants shared by the
//! kernel's resource managers. Both the block I/O layer and the physical page
//! allocator size their pools from here, so a change to a pool size is a
//! change in exactly one place.
//!
//! ## Modules
//!
//! ### Parameters ([`param`])
//! Sizes of fixed kernel tables:
//! * **Block size**: bytes per disk block ([`param::BSIZE`])
//! * **Buffer pool**: number of cached blocks ([`param::NBUF`])
//! * **Buckets**: number of independently locked recency lists ([`param::NBUCKETS`])
//!
//! ### Memory Layout ([`memory`])
//! Physical memory layout and page geometry:
//! * **Page size**: the allocation unit of the page allocator
//! * **Managed range**: `KERNBASE..PHYSTOP`
//! * **Scrub patterns**: fill bytes written into freed and freshly allocated pages
//!
//! ```text
//! Physical Address Space:
//!
//! 0x0000_0000 ┌──────────────────────────────┐
//!             │  Devices (UART, virtio, ...) │
//! KERNBASE    ├──────────────────────────────┤ 0x8000_0000
//!             │  Kernel text and data        │
//!             ├──────────────────────────────┤ end of kernel image
//!             │  Free pages (page allocator) │
//! PHYSTOP     └──────────────────────────────┘ KERNBASE + 128 MiB
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod memory;
pub mod param;
