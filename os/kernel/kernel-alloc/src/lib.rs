//! # Physical Page Allocation
//!
//! This crate owns the machine's free physical memory. It hands out whole
//! 4 KiB pages and keeps a reference count per page so that pages can be
//! shared between address spaces instead of copied.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              PhysicalPageAllocator                  │
//! │    • allocate / free                                │
//! │    • refcount / increment / decrement               │
//! └───────┬──────────────────┬──────────────────┬───────┘
//!         │                  │                  │
//! ┌───────▼───────┐  ┌───────▼────────┐  ┌──────▼───────┐
//! │ PageFreeList  │  │ PageRefcount-  │  │ PageFrames   │
//! │ LIFO stack,   │  │ Table, one     │  │ page bytes,  │
//! │ own spinlock  │  │ spinlock       │  │ lock per page│
//! └───────────────┘  └────────────────┘  └──────────────┘
//! ```
//!
//! ## Ownership Protocol
//!
//! * A page with count 0 is on the free list; a page with count ≥ 1 is not.
//! * [`PhysicalPageAllocator::allocate`] moves a page from 0 to 1.
//! * [`PhysicalPageAllocator::increment`] adds an owner (e.g. `fork` sharing a
//!   page copy-on-write).
//! * [`PhysicalPageAllocator::free`] removes an owner and reclaims the page
//!   when the last one is gone.
//!
//! The copy-on-write fault handler lives in the virtual memory layer; this
//! crate only guarantees that the counter operations are linearizable.
//!
//! ## Failure Modes
//!
//! Running out of pages is recoverable ([`AllocError::OutOfMemory`]). Broken
//! accounting (a negative count, a free-list page that is still referenced, a
//! page outside the managed range) panics.

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod address;
mod error;
mod frames;
mod free_list;
mod page_alloc;
mod range;
mod refcount;

pub use address::{PhysicalAddress, PhysicalPage};
pub use error::{AllocError, InitError};
pub use frames::{PAGE_LEN, PageBytes, PageFrames};
pub use free_list::PageFreeList;
pub use page_alloc::PhysicalPageAllocator;
pub use range::PhysicalRange;
pub use refcount::PageRefcountTable;
