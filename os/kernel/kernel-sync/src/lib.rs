//! # Kernel synchronization primitives
//!
//! Two lock classes are provided, and they are not interchangeable:
//!
//! * [`SpinLock`] busy-waits. It guards short, bounded critical sections whose
//!   holder never blocks: bucket lists, free lists, reference count tables.
//! * [`SleepLock`] suspends a waiting thread until the holder releases it. It
//!   guards state that is held across slow operations such as a disk transfer.
//!
//! A [`SpinLock`] must never be held across a call that may block, which
//! includes acquiring a [`SleepLock`].

#![cfg_attr(not(any(test, doctest, feature = "std")), no_std)]
#![allow(unsafe_code)]

#[cfg(feature = "std")]
mod sleep_lock;
mod spin_lock;

#[cfg(feature = "std")]
pub use sleep_lock::{SleepLock, SleepLockGuard};
pub use spin_lock::{SpinLock, SpinLockGuard};
