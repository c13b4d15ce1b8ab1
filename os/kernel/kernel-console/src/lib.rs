//! # Kernel Console
//!
//! Diagnostic output for the hosted kernel: a [`log::Log`] implementation and
//! a [`console_trace!`] macro that writes straight to the console sink,
//! bypassing the log framework.
//!
//! ```text
//! info!() / error!() ...          console_trace!()
//!        ↓                               ↓
//!   ConsoleLogger (level filter)         │
//!        ↓                               │
//!   "[LEVEL] target: message\n"          │
//!        └───────────────┬───────────────┘
//!                        ↓
//!             ConsoleSink (fmt::Write)
//!                        ↓
//!                      stderr
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kernel_console::ConsoleLogger;
//! use log::{LevelFilter, info};
//!
//! ConsoleLogger::new(LevelFilter::Debug).init().ok();
//! info!("buffer cache ready");
//! ```
//!
//! With the `enabled` feature turned off, the sink discards everything.

mod logger;

pub use logger::ConsoleLogger;

#[cfg(feature = "enabled")]
#[doc(hidden)]
pub mod console_fmt {
    use core::fmt::{self, Write};
    use std::io::{self, Write as _};

    /// Writes to the host's standard error, one lock per formatted message.
    pub struct ConsoleSink<'a>(io::StderrLock<'a>);

    impl Write for ConsoleSink<'_> {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.0.write_all(s.as_bytes()).map_err(|_| fmt::Error)
        }
    }

    #[doc(hidden)]
    pub fn console_write(args: fmt::Arguments) {
        // Best effort: a console that cannot be written to has nowhere to report it.
        let _ = ConsoleSink(io::stderr().lock()).write_fmt(args);
    }
}

#[cfg(not(feature = "enabled"))]
#[doc(hidden)]
pub mod console_fmt {
    use core::fmt;

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn console_write(_: fmt::Arguments) {}
}

/// Write formatted text to the console without going through `log`.
#[macro_export]
macro_rules! console_trace {
    ($($arg:tt)*) => {{
        $crate::console_fmt::console_write(core::format_args!($($arg)*));
    }};
}
