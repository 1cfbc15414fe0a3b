//! Diagnostic output for elfdump.
//!
//! Everything here writes to stderr so stdout carries only the dump.
//! `-q` silences diagnostics; `-v` adds the config source, per-stage timings
//! and entry counts on top of the one-line summary per file.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

const QUIET: u8 = 0;
const SUMMARY: u8 = 1;
const VERBOSE: u8 = 2;

static LEVEL: AtomicU8 = AtomicU8::new(SUMMARY);

/// Sets the process-wide level from the `-q`/`-v` flags; `-q` wins.
pub fn init(quiet: bool, verbose: bool) {
    let level = match (quiet, verbose) {
        (true, _) => QUIET,
        (false, true) => VERBOSE,
        (false, false) => SUMMARY,
    };
    LEVEL.store(level, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    LEVEL.load(Ordering::Relaxed) == VERBOSE
}

pub fn is_quiet() -> bool {
    LEVEL.load(Ordering::Relaxed) == QUIET
}

/// `eprintln!` that only fires under `-v`.
macro_rules! vprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}

pub(crate) use vprintln;

/// `eprintln!` that `-q` suppresses.
macro_rules! dprintln {
    ($($arg:tt)*) => {
        if !$crate::verbose::is_quiet() {
            eprintln!($($arg)*);
        }
    };
}

pub(crate) use dprintln;

/// Reports how long a decoding stage took when dropped under `-v`.
///
/// ```ignore
/// let _t = Timer::start("decode");
/// // "  decode: 1.2ms"
/// ```
pub struct Timer {
    stage: &'static str,
    start: Instant,
}

impl Timer {
    pub fn start(stage: &'static str) -> Self {
        Self {
            stage,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        vprintln!("  {}: {:.1?}", self.stage, self.start.elapsed());
    }
}
