//! Helpers for asserting on `logtest` output.
//!
//! `logtest` captures every record in the process, so other tests may have
//! logged in between. These helpers skip unrelated records.

use std::sync::Once;

use logtest::{Logger, Record};

/// Start the process-wide `logtest` logger, installing it only once.
///
/// `Logger::start` panics if a global logger is already set, so every test
/// in the binary must share a single installation.
pub fn start_logger() -> Logger {
    static START: Once = Once::new();
    let mut started = None;
    START.call_once(|| started = Some(Logger::start()));
    started.unwrap_or(Logger)
}

/// Pop records until one whose message contains `needle`.
///
/// # Panics
///
/// Panics if no such record was logged.
pub fn pop_log_containing(logger: &mut Logger, needle: &str) -> Record {
    while let Some(record) = logger.pop() {
        if record.args().contains(needle) {
            return record;
        }
    }
    panic!("no log record containing {needle:?}");
}

