//! Diagnostic sink for reporter failures.
//!
//! Anything the reporter cannot deliver or cannot do is echoed here instead
//! of being raised. The default sink forwards to the `log` facade under the
//! [`LOG_TARGET`] target.

use std::fmt;

use log::Level;

/// Log target used by [`LogSink`] and the transport workers.
pub const LOG_TARGET: &str = "femtoreport";

/// Receiver of diagnostic entries.
pub trait DiagnosticSink: Send + Sync {
    /// Record one diagnostic entry.
    fn emit(&self, level: Level, args: fmt::Arguments<'_>);
}

/// Sink forwarding to the `log` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(target: LOG_TARGET, level, "{args}");
    }
}

/// Sink forwarding to `tracing` events.
#[cfg(feature = "tracing-compat")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

#[cfg(feature = "tracing-compat")]
impl DiagnosticSink for TracingSink {
    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        match level {
            Level::Error => tracing::error!(target: LOG_TARGET, "{args}"),
            Level::Warn => tracing::warn!(target: LOG_TARGET, "{args}"),
            Level::Info => tracing::info!(target: LOG_TARGET, "{args}"),
            Level::Debug => tracing::debug!(target: LOG_TARGET, "{args}"),
            Level::Trace => tracing::trace!(target: LOG_TARGET, "{args}"),
        }
    }
}
