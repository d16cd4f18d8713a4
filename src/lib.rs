//! Client-resident fault reporter.
//!
//! Faults that escape application code (uncaught errors, unhandled
//! rejections, panics) and faults reported by hand are normalised into a
//! [`ReportRecord`], form-encoded, and posted to a collector address through
//! a fallback chain of delivery mechanisms. Reporting never fails loudly:
//! every problem is echoed to a [`DiagnosticSink`] and surfaces as `false`.

pub mod config_file;
mod diagnostics;
mod fault;
mod host;
mod normalise;
mod rate_limited_warner;
mod record;
mod reporter;
pub mod transport;

#[cfg(test)]
mod test_utils;

pub use config_file::{ConfigError, ReporterSettings, load_settings};
#[cfg(feature = "tracing-compat")]
pub use diagnostics::TracingSink;
pub use diagnostics::{DiagnosticSink, LOG_TARGET, LogSink};
pub use fault::{FaultEvent, FaultKind, FaultValue, LegacyFaultDescription};
pub use host::{EventGuard, HostContext, StaticHostContext, UNLOAD_EVENT_TYPES, default_user_agent};
pub use normalise::normalise;
pub use rate_limited_warner::{DEFAULT_WARN_INTERVAL, RateLimitedWarner};
pub use record::ReportRecord;
pub use reporter::{
    FaultEventBus, FaultEventTarget, FaultListener, FaultSource, FemtoReporter, HandlerSlot,
    LegacyFaultArgs, LegacyHandler, LegacyHandlerSlot, ReportArg, ReporterBuildError,
    ReporterBuilder, global, init, report_error, report_rejection, set_collector_address,
    shutdown,
};
pub use transport::{
    Beacon, BeaconPayload, DeliveryOutcome, FormRequest, QueuedBeacon, RequestMode,
    RequestPrimitive, Transport, TransportConfig, TransportError, UreqRequest,
};
