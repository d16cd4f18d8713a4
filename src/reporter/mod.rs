//! Reporter façade.
//!
//! [`FemtoReporter`] owns the collector address, the host context, the
//! transport chain and the diagnostic sink. Automatic capture (through a
//! [`FaultSource`]) and manual reports share [`FemtoReporter::send_fault`].

mod builder;
mod global;
mod sources;

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use log::Level;
use parking_lot::RwLock;

use crate::diagnostics::DiagnosticSink;
use crate::fault::{FaultEvent, FaultKind, FaultValue};
use crate::host::HostContext;
use crate::normalise::normalise;
use crate::transport::{QueuedBeacon, Transport, serialise_record};

pub use builder::{ReporterBuildError, ReporterBuilder};
pub use global::{global, init, report_error, report_rejection, set_collector_address, shutdown};
pub use sources::{
    FaultEventBus, FaultEventTarget, FaultListener, FaultSource, HandlerSlot, LegacyFaultArgs,
    LegacyHandler, LegacyHandlerSlot,
};

pub(crate) use sources::chain_panic_hook;

/// First argument of a manual report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ReportArg {
    #[default]
    Absent,
    Message(String),
    Fault(FaultValue),
}

impl From<&str> for ReportArg {
    fn from(value: &str) -> Self {
        Self::Message(value.to_owned())
    }
}

impl From<String> for ReportArg {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<FaultValue> for ReportArg {
    fn from(value: FaultValue) -> Self {
        Self::Fault(value)
    }
}

impl From<()> for ReportArg {
    fn from((): ()) -> Self {
        Self::Absent
    }
}

impl<T: Into<ReportArg>> From<Option<T>> for ReportArg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Apply the manual-report overload rule.
///
/// A fault value in first position is the fault itself when nothing follows
/// it; otherwise it is stringified into the message.
fn resolve_args(
    first: ReportArg,
    second: Option<FaultValue>,
) -> (Option<String>, Option<FaultValue>) {
    match (first, second) {
        (ReportArg::Fault(value), None) => (None, Some(value)),
        (ReportArg::Fault(value), Some(fault)) => (Some(value.display().to_owned()), Some(fault)),
        (ReportArg::Message(message), fault) => (Some(message), fault),
        (ReportArg::Absent, fault) => (None, fault),
    }
}

thread_local! {
    static REPORTING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as reporting. A fault raised while a report is
/// in flight on the same thread (a panicking mechanism under the panic hook,
/// say) is dropped instead of recursing.
struct ReportingGuard;

impl ReportingGuard {
    fn enter() -> Option<Self> {
        REPORTING.with(|flag| (!flag.replace(true)).then_some(Self))
    }
}

impl Drop for ReportingGuard {
    fn drop(&mut self) {
        REPORTING.with(|flag| flag.set(false));
    }
}

/// Client-resident fault reporter.
pub struct FemtoReporter {
    collector: RwLock<Option<String>>,
    host: Arc<dyn HostContext>,
    transport: Transport,
    sink: Arc<dyn DiagnosticSink>,
    queued_beacon: Option<Arc<QueuedBeacon>>,
}

impl FemtoReporter {
    pub(crate) fn from_parts(
        collector: Option<String>,
        host: Arc<dyn HostContext>,
        transport: Transport,
        sink: Arc<dyn DiagnosticSink>,
        queued_beacon: Option<Arc<QueuedBeacon>>,
    ) -> Self {
        Self {
            collector: RwLock::new(collector),
            host,
            transport,
            sink,
            queued_beacon,
        }
    }

    /// Replace the collector address. Last write wins; nothing is validated.
    pub fn set_collector_address(&self, address: impl Into<String>) {
        *self.collector.write() = Some(address.into());
    }

    pub fn collector_address(&self) -> Option<String> {
        self.collector.read().clone()
    }

    pub fn host(&self) -> &Arc<dyn HostContext> {
        &self.host
    }

    /// Report a handled error.
    pub fn report_error(&self, message: impl Into<ReportArg>, error: Option<FaultValue>) -> bool {
        let (message, error) = resolve_args(message.into(), error);
        self.log_manual(FaultKind::Error, message.as_deref(), error.as_ref());
        let event = FaultEvent {
            message,
            error,
            ..FaultEvent::new(FaultKind::Error)
        };
        self.send_fault(&event)
    }

    /// Report a rejection that was handled by application code.
    pub fn report_rejection(&self, message: impl Into<ReportArg>, cause: Option<FaultValue>) -> bool {
        let (message, cause) = resolve_args(message.into(), cause);
        self.log_manual(
            FaultKind::UnhandledRejection,
            message.as_deref(),
            cause.as_ref(),
        );
        let event = FaultEvent {
            message,
            cause,
            ..FaultEvent::new(FaultKind::UnhandledRejection)
        };
        self.send_fault(&event)
    }

    fn log_manual(&self, kind: FaultKind, message: Option<&str>, value: Option<&FaultValue>) {
        let label = match message.filter(|m| !m.is_empty()) {
            Some(message) => message.to_owned(),
            None => format!("Reporting {kind}"),
        };
        match value {
            Some(value) => self.sink.emit(Level::Error, format_args!("{label} {value}")),
            None => self.sink.emit(Level::Error, format_args!("{label}")),
        }
    }

    /// Normalise `event` and deliver it. Returns whether a mechanism accepted
    /// the report.
    pub fn send_fault(&self, event: &FaultEvent) -> bool {
        let Some(address) = self.collector_address() else {
            self.sink.emit(
                Level::Error,
                format_args!("Unable to send error report: Report URL not set"),
            );
            return false;
        };
        let Some(_guard) = ReportingGuard::enter() else {
            self.sink.emit(
                Level::Warn,
                format_args!("Dropping {} raised while reporting", event.kind),
            );
            return false;
        };
        let record = normalise(event, self.host.as_ref());
        let body = serialise_record(&record);
        self.transport.send(&address, &body)
    }

    /// Report a panic, then wait for the beacon queue: the process usually
    /// ends once the panic hook returns.
    pub(crate) fn report_panic(&self, event: &FaultEvent) {
        if self.send_fault(event) && !self.flush() {
            self.sink.emit(
                Level::Warn,
                format_args!("Beacon queue not drained after reporting a panic"),
            );
        }
    }

    /// Register with `source` so escaped faults are reported.
    ///
    /// [`FaultSource::PanicHook`] stays quiet while this reporter is the one
    /// registered by [`init`], whose own hook already reports panics.
    pub fn install(self: &Arc<Self>, source: FaultSource) {
        source.attach(Arc::clone(self));
    }

    /// Wait for queued beacons to be delivered. Returns `true` when there is
    /// no queue to wait on.
    pub fn flush(&self) -> bool {
        self.queued_beacon.as_ref().is_none_or(|beacon| beacon.flush())
    }

    /// Drain and stop the beacon worker, if any.
    pub fn close(&self) {
        if let Some(beacon) = &self.queued_beacon {
            beacon.close();
        }
    }
}

impl fmt::Debug for FemtoReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FemtoReporter")
            .field("collector", &*self.collector.read())
            .field("transport", &self.transport)
            .field("queued_beacon", &self.queued_beacon.is_some())
            .finish_non_exhaustive()
    }
}
