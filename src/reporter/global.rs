//! Process-wide reporter registry.
//!
//! [`init`] registers one [`FemtoReporter`] for the whole process and chains
//! a panic hook that forwards to whichever reporter is registered at the
//! time of the panic. The free functions delegate to that reporter.

use std::sync::{Arc, Once};

use log::{error, warn};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::diagnostics::LOG_TARGET;
use crate::fault::FaultValue;

use super::{FemtoReporter, ReportArg, ReporterBuildError, ReporterBuilder, chain_panic_hook};

static REPORTER: Lazy<RwLock<Option<Arc<FemtoReporter>>>> = Lazy::new(|| RwLock::new(None));
static PANIC_HOOK: Once = Once::new();

/// Build a reporter from `builder` and register it process-wide, replacing
/// any previously registered reporter.
pub fn init(builder: &ReporterBuilder) -> Result<Arc<FemtoReporter>, ReporterBuildError> {
    let reporter = Arc::new(builder.build()?);
    let previous = REPORTER.write().replace(Arc::clone(&reporter));
    if let Some(previous) = previous {
        previous.close();
    }
    PANIC_HOOK.call_once(|| {
        chain_panic_hook(|event| {
            if let Some(reporter) = global() {
                reporter.report_panic(event);
            }
        });
    });
    Ok(reporter)
}

/// The registered reporter, if [`init`] has run.
pub fn global() -> Option<Arc<FemtoReporter>> {
    REPORTER.read().clone()
}

/// Whether the process-wide panic hook currently reports to `reporter`.
pub(crate) fn forwards_panics_to(reporter: &Arc<FemtoReporter>) -> bool {
    PANIC_HOOK.is_completed()
        && global().is_some_and(|registered| Arc::ptr_eq(&registered, reporter))
}

/// Unregister the process-wide reporter and drain its beacon queue.
///
/// Returns `false` if no reporter was registered.
pub fn shutdown() -> bool {
    let Some(reporter) = REPORTER.write().take() else {
        return false;
    };
    reporter.close();
    true
}

pub fn set_collector_address(address: impl Into<String>) {
    match global() {
        Some(reporter) => reporter.set_collector_address(address),
        None => warn!(
            target: LOG_TARGET,
            "Ignoring collector address: reporter not initialised"
        ),
    }
}

pub fn report_error(message: impl Into<ReportArg>, error: Option<FaultValue>) -> bool {
    match global() {
        Some(reporter) => reporter.report_error(message, error),
        None => {
            error!(target: LOG_TARGET, "Unable to send error report: reporter not initialised");
            false
        }
    }
}

pub fn report_rejection(message: impl Into<ReportArg>, cause: Option<FaultValue>) -> bool {
    match global() {
        Some(reporter) => reporter.report_rejection(message, cause),
        None => {
            error!(target: LOG_TARGET, "Unable to send error report: reporter not initialised");
            false
        }
    }
}
