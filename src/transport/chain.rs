//! Ordered fallback chain over the delivery mechanisms.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use log::Level;

use crate::diagnostics::DiagnosticSink;
use crate::host::HostContext;

use super::mechanism::{
    Beacon, BeaconPayload, FormRequest, RequestMode, RequestPrimitive, TransportError,
};

/// Delivers encoded bodies, trying the beacon first and the request
/// primitive second.
///
/// While the host is unloading, a beacon that does not survive unload is
/// skipped when a request primitive is available, so the report goes out
/// synchronously before the caller returns.
///
/// [`send`](Self::send) never panics and never returns an error: every
/// failure turns into `false` plus a diagnostic entry.
#[derive(Clone)]
pub struct Transport {
    beacon: Option<Arc<dyn Beacon>>,
    request: Option<Arc<dyn RequestPrimitive>>,
    host: Arc<dyn HostContext>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Transport {
    pub fn new(
        beacon: Option<Arc<dyn Beacon>>,
        request: Option<Arc<dyn RequestPrimitive>>,
        host: Arc<dyn HostContext>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            beacon,
            request,
            host,
            sink,
        }
    }

    /// Send `body` to `address`. Returns whether some mechanism accepted it.
    pub fn send(&self, address: &str, body: &str) -> bool {
        if self.try_beacon(address, body) {
            return true;
        }
        self.try_request(address, body)
    }

    fn try_beacon(&self, address: &str, body: &str) -> bool {
        let Some(beacon) = &self.beacon else {
            return false;
        };
        if self.request.is_some() && self.host.is_unloading() && !beacon.survives_unload() {
            return false;
        }
        let payload = BeaconPayload::form(body);
        match guarded(|| beacon.send_beacon(address, payload)) {
            Ok(accepted) => accepted,
            Err(err) => {
                self.sink
                    .emit(Level::Error, format_args!("Error calling beacon: {err}"));
                false
            }
        }
    }

    fn try_request(&self, address: &str, body: &str) -> bool {
        let Some(request) = &self.request else {
            self.sink.emit(
                Level::Error,
                format_args!("Unable to send error report: no delivery mechanism accepted it"),
            );
            return false;
        };
        let mode = if self.host.is_unloading() {
            RequestMode::Synchronous
        } else {
            RequestMode::Asynchronous
        };
        match guarded(|| request.post(FormRequest::new(address, body), mode)) {
            Ok(()) => true,
            Err(err) => {
                self.sink.emit(
                    Level::Error,
                    format_args!("Error sending request: {err}"),
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("beacon", &self.beacon.is_some())
            .field("request", &self.request.is_some())
            .finish()
    }
}

/// Run a mechanism call, turning a panic into [`TransportError::Panicked`].
fn guarded<T>(call: impl FnOnce() -> Result<T, TransportError>) -> Result<T, TransportError> {
    catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|payload| Err(TransportError::Panicked(panic_text(&*payload))))
}

fn panic_text(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
