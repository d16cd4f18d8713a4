//! Delivery mechanisms the transport chain can draw on.
//!
//! Both traits mirror host primitives: an unload-safe beacon and a classic
//! request that can run synchronously or asynchronously. Implementations
//! report failure through [`TransportError`]; the chain decides what to do
//! with it.

use std::io;

use thiserror::Error;

use super::serialise::FORM_CONTENT_TYPE;

/// Errors raised by a delivery mechanism.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The mechanism has been shut down.
    #[error("transport closed")]
    Closed,
    /// The request failed below the HTTP layer.
    #[error("request failed: {0}")]
    Request(String),
    /// The background delivery thread could not be started.
    #[error("failed to spawn delivery thread: {0}")]
    Spawn(#[source] io::Error),
    /// The mechanism panicked.
    #[error("mechanism panicked: {0}")]
    Panicked(String),
}

/// Body handed to a beacon, tagged with its media type.
///
/// The body travels as bytes with an explicit type so beacon hosts do not
/// fall back to `text/plain`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeaconPayload {
    bytes: Vec<u8>,
    content_type: &'static str,
}

impl BeaconPayload {
    /// Wrap a form-encoded body.
    pub fn form(body: &str) -> Self {
        Self {
            bytes: body.as_bytes().to_vec(),
            content_type: FORM_CONTENT_TYPE,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }
}

/// Whether a request blocks until it has been sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestMode {
    /// Block the caller. Used while the host is unloading.
    Synchronous,
    /// Fire and forget.
    Asynchronous,
}

/// A form POST issued through a [`RequestPrimitive`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormRequest<'a> {
    pub url: &'a str,
    pub content_type: &'static str,
    pub body: &'a str,
}

impl<'a> FormRequest<'a> {
    pub fn new(url: &'a str, body: &'a str) -> Self {
        Self {
            url,
            content_type: FORM_CONTENT_TYPE,
            body,
        }
    }
}

/// Result of a delivery attempt, observed only for logging and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The collector answered with a 2xx status.
    Accepted(u16),
    /// The collector answered with any other status.
    Rejected(u16),
    /// No response was received.
    Failed(String),
}

/// Classify a collector response status.
pub fn classify_status(status: u16) -> DeliveryOutcome {
    match status {
        200..=299 => DeliveryOutcome::Accepted(status),
        _ => DeliveryOutcome::Rejected(status),
    }
}

/// Non-blocking, unload-safe send primitive.
pub trait Beacon: Send + Sync {
    /// Queue `payload` for delivery to `url`.
    ///
    /// Returns `Ok(false)` when the beacon declines the payload (for example
    /// because its queue is full).
    fn send_beacon(&self, url: &str, payload: BeaconPayload) -> Result<bool, TransportError>;

    /// Whether an accepted payload is still delivered if the process exits
    /// straight afterwards. While the host is unloading the chain bypasses
    /// beacons that return `false` in favour of a synchronous request.
    fn survives_unload(&self) -> bool {
        true
    }
}

/// HTTP request primitive.
pub trait RequestPrimitive: Send + Sync {
    /// Issue `request`. `Ok` means the request was sent (or, in asynchronous
    /// mode, dispatched); the response status is not inspected.
    fn post(&self, request: FormRequest<'_>, mode: RequestMode) -> Result<(), TransportError>;
}
