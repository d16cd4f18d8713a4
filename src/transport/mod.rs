//! Encoding and delivery of report bodies.
//!
//! Bodies are `application/x-www-form-urlencoded` and go out through an
//! ordered chain of mechanisms:
//!
//! - **Beacon**: a non-blocking, unload-safe send. [`QueuedBeacon`] queues
//!   payloads for a worker thread and drains the queue on close.
//! - **Request**: a form POST. [`UreqRequest`] sends synchronously while the
//!   host is unloading and on a detached thread otherwise.
//!
//! The first mechanism that accepts the body wins. Nothing is retried.

mod beacon;
mod chain;
mod config;
mod mechanism;
mod params;
mod request;
mod serialise;
mod url_encoding;


pub use beacon::QueuedBeacon;
pub use chain::Transport;
pub use config::{
    DEFAULT_BEACON_CAPACITY, DEFAULT_CONNECT_TIMEOUT, DEFAULT_WRITE_TIMEOUT, TransportConfig,
};
pub use mechanism::{
    Beacon, BeaconPayload, DeliveryOutcome, FormRequest, RequestMode, RequestPrimitive,
    TransportError, classify_status,
};
pub use params::{FormParams, encode_fields};
pub use request::{OutcomeObserver, UreqRequest};
pub use serialise::{FORM_CONTENT_TYPE, serialise_record};
pub use url_encoding::url_encode;
