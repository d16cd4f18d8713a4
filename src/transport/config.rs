//! Configuration consumed by the ureq-backed delivery mechanisms.

use std::sync::Arc;
use std::time::Duration;

use log::warn;
use ureq::{Agent, AgentBuilder};

use crate::diagnostics::LOG_TARGET;
use crate::rate_limited_warner::DEFAULT_WARN_INTERVAL;

/// Default beacon queue capacity.
pub const DEFAULT_BEACON_CAPACITY: usize = 64;
/// Default connection timeout applied when establishing HTTP connections.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default write/request timeout applied to HTTP requests.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables shared by [`QueuedBeacon`](super::QueuedBeacon) and
/// [`UreqRequest`](super::UreqRequest).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    /// Timeout for establishing connections.
    pub connect_timeout: Duration,
    /// Timeout for a complete request.
    pub write_timeout: Duration,
    /// Capacity of the beacon queue.
    pub beacon_capacity: usize,
    /// Interval between rate-limited drop warnings.
    pub warn_interval: Duration,
    /// Whether the beacon mechanism is part of the chain.
    pub beacon_enabled: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            beacon_capacity: DEFAULT_BEACON_CAPACITY,
            warn_interval: DEFAULT_WARN_INTERVAL,
            beacon_enabled: true,
        }
    }
}

impl TransportConfig {
    /// Build a ureq agent honouring the configured timeouts.
    ///
    /// TLS goes through `native-tls`; if the platform connector cannot be
    /// created the agent keeps ureq's default TLS configuration.
    pub(crate) fn agent(&self) -> Agent {
        let builder = AgentBuilder::new()
            .timeout_connect(self.connect_timeout)
            .timeout(self.write_timeout);
        match native_tls::TlsConnector::new() {
            Ok(connector) => builder.tls_connector(Arc::new(connector)).build(),
            Err(err) => {
                warn!(target: LOG_TARGET, "native TLS unavailable, using default connector: {err}");
                builder.build()
            }
        }
    }
}
