//! Builder for [`FemtoReporter`].
//!
//! Collects the collector address, injected host capabilities and transport
//! tunables, validates them, and assembles the mechanism chain. Anything not
//! supplied falls back to the ureq-backed mechanisms and
//! [`StaticHostContext`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config_file::ReporterSettings;
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::host::{HostContext, StaticHostContext};
use crate::transport::{
    Beacon, QueuedBeacon, RequestPrimitive, Transport, TransportConfig, TransportError,
    UreqRequest,
};

use super::FemtoReporter;

/// Errors raised while assembling a reporter.
#[derive(Debug, Error)]
pub enum ReporterBuildError {
    #[error("invalid reporter configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to start transport: {0}")]
    Transport(#[from] TransportError),
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(ReporterBuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

#[derive(Clone, Default)]
pub struct ReporterBuilder {
    collector_address: Option<String>,
    host: Option<Arc<dyn HostContext>>,
    user_agent: Option<String>,
    sink: Option<Arc<dyn DiagnosticSink>>,
    beacon: Option<Arc<dyn Beacon>>,
    request: Option<Arc<dyn RequestPrimitive>>,
    beacon_disabled: bool,
    connect_timeout_ms: Option<u64>,
    write_timeout_ms: Option<u64>,
    beacon_capacity: Option<usize>,
}

impl ReporterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collector address reports are posted to.
    pub fn with_collector_address(mut self, address: impl Into<String>) -> Self {
        self.collector_address = Some(address.into());
        self
    }

    /// Inject the host context. Overrides any configured user agent.
    pub fn with_host(mut self, host: Arc<dyn HostContext>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Use `beacon` instead of the queued ureq beacon.
    pub fn with_beacon(mut self, beacon: Arc<dyn Beacon>) -> Self {
        self.beacon = Some(beacon);
        self.beacon_disabled = false;
        self
    }

    /// Use `request` instead of the ureq request primitive.
    pub fn with_request(mut self, request: Arc<dyn RequestPrimitive>) -> Self {
        self.request = Some(request);
        self
    }

    /// Drop the beacon from the chain so every report uses the request
    /// primitive.
    pub fn without_beacon(mut self) -> Self {
        self.beacon = None;
        self.beacon_disabled = true;
        self
    }

    option_setter!(
        #[doc = "Set the user agent reported by the default host context."]
        with_user_agent,
        user_agent,
        String
    );
    option_setter!(
        #[doc = "Set the connect timeout in milliseconds."]
        with_connect_timeout_ms,
        connect_timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Set the write/request timeout in milliseconds."]
        with_write_timeout_ms,
        write_timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Set the beacon queue capacity."]
        with_beacon_capacity,
        beacon_capacity,
        usize
    );

    /// Apply settings loaded from a configuration file. Settings present in
    /// the file override values already on the builder.
    pub fn with_settings(mut self, settings: ReporterSettings) -> Self {
        let ReporterSettings {
            collector_url,
            connect_timeout_ms,
            write_timeout_ms,
            beacon_capacity,
            beacon,
            user_agent,
        } = settings;
        if collector_url.is_some() {
            self.collector_address = collector_url;
        }
        if user_agent.is_some() {
            self.user_agent = user_agent;
        }
        self.connect_timeout_ms = connect_timeout_ms.or(self.connect_timeout_ms);
        self.write_timeout_ms = write_timeout_ms.or(self.write_timeout_ms);
        self.beacon_capacity = beacon_capacity.or(self.beacon_capacity);
        match beacon {
            Some(false) => self.without_beacon(),
            Some(true) => {
                self.beacon_disabled = false;
                self
            }
            None => self,
        }
    }

    fn validate(&self) -> Result<(), ReporterBuildError> {
        if let Some(capacity) = self.beacon_capacity {
            ensure_positive!(capacity, "beacon_capacity")?;
        }
        if let Some(timeout) = self.connect_timeout_ms {
            ensure_positive!(timeout, "connect_timeout_ms")?;
        }
        if let Some(timeout) = self.write_timeout_ms {
            ensure_positive!(timeout, "write_timeout_ms")?;
        }
        Ok(())
    }

    fn transport_config(&self) -> Result<TransportConfig, ReporterBuildError> {
        self.validate()?;
        let defaults = TransportConfig::default();
        Ok(TransportConfig {
            connect_timeout: self
                .connect_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.connect_timeout),
            write_timeout: self
                .write_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.write_timeout),
            beacon_capacity: self.beacon_capacity.unwrap_or(defaults.beacon_capacity),
            beacon_enabled: !self.beacon_disabled,
            ..defaults
        })
    }

    fn build_host(&self) -> Arc<dyn HostContext> {
        if let Some(host) = &self.host {
            return Arc::clone(host);
        }
        let host = match &self.user_agent {
            Some(user_agent) => StaticHostContext::new().with_user_agent(user_agent.clone()),
            None => StaticHostContext::new(),
        };
        Arc::new(host)
    }

    /// Validate the configuration and assemble the reporter.
    pub fn build(&self) -> Result<FemtoReporter, ReporterBuildError> {
        let config = self.transport_config()?;
        let host = self.build_host();
        let sink = self
            .sink
            .clone()
            .unwrap_or_else(|| Arc::new(LogSink) as Arc<dyn DiagnosticSink>);

        let mut queued = None;
        let beacon = match (&self.beacon, config.beacon_enabled) {
            (_, false) => None,
            (Some(beacon), true) => Some(Arc::clone(beacon)),
            (None, true) => {
                let beacon = Arc::new(QueuedBeacon::with_config(&config)?);
                queued = Some(Arc::clone(&beacon));
                Some(beacon as Arc<dyn Beacon>)
            }
        };
        let request = self.request.clone().unwrap_or_else(|| {
            Arc::new(UreqRequest::with_config(&config)) as Arc<dyn RequestPrimitive>
        });

        let transport = Transport::new(beacon, Some(request), Arc::clone(&host), Arc::clone(&sink));
        Ok(FemtoReporter::from_parts(
            self.collector_address.clone(),
            host,
            transport,
            sink,
            queued,
        ))
    }
}

impl fmt::Debug for ReporterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterBuilder")
            .field("collector_address", &self.collector_address)
            .field("custom_host", &self.host.is_some())
            .field("user_agent", &self.user_agent)
            .field("custom_sink", &self.sink.is_some())
            .field("custom_beacon", &self.beacon.is_some())
            .field("custom_request", &self.request.is_some())
            .field("beacon_disabled", &self.beacon_disabled)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("write_timeout_ms", &self.write_timeout_ms)
            .field("beacon_capacity", &self.beacon_capacity)
            .finish()
    }
}
