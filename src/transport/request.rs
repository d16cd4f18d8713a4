//! ureq-backed request primitive.

use std::sync::Arc;
use std::thread;

use log::{debug, warn};
use ureq::Agent;

use crate::diagnostics::LOG_TARGET;

use super::config::TransportConfig;
use super::mechanism::{
    DeliveryOutcome, FormRequest, RequestMode, RequestPrimitive, TransportError, classify_status,
};

/// Callback receiving the outcome of every request.
pub type OutcomeObserver = Arc<dyn Fn(&DeliveryOutcome) + Send + Sync>;

/// Request primitive issuing form POSTs through a shared ureq `Agent`.
///
/// Synchronous requests run on the caller's thread. Asynchronous requests run
/// on a detached thread and only their outcome is observable.
#[derive(Clone)]
pub struct UreqRequest {
    agent: Agent,
    observer: Option<OutcomeObserver>,
}

impl UreqRequest {
    pub fn with_config(config: &TransportConfig) -> Self {
        Self {
            agent: config.agent(),
            observer: None,
        }
    }

    /// Observe the outcome of each request (for diagnostics and tests).
    pub fn with_outcome_observer(mut self, observer: OutcomeObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    fn execute(agent: &Agent, url: &str, content_type: &str, body: &str) -> DeliveryOutcome {
        match agent
            .post(url)
            .set("Content-Type", content_type)
            .send_string(body)
        {
            Ok(response) => classify_status(response.status()),
            Err(ureq::Error::Status(code, _)) => classify_status(code),
            Err(ureq::Error::Transport(err)) => DeliveryOutcome::Failed(err.to_string()),
        }
    }

    fn observe(observer: Option<&OutcomeObserver>, url: &str, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Accepted(status) => {
                debug!(target: LOG_TARGET, "report to {url} accepted with status {status}");
            }
            DeliveryOutcome::Rejected(status) => {
                warn!(target: LOG_TARGET, "report to {url} rejected with status {status}");
            }
            DeliveryOutcome::Failed(reason) => {
                warn!(target: LOG_TARGET, "report to {url} failed: {reason}");
            }
        }
        if let Some(observer) = observer {
            observer(outcome);
        }
    }
}

impl RequestPrimitive for UreqRequest {
    fn post(&self, request: FormRequest<'_>, mode: RequestMode) -> Result<(), TransportError> {
        match mode {
            RequestMode::Synchronous => {
                let outcome =
                    Self::execute(&self.agent, request.url, request.content_type, request.body);
                Self::observe(self.observer.as_ref(), request.url, &outcome);
                match outcome {
                    DeliveryOutcome::Failed(reason) => Err(TransportError::Request(reason)),
                    _ => Ok(()),
                }
            }
            RequestMode::Asynchronous => {
                let agent = self.agent.clone();
                let observer = self.observer.clone();
                let url = request.url.to_owned();
                let content_type = request.content_type;
                let body = request.body.to_owned();
                thread::Builder::new()
                    .name("femtoreport-request".into())
                    .spawn(move || {
                        let outcome = Self::execute(&agent, &url, content_type, &body);
                        Self::observe(observer.as_ref(), &url, &outcome);
                    })
                    .map(drop)
                    .map_err(TransportError::Spawn)
            }
        }
    }
}

impl std::fmt::Debug for UreqRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqRequest")
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
