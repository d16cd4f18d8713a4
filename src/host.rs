//! Ambient reads of host runtime state.
//!
//! The normaliser and transport never reach for globals. Everything they need
//! to know about the surrounding host (current address, referrer, user agent,
//! the event currently being dispatched) comes through [`HostContext`].

use std::sync::Arc;

use parking_lot::RwLock;

use crate::fault::LegacyFaultDescription;

/// Ambient event types during which requests must be sent synchronously.
pub const UNLOAD_EVENT_TYPES: [&str; 2] = ["unload", "beforeunload"];

/// Narrow view of the host runtime used while building and sending reports.
pub trait HostContext: Send + Sync {
    /// Address of the page (or process) at the time of the fault.
    fn location(&self) -> Option<String>;

    /// Referring address. May be empty.
    fn referrer(&self) -> Option<String>;

    /// Runtime identification string.
    fn user_agent(&self) -> Option<String>;

    /// Type of the event the host is currently dispatching, if any.
    fn current_event_type(&self) -> Option<String> {
        None
    }

    /// Legacy fault description attached to the ambient event by old hosts.
    fn legacy_fault_description(&self) -> Option<LegacyFaultDescription> {
        None
    }

    /// Whether the host is tearing the page down right now.
    fn is_unloading(&self) -> bool {
        self.current_event_type()
            .is_some_and(|kind| UNLOAD_EVENT_TYPES.contains(&kind.as_str()))
    }
}

/// Default user agent advertised by [`StaticHostContext`].
pub fn default_user_agent() -> String {
    format!(
        "{}/{} ({}; {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

#[derive(Debug, Default)]
struct AmbientEvent {
    kind: Option<String>,
    legacy: Option<LegacyFaultDescription>,
}

/// Host context with fixed identity fields and a settable ambient event.
///
/// Native hosts use this directly: set the identity once, then wrap teardown
/// code in [`enter_event`](Self::enter_event) so reports raised during
/// shutdown go out synchronously.
#[derive(Debug)]
pub struct StaticHostContext {
    location: Option<String>,
    referrer: Option<String>,
    user_agent: Option<String>,
    ambient: Arc<RwLock<AmbientEvent>>,
}

impl Default for StaticHostContext {
    fn default() -> Self {
        Self {
            location: None,
            referrer: None,
            user_agent: Some(default_user_agent()),
            ambient: Arc::default(),
        }
    }
}

impl StaticHostContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Mark `kind` as the event currently being dispatched until the returned
    /// guard is dropped.
    pub fn enter_event(&self, kind: impl Into<String>) -> EventGuard {
        let previous = self.ambient.write().kind.replace(kind.into());
        EventGuard {
            ambient: Arc::clone(&self.ambient),
            previous,
        }
    }

    /// Attach (or clear) a legacy fault description to the ambient event.
    pub fn set_legacy_fault_description(&self, description: Option<LegacyFaultDescription>) {
        self.ambient.write().legacy = description;
    }
}

impl HostContext for StaticHostContext {
    fn location(&self) -> Option<String> {
        self.location.clone()
    }

    fn referrer(&self) -> Option<String> {
        self.referrer.clone()
    }

    fn user_agent(&self) -> Option<String> {
        self.user_agent.clone()
    }

    fn current_event_type(&self) -> Option<String> {
        self.ambient.read().kind.clone()
    }

    fn legacy_fault_description(&self) -> Option<LegacyFaultDescription> {
        self.ambient.read().legacy.clone()
    }
}

/// Restores the previous ambient event type when dropped.
#[must_use = "the ambient event is reset as soon as the guard is dropped"]
#[derive(Debug)]
pub struct EventGuard {
    ambient: Arc<RwLock<AmbientEvent>>,
    previous: Option<String>,
}

impl Drop for EventGuard {
    fn drop(&mut self) {
        self.ambient.write().kind = self.previous.take();
    }
}
