//! Fault sources the reporter can register with.
//!
//! Hosts either offer a subscription mechanism (one listener per fault kind)
//! or a single legacy handler slot that must be chained rather than
//! replaced. Native processes additionally have the panic hook. Every source
//! funnels into [`FemtoReporter::send_fault`].

use std::panic::{self, PanicHookInfo};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::fault::{FaultEvent, FaultKind, FaultValue};

use super::FemtoReporter;
use super::global::forwards_panics_to;

/// Listener invoked for each dispatched fault event.
pub type FaultListener = Arc<dyn Fn(&FaultEvent) + Send + Sync>;

/// Host capability: subscription to fault notifications.
pub trait FaultEventTarget: Send + Sync {
    /// Register `listener` for events of `kind`.
    fn add_listener(&self, kind: FaultKind, listener: FaultListener);
}

/// In-process fault event target.
///
/// Hosts call [`dispatch`](Self::dispatch) when a fault escapes; listeners
/// for the event's kind run in registration order.
#[derive(Default)]
pub struct FaultEventBus {
    listeners: RwLock<Vec<(FaultKind, FaultListener)>>,
}

impl FaultEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every listener registered for its kind.
    pub fn dispatch(&self, event: &FaultEvent) {
        // Snapshot so a listener may register further listeners.
        let listeners: Vec<FaultListener> = self
            .listeners
            .read()
            .iter()
            .filter(|(kind, _)| *kind == event.kind)
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self, kind: FaultKind) -> usize {
        self.listeners
            .read()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

impl FaultEventTarget for FaultEventBus {
    fn add_listener(&self, kind: FaultKind, listener: FaultListener) {
        self.listeners.write().push((kind, listener));
    }
}

impl std::fmt::Debug for FaultEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultEventBus")
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

/// Arguments passed to a legacy global fault handler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LegacyFaultArgs {
    pub message: Option<String>,
    pub filename: Option<String>,
    pub lineno: Option<u32>,
    pub colno: Option<u32>,
    pub error: Option<FaultValue>,
}

impl LegacyFaultArgs {
    fn to_event(&self) -> FaultEvent {
        FaultEvent {
            kind: FaultKind::Error,
            message: self.message.clone(),
            filename: self.filename.clone(),
            lineno: self.lineno,
            colno: self.colno,
            error: self.error.clone(),
            cause: None,
        }
    }
}

/// Legacy fault handler. The return value is the host's "handled" flag.
pub type LegacyHandler = Arc<dyn Fn(&LegacyFaultArgs) -> bool + Send + Sync>;

/// Host capability: a single global fault handler slot.
pub trait LegacyHandlerSlot: Send + Sync {
    /// The handler currently installed, if any.
    fn current(&self) -> Option<LegacyHandler>;

    /// Install `handler` in place of the current one.
    fn replace(&self, handler: LegacyHandler);
}

/// In-process legacy handler slot.
#[derive(Default)]
pub struct HandlerSlot {
    handler: RwLock<Option<LegacyHandler>>,
}

impl HandlerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the installed handler. Returns `false` when the slot is empty.
    pub fn invoke(&self, args: &LegacyFaultArgs) -> bool {
        let handler = self.handler.read().clone();
        handler.is_some_and(|handler| handler(args))
    }
}

impl LegacyHandlerSlot for HandlerSlot {
    fn current(&self) -> Option<LegacyHandler> {
        self.handler.read().clone()
    }

    fn replace(&self, handler: LegacyHandler) {
        *self.handler.write() = Some(handler);
    }
}

impl std::fmt::Debug for HandlerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerSlot")
            .field("installed", &self.handler.read().is_some())
            .finish()
    }
}

/// How the reporter observes faults.
#[derive(Clone)]
pub enum FaultSource {
    /// Subscribe to error and rejection notifications.
    EventSubscription(Arc<dyn FaultEventTarget>),
    /// Chain onto a single legacy handler slot.
    LegacyHandlerChain(Arc<dyn LegacyHandlerSlot>),
    /// Chain onto the process panic hook. Reports are flushed before the
    /// hook returns.
    PanicHook,
}

impl FaultSource {
    /// Prefer the subscription mechanism when the host offers one.
    pub fn detect(
        target: Option<Arc<dyn FaultEventTarget>>,
        legacy: Arc<dyn LegacyHandlerSlot>,
    ) -> Self {
        match target {
            Some(target) => Self::EventSubscription(target),
            None => Self::LegacyHandlerChain(legacy),
        }
    }

    pub(crate) fn attach(self, reporter: Arc<FemtoReporter>) {
        match self {
            Self::EventSubscription(target) => {
                for kind in [FaultKind::Error, FaultKind::UnhandledRejection] {
                    let reporter = Arc::clone(&reporter);
                    target.add_listener(
                        kind,
                        Arc::new(move |event: &FaultEvent| {
                            reporter.send_fault(event);
                        }),
                    );
                }
            }
            Self::LegacyHandlerChain(slot) => {
                let previous = slot.current();
                slot.replace(Arc::new(move |args: &LegacyFaultArgs| {
                    reporter.send_fault(&args.to_event());
                    previous.as_ref().is_some_and(|previous| previous(args))
                }));
            }
            Self::PanicHook => chain_panic_hook(move |event| {
                if !forwards_panics_to(&reporter) {
                    reporter.report_panic(event);
                }
            }),
        }
    }
}

impl std::fmt::Debug for FaultSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::EventSubscription(_) => "EventSubscription",
            Self::LegacyHandlerChain(_) => "LegacyHandlerChain",
            Self::PanicHook => "PanicHook",
        })
    }
}

/// Install a panic hook that reports through `report` and then runs the
/// previously installed hook.
pub(crate) fn chain_panic_hook<F>(report: F)
where
    F: Fn(&FaultEvent) + Send + Sync + 'static,
{
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        report(&panic_event(info));
        previous(info);
    }));
}

fn panic_event(info: &PanicHookInfo<'_>) -> FaultEvent {
    let payload = FaultValue::from_panic_payload(info.payload());
    let event = FaultEvent::new(FaultKind::Error).with_message(payload.display());
    match info.location() {
        Some(location) => event.with_location(location.file(), location.line(), location.column()),
        None => event,
    }
}
