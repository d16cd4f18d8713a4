//! Scripted mechanisms and sinks for exercising the transport chain and the
//! reporter without a network.

use std::fmt;
use std::sync::Arc;

use log::Level;
use parking_lot::Mutex;

use crate::diagnostics::DiagnosticSink;
use crate::transport::{
    Beacon, BeaconPayload, FormRequest, RequestMode, RequestPrimitive, TransportError,
};

/// What a scripted mechanism does when called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Script {
    Accept,
    Decline,
    Fail,
    Panic,
}

/// One captured beacon call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeaconCall {
    pub url: String,
    pub body: String,
    pub content_type: &'static str,
}

#[derive(Clone)]
pub struct ScriptedBeacon {
    script: Script,
    survives_unload: bool,
    calls: Arc<Mutex<Vec<BeaconCall>>>,
}

impl ScriptedBeacon {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            survives_unload: true,
            calls: Arc::default(),
        }
    }

    /// A beacon whose queue would be lost if the process exited.
    pub fn lost_on_unload(mut self) -> Self {
        self.survives_unload = false;
        self
    }

    pub fn calls(&self) -> Vec<BeaconCall> {
        self.calls.lock().clone()
    }
}

impl Beacon for ScriptedBeacon {
    fn send_beacon(&self, url: &str, payload: BeaconPayload) -> Result<bool, TransportError> {
        self.calls.lock().push(BeaconCall {
            url: url.to_owned(),
            body: String::from_utf8_lossy(payload.bytes()).into_owned(),
            content_type: payload.content_type(),
        });
        match self.script {
            Script::Accept => Ok(true),
            Script::Decline => Ok(false),
            Script::Fail => Err(TransportError::Request("blocked by policy".into())),
            Script::Panic => panic!("beacon exploded"),
        }
    }

    fn survives_unload(&self) -> bool {
        self.survives_unload
    }
}

/// One captured request call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestCall {
    pub url: String,
    pub body: String,
    pub content_type: &'static str,
    pub mode: RequestMode,
}

#[derive(Clone)]
pub struct ScriptedRequest {
    script: Script,
    calls: Arc<Mutex<Vec<RequestCall>>>,
}

impl ScriptedRequest {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<RequestCall> {
        self.calls.lock().clone()
    }
}

impl RequestPrimitive for ScriptedRequest {
    fn post(&self, request: FormRequest<'_>, mode: RequestMode) -> Result<(), TransportError> {
        self.calls.lock().push(RequestCall {
            url: request.url.to_owned(),
            body: request.body.to_owned(),
            content_type: request.content_type,
            mode,
        });
        match self.script {
            Script::Accept | Script::Decline => Ok(()),
            Script::Fail => Err(TransportError::Request("connection refused".into())),
            Script::Panic => panic!("request exploded"),
        }
    }
}

/// Sink that stores every diagnostic entry.
#[derive(Clone, Default)]
pub struct CollectingSink {
    entries: Arc<Mutex<Vec<(Level, String)>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.lock().iter().any(|(_, m)| m.contains(needle))
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        self.entries.lock().push((level, args.to_string()));
    }
}
