//! The canonical report exchanged with the collector.

use crate::fault::FaultKind;

/// Normalised fault report.
///
/// Built once per fault, read-only afterwards, encoded exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRecord {
    kind: FaultKind,
    message: Option<String>,
    stack: Option<String>,
    url: Option<String>,
    referrer: Option<String>,
    user_agent: Option<String>,
}

impl ReportRecord {
    pub(crate) fn new(
        kind: FaultKind,
        message: Option<String>,
        stack: Option<String>,
        url: Option<String>,
        referrer: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            kind,
            message,
            stack,
            url,
            referrer,
            user_agent,
        }
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn referrer(&self) -> Option<&str> {
        self.referrer.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Wire fields in emission order. `type` is always present.
    pub fn fields(&self) -> [(&'static str, Option<&str>); 6] {
        [
            ("type", Some(self.kind.as_str())),
            ("message", self.message()),
            ("stack", self.stack()),
            ("url", self.url()),
            ("referrer", self.referrer()),
            ("userAgent", self.user_agent()),
        ]
    }
}
