//! Raw fault values and events as delivered by the host.
//!
//! Hosts hand the reporter faults in inconsistent shapes: a thrown value may
//! be a plain string, an error object with `name`/`message`/`stack`, or an
//! arbitrary object whose default stringification carries no information.
//! [`FaultValue`] captures the parts the normaliser cares about and
//! [`FaultEvent`] carries the surrounding event fields.

use std::any::Any;
use std::error::Error;
use std::fmt;

/// Which kind of fault produced a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Uncaught exception (or panic).
    Error,
    /// Unhandled asynchronous rejection.
    UnhandledRejection,
}

impl FaultKind {
    /// Wire name sent in the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::UnhandledRejection => "unhandledrejection",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag used by [`FaultValue::object`] for the generic stringification.
const GENERIC_OBJECT_TAG: &str = "Object";

/// A raw fault value (the thrown error or the rejection cause).
///
/// `display` is what the host's default stringification produced. Error-like
/// values additionally expose `name`, `message` and a native `stack`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaultValue {
    display: String,
    name: Option<String>,
    message: Option<String>,
    stack: Option<String>,
}

impl FaultValue {
    /// A thrown primitive such as a string.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            display: value.into(),
            ..Self::default()
        }
    }

    /// An error object with the conventional `"<name>: <message>"` display.
    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let display = match (name.is_empty(), message.is_empty()) {
            (true, _) => message.clone(),
            (false, true) => name.clone(),
            (false, false) => format!("{name}: {message}"),
        };
        Self {
            display,
            name: Some(name),
            message: Some(message),
            stack: None,
        }
    }

    /// An error-like object whose default stringification is the generic
    /// `[object Object]` marker.
    pub fn object(name: Option<String>, message: Option<String>) -> Self {
        Self {
            display: generic_display(GENERIC_OBJECT_TAG),
            name,
            message,
            stack: None,
        }
    }

    /// Capture a Rust error. The source chain, if any, becomes the stack text.
    pub fn from_error<E: Error + ?Sized>(err: &E) -> Self {
        let display = err.to_string();
        let mut stack = None;
        let mut source = err.source();
        while let Some(cause) = source {
            let trace = stack.get_or_insert_with(|| display.clone());
            trace.push_str("\n    caused by: ");
            trace.push_str(&cause.to_string());
            source = cause.source();
        }
        Self {
            message: Some(display.clone()),
            display,
            name: None,
            stack,
        }
    }

    /// Capture a panic payload.
    ///
    /// `&str` and `String` payloads are used verbatim; anything else has no
    /// useful stringification.
    pub fn from_panic_payload(payload: &(dyn Any + Send)) -> Self {
        if let Some(s) = payload.downcast_ref::<&str>() {
            Self::text(*s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            Self::text(s.clone())
        } else {
            Self::text("Box<dyn Any>")
        }
    }

    /// Replace the default stringification.
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    /// Set the error name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the error message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach native trace text.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// Whether the default stringification is the uninformative
    /// `[object <Tag>]` marker.
    pub fn has_generic_display(&self) -> bool {
        self.display
            .strip_prefix("[object ")
            .and_then(|rest| rest.strip_suffix(']'))
            .is_some_and(|tag| !tag.is_empty() && !tag.contains(char::is_whitespace))
    }
}

impl fmt::Display for FaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl From<&str> for FaultValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for FaultValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

fn generic_display(tag: &str) -> String {
    format!("[object {tag}]")
}

/// A host-delivered fault notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaultEvent {
    pub kind: FaultKind,
    pub message: Option<String>,
    pub filename: Option<String>,
    pub lineno: Option<u32>,
    pub colno: Option<u32>,
    /// Thrown value of an uncaught exception.
    pub error: Option<FaultValue>,
    /// Reason of an unhandled rejection.
    pub cause: Option<FaultValue>,
}

impl FaultEvent {
    /// An empty event of the given kind.
    pub fn new(kind: FaultKind) -> Self {
        Self {
            kind,
            message: None,
            filename: None,
            lineno: None,
            colno: None,
            error: None,
            cause: None,
        }
    }

    /// An uncaught-exception event carrying `error`.
    pub fn uncaught(error: FaultValue) -> Self {
        Self::new(FaultKind::Error).with_error(error)
    }

    /// An unhandled-rejection event carrying `cause`.
    pub fn rejection(cause: FaultValue) -> Self {
        Self::new(FaultKind::UnhandledRejection).with_cause(cause)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_error(mut self, error: FaultValue) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_cause(mut self, cause: FaultValue) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Set the source location. Zero line or column values mean "unknown".
    pub fn with_location(mut self, filename: impl Into<String>, lineno: u32, colno: u32) -> Self {
        self.filename = Some(filename.into());
        self.lineno = Some(lineno);
        self.colno = Some(colno);
        self
    }

    /// The fault value: `error` when present, otherwise `cause`.
    pub fn fault_value(&self) -> Option<&FaultValue> {
        self.error.as_ref().or(self.cause.as_ref())
    }
}

/// Legacy global fault description exposed by very old hosts on the ambient
/// event object rather than on the event argument.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LegacyFaultDescription {
    pub error_message: Option<String>,
    pub error_url: Option<String>,
    pub error_line: Option<u32>,
    pub error_character: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug)]
    struct Outer(Inner);

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("request failed")
        }
    }

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection reset")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    impl Error for Inner {}

    #[rstest]
    #[case("TypeError", "x is not defined", "TypeError: x is not defined")]
    #[case("", "bare message", "bare message")]
    #[case("RangeError", "", "RangeError")]
    fn error_display_follows_error_to_string(
        #[case] name: &str,
        #[case] message: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(FaultValue::error(name, message).display(), expected);
    }

    #[rstest]
    #[case("[object Object]", true)]
    #[case("[object Error]", true)]
    #[case("[object ]", false)]
    #[case("[object two words]", false)]
    #[case("TypeError: oops", false)]
    fn generic_display_detection(#[case] display: &str, #[case] generic: bool) {
        let value = FaultValue::text("").with_display(display);
        assert_eq!(value.has_generic_display(), generic);
    }

    #[test]
    fn object_values_have_generic_display() {
        let value = FaultValue::object(Some("TypeError".into()), None);
        assert!(value.has_generic_display());
        assert_eq!(value.name(), Some("TypeError"));
    }

    #[test]
    fn rust_error_chain_becomes_stack() {
        let value = FaultValue::from_error(&Outer(Inner));
        assert_eq!(value.display(), "request failed");
        assert_eq!(value.message(), Some("request failed"));
        assert_eq!(
            value.stack(),
            Some("request failed\n    caused by: connection reset")
        );
    }

    #[test]
    fn rust_error_without_source_has_no_stack() {
        assert_eq!(FaultValue::from_error(&Inner).stack(), None);
    }

    #[test]
    fn panic_payloads_are_stringified() {
        let static_payload: Box<dyn Any + Send> = Box::new("boom");
        let owned_payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        let opaque_payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(FaultValue::from_panic_payload(&*static_payload).display(), "boom");
        assert_eq!(
            FaultValue::from_panic_payload(&*owned_payload).display(),
            "owned boom"
        );
        assert_eq!(
            FaultValue::from_panic_payload(&*opaque_payload).display(),
            "Box<dyn Any>"
        );
    }

    #[test]
    fn fault_value_prefers_error_over_cause() {
        let event = FaultEvent::new(FaultKind::Error)
            .with_error(FaultValue::text("primary"))
            .with_cause(FaultValue::text("secondary"));
        assert_eq!(event.fault_value().map(FaultValue::display), Some("primary"));

        let rejection = FaultEvent::rejection(FaultValue::text("reason"));
        assert_eq!(rejection.fault_value().map(FaultValue::display), Some("reason"));
    }
}
