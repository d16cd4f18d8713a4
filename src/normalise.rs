//! Conversion of raw fault events into [`ReportRecord`] values.
//!
//! Host implementations disagree about where they put the useful text: some
//! repeat the error string in the event message, some prefix it, some leave
//! the event message empty. The rules here pick the most informative single
//! message without duplicating it, and always produce a stack of some sort.

use std::backtrace::Backtrace;
use std::borrow::Cow;

use crate::fault::{FaultEvent, FaultValue};
use crate::host::HostContext;
use crate::record::ReportRecord;

/// Normalise `event` into a report, reading identity fields from `host`.
///
/// Never fails: missing or inconsistent fields degrade to a best-effort
/// record.
pub fn normalise(event: &FaultEvent, host: &dyn HostContext) -> ReportRecord {
    let event = with_legacy_fallback(event, host);
    let value = event.fault_value();
    let error_string = value.map(error_string);
    let message = merge_messages(event.message.as_deref(), error_string.as_deref());
    let stack = derive_stack(&event, value, message.as_deref());

    ReportRecord::new(
        event.kind,
        message,
        Some(stack),
        host.location(),
        host.referrer(),
        host.user_agent(),
    )
}

/// Substitute the host's legacy fault description when the event itself
/// carries neither a message nor an error.
fn with_legacy_fallback<'a>(event: &'a FaultEvent, host: &dyn HostContext) -> Cow<'a, FaultEvent> {
    if event.error.is_some() || event.message.as_deref().is_some_and(|m| !m.is_empty()) {
        return Cow::Borrowed(event);
    }
    let Some(legacy) = host.legacy_fault_description() else {
        return Cow::Borrowed(event);
    };
    let Some(message) = legacy.error_message.filter(|m| !m.is_empty()) else {
        return Cow::Borrowed(event);
    };
    Cow::Owned(FaultEvent {
        kind: event.kind,
        message: Some(message),
        filename: legacy.error_url,
        lineno: legacy.error_line,
        colno: legacy.error_character,
        error: None,
        cause: None,
    })
}

/// Stringify a fault value, replacing the generic object marker with
/// `"<name>: <message>"` (or the bare message) when those are available.
pub(crate) fn error_string(value: &FaultValue) -> String {
    match (value.message(), value.has_generic_display()) {
        (Some(message), true) => match value.name() {
            Some(name) => format!("{name}: {message}"),
            None => message.to_owned(),
        },
        _ => value.display().to_owned(),
    }
}

/// Merge the event message and the error string into one message.
pub(crate) fn merge_messages(
    event_message: Option<&str>,
    error_string: Option<&str>,
) -> Option<String> {
    let Some(event_message) = event_message.filter(|m| !m.is_empty()) else {
        return error_string.map(str::to_owned);
    };
    let Some(error_string) = error_string.filter(|s| !s.is_empty()) else {
        return Some(event_message.to_owned());
    };
    if error_string.contains(event_message) {
        Some(error_string.to_owned())
    } else if event_message.contains(error_string) {
        Some(event_message.to_owned())
    } else {
        Some(format!("{event_message}: {error_string}"))
    }
}

fn derive_stack(event: &FaultEvent, value: Option<&FaultValue>, message: Option<&str>) -> String {
    let native = value
        .and_then(FaultValue::stack)
        .map(|stack| strip_repeated_summary(stack, message))
        .filter(|stack| !stack.is_empty());

    match native {
        Some(stack) => stack.to_owned(),
        None => synthesise_frame(event).unwrap_or_else(capture_reporting_stack),
    }
}

/// Drop the first line of `stack` when the message already contains it.
fn strip_repeated_summary<'a>(stack: &'a str, message: Option<&str>) -> &'a str {
    match (stack.find('\n'), message) {
        (Some(nl), Some(message)) if nl > 0 && message.contains(&stack[..nl]) => &stack[nl + 1..],
        _ => stack,
    }
}

/// Build a single `    at file[:line[:column]]` frame from event location
/// fields.
fn synthesise_frame(event: &FaultEvent) -> Option<String> {
    let filename = event.filename.as_deref().filter(|f| !f.is_empty())?;
    let mut frame = format!("    at {filename}");
    if let Some(line) = event.lineno.filter(|&l| l != 0) {
        frame.push_str(&format!(":{line}"));
        if let Some(column) = event.colno.filter(|&c| c != 0) {
            frame.push_str(&format!(":{column}"));
        }
    }
    Some(frame)
}

/// Trace of the reporting call itself, so the report at least shows where it
/// was raised from.
fn capture_reporting_stack() -> String {
    format!("Reported from\n{}", Backtrace::force_capture())
}
