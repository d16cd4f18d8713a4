//! Strict form encoding for report bodies.
//!
//! Starts from component-style percent-encoding and applies the corrections
//! `application/x-www-form-urlencoded` needs: `!`, `'`, `(`, `)` and `~` are
//! escaped, spaces become `+`, and the NUL byte passes through unescaped.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Bytes escaped in form values.
///
/// Everything except ASCII alphanumerics, `-`, `_`, `.` and `*`. The NUL
/// byte is deliberately absent so it is emitted literally. Space is in the
/// set but never reaches the encoder: [`url_encode`] maps it to `+` while
/// splitting.
pub(crate) const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*')
    .remove(0);

/// Form-encode a single key or value.
pub fn url_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut first = true;
    for chunk in s.split(' ') {
        if !first {
            result.push('+');
        }
        first = false;
        result.extend(utf8_percent_encode(chunk, FORM_ENCODE_SET));
    }
    result
}
