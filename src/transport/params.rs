//! Field collection for form bodies.

use std::fmt;

use super::url_encoding::url_encode;

/// Ordered, duplicate-free collection of form fields.
///
/// Mirrors the small `set` / `to_string` subset of a query-parameter API.
/// Values are stringified on insertion and encoded on output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormParams {
    pairs: Vec<(String, String)>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        let key = key.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Set `key` when `value` is present; absent values are omitted.
    pub fn set_optional<V: fmt::Display>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.set(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for FormParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", url_encode(key), url_encode(value))?;
        }
        Ok(())
    }
}

/// Encode a field mapping, omitting fields whose value is absent.
pub fn encode_fields<K, V, I>(fields: I) -> String
where
    K: Into<String>,
    V: fmt::Display,
    I: IntoIterator<Item = (K, Option<V>)>,
{
    let mut params = FormParams::new();
    for (key, value) in fields {
        params.set_optional(key, value);
    }
    params.to_string()
}
