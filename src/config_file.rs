//! Reporter settings loaded from an INI file.
//!
//! ```ini
//! [reporter]
//! collector_url = https://collector.example/errors
//! connect_timeout_ms = 2000
//! write_timeout_ms = 10000
//! beacon_capacity = 32
//! beacon = true
//! user_agent = my-app/1.4
//! ```
//!
//! Bytes are decoded with `encoding_rs` (UTF-8 unless another WHATWG label
//! is given) and parsed with `rust-ini`. Apply the result with
//! [`ReporterBuilder::with_settings`](crate::ReporterBuilder::with_settings).

use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;
use std::str::FromStr;

use encoding_rs::Encoding;
use ini::{Ini, Properties};
use log::warn;
use thiserror::Error;

use crate::diagnostics::LOG_TARGET;

/// Section holding the reporter settings.
pub const SECTION: &str = "reporter";

const DEFAULT_ENCODING: &str = "utf-8";

/// Errors raised while loading a settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} doesn't exist")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{0} is an empty file")]
    Empty(String),
    #[error("unknown encoding {0}")]
    UnknownEncoding(String),
    #[error("{path} could not be decoded as {encoding}")]
    Decode { path: String, encoding: &'static str },
    #[error("{path} is invalid: {message}")]
    Invalid { path: String, message: String },
    #[error("{0} has no [reporter] section")]
    MissingSection(String),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

/// Settings read from the `[reporter]` section. Absent keys stay `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReporterSettings {
    pub collector_url: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
    pub beacon_capacity: Option<usize>,
    pub beacon: Option<bool>,
    pub user_agent: Option<String>,
}

/// Load settings from `path`, decoding it as `encoding` (UTF-8 by default).
pub fn load_settings(
    path: impl AsRef<Path>,
    encoding: Option<&str>,
) -> Result<ReporterSettings, ConfigError> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let bytes = read_file_bytes(path, &name)?;
    if bytes.is_empty() {
        return Err(ConfigError::Empty(name));
    }
    let text = decode_with_encoding(&name, &bytes, encoding.unwrap_or(DEFAULT_ENCODING))?;
    parse_settings(&name, &text)
}

fn read_file_bytes(path: &Path, name: &str) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => ConfigError::NotFound(name.to_owned()),
        _ => ConfigError::Io {
            path: name.to_owned(),
            source: err,
        },
    })
}

fn decode_with_encoding(name: &str, bytes: &[u8], label: &str) -> Result<String, ConfigError> {
    let normalized_label = label.trim().to_ascii_lowercase();
    let encoding = Encoding::for_label(normalized_label.as_bytes())
        .ok_or_else(|| ConfigError::UnknownEncoding(label.to_owned()))?;
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(ConfigError::Decode {
            path: name.to_owned(),
            encoding: encoding.name(),
        });
    }
    Ok(decoded.into_owned())
}

/// Parse settings from INI text. `name` labels errors.
pub fn parse_settings(name: &str, text: &str) -> Result<ReporterSettings, ConfigError> {
    let ini = Ini::load_from_str(text).map_err(|err| ConfigError::Invalid {
        path: name.to_owned(),
        message: err.to_string(),
    })?;
    let section = ini
        .section(Some(SECTION))
        .ok_or_else(|| ConfigError::MissingSection(name.to_owned()))?;
    settings_from_section(section)
}

fn settings_from_section(section: &Properties) -> Result<ReporterSettings, ConfigError> {
    let mut settings = ReporterSettings::default();
    for (key, value) in section.iter() {
        let value = value.trim();
        match key {
            "collector_url" => settings.collector_url = Some(value.to_owned()),
            "connect_timeout_ms" => settings.connect_timeout_ms = Some(parse_number(key, value)?),
            "write_timeout_ms" => settings.write_timeout_ms = Some(parse_number(key, value)?),
            "beacon_capacity" => settings.beacon_capacity = Some(parse_number(key, value)?),
            "beacon" => settings.beacon = Some(parse_flag(key, value)?),
            "user_agent" => settings.user_agent = Some(value.to_owned()),
            other => warn!(target: LOG_TARGET, "Ignoring unknown [{SECTION}] key {other:?}"),
        }
    }
    Ok(settings)
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| invalid(key, value))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}
