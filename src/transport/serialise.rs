//! Serialisation of report records into form bodies.

use super::params::encode_fields;
use crate::record::ReportRecord;

/// Media type of every report body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Serialise a record to `application/x-www-form-urlencoded`.
///
/// Emits `type` followed by whichever of `message`, `stack`, `url`,
/// `referrer` and `userAgent` are present.
pub fn serialise_record(record: &ReportRecord) -> String {
    encode_fields(record.fields())
}
