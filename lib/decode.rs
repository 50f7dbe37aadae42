//! Turns validator output into typed values.
//!
//! JSON reports are decoded section by section so a failure names the field
//! that caused it. A report is either decoded completely or not at all.

mod date;


use crate::error::{EpubCheckError, EpubCheckResult};
use crate::profile::OutputKind;
use crate::report::{Checker, Item, Message, Publication, Report};
use serde::de::{DeserializeOwned, Error as _};
use serde_json::{Map, Value};

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use date::{CANONICAL_FORMAT, DateFormat, format_date, parse_date};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Decoded validator output.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A typed JSON report.
    Report(Box<Report>),
    /// XML or XMP text, passed through untouched.
    Raw(String),
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Decode `payload` according to `kind`.
pub fn decode(payload: &[u8], kind: OutputKind) -> EpubCheckResult<Decoded> {
    if kind.is_structured() {
        decode_report(payload).map(|report| Decoded::Report(Box::new(report)))
    } else {
        decode_raw(payload.to_vec(), kind).map(Decoded::Raw)
    }
}

/// Return the payload as text. Empty output is an error.
pub fn decode_raw(payload: Vec<u8>, kind: OutputKind) -> EpubCheckResult<String> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Err(EpubCheckError::EmptyOutput { kind });
    }
    Ok(String::from_utf8(payload)?)
}

/// Decode a JSON report.
pub fn decode_report(payload: &[u8]) -> EpubCheckResult<Report> {
    decode_report_with(payload, &DateFormat::DEFAULT)
}

/// Decode a JSON report, trying `date_formats` for the publication date.
pub fn decode_report_with(payload: &[u8], date_formats: &[DateFormat]) -> EpubCheckResult<Report> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Err(EpubCheckError::EmptyOutput {
            kind: OutputKind::JsonReport,
        });
    }

    let mut root: Map<String, Value> =
        serde_json::from_slice(payload).map_err(|e| EpubCheckError::decode("$", e))?;

    let messages = decode_list::<Message>(&mut root, "messages")?;
    let custom_message_file_name = decode_optional::<String>(&mut root, "customMessageFileName")?;
    let checker = decode_field::<Checker>(&mut root, "checker")?;
    let publication = decode_publication(&mut root, date_formats)?;
    let items = decode_list::<Item>(&mut root, "items")?;

    tracing::trace!(
        messages = messages.len(),
        items = items.len(),
        "decoded report"
    );

    Ok(Report {
        messages,
        custom_message_file_name,
        checker,
        publication,
        items,
    })
}

fn take(root: &mut Map<String, Value>, key: &'static str) -> EpubCheckResult<Value> {
    root.remove(key)
        .ok_or_else(|| EpubCheckError::decode(key, serde_json::Error::missing_field(key)))
}

fn decode_field<T: DeserializeOwned>(
    root: &mut Map<String, Value>,
    key: &'static str,
) -> EpubCheckResult<T> {
    let value = take(root, key)?;
    serde_json::from_value(value).map_err(|e| EpubCheckError::decode(key, e))
}

fn decode_optional<T: DeserializeOwned>(
    root: &mut Map<String, Value>,
    key: &str,
) -> EpubCheckResult<Option<T>> {
    match root.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| EpubCheckError::decode(key, e)),
    }
}

fn decode_list<T: DeserializeOwned>(
    root: &mut Map<String, Value>,
    key: &'static str,
) -> EpubCheckResult<Vec<T>> {
    let entries: Vec<Value> = decode_field(root, key)?;
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry)
                .map_err(|e| EpubCheckError::decode(format!("{}[{}]", key, index), e))
        })
        .collect()
}

/// Decode the publication, parsing its date with typed errors first.
fn decode_publication(
    root: &mut Map<String, Value>,
    date_formats: &[DateFormat],
) -> EpubCheckResult<Publication> {
    let mut publication: Map<String, Value> = decode_field(root, "publication")?;

    let literal: String = match publication.remove("date") {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| EpubCheckError::decode("publication.date", e))?,
        None => {
            return Err(EpubCheckError::decode(
                "publication.date",
                serde_json::Error::missing_field("date"),
            ));
        }
    };
    let date = parse_date(&literal, date_formats)?;
    publication.insert("date".into(), Value::String(format_date(&date)));

    serde_json::from_value(Value::Object(publication))
        .map_err(|e| EpubCheckError::decode("publication", e))
}

//--------------------------------------------------------------------------------------------------
// Modules
//--------------------------------------------------------------------------------------------------

/// Serde adapter for [`Publication::date`].
///
/// Serializes in [`CANONICAL_FORMAT`] and accepts every default format.
pub mod publication_date {
    use super::{DateFormat, format_date, parse_date};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_date(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let literal = String::deserialize(deserializer)?;
        parse_date(&literal, &DateFormat::DEFAULT).map_err(serde::de::Error::custom)
    }
}
