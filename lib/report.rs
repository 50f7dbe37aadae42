//! Typed representation of the validator's JSON report.
//!
//! Field names follow the report's wire format exactly; a decoded report
//! re-encodes to the same keys and enumeration literals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A decoded JSON report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Diagnostics, in the order the validator emitted them.
    pub messages: Vec<Message>,

    /// Custom message file the validator was run with, if any.
    #[serde(default)]
    pub custom_message_file_name: Option<String>,

    /// Information about the validator run.
    pub checker: Checker,

    /// Publication-level metadata.
    pub publication: Publication,

    /// Manifest items.
    pub items: Vec<Item>,
}

/// Diagnostic severity, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Suppressed,
    Usage,
    Info,
    Warning,
    Error,
    Fatal,
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message identifier, e.g. `RSC-005`.
    #[serde(rename = "ID")]
    pub id: String,
    pub severity: Severity,
    pub message: String,
    /// Locations beyond those listed in `locations`.
    #[serde(default)]
    pub additional_locations: Option<u32>,
    pub locations: Vec<Location>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

/// Where in the publication a diagnostic applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    /// Line number, `-1` when unknown.
    pub line: i64,
    /// Column number, `-1` when unknown.
    pub column: i64,
    #[serde(default)]
    pub context: Option<String>,
}

/// Summary of the validator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checker {
    pub path: String,
    pub filename: String,
    pub checker_version: String,
    /// Check timestamp as printed by the validator.
    pub check_date: String,
    /// Milliseconds.
    pub elapsed_time: u64,
    pub n_fatal: u32,
    pub n_error: u32,
    pub n_warning: u32,
    pub n_usage: u32,
}

/// Publication metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    #[serde(default)]
    pub publisher: Option<String>,
    pub title: String,
    pub creator: Vec<String>,
    /// Publication date, normalized to UTC.
    #[serde(with = "crate::decode::publication_date")]
    pub date: DateTime<Utc>,
    pub subject: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub rights: Option<String>,
    pub identifier: String,
    pub language: String,
    pub n_spines: u32,
    pub check_sum: i64,
    pub rendition_layout: String,
    pub rendition_orientation: String,
    pub rendition_spread: String,
    #[serde(rename = "ePubVersion")]
    pub epub_version: String,
    pub is_scripted: bool,
    pub has_fixed_format: bool,
    pub is_backward_compatible: bool,
    pub has_audio: bool,
    pub has_video: bool,
    pub chars_count: u64,
    pub embedded_fonts: Vec<String>,
    pub ref_fonts: Vec<String>,
    pub has_encryption: bool,
    pub has_signatures: bool,
    pub contributors: Vec<String>,
}

/// A packaged resource of the publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub file_name: String,
    #[serde(rename = "media_type", default)]
    pub media_type: Option<String>,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub compression_method: CompressionMethod,
    pub check_sum: String,
    pub is_spine_item: bool,
    #[serde(default)]
    pub spine_index: Option<u32>,
    pub is_linear: bool,
    #[serde(default)]
    pub is_fixed_format: Option<bool>,
    pub is_scripted: bool,
    #[serde(default)]
    pub rendition_layout: Option<String>,
    #[serde(default)]
    pub rendition_orientation: Option<String>,
    #[serde(default)]
    pub rendition_spread: Option<String>,
    /// Ids of items this item references.
    pub referenced_items: Vec<String>,
}

/// How an item is stored in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressionMethod {
    Deflated,
    Stored,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Report {
    /// Highest severity among the messages.
    pub fn max_severity(&self) -> Option<Severity> {
        self.messages.iter().map(|m| m.severity).max()
    }

    /// Whether any message is an error or fatal error.
    pub fn has_errors(&self) -> bool {
        self.max_severity()
            .is_some_and(|severity| severity >= Severity::Error)
    }

    /// Messages at or above `severity`.
    pub fn messages_at_least(&self, severity: Severity) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.severity >= severity)
    }

    /// Items in the spine, in reading order.
    pub fn spine(&self) -> Vec<&Item> {
        let mut spine: Vec<&Item> = self.items.iter().filter(|i| i.is_spine_item).collect();
        spine.sort_by_key(|i| i.spine_index);
        spine
    }
}

impl Checker {
    /// Count reported by the validator for `severity`.
    ///
    /// The validator only counts fatal, error, warning and usage messages.
    pub fn count(&self, severity: Severity) -> Option<u32> {
        match severity {
            Severity::Fatal => Some(self.n_fatal),
            Severity::Error => Some(self.n_error),
            Severity::Warning => Some(self.n_warning),
            Severity::Usage => Some(self.n_usage),
            Severity::Info | Severity::Suppressed => None,
        }
    }
}

impl Severity {
    /// Literal used in the report.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suppressed => "SUPPRESSED",
            Self::Usage => "USAGE",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deflated => write!(f, "Deflated"),
            Self::Stored => write!(f, "Stored"),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if self.line >= 0 {
            write!(f, ":{}", self.line)?;
            if self.column >= 0 {
                write!(f, ":{}", self.column)?;
            }
        }
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
