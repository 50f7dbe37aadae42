//! Publication date parsing.
//!
//! The validator copies the publication date out of the package document, so
//! its shape varies between books. Literals are tried against an ordered list
//! of candidate formats. Strict formats always go first: a lenient format such
//! as the day/month-swapped one would happily reread `2023-05-10` as the 5th
//! of October.

use crate::error::{EpubCheckError, EpubCheckResult};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Format used when re-encoding dates.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A candidate publication date format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateFormat {
    /// `2023-05-10T12:00:00+0000`
    IsoOffset,
    /// `2023-05-10T12:00:00Z`, `2023-05-10T12:00:00.5+02:00`
    Rfc3339,
    /// `2023-05-10`, read as midnight UTC.
    DateOnly,
    /// `2023-10-05T12:00:00+0000` meaning the 10th of May.
    SwappedDayMonth,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DateFormat {
    /// Formats tried when decoding a report.
    pub const DEFAULT: [DateFormat; 4] = [
        Self::IsoOffset,
        Self::Rfc3339,
        Self::DateOnly,
        Self::SwappedDayMonth,
    ];

    /// Pattern reported when nothing matched.
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::IsoOffset => CANONICAL_FORMAT,
            Self::Rfc3339 => "RFC 3339",
            Self::DateOnly => "%Y-%m-%d",
            Self::SwappedDayMonth => "%Y-%d-%mT%H:%M:%S%z",
        }
    }

    /// Strict formats cannot misread a literal meant for another format.
    pub fn is_strict(&self) -> bool {
        !matches!(self, Self::SwappedDayMonth)
    }

    /// Parse `literal`, returning `None` if it does not match.
    pub fn parse(&self, literal: &str) -> Option<DateTime<Utc>> {
        match self {
            Self::IsoOffset | Self::SwappedDayMonth => {
                DateTime::parse_from_str(literal, self.pattern())
                    .ok()
                    .map(|d| d.with_timezone(&Utc))
            }
            Self::Rfc3339 => DateTime::parse_from_rfc3339(literal)
                .ok()
                .map(|d| d.with_timezone(&Utc)),
            Self::DateOnly => NaiveDate::parse_from_str(literal, self.pattern())
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc()),
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Parse a publication date against `formats`.
///
/// Strict formats are tried first, then lenient ones, each group in the order
/// given. Fails with the full list of attempted formats if none matches.
pub fn parse_date(literal: &str, formats: &[DateFormat]) -> EpubCheckResult<DateTime<Utc>> {
    let strict = formats.iter().filter(|f| f.is_strict());
    let lenient = formats.iter().filter(|f| !f.is_strict());

    strict
        .chain(lenient)
        .find_map(|format| format.parse(literal))
        .ok_or_else(|| EpubCheckError::UnrecognizedDateFormat {
            expected: formats.iter().map(|f| f.pattern().to_string()).collect(),
            received: literal.to_string(),
        })
}

/// Render a date in [`CANONICAL_FORMAT`].
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(CANONICAL_FORMAT).to_string()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
