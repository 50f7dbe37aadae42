//! Validation profiles and output kinds understood by the external validator.

use crate::constants::{JSON_OUTPUT_FLAG, XML_OUTPUT_FLAG, XMP_OUTPUT_FLAG};
use crate::error::{EpubCheckError, EpubCheckResult};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Rule set the validator checks the publication against.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ValidationProfile {
    /// The default validation profile.
    #[default]
    Default,
    /// EPUB Dictionaries and Glossaries.
    Dict,
    /// EDUPUB profile.
    Edupub,
    /// EPUB Indexes.
    Idx,
    /// EPUB Previews.
    Preview,
}

/// Report format requested from the validator.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    /// Assessment XML document.
    #[value(name = "xml")]
    StructuredXml,
    /// Assessment XMP metadata document.
    #[value(name = "xmp")]
    XmpMetadata,
    /// Assessment JSON document, decodable into a [`Report`](crate::Report).
    #[default]
    #[value(name = "json")]
    JsonReport,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ValidationProfile {
    /// All profiles, in declaration order.
    pub const ALL: [ValidationProfile; 5] = [
        Self::Default,
        Self::Dict,
        Self::Edupub,
        Self::Idx,
        Self::Preview,
    ];

    /// Token passed after `--profile`.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Dict => "dict",
            Self::Edupub => "edupub",
            Self::Idx => "idx",
            Self::Preview => "preview",
        }
    }
}

impl OutputKind {
    /// All output kinds, in declaration order.
    pub const ALL: [OutputKind; 3] = [Self::StructuredXml, Self::XmpMetadata, Self::JsonReport];

    /// File extension used for scratch files of this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::StructuredXml => "xml",
            Self::XmpMetadata => "xmp",
            Self::JsonReport => "json",
        }
    }

    /// Flag that selects this kind on the validator command line.
    pub fn flag(&self) -> &'static str {
        match self {
            Self::StructuredXml => XML_OUTPUT_FLAG,
            Self::XmpMetadata => XMP_OUTPUT_FLAG,
            Self::JsonReport => JSON_OUTPUT_FLAG,
        }
    }

    /// Whether payloads of this kind decode into a typed report.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::JsonReport)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for ValidationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ValidationProfile {
    type Err = EpubCheckError;

    fn from_str(s: &str) -> EpubCheckResult<Self> {
        Self::ALL
            .into_iter()
            .find(|profile| profile.token() == s)
            .ok_or_else(|| EpubCheckError::Config(format!("unknown validation profile '{}'", s)))
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputKind {
    type Err = EpubCheckError;

    fn from_str(s: &str) -> EpubCheckResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension() == s)
            .ok_or_else(|| EpubCheckError::Config(format!("unknown output kind '{}'", s)))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
