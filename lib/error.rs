//! Error types for epubcheck-rs.

use crate::profile::OutputKind;
use std::time::Duration;
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Result type for epubcheck-rs operations.
pub type EpubCheckResult<T> = Result<T, EpubCheckError>;

/// Error type for epubcheck-rs operations.
#[derive(Debug, Error)]
pub enum EpubCheckError {
    /// The validator process could not be started.
    #[error("Failed to start validator `{program}`: {source}")]
    ProcessStart {
        /// Program that was launched.
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The validator exited with a non-zero status.
    #[error("Validator exited with {}", display_code(.code))]
    ProcessExit {
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// A report field failed to decode.
    #[error("Failed to decode `{field}`: {source}")]
    Decode {
        /// Path of the failing field, e.g. `messages[3]`.
        field: String,
        #[source]
        source: serde_json::Error,
    },

    /// The publication date matched none of the candidate formats.
    #[error("Unrecognized date format '{received}', expected one of: {}", .expected.join(", "))]
    UnrecognizedDateFormat {
        /// Formats that were attempted, in order.
        expected: Vec<String>,
        /// The offending literal.
        received: String,
    },

    /// The validator produced no output for the requested kind.
    #[error("Validator produced no {kind} output")]
    EmptyOutput { kind: OutputKind },

    /// Raw output was not valid UTF-8.
    #[error("Validator output is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The call exceeded its deadline and the validator was killed.
    #[error("Validator timed out after {0:?}")]
    Timeout(Duration),

    /// The call was cancelled and the validator was killed.
    #[error("Validation cancelled")]
    Cancelled,

    /// The background task driving a callback-based call failed.
    #[error("Validation task failed: {0}")]
    TaskFailed(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file parse error.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl EpubCheckError {
    /// Build a decode error for the field at `field`.
    pub fn decode(field: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            field: field.into(),
            source,
        }
    }

    /// Captured stderr, if this error carries any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::ProcessExit { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
