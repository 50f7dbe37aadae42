//! `epubcheck` library.
//!
//! Runs the external EPUBCheck validator against a publication and hands back
//! either a typed [`Report`] or the raw XML/XMP/JSON text it produced.

pub mod check;
pub mod commands;
pub mod config;
pub mod constants;
pub mod decode;
pub mod error;
pub mod handlers;
pub mod invocation;
pub mod profile;
pub mod report;
pub mod runner;
pub mod scratch;

#[cfg(test)]
mod test_support;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use check::*;
pub use commands::*;
pub use config::*;
pub use constants::*;
pub use decode::{DateFormat, Decoded, decode, decode_raw, decode_report, decode_report_with};
pub use error::*;
pub use invocation::*;
pub use profile::*;
pub use report::*;
pub use runner::*;
pub use scratch::*;
