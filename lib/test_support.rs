//! Fake validators for tests.
//!
//! Scripts are run through `/bin/sh` rather than executed directly so that
//! writing and launching them from parallel tests cannot hit `ETXTBSY`.

use crate::config::{CheckerConfig, OutputDestination, ValidatorCommand};
use std::path::Path;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// A complete report as emitted by the validator for a small EPUB 3 book.
pub(crate) const SAMPLE_REPORT: &str = r#"{
  "messages" : [ {
    "ID" : "RSC-005",
    "severity" : "ERROR",
    "message" : "Error while parsing file: element \"foo\" not allowed here",
    "additionalLocations" : 0,
    "locations" : [ {
      "path" : "EPUB/chapter1.xhtml",
      "line" : 12,
      "column" : 9,
      "context" : null
    } ],
    "suggestion" : null
  }, {
    "ID" : "ACC-009",
    "severity" : "USAGE",
    "message" : "Consider adding an accessibility summary",
    "locations" : [ ]
  } ],
  "customMessageFileName" : null,
  "checker" : {
    "path" : "/books/sample.epub",
    "filename" : "sample.epub",
    "checkerVersion" : "5.1.0",
    "checkDate" : "10-05-2023 12:00:00",
    "elapsedTime" : 412,
    "nFatal" : 0,
    "nError" : 1,
    "nWarning" : 0,
    "nUsage" : 1
  },
  "publication" : {
    "publisher" : "Example Press",
    "title" : "Sample Book",
    "creator" : [ "Ada Author" ],
    "date" : "2023-05-10T12:00:00+0000",
    "subject" : [ "Fiction" ],
    "description" : "A sample publication",
    "identifier" : "urn:uuid:5f1c2d2e-4f6a-4b1e-9c1d-2a3b4c5d6e7f",
    "language" : "en",
    "nSpines" : 2,
    "checkSum" : 123456789,
    "renditionLayout" : "reflowable",
    "renditionOrientation" : "auto",
    "renditionSpread" : "auto",
    "ePubVersion" : "3.0",
    "isScripted" : false,
    "hasFixedFormat" : false,
    "isBackwardCompatible" : true,
    "hasAudio" : false,
    "hasVideo" : false,
    "charsCount" : 5120,
    "embeddedFonts" : [ ],
    "refFonts" : [ "Georgia" ],
    "hasEncryption" : false,
    "hasSignatures" : false,
    "contributors" : [ ]
  },
  "items" : [ {
    "id" : "chapter1",
    "fileName" : "EPUB/chapter1.xhtml",
    "media_type" : "application/xhtml+xml",
    "compressedSize" : 1024,
    "uncompressedSize" : 4096,
    "compressionMethod" : "Deflated",
    "checkSum" : "d41d8cd98f00b204e9800998ecf8427e",
    "isSpineItem" : true,
    "spineIndex" : 1,
    "isLinear" : true,
    "isFixedFormat" : null,
    "isScripted" : false,
    "renditionLayout" : null,
    "renditionOrientation" : null,
    "renditionSpread" : null,
    "referencedItems" : [ "EPUB/style.css" ]
  }, {
    "id" : "css",
    "fileName" : "EPUB/style.css",
    "media_type" : "text/css",
    "compressedSize" : 200,
    "uncompressedSize" : 200,
    "compressionMethod" : "Stored",
    "checkSum" : "9e107d9d372bb6826bd81d3542a419d6",
    "isSpineItem" : false,
    "isLinear" : false,
    "isScripted" : false,
    "referencedItems" : [ ]
  } ]
}"#;

/// A minimal assessment XML document.
pub(crate) const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<jhove xmlns="http://schema.openpreservation.org/ois/xml/ns/jhove" name="epubcheck" release="5.1.0">
  <repInfo uri="sample.epub"><status>Well-formed</status></repInfo>
</jhove>"#;

/// Emulates the validator: writes `payload` to the last argument, or to stdout for `-`.
pub(crate) const WRITE_PAYLOAD: &str = r#"for dest; do :; done
if [ "$dest" = "-" ]; then
  cat "$PAYLOAD"
else
  cat "$PAYLOAD" > "$dest"
fi"#;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Write a shell script into `dir` and return a command that runs it.
pub(crate) fn script(dir: &Path, name: &str, body: &str) -> ValidatorCommand {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    ValidatorCommand::executable("/bin/sh").with_leading_args([path])
}

/// A fake validator that emits `payload` wherever it is asked to.
///
/// `prelude` runs before the payload is written, `epilogue` after.
pub(crate) fn emitting_validator(
    dir: &Path,
    name: &str,
    payload: &str,
    prelude: &str,
    epilogue: &str,
) -> ValidatorCommand {
    let payload_path = dir.join(format!("{}.payload", name));
    std::fs::write(&payload_path, payload).unwrap();
    let body = format!(
        "PAYLOAD='{}'\n{}\n{}\n{}",
        payload_path.display(),
        prelude,
        WRITE_PAYLOAD,
        epilogue
    );
    script(dir, name, &body)
}

/// Config that runs `command` with scratch files under `scratch`.
pub(crate) fn config(
    command: ValidatorCommand,
    scratch: &Path,
    destination: OutputDestination,
) -> CheckerConfig {
    CheckerConfig {
        scratch_dir: scratch.to_path_buf(),
        destination,
        ..CheckerConfig::new(command)
    }
}

/// Number of entries left in `dir`.
pub(crate) fn entries(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}
