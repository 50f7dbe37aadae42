//! Scratch output files.
//!
//! Each call that asks the validator to write a report file gets its own
//! uniquely named path. The file is removed after it has been read, and the
//! guard removes it on drop if the call bails out earlier.

use crate::profile::OutputKind;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A scratch file path owned by one validation call.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    removed: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ScratchFile {
    /// Reserve a fresh path in `dir` with the extension of `kind`.
    ///
    /// Creates `dir` if needed; the file itself is left for the validator to create.
    pub async fn new(dir: &Path, kind: OutputKind) -> io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir
            .join(Uuid::new_v4().to_string())
            .with_extension(kind.extension());
        Ok(Self {
            path,
            removed: false,
        })
    }

    /// Path handed to the validator.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file, then delete it.
    ///
    /// A file the validator never created reads as empty. Deletion is
    /// best-effort; the read result is returned either way.
    pub async fn read_and_remove(mut self) -> io::Result<Vec<u8>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        };

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), "failed to remove scratch file: {}", e),
        }
        self.removed = true;

        contents
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), "failed to remove scratch file: {}", e),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
