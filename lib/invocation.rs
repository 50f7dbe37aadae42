//! Builds the command line for one validator call.

use crate::config::ValidatorCommand;
use crate::constants::{FORCE_FLAG, PROFILE_FLAG, QUIET_FLAG, STDOUT_SENTINEL};
use crate::profile::{OutputKind, ValidationProfile};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A fully built validator command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    destination: Option<PathBuf>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Invocation {
    /// Build the invocation for validating `source`.
    ///
    /// With a `destination` the validator writes its report there, overwriting
    /// any existing file; without one it writes to standard output. The source
    /// path is not checked here: a missing file surfaces when the validator runs.
    pub fn build(
        command: &ValidatorCommand,
        source: &Path,
        profile: ValidationProfile,
        kind: OutputKind,
        destination: Option<&Path>,
    ) -> Self {
        let mut args = command.leading_args.clone();
        args.push(source.as_os_str().to_owned());
        args.push(QUIET_FLAG.into());
        if destination.is_some() {
            args.push(FORCE_FLAG.into());
        }
        args.push(PROFILE_FLAG.into());
        args.push(profile.token().into());
        args.push(kind.flag().into());
        match destination {
            Some(path) => args.push(path.as_os_str().to_owned()),
            None => args.push(STDOUT_SENTINEL.into()),
        }

        Self {
            program: command.program.clone(),
            args,
            destination: destination.map(Path::to_path_buf),
        }
    }

    /// Program to launch.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments, in order.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Report destination, `None` when the report goes to standard output.
    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn words(invocation: &Invocation) -> Vec<String> {
        invocation
            .args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_build_to_stdout() {
        let command = ValidatorCommand::java("java", "/opt/epubcheck.jar");
        let invocation = Invocation::build(
            &command,
            Path::new("/books/moby.epub"),
            ValidationProfile::Default,
            OutputKind::JsonReport,
            None,
        );

        assert_eq!(invocation.program(), Path::new("java"));
        assert_eq!(
            words(&invocation),
            vec![
                "-jar",
                "/opt/epubcheck.jar",
                "/books/moby.epub",
                "-q",
                "--profile",
                "default",
                "--json",
                "-"
            ]
        );
        assert!(invocation.destination().is_none());
    }

    #[test]
    fn test_build_to_file_forces_overwrite() {
        let command = ValidatorCommand::executable("epubcheck");
        let invocation = Invocation::build(
            &command,
            Path::new("book.epub"),
            ValidationProfile::Edupub,
            OutputKind::StructuredXml,
            Some(Path::new("/tmp/epubcheck/out.xml")),
        );

        assert_eq!(
            words(&invocation),
            vec![
                "book.epub",
                "-q",
                "-f",
                "--profile",
                "edupub",
                "--out",
                "/tmp/epubcheck/out.xml"
            ]
        );
        assert_eq!(
            invocation.destination(),
            Some(Path::new("/tmp/epubcheck/out.xml"))
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let command = ValidatorCommand::executable("epubcheck");
        let build = || {
            Invocation::build(
                &command,
                Path::new("a.epub"),
                ValidationProfile::Preview,
                OutputKind::XmpMetadata,
                None,
            )
        };
        assert_eq!(build(), build());
        assert!(words(&build()).contains(&"--xmp".to_string()));
    }

    #[test]
    fn test_display() {
        let command = ValidatorCommand::executable("epubcheck");
        let invocation = Invocation::build(
            &command,
            Path::new("a.epub"),
            ValidationProfile::Dict,
            OutputKind::JsonReport,
            None,
        );
        assert_eq!(
            invocation.to_string(),
            "epubcheck a.epub -q --profile dict --json -"
        );
    }
}
