//! CLI command definitions.

use crate::profile::{OutputKind, ValidationProfile};
use clap::Parser;
use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use std::path::PathBuf;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const CLI_EXAMPLES: &str = "\
Examples:
  epubcheck-rs book.epub                    Validate and summarize the report
  epubcheck-rs a.epub b.epub c.epub         Validate several books in parallel
  epubcheck-rs book.epub -p edupub          Check against the EDUPUB profile
  epubcheck-rs book.epub -f xml --raw       Print the assessment XML document
  epubcheck-rs book.epub --stream           Show validator output as it runs
  epubcheck-rs book.epub --strict           Fail on any non-zero validator exit
  epubcheck-rs book.epub --timeout 60       Give up after a minute";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Validate EPUB publications with EPUBCheck.
#[derive(Debug, Parser)]
#[command(name = "epubcheck-rs", author, version, styles = styles())]
#[command(about = "Validate EPUB publications with EPUBCheck", after_help = CLI_EXAMPLES)]
pub struct Cli {
    /// Publications to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Validation profile.
    #[arg(short, long, value_enum, default_value_t = ValidationProfile::Default)]
    pub profile: ValidationProfile,

    /// Report format requested from the validator.
    #[arg(short, long, value_enum, default_value_t = OutputKind::JsonReport)]
    pub format: OutputKind,

    /// Print the report text instead of a summary (implied for xml and xmp).
    #[arg(long)]
    pub raw: bool,

    /// Forward validator output as it is produced.
    #[arg(long, conflicts_with = "raw")]
    pub stream: bool,

    /// Fail when the validator exits non-zero, even if it wrote a report.
    #[arg(long)]
    pub strict: bool,

    /// Read reports from the validator's standard output instead of a scratch file.
    #[arg(long)]
    pub stdout: bool,

    /// Kill the validator after this many seconds (0 disables the limit).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// EPUBCheck jar to run.
    #[arg(long, value_name = "PATH")]
    pub jar: Option<PathBuf>,

    /// Config file to load instead of the default one.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Cli {
    /// Whether report text is printed as-is.
    pub fn prints_raw(&self) -> bool {
        self.raw || !self.format.is_structured()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Help and error colours for clap.
pub fn styles() -> Styles {
    Styles::styled()
        .header(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Blue))),
        )
        .usage(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Blue))),
        )
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["epubcheck-rs", "book.epub"]).unwrap();
        assert_eq!(cli.files, vec![PathBuf::from("book.epub")]);
        assert_eq!(cli.profile, ValidationProfile::Default);
        assert_eq!(cli.format, OutputKind::JsonReport);
        assert!(!cli.prints_raw());
        assert!(!cli.strict && !cli.stdout && !cli.stream);
        assert!(cli.timeout.is_none());
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "epubcheck-rs",
            "a.epub",
            "b.epub",
            "-p",
            "preview",
            "-f",
            "xmp",
            "--strict",
            "--stdout",
            "--timeout",
            "30",
            "--jar",
            "/opt/epubcheck.jar",
            "--config",
            "custom.toml",
        ])
        .unwrap();

        assert_eq!(cli.files.len(), 2);
        assert_eq!(cli.profile, ValidationProfile::Preview);
        assert_eq!(cli.format, OutputKind::XmpMetadata);
        assert!(cli.prints_raw());
        assert!(cli.strict && cli.stdout);
        assert_eq!(cli.timeout, Some(30));
        assert_eq!(cli.jar, Some(PathBuf::from("/opt/epubcheck.jar")));
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Cli::try_parse_from(["epubcheck-rs"]).is_err());
        assert!(Cli::try_parse_from(["epubcheck-rs", "a.epub", "-p", "strict"]).is_err());
        assert!(Cli::try_parse_from(["epubcheck-rs", "a.epub", "-f", "html"]).is_err());
        assert!(Cli::try_parse_from(["epubcheck-rs", "a.epub", "--raw", "--stream"]).is_err());
    }
}
