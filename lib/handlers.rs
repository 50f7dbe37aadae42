//! Command handler for the `epubcheck-rs` binary.

use crate::check::EpubCheck;
use crate::commands::Cli;
use crate::config::{CheckerConfig, ExitPolicy, OutputDestination, timeout_from_secs};
use crate::error::{EpubCheckError, EpubCheckResult};
use crate::profile::OutputKind;
use crate::report::{Report, Severity};
use crate::runner::{OutputChunk, OutputStream};
use colored::Colorize;
use futures_util::future::join_all;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// What happened to one file.
#[derive(Debug)]
pub enum CheckOutcome {
    /// A decoded report.
    Report(Box<Report>),
    /// Raw report text.
    Raw(String),
    /// The validator's exit status after streaming.
    Streamed(ExitStatus),
    /// The call failed.
    Failed(EpubCheckError),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl CheckOutcome {
    /// Whether the file counts as valid.
    pub fn passed(&self) -> bool {
        match self {
            Self::Report(report) => !report.has_errors(),
            Self::Raw(_) => true,
            Self::Streamed(status) => status.success(),
            Self::Failed(_) => false,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Handlers
//--------------------------------------------------------------------------------------------------

/// Validate every file named on the command line.
///
/// Files run in parallel and results print in command-line order. Returns
/// whether every file passed.
pub async fn check_files(cli: Cli) -> EpubCheckResult<bool> {
    let config = Arc::new(resolve_config(&cli)?);
    tracing::debug!(?config, "resolved configuration");

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n  {} Interrupted, stopping validators", "✗".bright_red());
                cancel.cancel();
            }
        }
    });

    let futures: Vec<_> = cli
        .files
        .iter()
        .map(|file| {
            let check = EpubCheck::new(file, cli.profile)
                .with_config(config.clone())
                .with_cancellation(cancel.clone());
            check_one(check, &cli)
        })
        .collect();
    let outcomes = join_all(futures).await;
    watcher.abort();

    if cancel.is_cancelled() {
        return Err(EpubCheckError::Cancelled);
    }

    for (file, outcome) in cli.files.iter().zip(&outcomes) {
        print_outcome(file, outcome);
    }

    let failed = failed_files(&cli.files, &outcomes);
    if outcomes.len() > 1 {
        print_totals(&failed, outcomes.len());
    }

    Ok(failed.is_empty())
}

/// Build the configuration from the config file, environment and flags.
pub fn resolve_config(cli: &Cli) -> EpubCheckResult<CheckerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = CheckerConfig::from_file(path)?;
            config.apply_env()?;
            config
        }
        None => CheckerConfig::load()?,
    };

    if let Some(jar) = &cli.jar {
        config.command = config.command.override_java(None, Some(jar.clone()));
    }
    if cli.strict {
        config.exit_policy = ExitPolicy::Strict;
    }
    if cli.stdout {
        config.destination = OutputDestination::Stdout;
    }
    if let Some(secs) = cli.timeout {
        config.timeout = timeout_from_secs(secs);
    }

    Ok(config)
}

async fn check_one(check: EpubCheck, cli: &Cli) -> CheckOutcome {
    let result = if cli.stream {
        stream_one(&check, cli.format).await.map(CheckOutcome::Streamed)
    } else if cli.prints_raw() {
        check.validate_raw(cli.format).await.map(CheckOutcome::Raw)
    } else {
        check
            .validate()
            .await
            .map(|report| CheckOutcome::Report(Box::new(report)))
    };

    result.unwrap_or_else(CheckOutcome::Failed)
}

/// Run one file, copying validator output to the terminal as it arrives.
async fn stream_one(check: &EpubCheck, kind: OutputKind) -> EpubCheckResult<ExitStatus> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<OutputChunk>();
    let printer = tokio::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            let written = match chunk.stream {
                OutputStream::Stdout => std::io::stdout().write_all(&chunk.bytes),
                OutputStream::Stderr => std::io::stderr().write_all(&chunk.bytes),
            };
            if let Err(e) = written {
                tracing::warn!("failed to write validator output: {}", e);
            }
        }
    });

    let status = check.stream(kind, tx).await;
    if let Err(e) = printer.await {
        tracing::warn!("output printer failed: {}", e);
    }
    status
}

//--------------------------------------------------------------------------------------------------
// Functions: Output
//--------------------------------------------------------------------------------------------------

fn print_outcome(file: &Path, outcome: &CheckOutcome) {
    let name = file.display().to_string();
    match outcome {
        CheckOutcome::Report(report) => print_report(&name, report),
        CheckOutcome::Raw(text) => {
            println!("{}", text.trim_end());
        }
        CheckOutcome::Streamed(status) => {
            if !status.success() {
                println!();
                println!(
                    "  {} {} {}",
                    "✗".bright_red(),
                    name.bright_cyan(),
                    format!("(exit {})", status.code().unwrap_or(-1)).dimmed()
                );
            }
        }
        CheckOutcome::Failed(e) => {
            println!();
            println!("  {} {}", "✗".bright_red(), name.bright_cyan());
            println!("    {}", e.to_string().bright_red());
            if let Some(stderr) = e.stderr() {
                for line in stderr.lines() {
                    println!("      {}", line.dimmed());
                }
            }
        }
    }
}

fn print_report(name: &str, report: &Report) {
    let checker = &report.checker;
    let counts = format!(
        "{} fatal, {} errors, {} warnings, {} usage",
        checker.n_fatal, checker.n_error, checker.n_warning, checker.n_usage
    );

    println!();
    if report.has_errors() {
        println!(
            "  {} {} {}",
            "✗".bright_red(),
            name.bright_cyan(),
            format!("({})", counts).dimmed()
        );
    } else {
        println!(
            "  {} {} {}",
            "✓".bright_green(),
            name.bright_cyan(),
            format!("({})", counts).dimmed()
        );
    }
    println!(
        "    {}",
        format!(
            "{} · EPUB {} · EPUBCheck {}",
            report.publication.title, report.publication.epub_version, checker.checker_version
        )
        .dimmed()
    );

    for message in report.messages_at_least(Severity::Warning) {
        let label = format!("{}[{}]", message.severity.as_str().to_lowercase(), message.id);
        let label = match message.severity {
            Severity::Fatal | Severity::Error => label.bright_red(),
            _ => label.bright_yellow(),
        };
        match message.locations.first() {
            Some(location) => println!("    {} → {}", label, location),
            None => println!("    {}", label),
        }
        println!("      {}", message.message);
        if let Some(suggestion) = &message.suggestion {
            println!("      {}: {}", "hint".bright_blue().bold(), suggestion);
        }
    }
}

fn print_totals(failed: &[&Path], total: usize) {
    println!();
    let summary = format!("{} of {} publications passed", total - failed.len(), total);
    if failed.is_empty() {
        println!("  {} {}", "✓".bright_green(), summary);
    } else {
        println!("  {} {}", "✗".bright_red(), summary);
        for file in failed {
            println!("    {}", file.display().to_string().dimmed());
        }
    }
    println!();
}

/// Paths of the files that did not pass.
pub fn failed_files<'a>(files: &'a [PathBuf], outcomes: &[CheckOutcome]) -> Vec<&'a Path> {
    files
        .iter()
        .zip(outcomes)
        .filter(|(_, outcome)| !outcome.passed())
        .map(|(file, _)| file.as_path())
        .collect()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorCommand;
    use crate::decode::decode_report;
    use crate::test_support::{SAMPLE_REPORT, emitting_validator};
    use clap::Parser;
    use std::time::Duration;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("epubcheck-rs").chain(args.iter().copied())).unwrap()
    }

    /// Config file that runs `command` with scratch files inside `dir`.
    fn config_file(dir: &TempDir, command: &ValidatorCommand) -> PathBuf {
        let mut words = vec![format!("{:?}", command.program.display().to_string())];
        words.extend(
            command
                .leading_args
                .iter()
                .map(|a| format!("{:?}", a.to_string_lossy())),
        );
        let content = format!(
            "command = [{}]\nscratch_dir = {:?}\n",
            words.join(", "),
            dir.path().join("scratch").display().to_string()
        );
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_flags_override_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = 5\ndestination = \"temp-file\"\n").unwrap();
        let path = path.display().to_string();

        let config = resolve_config(&cli(&["a.epub", "--config", &path])).unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.destination, OutputDestination::TempFile);
        assert_eq!(config.exit_policy, ExitPolicy::Lenient);

        let config = resolve_config(&cli(&[
            "a.epub",
            "--config",
            &path,
            "--strict",
            "--stdout",
            "--timeout",
            "0",
            "--jar",
            "/opt/epubcheck.jar",
        ]))
        .unwrap();
        assert!(config.timeout.is_none());
        assert_eq!(config.destination, OutputDestination::Stdout);
        assert_eq!(config.exit_policy, ExitPolicy::Strict);
        assert_eq!(config.command.leading_args[0], "-jar");
        assert_eq!(config.command.leading_args[1], "/opt/epubcheck.jar");
    }

    #[test]
    fn test_jar_flag_keeps_configured_java() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "java = \"/usr/lib/jvm/17/bin/java\"\njar = \"/opt/old.jar\"\n",
        )
        .unwrap();
        let path = path.display().to_string();

        let config =
            resolve_config(&cli(&["a.epub", "--config", &path, "--jar", "/opt/new.jar"])).unwrap();
        assert_eq!(
            config.command,
            ValidatorCommand::java("/usr/lib/jvm/17/bin/java", "/opt/new.jar")
        );
    }

    #[test]
    fn test_missing_config_file_fails() {
        let err = resolve_config(&cli(&["a.epub", "--config", "/nonexistent/config.toml"]))
            .unwrap_err();
        assert!(matches!(err, EpubCheckError::Io(_)));
    }

    #[test]
    fn test_outcome_passed() {
        let report = decode_report(SAMPLE_REPORT.as_bytes()).unwrap();
        assert!(!CheckOutcome::Report(Box::new(report.clone())).passed());

        let mut clean = report;
        clean.messages.retain(|m| m.severity < Severity::Error);
        assert!(CheckOutcome::Report(Box::new(clean)).passed());

        assert!(CheckOutcome::Raw("<jhove/>".into()).passed());
        assert!(!CheckOutcome::Failed(EpubCheckError::Cancelled).passed());
    }

    #[test]
    fn test_failed_files() {
        let files = vec![PathBuf::from("a.epub"), PathBuf::from("b.epub")];
        let outcomes = vec![
            CheckOutcome::Raw("ok".into()),
            CheckOutcome::Failed(EpubCheckError::Cancelled),
        ];
        assert_eq!(failed_files(&files, &outcomes), vec![Path::new("b.epub")]);
    }

    #[tokio::test]
    async fn test_check_files_reports_errors() {
        let dir = TempDir::new().unwrap();
        let command = emitting_validator(dir.path(), "v.sh", SAMPLE_REPORT, "", "");
        let path = config_file(&dir, &command).display().to_string();

        let passed = check_files(cli(&["a.epub", "b.epub", "--config", &path]))
            .await
            .unwrap();
        assert!(!passed);
    }

    #[tokio::test]
    async fn test_check_files_raw_passes() {
        let dir = TempDir::new().unwrap();
        let command = emitting_validator(dir.path(), "v.sh", SAMPLE_REPORT, "", "");
        let path = config_file(&dir, &command).display().to_string();

        let passed = check_files(cli(&["a.epub", "--raw", "--config", &path]))
            .await
            .unwrap();
        assert!(passed);
    }

    #[tokio::test]
    async fn test_check_files_streams() {
        let dir = TempDir::new().unwrap();
        let command = emitting_validator(dir.path(), "v.sh", SAMPLE_REPORT, "", "exit 1");
        let path = config_file(&dir, &command).display().to_string();

        let passed = check_files(cli(&["a.epub", "--stream", "--config", &path]))
            .await
            .unwrap();
        assert!(!passed);
    }
}
