//! `epubcheck-rs` validates EPUB publications with EPUBCheck.

use clap::Parser;
use colored::Colorize;
use epubcheck::{Cli, EpubCheckError, EpubCheckResult, handlers};
use tracing_subscriber::EnvFilter;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    // Only log when RUST_LOG is set.
    init_tracing();

    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    }
}

/// Print an error with appropriate formatting based on error type.
fn print_error(e: &EpubCheckError) {
    println!();
    match e {
        EpubCheckError::ProcessStart { program, source } => {
            println!(
                "  {} Could not start the validator",
                "error".bright_red().bold()
            );
            println!();
            println!("    {}: {}", "Program".dimmed(), program);
            println!("    {}: {}", "Cause".dimmed(), source);
            println!();
            println!(
                "    {}: Install Java and EPUBCheck, or set {} to an epubcheck executable",
                "hint".bright_blue().bold(),
                "EPUBCHECK_BIN".bright_white()
            );
        }
        EpubCheckError::ConfigParse(err) => {
            println!("  {} Invalid config file", "error".bright_red().bold());
            println!();
            for line in err.to_string().lines() {
                println!("    {}", line);
            }
        }
        EpubCheckError::Cancelled => {
            println!("  {} Validation cancelled", "✗".bright_red());
        }
        _ => {
            let msg = e.to_string();
            match msg.split_once(": ") {
                Some((prefix, rest)) if prefix.len() < 40 => {
                    println!(
                        "  {} {}",
                        format!("error[{}]", prefix.to_lowercase()).bright_red().bold(),
                        rest.dimmed()
                    );
                }
                _ => println!("  {} {}", "error".bright_red().bold(), msg),
            }
            if let Some(stderr) = e.stderr() {
                println!();
                for line in stderr.lines() {
                    println!("    {}", line.dimmed());
                }
            }
        }
    }
    println!();
}

/// Initialize tracing. Only enables logging when RUST_LOG is set.
fn init_tracing() {
    let rust_log_set = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.is_empty())
        .is_some();

    if !rust_log_set {
        return;
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> EpubCheckResult<bool> {
    let cli = Cli::parse();
    handlers::check_files(cli).await
}
