//! Per-file validation entry point.
//!
//! [`EpubCheck`] ties together invocation building, process running and
//! decoding. Every call shape runs the validator exactly once through the same
//! [`ProcessRunner`]; they only differ in how the result reaches the caller.

use crate::config::{CheckerConfig, ExitPolicy, OutputDestination};
use crate::decode::{decode_raw, decode_report};
use crate::error::{EpubCheckError, EpubCheckResult};
use crate::invocation::Invocation;
use crate::profile::{OutputKind, ValidationProfile};
use crate::report::Report;
use crate::runner::{OutputChunk, ProcessOutput, ProcessRunner};
use crate::scratch::ScratchFile;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;


//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Validates one publication with one profile.
#[derive(Debug, Clone)]
pub struct EpubCheck {
    source: PathBuf,
    profile: ValidationProfile,
    config: Arc<CheckerConfig>,
    cancel: CancellationToken,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl EpubCheck {
    /// Validate `source` against `profile` with the default configuration.
    pub fn new(source: impl Into<PathBuf>, profile: ValidationProfile) -> Self {
        Self {
            source: source.into(),
            profile,
            config: Arc::new(CheckerConfig::default()),
            cancel: CancellationToken::new(),
        }
    }

    /// Use `config` instead of the defaults.
    pub fn with_config(mut self, config: impl Into<Arc<CheckerConfig>>) -> Self {
        self.config = config.into();
        self
    }

    /// Kill any running validator when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn profile(&self) -> ValidationProfile {
        self.profile
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Validate and decode the JSON report.
    pub async fn validate(&self) -> EpubCheckResult<Report> {
        let payload = self.produce(OutputKind::JsonReport).await?;
        decode_report(&payload)
    }

    /// Validate and return the report for `kind` as text.
    pub async fn validate_raw(&self, kind: OutputKind) -> EpubCheckResult<String> {
        let payload = self.produce(kind).await?;
        decode_raw(payload, kind)
    }

    /// Like [`validate`](Self::validate), delivering the result to `completion`.
    ///
    /// Returns immediately. `completion` runs exactly once, including when the
    /// worker panics. Outside a tokio runtime the call is driven on its own thread.
    pub fn validate_with<F>(&self, completion: F)
    where
        F: FnOnce(EpubCheckResult<Report>) + Send + 'static,
    {
        let check = self.clone();
        dispatch(async move { check.validate().await }, completion);
    }

    /// Like [`validate_raw`](Self::validate_raw), delivering the result to `completion`.
    pub fn validate_raw_with<F>(&self, kind: OutputKind, completion: F)
    where
        F: FnOnce(EpubCheckResult<String>) + Send + 'static,
    {
        let check = self.clone();
        dispatch(async move { check.validate_raw(kind).await }, completion);
    }

    /// Run the validator with the report on standard output, forwarding output
    /// chunks to `sink` as they arrive.
    pub async fn stream(
        &self,
        kind: OutputKind,
        sink: UnboundedSender<OutputChunk>,
    ) -> EpubCheckResult<ExitStatus> {
        let invocation = self.invocation(kind, None);
        self.runner().run_streaming(&invocation, sink).await
    }

    fn runner(&self) -> ProcessRunner {
        ProcessRunner::new()
            .with_timeout(self.config.timeout)
            .with_cancellation(self.cancel.clone())
    }

    fn invocation(&self, kind: OutputKind, destination: Option<&Path>) -> Invocation {
        Invocation::build(
            &self.config.command,
            &self.source,
            self.profile,
            kind,
            destination,
        )
    }

    /// Run the validator and return the raw payload for `kind`.
    async fn produce(&self, kind: OutputKind) -> EpubCheckResult<Vec<u8>> {
        match self.config.destination {
            OutputDestination::Stdout => {
                let output = self.runner().run(&self.invocation(kind, None)).await?;
                self.settle(&output, &output.stdout)?;
                Ok(output.stdout)
            }
            OutputDestination::TempFile => {
                // Dropping the guard on any early return removes the file.
                let scratch = ScratchFile::new(&self.config.scratch_dir, kind).await?;
                let invocation = self.invocation(kind, Some(scratch.path()));
                let output = self.runner().run(&invocation).await?;
                log_chatter(&output.stdout);

                let payload = scratch.read_and_remove().await?;
                self.settle(&output, &payload)?;
                Ok(payload)
            }
        }
    }

    /// Log stderr and apply the exit policy.
    fn settle(&self, output: &ProcessOutput, payload: &[u8]) -> EpubCheckResult<()> {
        let stderr = output.stderr_text();
        if !stderr.is_empty() {
            tracing::warn!(source = %self.source.display(), "validator stderr: {}", stderr);
        }

        if output.success() {
            return Ok(());
        }

        let produced = !payload.iter().all(u8::is_ascii_whitespace);
        match self.config.exit_policy {
            ExitPolicy::Lenient if produced => {
                tracing::warn!(
                    source = %self.source.display(),
                    code = ?output.code(),
                    "validator exited non-zero, decoding its output anyway"
                );
                Ok(())
            }
            _ => Err(EpubCheckError::ProcessExit {
                code: output.code(),
                stderr,
            }),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Log what the validator printed while writing its report elsewhere.
fn log_chatter(stdout: &[u8]) {
    for line in String::from_utf8_lossy(stdout).lines() {
        if !line.trim().is_empty() {
            tracing::info!("{}", line);
        }
    }
}

/// Drive `work` in the background and hand its result to `completion` once.
fn dispatch<T, Fut, F>(work: Fut, completion: F)
where
    T: Send + 'static,
    Fut: Future<Output = EpubCheckResult<T>> + Send + 'static,
    F: FnOnce(EpubCheckResult<T>) + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            let task = handle.spawn(work);
            handle.spawn(async move { completion(joined(task.await)) });
        }
        Err(_) => {
            std::thread::spawn(move || {
                let result = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(EpubCheckError::from)
                    .and_then(|runtime| {
                        let task = runtime.spawn(work);
                        joined(runtime.block_on(task))
                    });
                completion(result);
            });
        }
    }
}

fn joined<T>(result: Result<EpubCheckResult<T>, JoinError>) -> EpubCheckResult<T> {
    result.unwrap_or_else(|e| Err(EpubCheckError::TaskFailed(e.to_string())))
}
