//! Runs the external validator and drains its output.
//!
//! Standard output, standard error and the exit wait are three concurrent
//! activities joined before returning. A validator that fills one pipe while
//! nobody reads it would otherwise block forever.

use crate::constants::STREAM_CHUNK_SIZE;
use crate::error::{EpubCheckError, EpubCheckResult};
use crate::invocation::Invocation;
use bytes::{Bytes, BytesMut};
use std::future::Future;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

type Reader = Box<dyn AsyncRead + Send + Unpin>;

/// Launches validator processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

/// Everything a finished validator process left behind.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit status.
    pub status: ExitStatus,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error.
    pub stderr: Vec<u8>,
}

/// Which pipe a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A piece of validator output delivered as soon as it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: OutputStream,
    pub bytes: Bytes,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ProcessRunner {
    /// Create a runner with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the validator if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Kill the validator when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run the invocation once, buffering both output streams.
    pub async fn run(&self, invocation: &Invocation) -> EpubCheckResult<ProcessOutput> {
        let (status, stdout, stderr) = self.execute(invocation, collect).await?;
        Ok(ProcessOutput {
            status,
            stdout,
            stderr,
        })
    }

    /// Run the invocation once, forwarding output chunks to `sink` as they arrive.
    ///
    /// Nothing is buffered. If the receiving side goes away the streams are
    /// still drained to the end and the data discarded.
    pub async fn run_streaming(
        &self,
        invocation: &Invocation,
        sink: UnboundedSender<OutputChunk>,
    ) -> EpubCheckResult<ExitStatus> {
        let (status, (), ()) = self
            .execute(invocation, |reader: Reader, stream| {
                forward(reader, stream, sink.clone())
            })
            .await?;
        Ok(status)
    }

    async fn execute<T, F, Fut>(
        &self,
        invocation: &Invocation,
        drain: F,
    ) -> EpubCheckResult<(ExitStatus, T, T)>
    where
        F: Fn(Reader, OutputStream) -> Fut,
        Fut: Future<Output = io::Result<T>>,
    {
        let mut child = self.spawn(invocation)?;
        let pid = child.id();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("validator stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("validator stderr was not captured"))?;

        // The deadline covers the drains too: a descendant that inherited the
        // pipes can hold them open after the child itself has exited.
        let interrupted = {
            let finished = async {
                tokio::join!(
                    drain(Box::new(stdout), OutputStream::Stdout),
                    drain(Box::new(stderr), OutputStream::Stderr),
                    child.wait(),
                )
            };

            tokio::select! {
                (stdout, stderr, status) = finished => {
                    let status = status?;
                    tracing::debug!(code = ?status.code(), "validator exited");
                    return Ok((status, stdout?, stderr?));
                }
                _ = self.deadline() => EpubCheckError::Timeout(self.timeout.unwrap_or_default()),
                _ = self.cancel.cancelled() => EpubCheckError::Cancelled,
            }
        };

        tracing::warn!(?pid, "{}, killing validator", interrupted);
        terminate(&mut child, pid).await;
        Err(interrupted)
    }

    fn spawn(&self, invocation: &Invocation) -> EpubCheckResult<Child> {
        tracing::debug!(command = %invocation, "spawning validator");
        let mut command = Command::new(invocation.program());
        command
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so a timeout also reaches wrapper-spawned JVMs.
        #[cfg(unix)]
        command.process_group(0);

        command
            .spawn()
            .map_err(|source| EpubCheckError::ProcessStart {
                program: invocation.program().display().to_string(),
                source,
            })
    }

    /// Resolves when the timeout elapses; never without one.
    async fn deadline(&self) {
        match self.timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    }
}

impl ProcessOutput {
    /// Whether the validator exited with status zero.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, `None` when terminated by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Standard error as text.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim_end().to_string()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Kill the validator and everything left in its process group.
///
/// `pid` is taken at spawn time: the child may already have been reaped while
/// a descendant still holds its pipes.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pid {
        // Negative PID addresses the whole process group.
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }

    if let Ok(Some(_)) = child.try_wait() {
        return;
    }
    if let Err(e) = child.kill().await {
        tracing::warn!("failed to kill validator: {}", e);
    }
}

async fn collect(mut reader: Reader, _stream: OutputStream) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

async fn forward(
    mut reader: Reader,
    stream: OutputStream,
    sink: UnboundedSender<OutputChunk>,
) -> io::Result<()> {
    loop {
        let mut buf = BytesMut::with_capacity(STREAM_CHUNK_SIZE);
        if reader.read_buf(&mut buf).await? == 0 {
            return Ok(());
        }
        // A closed sink only means nobody is listening; keep draining.
        let _ = sink.send(OutputChunk {
            stream,
            bytes: buf.freeze(),
        });
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
