use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::{AdapterError, Result};

/// Raw result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Process exit code; -1 when the process was terminated by a signal
    pub exit_code: i32,
    /// stdout and stderr merged into one stream. Ordering between the two
    /// streams is not guaranteed; parsers must not rely on it.
    pub combined: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs an external executable and captures its output.
///
/// A trait so that adapter tests can substitute a scripted runner and
/// verify exactly which invocations happened (including none at all).
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Spawn one subprocess and wait for it to finish (or hit `timeout`).
    /// Never retries.
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        working_dir: &Path,
        timeout: Option<Duration>,
    ) -> Result<ToolOutput>;
}

/// Production runner backed by `tokio::process`.
pub struct ProcessRunner;

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        working_dir: &Path,
        timeout: Option<Duration>,
    ) -> Result<ToolOutput> {
        // Validate the working directory up front so a misconfigured tool
        // path surfaces as PathNotFound instead of an opaque spawn error.
        if !working_dir.is_dir() {
            return Err(AdapterError::PathNotFound(working_dir.to_path_buf()));
        }

        tracing::debug!(
            program = %program.display(),
            args = ?args,
            dir = %working_dir.display(),
            "running tool"
        );

        let mut child = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Drain both pipes concurrently while waiting, so a chatty tool
        // cannot deadlock on a full pipe buffer.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_task = tokio::spawn(read_to_string(stdout));
        let err_task = tokio::spawn(read_to_string(stderr));

        let status = match timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    out_task.abort();
                    err_task.abort();
                    tracing::warn!(
                        program = %program.display(),
                        timeout_secs = limit.as_secs(),
                        "tool exceeded timeout, killed"
                    );
                    return Err(AdapterError::Timeout(limit));
                }
            },
            None => child.wait().await?,
        };

        let mut combined = out_task.await.unwrap_or_default();
        combined.push_str(&err_task.await.unwrap_or_default());

        let exit_code = status.code().unwrap_or(-1);
        tracing::debug!(exit_code, bytes = combined.len(), "tool finished");

        Ok(ToolOutput {
            exit_code,
            combined,
        })
    }
}

async fn read_to_string<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut reader) = pipe {
        let _ = reader.read_to_end(&mut buf).await;
    }
    String::from_utf8_lossy(&buf).into_owned()
}
