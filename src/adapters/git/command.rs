//! Bounded `git` subprocess runner.
//!
//! Every invocation has a wall-clock timeout and a cap on captured output.
//! The child is killed when either bound is hit. Nothing is retried.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Maximum git execution time before kill.
pub const GIT_TIMEOUT_SECS: u64 = 120;
/// Maximum captured output per stream (8 MB).
pub const MAX_OUTPUT_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GitFailure {
    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("i/o error talking to git: {0}")]
    Io(#[source] std::io::Error),
    #[error("timed out after {}s and was killed", .0.as_secs())]
    TimedOut(Duration),
    #[error("output exceeded {} bytes and was killed", MAX_OUTPUT_BYTES)]
    OutputTooLarge,
    #[error("exited with {status}{}", stderr_suffix(.stderr))]
    Exit { status: ExitStatus, stderr: String },
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Runs `git <args>` (optionally inside `cwd`) under the given bounds.
pub async fn run_git(
    args: &[String],
    cwd: Option<&Path>,
    timeout: Duration,
    max_output: usize,
) -> Result<GitOutput, GitFailure> {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(GitFailure::Spawn)?;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let run = async {
        let (out, err) = tokio::join!(
            read_capped(stdout, max_output),
            read_capped(stderr, max_output)
        );
        let (out, err) = (out.map_err(GitFailure::Io)?, err.map_err(GitFailure::Io)?);
        if out.len() > max_output || err.len() > max_output {
            let _ = child.start_kill();
            return Err(GitFailure::OutputTooLarge);
        }
        let status = child.wait().await.map_err(GitFailure::Io)?;
        Ok((status, out, err))
    };

    // On timeout the child is dropped on return and kill_on_drop reaps it.
    let (status, out, err) = tokio::time::timeout(timeout, run)
        .await
        .map_err(|_| GitFailure::TimedOut(timeout))??;

    let stdout = String::from_utf8_lossy(&out).into_owned();
    let stderr = String::from_utf8_lossy(&err).into_owned();
    if !status.success() {
        return Err(GitFailure::Exit { status, stderr });
    }
    Ok(GitOutput { stdout, stderr })
}

async fn read_capped<R>(pipe: Option<R>, max_output: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(pipe) = pipe {
        // One byte past the cap is enough to know it was exceeded.
        pipe.take(max_output as u64 + 1).read_to_end(&mut buf).await?;
    }
    Ok(buf)
}
