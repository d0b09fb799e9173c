//! Subprocess execution.
//!
//! `CommandRunner` is the seam between command construction and the child
//! process so the dispatcher can be exercised without a real gcloud.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use shell_words::split as shell_split;
use thiserror::Error;
use tokio::process::Command;

use super::GcloudCommand;

/// Raw captured result of one child process.
#[derive(Clone, Debug)]
pub struct ExecOutput {
    pub success: bool,
    /// Human form of the exit status, e.g. `exit status: 1`.
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

#[cfg(test)]
impl ExecOutput {
    /// Canned output for fake runners.
    pub fn new(success: bool, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            success,
            status: if success {
                "exit status: 0".into()
            } else {
                "exit status: 1".into()
            },
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

impl ExecOutput {
    /// Turn a failed exit into `ExecError::Exit`.
    pub fn into_success(self) -> Result<Self, ExecError> {
        if self.success {
            Ok(self)
        } else {
            Err(ExecError::Exit {
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("gcloud exited with {status}{}", stderr_suffix(.stderr))]
    Exit { status: String, stderr: String },

    #[error("gcloud did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("gcloud output is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion, capturing both streams.
    async fn run(&self, command: &GcloudCommand) -> Result<ExecOutput, ExecError>;
}

/// The gcloud executable, possibly with leading arguments
/// (e.g. `sh /opt/wrappers/gcloud.sh`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GcloudBinary {
    pub program: String,
    pub args: Vec<String>,
}

impl GcloudBinary {
    /// Shell-split a user supplied command line.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            bail!("gcloud command is empty");
        }
        let mut parts = shell_split(trimmed)
            .with_context(|| format!("failed to parse gcloud command line: {trimmed}"))?
            .into_iter();
        let Some(program) = parts.next().filter(|p| !p.is_empty()) else {
            bail!("empty program name in gcloud command line");
        };
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl Default for GcloudBinary {
    fn default() -> Self {
        Self {
            program: super::PROGRAM.to_string(),
            args: Vec::new(),
        }
    }
}

impl fmt::Display for GcloudBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        f.write_str(&shell_words::join(tokens))
    }
}

/// Runs commands as real child processes via `tokio::process`.
#[derive(Clone, Debug, Default)]
pub struct ProcessRunner {
    binary: GcloudBinary,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(binary: GcloudBinary, timeout: Option<Duration>) -> Self {
        Self { binary, timeout }
    }

    pub fn binary(&self) -> &GcloudBinary {
        &self.binary
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &GcloudCommand) -> Result<ExecOutput, ExecError> {
        let mut child = Command::new(&self.binary.program);
        child
            .args(&self.binary.args)
            .args(command.args())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let pending = child.output();
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| ExecError::TimedOut(limit))?,
            None => pending.await,
        };
        let output = result.map_err(|source| ExecError::Spawn {
            program: self.binary.program.clone(),
            source,
        })?;

        Ok(ExecOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
