//! Startup prerequisites: gcloud must run and have an authenticated account.

use serde_json::Value;
use thiserror::Error;

use super::{CommandRunner, ExecError, GcloudCommand, OutputFormat};

#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("gcloud CLI is not installed or not reachable: {0}")]
    NotInstalled(#[source] ExecError),

    #[error("gcloud is not authenticated, run `gcloud auth login`: {0}")]
    AuthCheckFailed(#[source] ExecError),

    #[error("gcloud is not authenticated, run `gcloud auth login`")]
    NoAccounts,
}

/// Check that gcloud answers `version` and lists at least one credentialed account.
pub async fn verify(runner: &dyn CommandRunner) -> Result<(), PreflightError> {
    runner
        .run(&GcloudCommand::new(["version"]))
        .await
        .and_then(|o| o.into_success())
        .map_err(PreflightError::NotInstalled)?;

    let accounts = runner
        .run(&GcloudCommand::new(["auth", "list"]).format(OutputFormat::Json))
        .await
        .and_then(|o| o.into_success())
        .map_err(PreflightError::AuthCheckFailed)?;

    let parsed: Value = serde_json::from_str(&accounts.stdout)
        .map_err(|e| PreflightError::AuthCheckFailed(ExecError::Parse(e)))?;
    match parsed.as_array() {
        Some(list) if !list.is_empty() => {
            tracing::debug!(accounts = list.len(), "gcloud credentials found");
            Ok(())
        }
        _ => Err(PreflightError::NoAccounts),
    }
}

/// The configured default project, if any. Lookup failures count as "not set".
pub async fn default_project(runner: &dyn CommandRunner) -> Option<String> {
    let output = runner
        .run(&GcloudCommand::new(["config", "get-value", "project"]))
        .await
        .and_then(|o| o.into_success());
    match output {
        Ok(o) => {
            let value = o.stdout.trim();
            (!value.is_empty() && value != "(unset)").then(|| value.to_string())
        }
        Err(e) => {
            tracing::debug!(error = %e, "could not read default project");
            None
        }
    }
}
