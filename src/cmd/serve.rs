//! `serve`: preflight, startup banner, then MCP over stdio.
//!
//! Stdout belongs to the protocol; every human-facing line goes to stderr.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::gcloud::{self, ProcessRunner};
use crate::mcp::{self, AssetServer};

pub fn execute_serve(runner: ProcessRunner) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    rt.block_on(serve(runner))
}

async fn serve(runner: ProcessRunner) -> Result<()> {
    tracing::debug!(gcloud = %runner.binary(), "checking gcloud prerequisites");
    gcloud::verify(&runner).await?;

    let project = gcloud::default_project(&runner).await;
    eprintln!("gcloud-asset-mcp server running on stdio");
    eprintln!("Default project: {}", project.as_deref().unwrap_or("(not set)"));

    mcp::serve_stdio(AssetServer::new(Arc::new(runner))).await?;
    tracing::info!("client disconnected, shutting down");
    Ok(())
}
