//! MCP surface: the tool catalog and call dispatch.
//!
//! AssetServer implements rmcp's `ServerHandler`:
//!   tools/list -> preflight, then one `Tool` per catalog entry
//!   tools/call -> dispatch(name, arguments) -> CallToolResult
//!
//! Every per-call failure becomes an error-flagged `CallToolResult`; the
//! handler itself never returns a protocol error for a call.

mod transport;

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};

use crate::error::ToolError;
use crate::gcloud::{self, CommandRunner, Payload};
use crate::ops::schema::{JsonObject, Violation, input_schema};
use crate::ops::{AssetRequest, Operation};

const INSTRUCTIONS: &str = "Query Google Cloud Asset Inventory through the local gcloud CLI. \
Use get_current_project to discover the default project, list_assets or search_assets to \
find resources, and get_asset_history to inspect changes to one asset.";

/// Composition root for the server: the runner plus the static catalog.
#[derive(Clone)]
pub struct AssetServer {
    runner: Arc<dyn CommandRunner>,
}

impl AssetServer {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// One MCP tool per catalog entry, in catalog order.
    pub fn tools() -> Vec<Tool> {
        Operation::variants()
            .iter()
            .map(|op| {
                let d = op.descriptor();
                Tool::new(d.name, d.description, Arc::new(input_schema(d.params)))
            })
            .collect()
    }

    /// Resolve, validate, run and wrap a single call.
    pub async fn dispatch(&self, name: &str, arguments: Option<&JsonObject>) -> CallToolResult {
        match self.try_dispatch(name, arguments).await {
            Ok(payload) => CallToolResult::success(vec![Content::text(payload.render())]),
            Err(err) => {
                tracing::warn!(tool = name, kind = err.kind(), error = %err, "tool call failed");
                CallToolResult::error(vec![Content::text(err.to_string())])
            }
        }
    }

    async fn try_dispatch(&self, name: &str, arguments: Option<&JsonObject>) -> Result<Payload, ToolError> {
        let operation =
            Operation::from_name(name).ok_or_else(|| ToolError::UnknownOperation(name.to_string()))?;
        if let Some(raw) = arguments.and_then(|a| a.get(transport::RAW_ARGUMENTS_KEY)) {
            return Err(ToolError::Validation {
                operation,
                violations: vec![Violation::new("arguments", format!("expected an object, got {raw}"))],
            });
        }
        let request = AssetRequest::parse(operation, arguments)
            .map_err(|violations| ToolError::Validation { operation, violations })?;
        gcloud::execute(self.runner.as_ref(), &request).await
    }
}

impl ServerHandler for AssetServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        // gcloud may have been removed or logged out since startup; the
        // catalog is useless without it.
        if let Err(e) = gcloud::verify(self.runner.as_ref()).await {
            tracing::error!(error = %e, "gcloud prerequisites no longer met");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        Ok(ListToolsResult::with_all_items(Self::tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(tool = %request.name, "tool call");
        Ok(self.dispatch(&request.name, request.arguments.as_ref()).await)
    }
}

/// Serve MCP over stdin/stdout until the client disconnects.
pub async fn serve_stdio(server: AssetServer) -> Result<()> {
    let service = server
        .serve((transport::normalized_stdin(), tokio::io::stdout()))
        .await
        .context("failed to initialize MCP stdio transport")?;
    service
        .waiting()
        .await
        .context("MCP service terminated abnormally")?;
    Ok(())
}
