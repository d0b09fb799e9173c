//! Per-call failure taxonomy.
//!
//! Every variant is rendered into an error-flagged tool result by the
//! dispatcher; none of them surface as protocol faults.

use thiserror::Error;

use crate::gcloud::ExecError;
use crate::ops::Operation;
use crate::ops::schema::Violation;

#[derive(Debug, Error)]
pub enum ToolError {
    /// The caller named a tool outside the catalog.
    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    /// The argument object did not satisfy the operation's schema.
    #[error("Invalid arguments for {operation}: {}", join_violations(.violations))]
    Validation {
        operation: Operation,
        violations: Vec<Violation>,
    },

    /// gcloud could not be run, exited non-zero, or printed unusable output.
    #[error("{operation} failed: {source}")]
    Execution {
        operation: Operation,
        #[source]
        source: ExecError,
    },
}

impl ToolError {
    pub fn execution(operation: Operation, source: ExecError) -> Self {
        ToolError::Execution { operation, source }
    }

    /// Short machine-friendly label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownOperation(_) => "unknown_operation",
            ToolError::Validation { .. } => "validation",
            ToolError::Execution {
                source: ExecError::Parse(_),
                ..
            } => "parse",
            ToolError::Execution { .. } => "execution",
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
