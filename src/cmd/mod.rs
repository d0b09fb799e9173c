/*!
Subcommand entry points.

  serve  (default) preflight gcloud, then run the MCP server on stdio
  tools            print the tool catalog without touching gcloud

Each module exposes one `execute_*` function returning `anyhow::Result<()>`;
argument structs derive `clap::Args`.
*/

pub mod serve;
pub mod tools;

pub use serve::execute_serve;
pub use tools::{ToolsArgs, execute_tools};
