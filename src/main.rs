use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod error;
mod gcloud;
mod mcp;
mod ops;
mod utils;

use cmd::ToolsArgs;
use gcloud::{GcloudBinary, ProcessRunner};

/// gcloud-asset-mcp - Cloud Asset Inventory for MCP clients, backed by the gcloud CLI
///
///   gcloud-asset-mcp [serve]        Run the MCP server on stdio (default)
///   gcloud-asset-mcp tools [--json] Print the tool catalog
///
/// Tools:
///   list_assets, search_assets, get_asset_history,
///   get_projects, get_services, get_current_project
///
/// Global flags / env:
///   -v / -vv          Increase verbosity (logs go to stderr)
///   -q / --quiet      Errors only
///   --gcloud CMD      gcloud command line (or GCLOUD_BIN), e.g. "gcloud" or "sh ./wrapper.sh"
///   --timeout SECS    Per-call gcloud time limit (or GCLOUD_TIMEOUT); unlimited by default
///   RUST_LOG          Overrides -v/-q when set
#[derive(Parser, Debug)]
#[command(
    name = "gcloud-asset-mcp",
    version,
    about = "MCP server for Google Cloud Asset Inventory via the gcloud CLI",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// gcloud command line used for every invocation
    #[arg(long, env = "GCLOUD_BIN", default_value = "gcloud", global = true, value_name = "CMD")]
    gcloud: String,

    /// Kill gcloud invocations that run longer than this many seconds
    #[arg(long, env = "GCLOUD_TIMEOUT", global = true, value_name = "SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP server on stdio
    Serve,

    /// Print the tool catalog
    Tools(ToolsArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::init_logging(utils::derive_level(cli.verbose, cli.quiet));

    let binary = match GcloudBinary::parse(&cli.gcloud) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Invalid gcloud command '{}': {e:#}", cli.gcloud);
            std::process::exit(2);
        }
    };
    let timeout = cli.timeout.filter(|s| *s > 0).map(Duration::from_secs);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => cmd::execute_serve(ProcessRunner::new(binary, timeout)),
        Commands::Tools(args) => cmd::execute_tools(args),
    }
}
