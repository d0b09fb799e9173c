//! Logging setup.
//!
//! Log lines always go to stderr: stdout carries MCP frames while serving.
//! `RUST_LOG` wins when set, otherwise `-v`/`-q` pick the level.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub fn derive_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

pub fn init_logging(level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
