//! text-saver-mcp — MCP server exposing `save_text` over stdio.
//!
//! Usage:
//!   text-saver-mcp                        # defaults (executable's directory)
//!   text-saver-mcp --root ~/notes         # custom storage root
//!   text-saver-mcp --config saver.toml    # settings from a TOML file
//!
//! Logs go to stderr; set RUST_LOG to adjust verbosity.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use text_saver::mcp::{shutdown_signal, McpServer, SERVER_NAME};
use text_saver::{SaverConfig, Storage};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "text-saver-mcp")]
#[command(about = "MCP server that saves text to local files", long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage root directory (overrides config and TEXT_SAVER_ROOT)
    #[arg(short, long)]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();

    let code = match run(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = ?e, "server failed");
            1
        }
    };
    info!("server shutdown complete");
    std::process::exit(code);
}

async fn run(args: Args) -> Result<()> {
    let config = SaverConfig::load(args.config.as_deref(), args.root.as_deref())?;

    info!(name = SERVER_NAME, transport = "stdio", "starting MCP server");
    info!(root = %config.storage_root.display(), "storage root");
    info!(max_bytes = config.max_text_bytes, "maximum text size");

    Storage::init(&config.storage_root)?;

    let server = McpServer::new(config);
    server.run_stdio(shutdown_signal()).await
}
