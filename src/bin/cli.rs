//! Text Saver CLI - save text from the shell with the same rules as the MCP tool.
//!
//! Usage:
//!   text-saver save "some text"             # timestamped file
//!   text-saver save -f notes "some text"    # notes.txt
//!   echo hi | text-saver save -f notes      # text from stdin
//!   text-saver check-name "../x y"          # show how a name would be handled
//!   text-saver config                       # effective configuration

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use text_saver::save::resolve_filename;
use text_saver::{sanitize_filename, save_text, validate_filename, SaveResult, SaverConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "text-saver")]
#[command(about = "Text Saver - save text to local files", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Storage root directory (overrides config and TEXT_SAVER_ROOT)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save text to a file in the storage root
    Save {
        /// Text to save (read from stdin when omitted)
        text: Option<String>,

        /// File name; '.txt' is appended if missing
        #[arg(short, long)]
        filename: Option<String>,
    },

    /// Show whether a filename is safe and what it would become
    CheckName {
        /// Filename to check
        name: String,
    },

    /// Print the effective configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `false` when the command ran but the save failed.
fn run(cli: Cli) -> Result<bool> {
    let config = SaverConfig::load(cli.config.as_deref(), cli.root.as_deref())
        .context("loading configuration")?;

    match cli.command {
        Commands::Save { text, filename } => {
            let text = match text {
                Some(text) => text,
                None => read_stdin()?,
            };
            let result = save_text(&config, &text, filename.as_deref());
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(matches!(result, SaveResult::Success { .. }))
        }

        Commands::CheckName { name } => {
            let valid = validate_filename(&name);
            println!("Name:      {}", name);
            println!("Valid:     {}", if valid { "yes" } else { "no" });
            if !valid {
                println!("Sanitized: {}", sanitize_filename(&name));
            }
            println!("Saved as:  {}", resolve_filename(Some(&name), Local::now()));
            Ok(true)
        }

        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(true)
        }
    }
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("reading text from stdin (input must be UTF-8)")?;
    Ok(text)
}
