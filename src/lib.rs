//! # Text Saver
//!
//! Save text to local files from AI agents.
//!
//! Text Saver exposes a single MCP tool, `save_text`, that writes text into
//! one fixed directory. Requested filenames are validated, and unsafe ones
//! are sanitized instead of rejected, so a write can never land outside the
//! storage root.
//!
//! ## Key Features
//!
//! - **Confined**: every file is written directly inside the storage root
//! - **Forgiving**: unsafe names are rewritten, not refused
//! - **Bounded**: text larger than 10 MiB is rejected before anything is written
//! - **Atomic**: files appear fully written or not at all
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use text_saver::{save_text, SaveResult, SaverConfig};
//!
//! let config = SaverConfig::with_root("/tmp/notes");
//! match save_text(&config, "hello", Some("greeting")) {
//!     SaveResult::Success { path, .. } => println!("saved to {}", path.display()),
//!     SaveResult::Failure { message, .. } => eprintln!("{}", message),
//! }
//! ```

pub mod config;
pub mod error;
pub mod mcp;
pub mod save;
pub mod storage;

// Re-exports for convenience
pub use config::{SaverConfig, MAX_TEXT_SIZE};
pub use error::{Result, TextSaverError};
pub use save::{
    sanitize_filename, save, save_text, validate_filename, SaveErrorKind, SaveRequest, SaveResult,
};
pub use storage::Storage;
