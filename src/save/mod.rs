//! Save module — the one operation this crate exists for.
//!
//! Every call is independent. Two saves to the same name race with "last
//! write wins"; two auto-named saves within the same second share a name
//! and overwrite each other.

pub mod filename;
pub mod operation;
pub mod types;

pub use filename::{
    ensure_txt_extension, resolve_filename, sanitize_filename, timestamp_filename,
    validate_filename, FALLBACK_FILENAME, TXT_EXTENSION,
};
pub use operation::{save, save_text, try_save};
pub use types::{SaveErrorKind, SaveRequest, SaveResult};
