//! Filename policy — validation, sanitization, extension and timestamps.
//!
//! A supplied name is used as-is only when it is obviously safe. Anything
//! else is rewritten into a safe name rather than rejected.

use chrono::{DateTime, Local};
use std::path::Path;
use tracing::{info, warn};

/// Extension every saved file carries.
pub const TXT_EXTENSION: &str = ".txt";

/// Used when sanitization leaves nothing behind.
pub const FALLBACK_FILENAME: &str = "file.txt";

/// Format of auto-generated names (local time, second resolution).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Characters allowed anywhere after the first position.
fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Matches `^[A-Za-z0-9][A-Za-z0-9_.-]*$`.
fn matches_safe_pattern(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => chars.all(is_safe_char),
        _ => false,
    }
}

/// True when `filename` can be used without rewriting.
///
/// Absolute paths, any `..`, and either path separator are refused before
/// the character pattern is checked.
pub fn validate_filename(filename: &str) -> bool {
    if Path::new(filename).is_absolute()
        || filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\')
    {
        return false;
    }
    matches_safe_pattern(filename)
}

/// Rewrite `filename` into a safe, non-empty name.
///
/// Keeps only the last path component (either separator flavor) and
/// replaces every disallowed character with `_`. Idempotent.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let safe: String = base
        .chars()
        .map(|c| if is_safe_char(c) { c } else { '_' })
        .collect();

    if safe.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        safe
    }
}

/// Append `.txt` unless the name already ends with it.
pub fn ensure_txt_extension(mut filename: String) -> String {
    if !filename.ends_with(TXT_EXTENSION) {
        filename.push_str(TXT_EXTENSION);
    }
    filename
}

/// `YYYY-MM-DD-HH-MM-SS.txt` for `now`.
pub fn timestamp_filename(now: DateTime<Local>) -> String {
    format!("{}{}", now.format(TIMESTAMP_FORMAT), TXT_EXTENSION)
}

/// Final filename for a request.
///
/// Missing or empty names get a timestamp; unsafe names are sanitized
/// (and logged); every result ends in `.txt` and holds no separator.
pub fn resolve_filename(requested: Option<&str>, now: DateTime<Local>) -> String {
    let name = match requested {
        None | Some("") => timestamp_filename(now),
        Some(name) if validate_filename(name) => name.to_string(),
        Some(name) => {
            warn!(filename = name, "unsafe filename attempted");
            let sanitized = sanitize_filename(name);
            info!(filename = %sanitized, "filename sanitized");
            sanitized
        }
    };
    ensure_txt_extension(name)
}
