//! The save operation: size check, filename policy, confined atomic write.

use chrono::Local;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, info};

use super::filename::resolve_filename;
use super::types::{SaveErrorKind, SaveRequest, SaveResult};
use crate::config::SaverConfig;
use crate::error::{Result, TextSaverError};
use crate::storage::{Storage, WrittenFile};

/// Save `text` under `filename` (or a timestamped name).
pub fn save_text(config: &SaverConfig, text: &str, filename: Option<&str>) -> SaveResult {
    contain(|| try_save(config, text, filename))
}

/// Run a save attempt, turning every error and panic into a result.
fn contain<F>(attempt: F) -> SaveResult
where
    F: FnOnce() -> Result<(String, WrittenFile)>,
{
    match panic::catch_unwind(AssertUnwindSafe(attempt)) {
        Ok(Ok((filename, written))) => SaveResult::Success {
            message: format!("Text saved to {}", written.path.display()),
            path: written.path,
            size: written.size,
            filename,
        },
        Ok(Err(err)) => {
            log_failure(&err);
            SaveResult::from(&err)
        }
        Err(payload) => {
            let detail = panic_detail(payload.as_ref());
            error!(detail = %detail, "unexpected failure while saving text");
            SaveResult::failure(
                SaveErrorKind::UnexpectedFailure,
                format!("unexpected error: {}", detail),
            )
        }
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// [`save_text`] for an already-parsed request.
pub fn save(config: &SaverConfig, request: &SaveRequest) -> SaveResult {
    save_text(config, &request.text, request.filename.as_deref())
}

/// Fallible core. Returns the final filename and the written file.
pub fn try_save(
    config: &SaverConfig,
    text: &str,
    filename: Option<&str>,
) -> Result<(String, WrittenFile)> {
    let size = text.len();
    if size > config.max_text_bytes {
        return Err(TextSaverError::TextTooLarge { size, limit: config.max_text_bytes });
    }

    let filename = resolve_filename(filename, Local::now());
    let storage = Storage::init(&config.storage_root)?;
    info!(
        root = %storage.root().display(),
        filename = %filename,
        bytes = size,
        "saving text"
    );

    let written = storage.write_atomic(&filename, text.as_bytes())?;
    Ok((filename, written))
}

fn log_failure(err: &TextSaverError) {
    match err {
        TextSaverError::TextTooLarge { .. } | TextSaverError::InvalidInput(_) => {
            error!(kind = %err.kind(), error = %err, "rejected save request");
        }
        _ => {
            error!(kind = %err.kind(), error = ?err, "failed to save text");
        }
    }
}
