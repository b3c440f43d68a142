//! Request and result types for the save operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

use crate::error::{Result, TextSaverError};

// ─── Request ───────────────────────────────────────────────────────

/// A request to persist `text`, optionally under `filename`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl SaveRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), filename: None }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Build a request from untyped tool arguments.
    ///
    /// `text` must be a string. `filename` may be absent or null.
    pub fn from_arguments(args: &Value) -> Result<Self> {
        let text = match args.get("text") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(TextSaverError::InvalidInput(
                    "text must be a string".to_string(),
                ))
            }
            None => {
                return Err(TextSaverError::InvalidInput(
                    "missing required parameter: text".to_string(),
                ))
            }
        };

        let filename = match args.get("filename") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(TextSaverError::InvalidInput(
                    "filename must be a string".to_string(),
                ))
            }
        };

        Ok(Self { text, filename })
    }
}

// ─── Result ────────────────────────────────────────────────────────

/// Failure categories reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveErrorKind {
    InvalidInput,
    TextTooLarge,
    PermissionDenied,
    IoFailure,
    WriteVerificationFailed,
    UnexpectedFailure,
}

impl fmt::Display for SaveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaveErrorKind::InvalidInput => "invalid_input",
            SaveErrorKind::TextTooLarge => "text_too_large",
            SaveErrorKind::PermissionDenied => "permission_denied",
            SaveErrorKind::IoFailure => "io_failure",
            SaveErrorKind::WriteVerificationFailed => "write_verification_failed",
            SaveErrorKind::UnexpectedFailure => "unexpected_failure",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one save, serialized with a `status` tag of
/// `"success"` or `"error"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum SaveResult {
    #[serde(rename = "success")]
    Success {
        message: String,
        /// Absolute path of the written file.
        path: PathBuf,
        /// Size on disk in bytes.
        size: u64,
        /// Final filename used.
        filename: String,
    },

    #[serde(rename = "error")]
    Failure {
        #[serde(rename = "error_kind")]
        kind: SaveErrorKind,
        message: String,
    },
}

impl SaveResult {
    pub fn failure(kind: SaveErrorKind, message: impl Into<String>) -> Self {
        SaveResult::Failure { kind, message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SaveResult::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            SaveResult::Success { message, .. } | SaveResult::Failure { message, .. } => message,
        }
    }

    /// Error category, if this is a failure.
    pub fn error_kind(&self) -> Option<SaveErrorKind> {
        match self {
            SaveResult::Success { .. } => None,
            SaveResult::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl From<&TextSaverError> for SaveResult {
    fn from(err: &TextSaverError) -> Self {
        SaveResult::failure(err.kind(), err.to_string())
    }
}
