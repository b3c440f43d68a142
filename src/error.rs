//! Error types for text-saver.
//!
//! Internal failures are `TextSaverError`. At the tool boundary they are
//! flattened into a [`SaveErrorKind`] plus a user-facing message.

use std::io;

use thiserror::Error;

use crate::save::SaveErrorKind;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, TextSaverError>;

#[derive(Debug, Error)]
pub enum TextSaverError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("text size ({size} bytes) exceeds the maximum allowed ({limit} bytes)")]
    TextTooLarge { size: usize, limit: usize },

    #[error("permission denied writing file: {filename}")]
    PermissionDenied {
        filename: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error writing file {filename}: {source}")]
    Io {
        filename: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to create storage directory {path}: {source}")]
    StorageDir {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("write verification failed: {0}")]
    WriteVerification(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl TextSaverError {
    /// Wrap an I/O error raised while writing `filename`.
    pub fn from_io(filename: impl Into<String>, source: io::Error) -> Self {
        let filename = filename.into();
        if source.kind() == io::ErrorKind::PermissionDenied {
            TextSaverError::PermissionDenied { filename, source }
        } else {
            TextSaverError::Io { filename, source }
        }
    }

    /// The public error category reported to the caller.
    pub fn kind(&self) -> SaveErrorKind {
        match self {
            TextSaverError::InvalidInput(_) => SaveErrorKind::InvalidInput,
            TextSaverError::TextTooLarge { .. } => SaveErrorKind::TextTooLarge,
            TextSaverError::PermissionDenied { .. } => SaveErrorKind::PermissionDenied,
            TextSaverError::Io { .. } => SaveErrorKind::IoFailure,
            TextSaverError::StorageDir { source, .. } => {
                if source.kind() == io::ErrorKind::PermissionDenied {
                    SaveErrorKind::PermissionDenied
                } else {
                    SaveErrorKind::IoFailure
                }
            }
            TextSaverError::WriteVerification(_) => SaveErrorKind::WriteVerificationFailed,
            TextSaverError::Config(_) | TextSaverError::Unexpected(_) => {
                SaveErrorKind::UnexpectedFailure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_is_classified() {
        let err = TextSaverError::from_io(
            "notes.txt",
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );
        assert_eq!(err.kind(), SaveErrorKind::PermissionDenied);
        assert!(err.to_string().contains("notes.txt"));
    }

    #[test]
    fn test_other_io_is_io_failure() {
        let err = TextSaverError::from_io("notes.txt", io::Error::new(io::ErrorKind::Other, "disk"));
        assert_eq!(err.kind(), SaveErrorKind::IoFailure);
        assert!(err.to_string().contains("disk"));
    }

    #[test]
    fn test_storage_dir_error_names_directory() {
        let err = TextSaverError::StorageDir {
            path: "/srv/notes".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        };
        assert_eq!(err.kind(), SaveErrorKind::PermissionDenied);
        assert!(err.to_string().starts_with("failed to create storage directory /srv/notes"));
    }

    #[test]
    fn test_too_large_message() {
        let err = TextSaverError::TextTooLarge { size: 11, limit: 10 };
        assert_eq!(err.kind(), SaveErrorKind::TextTooLarge);
        assert_eq!(
            err.to_string(),
            "text size (11 bytes) exceeds the maximum allowed (10 bytes)"
        );
    }
}
