//! File system storage for saved text.
//!
//! All writes land directly inside the storage root. Writes are atomic:
//! the bytes go to a temporary sibling first, then get renamed over the
//! target, so a half-written file is never visible under its final name.

use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, TextSaverError};

/// Storage layer rooted at a single directory.
pub struct Storage {
    /// Directory every file is written into.
    root: PathBuf,
}

/// Outcome of a completed write.
#[derive(Debug, Clone)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub size: u64,
}

impl Storage {
    /// Initialize storage, creating the root directory (and parents) if needed.
    pub fn init(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            debug!(root = %root.display(), "creating storage root");
        }
        fs::create_dir_all(root).map_err(|source| TextSaverError::StorageDir {
            path: root.display().to_string(),
            source,
        })?;
        Ok(Self { root: root.to_path_buf() })
    }

    /// Open a storage root without touching the file system.
    pub fn open(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }

    /// Get root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a file named `filename` would occupy.
    ///
    /// `filename` must be a single plain path component; anything that could
    /// climb out of the root is refused.
    pub fn confine(&self, filename: &str) -> Result<PathBuf> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None)
                if !filename.contains(&['/', '\\'][..]) && name == OsStr::new(filename) =>
            {
                Ok(self.root.join(name))
            }
            _ => Err(TextSaverError::Unexpected(format!(
                "refusing to write outside the storage root: {}",
                filename
            ))),
        }
    }

    /// Create or overwrite `filename` with `bytes`.
    pub fn write_atomic(&self, filename: &str, bytes: &[u8]) -> Result<WrittenFile> {
        let target = self.confine(filename)?;
        let tmp_path = self.root.join(format!(".text-saver-{}.tmp", Uuid::new_v4().simple()));

        info!(path = %target.display(), bytes = bytes.len(), "writing file");

        if let Err(e) = write_and_sync(&tmp_path, bytes) {
            discard(&tmp_path);
            return Err(TextSaverError::from_io(filename, e));
        }
        if let Err(e) = fs::rename(&tmp_path, &target) {
            discard(&tmp_path);
            return Err(TextSaverError::from_io(filename, e));
        }

        let size = self.verify(filename, &target, bytes.len())?;
        debug!(path = %target.display(), size, "file saved");
        Ok(WrittenFile { path: target, size })
    }

    /// Confirm the target exists and did not come out empty.
    fn verify(&self, filename: &str, target: &Path, expected: usize) -> Result<u64> {
        let metadata = match fs::metadata(target) {
            Ok(m) if m.is_file() => m,
            Ok(_) => {
                return Err(TextSaverError::WriteVerification(format!(
                    "not a regular file after write: {}",
                    target.display()
                )))
            }
            Err(e) => {
                warn!(file = filename, error = %e, "written file is missing");
                return Err(TextSaverError::WriteVerification(format!(
                    "file was not created: {}",
                    target.display()
                )));
            }
        };

        if metadata.len() == 0 && expected > 0 {
            return Err(TextSaverError::WriteVerification(format!(
                "file was created but appears to be empty: {}",
                target.display()
            )));
        }
        Ok(metadata.len())
    }
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn discard(tmp_path: &Path) {
    if let Err(e) = fs::remove_file(tmp_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %tmp_path.display(), error = %e, "failed to remove temp file");
        }
    }
}
