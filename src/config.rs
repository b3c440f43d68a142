//! Process-wide configuration.
//!
//! Built once at startup and passed by reference into every save. Sources,
//! lowest to highest precedence: built-in defaults, an optional TOML file,
//! the `TEXT_SAVER_ROOT` environment variable, explicit overrides from the
//! command line.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, TextSaverError};

/// Maximum accepted text size: 10 MiB of UTF-8.
pub const MAX_TEXT_SIZE: usize = 10 * 1024 * 1024;

/// Name of the config file looked up next to the executable.
pub const CONFIG_FILE_NAME: &str = "text-saver.toml";

/// Environment variable overriding the storage root.
pub const ROOT_ENV_VAR: &str = "TEXT_SAVER_ROOT";

/// Immutable settings for the save operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaverConfig {
    /// Every file is written directly inside this directory.
    pub storage_root: PathBuf,
    /// Upper bound on the UTF-8 byte length of saved text.
    pub max_text_bytes: usize,
}

/// On-disk shape of `text-saver.toml`. All keys are optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    storage_root: Option<PathBuf>,
    max_text_bytes: Option<usize>,
}

impl Default for SaverConfig {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            max_text_bytes: MAX_TEXT_SIZE,
        }
    }
}

impl SaverConfig {
    /// Config rooted at `storage_root` with the default size limit.
    pub fn with_root(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: absolutize(storage_root.into(), None),
            max_text_bytes: MAX_TEXT_SIZE,
        }
    }

    /// Load the effective config.
    ///
    /// `explicit` must exist if given. Without it, `text-saver.toml` beside
    /// the executable is used when present.
    pub fn load(explicit: Option<&Path>, root_override: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let file = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|p| p.is_file()),
        };
        if let Some(path) = file {
            config.apply_file(&path)?;
        }

        if let Some(root) = env::var_os(ROOT_ENV_VAR).filter(|v| !v.is_empty()) {
            debug!(root = ?root, "storage root from environment");
            config.storage_root = absolutize(PathBuf::from(root), None);
        }

        if let Some(root) = root_override {
            config.storage_root = absolutize(root.to_path_buf(), None);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults.
    pub fn from_toml_str(source: &str, base_dir: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        config.merge(parse_file(source)?, base_dir);
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "loading config file");
        let source = fs::read_to_string(path)
            .map_err(|e| TextSaverError::Config(format!("{}: {}", path.display(), e)))?;
        self.merge(parse_file(&source)?, path.parent());
        Ok(())
    }

    fn merge(&mut self, file: ConfigFile, base_dir: Option<&Path>) {
        if let Some(root) = file.storage_root {
            self.storage_root = absolutize(root, base_dir);
        }
        if let Some(limit) = file.max_text_bytes {
            self.max_text_bytes = limit;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_text_bytes == 0 {
            return Err(TextSaverError::Config(
                "max_text_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_file(source: &str) -> Result<ConfigFile> {
    toml::from_str(source).map_err(|e| TextSaverError::Config(e.to_string()))
}

/// Directory holding the running executable, falling back to the cwd.
fn default_storage_root() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| absolutize(PathBuf::from("."), None))
}

fn default_config_path() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    Some(exe.parent()?.join(CONFIG_FILE_NAME))
}

/// Make `path` absolute against `base` (or the cwd) without touching disk.
fn absolutize(path: PathBuf, base: Option<&Path>) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match base {
        Some(base) if base.is_absolute() => base.join(path),
        Some(base) => absolutize(base.join(path), None),
        None => env::current_dir().map(|cwd| cwd.join(&path)).unwrap_or(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SaverConfig::default();
        assert_eq!(config.max_text_bytes, 10_485_760);
        assert!(config.storage_root.is_absolute());
    }

    #[test]
    fn test_toml_overrides() {
        let config = SaverConfig::from_toml_str(
            "storage_root = \"/var/lib/text-saver\"\nmax_text_bytes = 1024\n",
            None,
        )
        .unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/var/lib/text-saver"));
        assert_eq!(config.max_text_bytes, 1024);
    }

    #[test]
    fn test_relative_root_resolves_against_config_dir() {
        let config =
            SaverConfig::from_toml_str("storage_root = \"notes\"", Some(Path::new("/etc/ts")))
                .unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/etc/ts/notes"));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = SaverConfig::from_toml_str("max_text_bytes = 0", None).unwrap_err();
        assert!(matches!(err, TextSaverError::Config(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = SaverConfig::from_toml_str("colour = \"blue\"", None).unwrap_err();
        assert!(matches!(err, TextSaverError::Config(_)));
    }

    #[test]
    fn test_load_explicit_file_and_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "storage_root = \"out\"\nmax_text_bytes = 64\n").unwrap();

        let override_root = dir.path().join("elsewhere");
        let config = SaverConfig::load(Some(&path), Some(&override_root)).unwrap();
        assert_eq!(config.storage_root, override_root);
        assert_eq!(config.max_text_bytes, 64);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(SaverConfig::load(Some(&missing), None).is_err());
    }
}
