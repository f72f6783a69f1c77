//! TOML settings for the `sb` binary.
//!
//! ```toml
//! database = "~/.local/share/soundboard/soundboard.db"
//! backup_dir = "backups"
//!
//! [backup]
//! attempts = 3
//! retry_delay_ms = 500
//! on_write = true
//!
//! [download]
//! attempts = 3
//! retry_delay_ms = 500
//! timeout_ms = 30000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::path::{PathResolver, default_config_path, default_data_dir};
use crate::error::{Result, SbError};
use crate::retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use crate::store::BackupHook;

const DEFAULT_RETRY_DELAY_MS: u64 = 500;
const DEFAULT_DOWNLOAD_TIMEOUT_MS: u64 = 30_000;

/// Settings as written in the TOML file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    database: Option<PathBuf>,
    backup_dir: Option<PathBuf>,
    #[serde(default)]
    backup: BackupSettings,
    #[serde(default)]
    download: DownloadSettings,
}

/// Backup behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupSettings {
    /// Copy attempts per backup.
    pub attempts: u32,
    /// Wait between copy attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Back up the store after each mutating command.
    pub on_write: bool,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            on_write: true,
        }
    }
}

/// Audio downloads for `sb files import <URL>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadSettings {
    /// Request attempts per download.
    pub attempts: u32,
    /// Wait between attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Connect and read timeout, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            timeout_ms: DEFAULT_DOWNLOAD_TIMEOUT_MS,
        }
    }
}

/// Effective settings with every path resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// File the settings were read from (may not exist).
    pub source: PathBuf,
    pub database: PathBuf,
    pub backup_dir: PathBuf,
    pub backup: BackupSettings,
    pub download: DownloadSettings,
}

impl Settings {
    /// Defaults rooted at the platform's local data directory.
    pub fn defaults() -> Result<Self> {
        let data_dir = default_data_dir()?;
        Ok(Self {
            source: default_config_path()?,
            database: data_dir.join("soundboard.db"),
            backup_dir: data_dir.join("backups"),
            backup: BackupSettings::default(),
            download: DownloadSettings::default(),
        })
    }

    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let source = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };

        if !source.exists() {
            debug!(path = %source.display(), "No settings file, using defaults");
            return Ok(Self {
                source,
                ..Self::defaults()?
            });
        }

        let contents = std::fs::read_to_string(&source)?;
        let settings = Self::from_toml(&contents, &source)?;
        info!(path = %source.display(), "Loaded settings");
        Ok(settings)
    }

    /// Parse settings text; relative paths resolve against `source`'s directory.
    pub fn from_toml(contents: &str, source: &Path) -> Result<Self> {
        let raw: RawSettings = toml::from_str(contents)
            .map_err(|e| SbError::ConfigParse(format!("{}: {e}", source.display())))?;

        let defaults = Self::defaults()?;
        let resolver = PathResolver::new(source)?;

        let database = match raw.database {
            Some(p) => resolver.resolve(&p)?,
            None => defaults.database,
        };
        let backup_dir = match raw.backup_dir {
            Some(p) => resolver.resolve(&p)?,
            None => defaults.backup_dir,
        };

        let settings = Self {
            source: source.to_path_buf(),
            database,
            backup_dir,
            backup: raw.backup,
            download: raw.download,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.database.as_os_str().is_empty() {
            return Err(SbError::ConfigInvalid("database path is empty".to_string()));
        }
        if self.database.is_dir() {
            return Err(SbError::ConfigInvalid(format!(
                "database path is a directory: {}",
                self.database.display()
            )));
        }
        Ok(())
    }

    /// Retry policy for backup copies.
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.backup.retry_delay_ms),
            self.backup.attempts,
        )
    }

    /// Retry policy for audio downloads.
    pub const fn download_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.download.retry_delay_ms),
            self.download.attempts,
        )
    }

    pub const fn download_timeout(&self) -> Duration {
        Duration::from_millis(self.download.timeout_ms)
    }

    /// Backup-on-write hook, when enabled.
    pub fn backup_hook(&self) -> Option<BackupHook> {
        self.backup
            .on_write
            .then(|| BackupHook::new(&self.backup_dir, self.retry_policy()))
    }
}
