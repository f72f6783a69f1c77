//! Error types for soundboard store and migration operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::audio::DownloadError;
use crate::retry::RetryError;

/// Primary error type for soundboard operations.
#[derive(Error, Debug)]
pub enum SbError {
    // Store errors
    #[error("Database error ({context}): {source}")]
    Database {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Audio category not found: {id}")]
    CategoryNotFound { id: i64 },

    #[error("Audio file not found: {id}")]
    AudioFileNotFound { id: i64 },

    #[error("Cannot delete category {id} {name}. Used on {}", .used_by.join(","))]
    CategoryInUse {
        id: i64,
        name: String,
        used_by: Vec<String>,
    },

    #[error("Store is not file-backed and cannot be checkpointed")]
    StoreNotFileBacked,

    #[error("Store {} was closed and could not be reopened", .path.display())]
    StoreClosed { path: PathBuf },

    // Codec errors
    #[error("Invalid legacy action parameters: {0}")]
    InvalidLegacyParameters(String),

    #[error("Invalid action parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid profile document '{profile}': {reason}")]
    InvalidProfile { profile: String, reason: String },

    // Backup errors
    #[error("Backup of {} failed: {source}", .path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: RetryError<std::io::Error>,
    },

    // Audio import errors
    #[error("Unsupported audio content: {path}")]
    UnsupportedAudio { path: String },

    #[error("Audio file not found on disk: {path}")]
    AudioSourceNotFound { path: String },

    #[error("Download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: RetryError<DownloadError>,
    },

    // Configuration errors
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl SbError {
    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CategoryNotFound { .. }
                | Self::AudioFileNotFound { .. }
                | Self::CategoryInUse { .. }
                | Self::UnsupportedAudio { .. }
                | Self::AudioSourceNotFound { .. }
                | Self::Download { .. }
                | Self::ConfigParse(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::CategoryInUse { .. } => {
                Some("Move or delete the listed audio files first: sb files move <ID> <CATEGORY>")
            }
            Self::CategoryNotFound { .. } => Some("Run: sb categories list"),
            Self::AudioFileNotFound { .. } => Some("Run: sb files list"),
            Self::UnsupportedAudio { .. } => Some("Supported formats: wav, mp3, ogg, flac, aiff"),
            Self::Download { .. } => Some("Check the URL and your network connection"),
            Self::Backup { .. } => Some("Check free disk space and permissions of the backup directory"),
            Self::StoreClosed { .. } => Some("Check the database file, then run the command again"),
            Self::ConfigParse(_) => Some("Run: sb config to see the effective settings"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using SbError.
pub type Result<T> = std::result::Result<T, SbError>;

/// Builds a `map_err` adapter that tags a `rusqlite::Error` with context.
pub fn db_err(context: &'static str) -> impl FnOnce(rusqlite::Error) -> SbError {
    move |source| SbError::Database { context, source }
}

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| SbError::Other(format!("{}: {e}", f().into())))
    }
}
