//! Normalized audio store: categories, deduplicated audio files, backups.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.local/share/soundboard/
//! ├── soundboard.db              # SQLite database (audio + profiles)
//! └── backups/
//!     └── soundboard-20250101T120000.000000Z.db
//! ```

mod backup;
mod db;
mod schema;

pub use backup::{BackupHook, BackupInfo, create_backup, list_backups};
pub use db::{AudioStore, SoundboardDb};
pub use schema::{
    AudioCategory, AudioFile, AudioFileSummary, CURRENT_CONFIG_VERSION, DEFAULT_CATEGORY_ID,
    DEFAULT_CATEGORY_NAME, LEGACY_CONFIG_VERSION,
};
