//! Row types and SQL schema for the audio store.
//!
//! # `SQLite` Schema
//!
//! ```sql
//! -- Categories group audio files in the library
//! -- AUTOINCREMENT: ids of deleted rows are never handed out again
//! CREATE TABLE audio_category (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     name TEXT NOT NULL
//! );
//!
//! -- One row per distinct audio payload
//! CREATE TABLE audio_file (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     name TEXT NOT NULL,
//!     data BLOB NOT NULL,
//!     category_id INTEGER NOT NULL REFERENCES audio_category(id)
//! );
//!
//! -- Host configuration tree, one JSON document per profile
//! CREATE TABLE profile (
//!     id TEXT PRIMARY KEY,
//!     name TEXT NOT NULL,
//!     sort_order INTEGER NOT NULL DEFAULT 0,
//!     document TEXT NOT NULL
//! );
//!
//! -- Key/value metadata (config_version)
//! CREATE TABLE store_meta (
//!     key TEXT PRIMARY KEY,
//!     value TEXT NOT NULL
//! );
//! ```

use serde::{Deserialize, Serialize};

/// Id of the category migration files land in.
pub const DEFAULT_CATEGORY_ID: i64 = 1;

/// Name given to the default category when it is created.
pub const DEFAULT_CATEGORY_NAME: &str = "Default category";

/// Configuration version before audio payloads were moved into the store.
pub const LEGACY_CONFIG_VERSION: u32 = 1;

/// Configuration version once every audio action references the store.
pub const CURRENT_CONFIG_VERSION: u32 = 2;

/// A named group of audio files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioCategory {
    pub id: i64,
    pub name: String,
}

/// A stored audio payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFile {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    pub data: Vec<u8>,
    pub category_id: i64,
}

/// Audio file metadata without the payload, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFileSummary {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub size_bytes: u64,
}

impl From<&AudioFile> for AudioFileSummary {
    fn from(file: &AudioFile) -> Self {
        Self {
            id: file.id,
            name: file.name.clone(),
            category_id: file.category_id,
            size_bytes: file.data.len() as u64,
        }
    }
}

/// SQL schema for the store.
pub(crate) const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS audio_category (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS audio_file (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    data BLOB NOT NULL,
    category_id INTEGER NOT NULL REFERENCES audio_category(id)
);

CREATE TABLE IF NOT EXISTS profile (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0,
    document TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audio_file_category ON audio_file(category_id);

INSERT OR IGNORE INTO store_meta (key, value) VALUES ('config_version', '1');
";
