//! File-level backups of the store.
//!
//! A backup is a plain copy of the database file taken while no transaction
//! is open. Copies are retried with a [`RetryPolicy`] because the file may
//! be briefly locked by antivirus scanners or sync tools.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{Result, SbError};
use crate::retry::RetryPolicy;

const BACKUP_EXTENSION: &str = "db";

/// Backup-on-write configuration for a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupHook {
    pub dir: PathBuf,
    pub policy: RetryPolicy,
}

impl BackupHook {
    pub fn new(dir: impl Into<PathBuf>, policy: RetryPolicy) -> Self {
        Self {
            dir: dir.into(),
            policy,
        }
    }
}

/// A backup file on disk.
#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

/// Copies the database at `db_path` into `backup_dir` and returns the new file's path.
///
/// The file name is `<stem>-<UTC timestamp>.db`; a numeric suffix is added if
/// a backup with the same timestamp already exists.
#[instrument(skip(policy), fields(db = %db_path.display(), dir = %backup_dir.display()))]
pub fn create_backup(db_path: &Path, backup_dir: &Path, policy: &RetryPolicy) -> Result<PathBuf> {
    fs::create_dir_all(backup_dir).map_err(|e| {
        SbError::Other(format!(
            "Failed to create backup directory {}: {e}",
            backup_dir.display()
        ))
    })?;

    let target = next_backup_path(db_path, backup_dir);
    let bytes = policy
        .execute(|| fs::copy(db_path, &target))
        .map_err(|source| SbError::Backup {
            path: db_path.to_path_buf(),
            source,
        })?;

    info!(backup = %target.display(), bytes, "Backup created");
    Ok(target)
}

/// Lists backups in `backup_dir`, newest first. A missing directory has no backups.
pub fn list_backups(backup_dir: &Path) -> Result<Vec<BackupInfo>> {
    if !backup_dir.exists() {
        return Ok(Vec::new());
    }

    let mut backups = Vec::new();
    for entry in fs::read_dir(backup_dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(BACKUP_EXTENSION) {
            continue;
        }
        let meta = fs::metadata(&path)?;
        let modified = meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now());
        backups.push(BackupInfo {
            path,
            size_bytes: meta.len(),
            modified,
        });
    }

    // Timestamped names sort chronologically.
    backups.sort_by(|a, b| b.path.cmp(&a.path));
    debug!(count = backups.len(), "Listed backups");
    Ok(backups)
}

fn next_backup_path(db_path: &Path, backup_dir: &Path) -> PathBuf {
    let stem = db_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("soundboard");
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6fZ");

    let mut candidate = backup_dir.join(format!("{stem}-{stamp}.{BACKUP_EXTENSION}"));
    let mut n = 1;
    while candidate.exists() {
        candidate = backup_dir.join(format!("{stem}-{stamp}-{n}.{BACKUP_EXTENSION}"));
        n += 1;
    }
    candidate
}
