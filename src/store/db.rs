//! `SQLite` operations for the audio store.
//!
//! [`AudioStore`] is the contract the migration and the CLI rely on. It is
//! implemented for [`rusqlite::Connection`], so the same calls work on a plain
//! connection and inside a [`rusqlite::Transaction`] (which derefs to one),
//! and for [`SoundboardDb`], which adds the backup-on-write hook.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::{debug, error, info, instrument, trace, warn};

use super::backup::{self, BackupHook};
use super::schema::{AudioCategory, AudioFile, SCHEMA_SQL};
use crate::error::{Result, SbError, db_err};

/// Insert/update/delete/query contract over categories and audio files.
pub trait AudioStore {
    fn insert_audio_category(&self, name: &str) -> Result<i64>;

    /// Creates the category with a fixed id unless it exists; returns true if created.
    fn ensure_category(&self, id: i64, name: &str) -> Result<bool>;

    fn insert_audio_file(&self, data: &[u8], name: &str, category_id: i64) -> Result<i64>;

    fn update_category(&self, category: &AudioCategory) -> Result<()>;

    fn update_audio_file(&self, file: &AudioFile) -> Result<()>;

    /// Deletes a category; rejected while any audio file references it.
    fn delete_category(&self, id: i64) -> Result<()>;

    fn delete_audio_file(&self, id: i64) -> Result<()>;

    /// All categories ordered by id.
    fn list_categories(&self) -> Result<Vec<AudioCategory>>;

    /// All audio files ordered by id.
    fn list_audio_files(&self) -> Result<Vec<AudioFile>>;

    fn get_audio_file(&self, id: i64) -> Result<Option<AudioFile>>;

    fn config_version(&self) -> Result<u32>;

    fn set_config_version(&self, version: u32) -> Result<()>;
}

impl AudioStore for Connection {
    fn insert_audio_category(&self, name: &str) -> Result<i64> {
        self.execute("INSERT INTO audio_category (name) VALUES (?1)", params![name])
            .map_err(db_err("Failed to insert audio category"))?;
        let id = self.last_insert_rowid();
        debug!(id, name, "Inserted audio category");
        Ok(id)
    }

    fn ensure_category(&self, id: i64, name: &str) -> Result<bool> {
        let inserted = self
            .execute(
                "INSERT OR IGNORE INTO audio_category (id, name) VALUES (?1, ?2)",
                params![id, name],
            )
            .map_err(db_err("Failed to ensure audio category"))?;
        Ok(inserted > 0)
    }

    fn insert_audio_file(&self, data: &[u8], name: &str, category_id: i64) -> Result<i64> {
        self.execute(
            "INSERT INTO audio_file (name, data, category_id) VALUES (?1, ?2, ?3)",
            params![name, data, category_id],
        )
        .map_err(db_err("Failed to insert audio file"))?;
        let id = self.last_insert_rowid();
        trace!(id, name, category_id, bytes = data.len(), "Inserted audio file");
        Ok(id)
    }

    fn update_category(&self, category: &AudioCategory) -> Result<()> {
        let updated = self
            .execute(
                "UPDATE audio_category SET name = ?1 WHERE id = ?2",
                params![category.name, category.id],
            )
            .map_err(db_err("Failed to update audio category"))?;
        if updated == 0 {
            return Err(SbError::CategoryNotFound { id: category.id });
        }
        Ok(())
    }

    fn update_audio_file(&self, file: &AudioFile) -> Result<()> {
        if !category_exists(self, file.category_id)? {
            return Err(SbError::CategoryNotFound {
                id: file.category_id,
            });
        }
        let updated = self
            .execute(
                "UPDATE audio_file SET name = ?1, category_id = ?2 WHERE id = ?3",
                params![file.name, file.category_id, file.id],
            )
            .map_err(db_err("Failed to update audio file"))?;
        if updated == 0 {
            return Err(SbError::AudioFileNotFound { id: file.id });
        }
        Ok(())
    }

    fn delete_category(&self, id: i64) -> Result<()> {
        let name: Option<String> = self
            .query_row(
                "SELECT name FROM audio_category WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err("Failed to look up audio category"))?;
        let Some(name) = name else {
            return Err(SbError::CategoryNotFound { id });
        };

        let mut stmt = self
            .prepare("SELECT name FROM audio_file WHERE category_id = ?1 ORDER BY id")
            .map_err(db_err("Failed to prepare statement"))?;
        let used_by = stmt
            .query_map(params![id], |row| row.get::<_, String>(0))
            .map_err(db_err("Failed to query audio files"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err("Failed to collect audio files"))?;

        if !used_by.is_empty() {
            return Err(SbError::CategoryInUse { id, name, used_by });
        }

        self.execute("DELETE FROM audio_category WHERE id = ?1", params![id])
            .map_err(db_err("Failed to delete audio category"))?;
        debug!(id, "Deleted audio category");
        Ok(())
    }

    fn delete_audio_file(&self, id: i64) -> Result<()> {
        let deleted = self
            .execute("DELETE FROM audio_file WHERE id = ?1", params![id])
            .map_err(db_err("Failed to delete audio file"))?;
        if deleted == 0 {
            return Err(SbError::AudioFileNotFound { id });
        }
        debug!(id, "Deleted audio file");
        Ok(())
    }

    fn list_categories(&self) -> Result<Vec<AudioCategory>> {
        let mut stmt = self
            .prepare("SELECT id, name FROM audio_category ORDER BY id")
            .map_err(db_err("Failed to prepare statement"))?;
        stmt.query_map([], |row| {
            Ok(AudioCategory {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .map_err(db_err("Failed to query audio categories"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err("Failed to collect audio categories"))
    }

    fn list_audio_files(&self) -> Result<Vec<AudioFile>> {
        let mut stmt = self
            .prepare("SELECT id, name, data, category_id FROM audio_file ORDER BY id")
            .map_err(db_err("Failed to prepare statement"))?;
        stmt.query_map([], |row| {
            Ok(AudioFile {
                id: row.get(0)?,
                name: row.get(1)?,
                data: row.get(2)?,
                category_id: row.get(3)?,
            })
        })
        .map_err(db_err("Failed to query audio files"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err("Failed to collect audio files"))
    }

    fn get_audio_file(&self, id: i64) -> Result<Option<AudioFile>> {
        self.query_row(
            "SELECT id, name, data, category_id FROM audio_file WHERE id = ?1",
            params![id],
            |row| {
                Ok(AudioFile {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    data: row.get(2)?,
                    category_id: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(db_err("Failed to load audio file"))
    }

    fn config_version(&self) -> Result<u32> {
        let value: Option<String> = self
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'config_version'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err("Failed to read config version"))?;
        match value {
            Some(v) => v
                .parse()
                .map_err(|_| SbError::Other(format!("Invalid config_version in store: {v}"))),
            None => Ok(super::schema::LEGACY_CONFIG_VERSION),
        }
    }

    fn set_config_version(&self, version: u32) -> Result<()> {
        self.execute(
            "INSERT INTO store_meta (key, value) VALUES ('config_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![version.to_string()],
        )
        .map_err(db_err("Failed to write config version"))?;
        Ok(())
    }
}

fn category_exists(conn: &Connection, id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT 1 FROM audio_category WHERE id = ?1",
        params![id],
        |_| Ok(()),
    )
    .optional()
    .map(|row| row.is_some())
    .map_err(db_err("Failed to look up audio category"))
}

/// Database wrapper for the audio store.
pub struct SoundboardDb {
    conn: Connection,
    path: Option<PathBuf>,
    backup_hook: Option<BackupHook>,
    /// Set when a checkpoint could not reopen the file.
    closed: bool,
}

impl SoundboardDb {
    /// Opens or creates a database at the given path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SbError::Other(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let conn = open_connection(path)?;
        info!(path = %path.display(), "Audio store ready");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
            backup_hook: None,
            closed: false,
        })
    }

    /// Creates an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err("Failed to create in-memory database"))?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            path: None,
            backup_hook: None,
            closed: false,
        })
    }

    /// Path of the database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The underlying connection, for read-only queries not covered by the traits.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// True once a checkpoint failed to reopen the database file.
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// The connection, or `StoreClosed` if the handle lost its file.
    pub(crate) fn live(&self) -> Result<&Connection> {
        if self.closed {
            return Err(self.closed_error());
        }
        Ok(&self.conn)
    }

    fn closed_error(&self) -> SbError {
        SbError::StoreClosed {
            path: self.path.clone().unwrap_or_default(),
        }
    }

    /// Installs a hook that backs up the store after each write.
    pub fn set_backup_hook(&mut self, hook: Option<BackupHook>) {
        self.backup_hook = hook;
    }

    /// Removes and returns the backup-on-write hook.
    pub fn take_backup_hook(&mut self) -> Option<BackupHook> {
        self.backup_hook.take()
    }

    pub fn has_backup_hook(&self) -> bool {
        self.backup_hook.is_some()
    }

    /// Runs `work` inside a single transaction.
    ///
    /// Commits if `work` returns `Ok`; otherwise everything it wrote is
    /// rolled back and the error is returned unchanged. The backup hook does
    /// not fire for writes made inside the transaction.
    #[instrument(skip_all)]
    pub fn run_in_transaction<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        if self.closed {
            return Err(self.closed_error());
        }
        let tx = self
            .conn
            .transaction()
            .map_err(db_err("Failed to start transaction"))?;

        match work(&tx) {
            Ok(value) => {
                tx.commit().map_err(db_err("Failed to commit transaction"))?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, "Rolling back transaction");
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Closes the connection, runs `while_closed` on the database file, then
    /// reopens under a fresh connection.
    ///
    /// The store is reopened even if `while_closed` fails; the closure's error
    /// is returned after reopening. If the file cannot be reopened the handle
    /// is marked closed and every later call fails with `StoreClosed`.
    #[instrument(skip_all)]
    pub fn close_and_reopen<T, F>(&mut self, while_closed: F) -> Result<T>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        let path = self.path.clone().ok_or(SbError::StoreNotFileBacked)?;
        if self.closed {
            return Err(self.closed_error());
        }

        let placeholder =
            Connection::open_in_memory().map_err(db_err("Failed to create placeholder connection"))?;
        let old = std::mem::replace(&mut self.conn, placeholder);
        if let Err((conn, e)) = old.close() {
            self.conn = conn;
            return Err(db_err("Failed to close database")(e));
        }
        debug!(path = %path.display(), "Connection closed");

        let outcome = while_closed(&path);

        match open_connection(&path) {
            Ok(conn) => {
                self.conn = conn;
                debug!(path = %path.display(), "Connection reopened");
                outcome
            }
            Err(e) => {
                self.closed = true;
                if let Err(closure_err) = &outcome {
                    warn!(error = %closure_err, "Checkpoint step failed before reopen");
                }
                error!(path = %path.display(), error = %e, "Store could not be reopened");
                Err(e)
            }
        }
    }

    /// Takes a backup after a committed write. A failed backup is logged and
    /// never turns the write into an error.
    fn after_write(&self) {
        if let (Some(hook), Some(path)) = (&self.backup_hook, &self.path) {
            if let Err(e) = backup::create_backup(path, &hook.dir, &hook.policy) {
                warn!(error = %e, dir = %hook.dir.display(), "Backup after write failed");
            }
        }
    }
}

impl AudioStore for SoundboardDb {
    fn insert_audio_category(&self, name: &str) -> Result<i64> {
        let id = self.live()?.insert_audio_category(name)?;
        self.after_write();
        Ok(id)
    }

    fn ensure_category(&self, id: i64, name: &str) -> Result<bool> {
        let created = self.live()?.ensure_category(id, name)?;
        if created {
            self.after_write();
        }
        Ok(created)
    }

    fn insert_audio_file(&self, data: &[u8], name: &str, category_id: i64) -> Result<i64> {
        let id = self.live()?.insert_audio_file(data, name, category_id)?;
        self.after_write();
        Ok(id)
    }

    fn update_category(&self, category: &AudioCategory) -> Result<()> {
        self.live()?.update_category(category)?;
        self.after_write();
        Ok(())
    }

    fn update_audio_file(&self, file: &AudioFile) -> Result<()> {
        self.live()?.update_audio_file(file)?;
        self.after_write();
        Ok(())
    }

    fn delete_category(&self, id: i64) -> Result<()> {
        self.live()?.delete_category(id)?;
        self.after_write();
        Ok(())
    }

    fn delete_audio_file(&self, id: i64) -> Result<()> {
        self.live()?.delete_audio_file(id)?;
        self.after_write();
        Ok(())
    }

    fn list_categories(&self) -> Result<Vec<AudioCategory>> {
        self.live()?.list_categories()
    }

    fn list_audio_files(&self) -> Result<Vec<AudioFile>> {
        self.live()?.list_audio_files()
    }

    fn get_audio_file(&self, id: i64) -> Result<Option<AudioFile>> {
        self.live()?.get_audio_file(id)
    }

    fn config_version(&self) -> Result<u32> {
        self.live()?.config_version()
    }

    fn set_config_version(&self, version: u32) -> Result<()> {
        self.live()?.set_config_version(version)?;
        self.after_write();
        Ok(())
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    debug!(path = %path.display(), "Opening audio store");
    let conn = Connection::open(path).map_err(db_err("Failed to open database"))?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Initializes the database schema.
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .map_err(db_err("Failed to enable foreign keys"))?;
    conn.execute_batch(SCHEMA_SQL)
        .map_err(db_err("Failed to initialize schema"))?;
    Ok(())
}
