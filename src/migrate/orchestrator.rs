//! One-shot migration of legacy audio actions into the audio store.
//!
//! # Protocol
//!
//! ```text
//!  Idle ──► BackingUp ──► Migrating ──► Committed
//!   ▲           │              │
//!   └── backup ─┘              └──────► RolledBack
//!       failed
//! ```
//!
//! 1. The backup-on-write hook is removed for the duration of the run.
//! 2. `BackingUp`: the connection is closed, the database file is copied
//!    (with retries), and a fresh connection is opened. No write happens
//!    before the copy exists.
//! 3. `Migrating`: one transaction ensures the default category, rewrites
//!    every audio action through the dedup index, saves the tree and bumps
//!    the config version. There is no cancellation point inside it.
//! 4. `Committed` or `RolledBack`; the hook is restored either way.
//! 5. On success the upgrade notification is sent.

use std::path::PathBuf;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, error, info, info_span, instrument, trace};

use super::dedup::DedupIndex;
use super::notify::{Notifier, UPGRADE_MESSAGE, UPGRADE_TITLE};
use crate::codec::{self, BlobFormat};
use crate::error::Result;
use crate::profile::{PluginAction, ProfileStore, has_action_buttons};
use crate::retry::RetryPolicy;
use crate::store::{
    AudioStore, CURRENT_CONFIG_VERSION, DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME, SoundboardDb,
    create_backup,
};

/// Where a migration run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    Idle,
    BackingUp,
    Migrating,
    Committed,
    RolledBack,
}

/// Why a run did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No profile has a single action button.
    NoActionButtons,
    /// The store already carries the current config version.
    AlreadyMigrated,
}

/// Counts from a committed migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub backup_path: PathBuf,
    pub profiles: usize,
    pub buttons: usize,
    /// Audio actions rewritten from the legacy format.
    pub actions_migrated: usize,
    /// Audio actions that were already in V2 format and left alone.
    pub actions_already_current: usize,
    /// Distinct payloads written to `audio_file`.
    pub audio_files_created: usize,
    /// Actions whose payload matched one already written in this run.
    pub duplicate_payloads: usize,
    pub default_category_created: bool,
}

/// Result of [`Migrator::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationOutcome {
    Skipped { reason: SkipReason },
    Migrated(MigrationReport),
}

impl MigrationOutcome {
    pub const fn is_migrated(&self) -> bool {
        matches!(self, Self::Migrated(_))
    }
}

/// Runs the legacy configuration migration against a store.
pub struct Migrator<N> {
    backup_dir: PathBuf,
    backup_policy: RetryPolicy,
    notifier: N,
    phase: MigrationPhase,
}

impl<N: Notifier> Migrator<N> {
    pub fn new(backup_dir: impl Into<PathBuf>, notifier: N) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            backup_policy: RetryPolicy::default(),
            notifier,
            phase: MigrationPhase::Idle,
        }
    }

    /// Sets the retry policy used for the pre-migration backup.
    pub fn with_backup_policy(mut self, policy: RetryPolicy) -> Self {
        self.backup_policy = policy;
        self
    }

    /// Phase reached by the last run.
    pub const fn phase(&self) -> MigrationPhase {
        self.phase
    }

    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Returns why a run would be skipped, or `None` if it would migrate.
    pub fn skip_reason(db: &SoundboardDb) -> Result<Option<SkipReason>> {
        if db.config_version()? >= CURRENT_CONFIG_VERSION {
            return Ok(Some(SkipReason::AlreadyMigrated));
        }
        if !has_action_buttons(&db.load_profiles()?) {
            return Ok(Some(SkipReason::NoActionButtons));
        }
        Ok(None)
    }

    /// Migrates every legacy audio action in `db`.
    ///
    /// Either everything is committed and the notification is sent, or the
    /// store is left as it was before the transaction began and the error is
    /// returned. Must not run concurrently with any other writer of the same
    /// database file.
    #[instrument(skip_all, fields(backup_dir = %self.backup_dir.display()))]
    pub fn run(&mut self, db: &mut SoundboardDb) -> Result<MigrationOutcome> {
        self.phase = MigrationPhase::Idle;

        if let Some(reason) = Self::skip_reason(db)? {
            info!(?reason, "Migration not needed");
            return Ok(MigrationOutcome::Skipped { reason });
        }

        let hook = db.take_backup_hook();
        let result = self.checkpoint_and_migrate(db);
        db.set_backup_hook(hook);

        let report = result?;
        self.notifier.notify(UPGRADE_TITLE, UPGRADE_MESSAGE);
        Ok(MigrationOutcome::Migrated(report))
    }

    fn checkpoint_and_migrate(&mut self, db: &mut SoundboardDb) -> Result<MigrationReport> {
        self.transition(MigrationPhase::BackingUp);
        let backup_dir = self.backup_dir.clone();
        let policy = self.backup_policy;
        let backup_path = match db.close_and_reopen(|path| create_backup(path, &backup_dir, &policy)) {
            Ok(path) => path,
            Err(e) => {
                error!(error = %e, "Backup failed, store left untouched");
                self.transition(MigrationPhase::Idle);
                return Err(e);
            }
        };

        self.transition(MigrationPhase::Migrating);
        let mut index = DedupIndex::new();
        match db.run_in_transaction(|tx| migrate_store(tx, &mut index)) {
            Ok(mut report) => {
                report.backup_path = backup_path;
                self.transition(MigrationPhase::Committed);
                info!(
                    actions = report.actions_migrated,
                    files = report.audio_files_created,
                    duplicates = report.duplicate_payloads,
                    "Migration committed"
                );
                Ok(report)
            }
            Err(e) => {
                self.transition(MigrationPhase::RolledBack);
                error!(error = %e, backup = %backup_path.display(), "Migration rolled back");
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: MigrationPhase) {
        debug!(from = ?self.phase, to = ?next, "Migration phase");
        self.phase = next;
    }
}

/// Rewrites the whole tree inside an open transaction.
fn migrate_store(conn: &Connection, index: &mut DedupIndex) -> Result<MigrationReport> {
    let default_category_created = conn.ensure_category(DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME)?;
    let mut profiles = conn.load_profiles()?;

    let mut report = MigrationReport {
        profiles: profiles.len(),
        default_category_created,
        ..MigrationReport::default()
    };

    for profile in &mut profiles {
        let _span = info_span!("profile", id = %profile.id).entered();
        for folder in &mut profile.folders {
            for button in &mut folder.action_buttons {
                report.buttons += 1;
                for slot in button.slots_mut() {
                    for action in slot.iter_mut() {
                        migrate_action(conn, action, index, &mut report)?;
                    }
                }
            }
        }
    }

    conn.save_profiles(&profiles)?;
    conn.set_config_version(CURRENT_CONFIG_VERSION)?;

    report.audio_files_created = index.len();
    report.duplicate_payloads = index.hits();
    Ok(report)
}

fn migrate_action(
    conn: &Connection,
    action: &mut PluginAction,
    index: &mut DedupIndex,
    report: &mut MigrationReport,
) -> Result<()> {
    let Some(kind) = action.audio_kind() else {
        trace!(action_id = %action.action_id, "Not an audio action");
        return Ok(());
    };

    if codec::detect_format(&action.configuration) == BlobFormat::V2 {
        debug!(?kind, "Audio action already references the store");
        report.actions_already_current += 1;
        return Ok(());
    }

    let legacy = codec::deserialize_legacy(&action.configuration)?;
    let audio_file_id = index.get_or_insert(
        &legacy.file_data,
        &legacy.file_name,
        DEFAULT_CATEGORY_ID,
        |data, name, category_id| conn.insert_audio_file(data, name, category_id),
    )?;

    let params = legacy.into_v2(audio_file_id);
    action.configuration_summary = params.summary();
    action.configuration = codec::serialize_v2(&params)?;
    report.actions_migrated += 1;
    trace!(?kind, audio_file_id, "Audio action migrated");
    Ok(())
}
