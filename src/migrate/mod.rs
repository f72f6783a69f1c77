//! Migration of legacy per-button audio into the normalized audio store.
//!
//! # Usage
//!
//! ```ignore
//! use sb::migrate::{LogNotifier, Migrator};
//! use sb::store::SoundboardDb;
//!
//! let mut db = SoundboardDb::open("soundboard.db")?;
//! let mut migrator = Migrator::new("backups", LogNotifier);
//! match migrator.run(&mut db)? {
//!     MigrationOutcome::Migrated(report) => println!("{} actions rewritten", report.actions_migrated),
//!     MigrationOutcome::Skipped { reason } => println!("nothing to do: {reason:?}"),
//! }
//! ```

mod dedup;
mod notify;
mod orchestrator;

pub use dedup::{DedupIndex, fingerprint};
pub use notify::{
    LogNotifier, Notification, Notifier, RecordingNotifier, UPGRADE_MESSAGE, UPGRADE_TITLE,
};
pub use orchestrator::{MigrationOutcome, MigrationPhase, MigrationReport, Migrator, SkipReason};
