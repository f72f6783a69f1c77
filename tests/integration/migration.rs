//! End-to-end migration tests against file-backed stores.

use std::time::Duration;

use tempfile::TempDir;

use sb::codec::{self, BlobFormat};
use sb::error::SbError;
use sb::migrate::{
    MigrationOutcome, MigrationPhase, Migrator, Notification, RecordingNotifier, SkipReason,
    UPGRADE_MESSAGE, UPGRADE_TITLE,
};
use sb::profile::{AudioActionKind, PluginAction, ProfileStore};
use sb::retry::RetryPolicy;
use sb::store::{
    AudioStore, BackupHook, CURRENT_CONFIG_VERSION, DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME,
    LEGACY_CONFIG_VERSION, SoundboardDb, list_backups,
};

use crate::common::fixtures::{
    SHORT_RIFF, audio_actions, button, duplicate_payload_tree, every_slot_tree, folder,
    foreign_action, legacy_action, profile, seeded_store, snapshot,
};
use crate::common::init_test_logging;

const FAIL_SECOND_FILE: &str = "
    CREATE TRIGGER fail_second_file BEFORE INSERT ON audio_file
    WHEN (SELECT COUNT(*) FROM audio_file) >= 1
    BEGIN
        SELECT RAISE(ABORT, 'injected failure');
    END;";

fn migrator(dir: &TempDir) -> Migrator<RecordingNotifier> {
    Migrator::new(dir.path().join("backups"), RecordingNotifier::new())
        .with_backup_policy(RetryPolicy::new(Duration::from_millis(1), 2))
}

fn expect_report(outcome: MigrationOutcome) -> sb::migrate::MigrationReport {
    match outcome {
        MigrationOutcome::Migrated(report) => report,
        other @ MigrationOutcome::Skipped { .. } => panic!("expected migration, got {other:?}"),
    }
}

#[test]
fn duplicate_payloads_share_one_audio_file() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let mut db = seeded_store(dir.path(), &duplicate_payload_tree());

    let report = expect_report(migrator(&dir).run(&mut db).unwrap());
    assert_eq!(report.actions_migrated, 2);
    assert_eq!(report.audio_files_created, 1);
    assert_eq!(report.duplicate_payloads, 1);

    let files = db.list_audio_files().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].data, SHORT_RIFF.to_vec());
    assert_eq!(files[0].name, "a.wav");
    assert_eq!(files[0].category_id, DEFAULT_CATEGORY_ID);

    let actions = audio_actions(&db.load_profiles().unwrap());
    let params: Vec<_> = actions
        .iter()
        .map(|a| codec::deserialize_v2(&a.configuration).unwrap())
        .collect();
    assert_eq!(params[0].audio_file_id, files[0].id);
    assert_eq!(params[1].audio_file_id, files[0].id);
    assert_eq!(params[0].file_name, "a.wav");
    assert_eq!(params[1].file_name, "b.wav");
}

#[test]
fn every_slot_is_rewritten_against_its_payload() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let tree = every_slot_tree();
    let mut db = seeded_store(dir.path(), &tree);

    let report = expect_report(migrator(&dir).run(&mut db).unwrap());
    assert_eq!(report.profiles, 2);
    assert_eq!(report.buttons, 3);
    assert_eq!(report.actions_migrated, 8);
    assert_eq!(report.actions_already_current, 0);
    assert_eq!(report.audio_files_created, 4);
    assert_eq!(report.duplicate_payloads, 4);
    assert!(report.default_category_created);

    let migrated = db.load_profiles().unwrap();
    let before = audio_actions(&tree);
    let after = audio_actions(&migrated);
    assert_eq!(before.len(), after.len());

    for (old, new) in before.iter().zip(&after) {
        assert_eq!(codec::detect_format(&new.configuration), BlobFormat::V2);
        assert_eq!(old.action_id, new.action_id);

        let legacy = codec::deserialize_legacy(&old.configuration).unwrap();
        let v2 = codec::deserialize_v2(&new.configuration).unwrap();
        let file = db.get_audio_file(v2.audio_file_id).unwrap().unwrap();

        assert_eq!(file.data, legacy.file_data);
        assert_eq!(v2.file_name, legacy.file_name);
        assert_eq!(v2.volume, legacy.volume);
        assert_eq!(v2.use_default_device, legacy.use_default_device);
        assert_eq!(
            new.configuration_summary,
            format!("{} - {}", v2.audio_file_id, legacy.file_name)
        );
    }

    // Foreign actions pass through untouched.
    let foreign = |profiles: &[sb::profile::Profile]| -> Vec<PluginAction> {
        profiles
            .iter()
            .flat_map(|p| p.buttons())
            .flat_map(|b| b.all_actions())
            .filter(|a| a.audio_kind().is_none())
            .cloned()
            .collect()
    };
    assert_eq!(foreign(&tree), foreign(&migrated));
}

#[test]
fn failure_mid_migration_leaves_store_untouched() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let mut db = seeded_store(dir.path(), &every_slot_tree());
    db.connection().execute_batch(FAIL_SECOND_FILE).unwrap();

    let before = snapshot(db.connection());
    assert!(before.categories.is_empty());
    assert_eq!(before.config_version, LEGACY_CONFIG_VERSION);

    let mut m = migrator(&dir);
    let err = m.run(&mut db).unwrap_err();
    assert!(matches!(err, SbError::Database { .. }), "unexpected error: {err}");
    assert_eq!(m.phase(), MigrationPhase::RolledBack);
    assert!(m.notifier().sent().is_empty());

    assert_eq!(snapshot(db.connection()), before);
    // The backup is taken before the transaction and survives the rollback.
    assert_eq!(list_backups(&dir.path().join("backups")).unwrap().len(), 1);

    // Once the fault is gone, a rerun succeeds from the same starting point.
    db.connection()
        .execute_batch("DROP TRIGGER fail_second_file;")
        .unwrap();
    let report = expect_report(m.run(&mut db).unwrap());
    assert_eq!(m.phase(), MigrationPhase::Committed);
    assert_eq!(report.audio_files_created, 4);
    assert_eq!(db.config_version().unwrap(), CURRENT_CONFIG_VERSION);
}

#[test]
fn backup_failure_aborts_before_any_write() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let mut db = seeded_store(dir.path(), &duplicate_payload_tree());
    let before = snapshot(db.connection());

    // A regular file where the backup directory should be.
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, b"not a directory").unwrap();

    let mut m = Migrator::new(&blocked, RecordingNotifier::new())
        .with_backup_policy(RetryPolicy::new(Duration::from_millis(1), 2));
    assert!(m.run(&mut db).is_err());
    assert_eq!(m.phase(), MigrationPhase::Idle);
    assert!(m.notifier().sent().is_empty());
    assert_eq!(snapshot(db.connection()), before);
}

#[test]
fn backup_holds_pre_migration_state() {
    let dir = TempDir::new().unwrap();
    let tree = duplicate_payload_tree();
    let mut db = seeded_store(dir.path(), &tree);

    let report = expect_report(migrator(&dir).run(&mut db).unwrap());
    assert!(report.backup_path.starts_with(dir.path().join("backups")));

    let backup = SoundboardDb::open(&report.backup_path).unwrap();
    assert_eq!(backup.load_profiles().unwrap(), tree);
    assert_eq!(backup.config_version().unwrap(), LEGACY_CONFIG_VERSION);
    assert!(backup.list_audio_files().unwrap().is_empty());
}

#[test]
fn second_run_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let mut db = seeded_store(dir.path(), &every_slot_tree());
    let mut m = migrator(&dir);

    assert!(m.run(&mut db).unwrap().is_migrated());
    let after_first = snapshot(db.connection());

    let outcome = m.run(&mut db).unwrap();
    assert_eq!(
        outcome,
        MigrationOutcome::Skipped {
            reason: SkipReason::AlreadyMigrated
        }
    );
    assert_eq!(snapshot(db.connection()), after_first);
    assert_eq!(list_backups(&dir.path().join("backups")).unwrap().len(), 1);
    assert_eq!(m.notifier().sent().len(), 1);
}

#[test]
fn migrated_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let mut db = seeded_store(dir.path(), &duplicate_payload_tree());
        expect_report(migrator(&dir).run(&mut db).unwrap());
    }

    let mut db = SoundboardDb::open(dir.path().join("soundboard.db")).unwrap();
    assert_eq!(db.config_version().unwrap(), CURRENT_CONFIG_VERSION);
    assert_eq!(db.list_audio_files().unwrap().len(), 1);
    assert!(!migrator(&dir).run(&mut db).unwrap().is_migrated());
}

#[test]
fn tree_without_buttons_is_skipped() {
    let dir = TempDir::new().unwrap();
    let tree = vec![profile("empty", vec![folder("root", Vec::new())])];
    let mut db = seeded_store(dir.path(), &tree);
    let mut m = migrator(&dir);

    let outcome = m.run(&mut db).unwrap();
    assert_eq!(
        outcome,
        MigrationOutcome::Skipped {
            reason: SkipReason::NoActionButtons
        }
    );
    assert!(!dir.path().join("backups").exists());
    assert!(db.list_categories().unwrap().is_empty());
    assert_eq!(db.config_version().unwrap(), LEGACY_CONFIG_VERSION);
    assert!(m.notifier().sent().is_empty());
}

#[test]
fn buttons_without_audio_still_bump_version() {
    let dir = TempDir::new().unwrap();
    let tree = vec![profile(
        "main",
        vec![folder("root", vec![button("b1", vec![foreign_action("{}")])])],
    )];
    let mut db = seeded_store(dir.path(), &tree);

    let report = expect_report(migrator(&dir).run(&mut db).unwrap());
    assert_eq!(report.actions_migrated, 0);
    assert_eq!(report.audio_files_created, 0);
    assert_eq!(db.load_profiles().unwrap(), tree);
    assert_eq!(db.config_version().unwrap(), CURRENT_CONFIG_VERSION);
    assert_eq!(db.list_categories().unwrap()[0].name, DEFAULT_CATEGORY_NAME);
}

#[test]
fn current_format_actions_are_left_alone() {
    let dir = TempDir::new().unwrap();
    let current = PluginAction::audio(
        AudioActionKind::Loop,
        r#"{"AudioFileId":7,"FileName":"kept.wav","Volume":20,"UseDefaultDevice":true,"OutputDeviceId":null,"SyncButtonState":false}"#,
    );
    let tree = vec![profile(
        "main",
        vec![folder(
            "root",
            vec![button(
                "b1",
                vec![
                    current.clone(),
                    legacy_action(AudioActionKind::Play, &SHORT_RIFF, "new.wav"),
                ],
            )],
        )],
    )];
    let mut db = seeded_store(dir.path(), &tree);

    let report = expect_report(migrator(&dir).run(&mut db).unwrap());
    assert_eq!(report.actions_already_current, 1);
    assert_eq!(report.actions_migrated, 1);

    let after = audio_actions(&db.load_profiles().unwrap());
    assert_eq!(after[0], current);
}

#[test]
fn existing_default_category_is_reused() {
    let dir = TempDir::new().unwrap();
    let mut db = seeded_store(dir.path(), &duplicate_payload_tree());
    db.ensure_category(DEFAULT_CATEGORY_ID, "Mine").unwrap();

    let report = expect_report(migrator(&dir).run(&mut db).unwrap());
    assert!(!report.default_category_created);

    let categories = db.list_categories().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Mine");
}

#[test]
fn notification_sent_once_after_commit() {
    let dir = TempDir::new().unwrap();
    let mut db = seeded_store(dir.path(), &duplicate_payload_tree());
    let mut m = migrator(&dir);
    m.run(&mut db).unwrap();

    assert_eq!(
        m.notifier().sent(),
        vec![Notification {
            title: UPGRADE_TITLE.to_string(),
            message: UPGRADE_MESSAGE.to_string(),
        }]
    );
    assert_eq!(UPGRADE_TITLE, "SoundBoard Upgrade");
    assert_eq!(
        UPGRADE_MESSAGE,
        "A major update was performed. A backup has been made."
    );
}

#[test]
fn backup_hook_is_suspended_during_migration() {
    let dir = TempDir::new().unwrap();
    let hook_dir = dir.path().join("on-write");
    let mut db = seeded_store(dir.path(), &duplicate_payload_tree());
    db.set_backup_hook(Some(BackupHook::new(
        &hook_dir,
        RetryPolicy::new(Duration::from_millis(1), 1),
    )));

    expect_report(migrator(&dir).run(&mut db).unwrap());
    assert!(db.has_backup_hook());
    assert!(list_backups(&hook_dir).unwrap().is_empty());

    db.insert_audio_category("After").unwrap();
    assert_eq!(list_backups(&hook_dir).unwrap().len(), 1);
}
