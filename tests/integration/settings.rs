//! Settings files driving store and backup locations.

use tempfile::TempDir;

use sb::config::Settings;
use sb::error::SbError;
use sb::store::{AudioStore, SoundboardDb, list_backups};

#[test]
fn settings_locate_store_and_backups() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        "database = \"data/sb.db\"\nbackup_dir = \"backups\"\n[backup]\nattempts = 2\nretry_delay_ms = 1\n",
    )
    .unwrap();

    let settings = Settings::load(Some(&config)).unwrap();
    let mut db = SoundboardDb::open(&settings.database).unwrap();
    db.set_backup_hook(settings.backup_hook());
    db.insert_audio_category("Effects").unwrap();

    assert!(dir.path().join("data/sb.db").is_file());
    assert_eq!(list_backups(&dir.path().join("backups")).unwrap().len(), 1);
}

#[test]
fn disabled_backup_on_write_takes_none() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        "database = \"sb.db\"\nbackup_dir = \"backups\"\n[backup]\non_write = false\n",
    )
    .unwrap();

    let settings = Settings::load(Some(&config)).unwrap();
    let mut db = SoundboardDb::open(&settings.database).unwrap();
    db.set_backup_hook(settings.backup_hook());
    db.insert_audio_category("Effects").unwrap();

    assert!(!dir.path().join("backups").exists());
}

#[test]
fn wrong_value_type_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[backup]\nattempts = \"three\"\n").unwrap();

    let err = Settings::load(Some(&config)).unwrap_err();
    assert!(matches!(err, SbError::ConfigParse(_)));
    assert!(err.to_string().contains("config.toml"));
}
