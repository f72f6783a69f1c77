//! Fixture builders for legacy profile trees and store snapshots.

use std::path::Path;

use rusqlite::Connection;
use sb::codec::{self, LegacyActionParameters};
use sb::profile::{ActionButton, AudioActionKind, EventListener, Folder, PluginAction, Profile, ProfileStore};
use sb::store::{AudioCategory, AudioStore, SoundboardDb};

/// The five-byte payload used by the deduplication scenarios.
pub const SHORT_RIFF: [u8; 5] = [0x52, 0x49, 0x46, 0x46, 0x00];

/// A minimal RIFF/WAVE header the audio sniffer accepts.
#[must_use]
pub fn wav_bytes(tag: u8) -> Vec<u8> {
    let mut data = b"RIFF".to_vec();
    data.extend_from_slice(&36u32.to_le_bytes());
    data.extend_from_slice(b"WAVEfmt ");
    data.push(tag);
    data
}

/// A legacy configuration blob embedding `data` under `name`.
#[must_use]
pub fn legacy_blob(data: &[u8], name: &str) -> String {
    codec::serialize_legacy(&LegacyActionParameters::new(data.to_vec(), name))
        .expect("legacy params serialize")
}

/// An audio action of `kind` carrying a legacy blob.
#[must_use]
pub fn legacy_action(kind: AudioActionKind, data: &[u8], name: &str) -> PluginAction {
    PluginAction::audio(kind, legacy_blob(data, name))
}

/// An action owned by some other plugin.
#[must_use]
pub fn foreign_action(configuration: &str) -> PluginAction {
    PluginAction::new("Macro Deck", "SwitchFolder", configuration)
}

#[must_use]
pub fn button(id: &str, actions: Vec<PluginAction>) -> ActionButton {
    let mut b = ActionButton::new(id, 0, 0);
    b.actions = actions;
    b
}

#[must_use]
pub fn folder(id: &str, buttons: Vec<ActionButton>) -> Folder {
    Folder {
        id: id.to_string(),
        name: id.to_string(),
        action_buttons: buttons,
    }
}

#[must_use]
pub fn profile(id: &str, folders: Vec<Folder>) -> Profile {
    let mut p = Profile::new(id, format!("Profile {id}"));
    p.folders = folders;
    p
}

/// Two buttons sharing one payload under different names.
#[must_use]
pub fn duplicate_payload_tree() -> Vec<Profile> {
    vec![profile(
        "main",
        vec![folder(
            "root",
            vec![
                button("b1", vec![legacy_action(AudioActionKind::Play, &SHORT_RIFF, "a.wav")]),
                button("b2", vec![legacy_action(AudioActionKind::Play, &SHORT_RIFF, "b.wav")]),
            ],
        )],
    )]
}

/// Audio actions in every slot kind, across two profiles and three folders.
///
/// Holds 8 audio actions with 4 distinct payloads plus 2 foreign actions.
#[must_use]
pub fn every_slot_tree() -> Vec<Profile> {
    let mut b1 = ActionButton::new("p1-b1", 0, 0);
    b1.actions.push(legacy_action(AudioActionKind::Play, &wav_bytes(1), "one.wav"));
    b1.actions.push(foreign_action("{\"folder\":\"sub\"}"));
    b1.actions_long_press.push(legacy_action(AudioActionKind::PlayStop, &wav_bytes(2), "two.wav"));
    b1.actions_long_press_release.push(legacy_action(AudioActionKind::Overlap, &wav_bytes(1), "one-again.wav"));
    b1.actions_release.push(legacy_action(AudioActionKind::Loop, &wav_bytes(3), "three.wav"));

    let mut b2 = ActionButton::new("p1-b2", 1, 0);
    b2.event_listeners.push(EventListener {
        event_to_listen: "Variable changed".to_string(),
        actions: vec![
            legacy_action(AudioActionKind::Play, &wav_bytes(2), "two.wav"),
            foreign_action("{}"),
        ],
    });

    let mut b3 = ActionButton::new("p2-b1", 0, 1);
    b3.actions.push(legacy_action(AudioActionKind::Overlap, &wav_bytes(4), "four.wav"));
    b3.actions.push(legacy_action(AudioActionKind::Loop, &wav_bytes(4), "four-copy.wav"));
    b3.actions_release.push(legacy_action(AudioActionKind::PlayStop, &wav_bytes(3), "three.wav"));

    vec![
        profile("p1", vec![folder("p1-root", vec![b1]), folder("p1-sub", vec![b2])]),
        profile("p2", vec![folder("p2-root", vec![b3])]),
    ]
}

/// Opens a file-backed store under `dir` holding `profiles`.
#[must_use]
pub fn seeded_store(dir: &Path, profiles: &[Profile]) -> SoundboardDb {
    let db = SoundboardDb::open(dir.join("soundboard.db")).expect("open store");
    db.save_profiles(profiles).expect("save profiles");
    db
}

/// Every audio action in the tree, in traversal order.
#[must_use]
pub fn audio_actions(profiles: &[Profile]) -> Vec<PluginAction> {
    profiles
        .iter()
        .flat_map(|p| p.buttons())
        .flat_map(|b| b.all_actions())
        .filter(|a| a.audio_kind().is_some())
        .cloned()
        .collect()
}

/// Full observable state of a store, for before/after comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub categories: Vec<AudioCategory>,
    pub files: Vec<(i64, String, Vec<u8>, i64)>,
    pub profiles: Vec<(String, String)>,
    pub config_version: u32,
}

/// Captures categories, files (with payloads), raw profile documents and
/// the config version.
#[must_use]
pub fn snapshot(conn: &Connection) -> StoreSnapshot {
    let files = conn
        .list_audio_files()
        .expect("list files")
        .into_iter()
        .map(|f| (f.id, f.name, f.data, f.category_id))
        .collect();

    let mut stmt = conn
        .prepare("SELECT id, document FROM profile ORDER BY sort_order, id")
        .expect("prepare");
    let profiles = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .expect("query profiles")
        .collect::<Result<Vec<_>, _>>()
        .expect("collect profiles");

    StoreSnapshot {
        categories: conn.list_categories().expect("list categories"),
        files,
        profiles,
        config_version: conn.config_version().expect("config version"),
    }
}
