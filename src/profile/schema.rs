//! Types for the host's button configuration tree.
//!
//! A profile holds folders, a folder holds action buttons, and each button
//! carries several action lists ("slots"), one per trigger:
//!
//! ```text
//! Profile
//! └── Folder
//!     └── ActionButton
//!         ├── actions                      (press)
//!         ├── actions_long_press
//!         ├── actions_long_press_release
//!         ├── actions_release
//!         └── event_listeners[*].actions   (listener-triggered)
//! ```

use serde::{Deserialize, Serialize};

/// Plugin id the soundboard actions are registered under.
pub const SOUNDBOARD_PLUGIN_ID: &str = "Soundboard4MacroDeck";

/// The closed set of action kinds that carry audio parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioActionKind {
    Play,
    PlayStop,
    Overlap,
    Loop,
}

impl AudioActionKind {
    pub const ALL: [Self; 4] = [Self::Play, Self::PlayStop, Self::Overlap, Self::Loop];

    /// Action id as stored in the configuration tree.
    pub const fn action_id(self) -> &'static str {
        match self {
            Self::Play => "SoundboardPlayAction",
            Self::PlayStop => "SoundboardPlayStopAction",
            Self::Overlap => "SoundboardOverlapAction",
            Self::Loop => "SoundboardLoopAction",
        }
    }

    /// Resolves a stored action id; `None` for anything that is not an audio action.
    pub fn from_action_id(action_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.action_id() == action_id)
    }
}

/// One configured action inside a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginAction {
    pub plugin_id: String,
    pub action_id: String,
    /// Plugin-specific configuration blob.
    #[serde(default)]
    pub configuration: String,
    #[serde(default)]
    pub configuration_summary: String,
}

impl PluginAction {
    pub fn new(plugin_id: impl Into<String>, action_id: impl Into<String>, configuration: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            action_id: action_id.into(),
            configuration: configuration.into(),
            configuration_summary: String::new(),
        }
    }

    /// Builds a soundboard action of the given kind.
    pub fn audio(kind: AudioActionKind, configuration: impl Into<String>) -> Self {
        Self::new(SOUNDBOARD_PLUGIN_ID, kind.action_id(), configuration)
    }

    /// The audio action kind, if this is a soundboard audio action.
    pub fn audio_kind(&self) -> Option<AudioActionKind> {
        if self.plugin_id != SOUNDBOARD_PLUGIN_ID {
            return None;
        }
        AudioActionKind::from_action_id(&self.action_id)
    }
}

/// Actions run when a host event fires for the button.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventListener {
    pub event_to_listen: String,
    #[serde(default)]
    pub actions: Vec<PluginAction>,
}

/// A single button on a folder grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionButton {
    pub id: String,
    #[serde(default)]
    pub position_x: i32,
    #[serde(default)]
    pub position_y: i32,
    #[serde(default)]
    pub actions: Vec<PluginAction>,
    #[serde(default)]
    pub actions_long_press: Vec<PluginAction>,
    #[serde(default)]
    pub actions_long_press_release: Vec<PluginAction>,
    #[serde(default)]
    pub actions_release: Vec<PluginAction>,
    #[serde(default)]
    pub event_listeners: Vec<EventListener>,
}

impl ActionButton {
    pub fn new(id: impl Into<String>, position_x: i32, position_y: i32) -> Self {
        Self {
            id: id.into(),
            position_x,
            position_y,
            ..Self::default()
        }
    }

    /// Every action slot of this button, listener slots last.
    pub fn slots(&self) -> impl Iterator<Item = &Vec<PluginAction>> {
        [
            &self.actions,
            &self.actions_long_press,
            &self.actions_long_press_release,
            &self.actions_release,
        ]
        .into_iter()
        .chain(self.event_listeners.iter().map(|l| &l.actions))
    }

    /// Mutable access to every action slot, in the same order as [`Self::slots`].
    pub fn slots_mut(&mut self) -> impl Iterator<Item = &mut Vec<PluginAction>> {
        [
            &mut self.actions,
            &mut self.actions_long_press,
            &mut self.actions_long_press_release,
            &mut self.actions_release,
        ]
        .into_iter()
        .chain(self.event_listeners.iter_mut().map(|l| &mut l.actions))
    }

    /// Iterates every action across all slots.
    pub fn all_actions(&self) -> impl Iterator<Item = &PluginAction> {
        self.slots().flatten()
    }
}

/// A folder (page) of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub action_buttons: Vec<ActionButton>,
}

/// Top-level profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub folders: Vec<Folder>,
}

impl Profile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            folders: Vec::new(),
        }
    }

    /// Iterates every button in every folder.
    pub fn buttons(&self) -> impl Iterator<Item = &ActionButton> {
        self.folders.iter().flat_map(|f| f.action_buttons.iter())
    }
}

/// True if any profile contains at least one action button.
pub fn has_action_buttons(profiles: &[Profile]) -> bool {
    profiles
        .iter()
        .any(|p| p.folders.iter().any(|f| !f.action_buttons.is_empty()))
}

/// Counts over a configuration tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeSummary {
    pub profiles: usize,
    pub folders: usize,
    pub buttons: usize,
    pub actions: usize,
    pub audio_actions: usize,
}

impl TreeSummary {
    pub fn of(profiles: &[Profile]) -> Self {
        let mut summary = Self {
            profiles: profiles.len(),
            ..Self::default()
        };
        for profile in profiles {
            summary.folders += profile.folders.len();
            for button in profile.buttons() {
                summary.buttons += 1;
                for action in button.all_actions() {
                    summary.actions += 1;
                    if action.audio_kind().is_some() {
                        summary.audio_actions += 1;
                    }
                }
            }
        }
        summary
    }
}
