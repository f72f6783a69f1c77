//! Host configuration tree: profiles, folders, buttons and their action slots.

mod db;
mod schema;

pub use db::ProfileStore;
pub use schema::{
    ActionButton, AudioActionKind, EventListener, Folder, PluginAction, Profile,
    SOUNDBOARD_PLUGIN_ID, TreeSummary, has_action_buttons,
};
