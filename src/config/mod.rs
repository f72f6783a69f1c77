//! Settings file handling.
//!
//! Loads the TOML settings used by the `sb` binary and resolves the store and
//! backup locations they name.

mod path;
mod settings;

pub use path::{PathResolver, default_config_path, default_data_dir, home_dir, resolve_path};
pub use settings::{BackupSettings, DownloadSettings, Settings};
