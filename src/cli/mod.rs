//! CLI argument definitions and command dispatch.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Soundboard store CLI - manage audio categories and files, migrate legacy buttons.
///
/// The store is migrated automatically on every start when legacy button
/// audio is found.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "sb", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "SB_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only errors are logged)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Settings file (TOML)
    #[arg(long, global = true, env = "SB_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Store database, overriding the settings file
    #[arg(long, global = true, env = "SB_DATABASE", value_name = "PATH")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }

    /// Returns true if the command needs the store opened and migrated.
    pub fn needs_store(&self) -> bool {
        !matches!(
            self.command,
            None | Some(Commands::Config(_) | Commands::Version | Commands::Completions(_))
        )
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Store ===
    /// Manage audio categories
    #[command(subcommand)]
    Categories(CategoryCommand),

    /// Manage audio files
    #[command(subcommand)]
    Files(FileCommand),

    /// Summarize the profile tree and its audio buttons
    Profiles,

    /// List store backups, newest first
    Backups,

    // === Configuration ===
    /// Show effective settings
    Config(ConfigArgs),

    // === Utilities ===
    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// List categories
    #[command(visible_alias = "ls")]
    List,

    /// Create a category
    Add {
        /// Category name
        name: String,
    },

    /// Rename a category
    Rename {
        /// Category id
        id: i64,
        /// New name
        name: String,
    },

    /// Delete an unused category
    #[command(visible_alias = "rm")]
    Delete {
        /// Category id
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum FileCommand {
    /// List audio files
    #[command(visible_alias = "ls")]
    List {
        /// Only files in this category
        #[arg(long, short = 'c')]
        category: Option<i64>,
    },

    /// Import an audio file from disk or an http(s) URL
    Import(ImportArgs),

    /// Rename an audio file
    Rename {
        /// Audio file id
        id: i64,
        /// New name
        name: String,
    },

    /// Move an audio file to another category
    #[command(visible_alias = "mv")]
    Move {
        /// Audio file id
        id: i64,
        /// Target category id
        category: i64,
    },

    /// Delete an audio file
    #[command(visible_alias = "rm")]
    Delete {
        /// Audio file id
        id: i64,
    },
}

/// Arguments for importing audio.
///
/// # Examples
///
/// ```bash
/// # Import into the default category under its file name
/// sb files import ~/sounds/airhorn.wav
///
/// # Import into category 3 with a display name
/// sb files import ./clap.mp3 --category 3 --name "Applause"
///
/// # Download, retrying per the [download] settings
/// sb files import https://example.com/sounds/horn.wav
/// ```
#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// Audio file path or http(s) URL (WAV, MP3, OGG, FLAC, AIFF)
    pub source: String,

    /// Target category id
    #[arg(long, short = 'c', default_value_t = crate::store::DEFAULT_CATEGORY_ID)]
    pub category: i64,

    /// Display name (defaults to the file name or last URL segment)
    #[arg(long, short = 'n')]
    pub name: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Show settings file path only
    #[arg(long)]
    pub path: bool,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
