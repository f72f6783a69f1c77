//! Soundboard store CLI.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io::{self, IsTerminal};
use std::path::Path;

use clap::Parser;
use console::style;
use serde::Serialize;

use sb::audio;
use sb::cli::{self, CategoryCommand, Cli, Commands, FileCommand};
use sb::codec::{self, BlobFormat};
use sb::config::Settings;
use sb::error::{Result, ResultExt, SbError};
use sb::logging;
use sb::migrate::{MigrationOutcome, Migrator, RecordingNotifier};
use sb::profile::{ProfileStore, TreeSummary};
use sb::store::{
    AudioCategory, AudioFileSummary, AudioStore, DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME,
    SoundboardDb, list_backups,
};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> &'static str {
        option_env!("VERGEN_GIT_DIRTY").unwrap_or("false")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color || !io::stdout().is_terminal() {
        console::set_colors_enabled(false);
    }
    if cli.no_color || !io::stderr().is_terminal() {
        console::set_colors_enabled_stderr(false);
    }

    logging::init_logging(cli.robot, cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        output_error(&cli, &e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;

    if !cli.needs_store() {
        return match &cli.command {
            Some(Commands::Config(args)) => cmd_config(cli, &settings, args),
            Some(Commands::Version) => cmd_version(cli),
            Some(Commands::Completions(args)) => cmd_completions(args),
            _ => print_quick_start(cli),
        };
    }

    // Opening the store runs the startup migration, which may add a backup.
    let db = open_store(cli, &settings)?;
    match &cli.command {
        Some(Commands::Categories(sub)) => cmd_categories(cli, &db, sub),
        Some(Commands::Files(sub)) => cmd_files(cli, &db, &settings, sub),
        Some(Commands::Profiles) => cmd_profiles(cli, &db),
        Some(Commands::Backups) => cmd_backups(cli, &settings),
        _ => print_quick_start(cli),
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(database) = &cli.database {
        settings.database.clone_from(database);
    }
    Ok(settings)
}

/// Opens the store, runs the startup migration and arms the backup hook.
fn open_store(cli: &Cli, settings: &Settings) -> Result<SoundboardDb> {
    let mut db = SoundboardDb::open(&settings.database)?;

    let notifier = RecordingNotifier::new();
    let outcome = Migrator::new(&settings.backup_dir, &notifier)
        .with_backup_policy(settings.retry_policy())
        .run(&mut db)?;

    if let MigrationOutcome::Migrated(report) = &outcome {
        for note in notifier.sent() {
            if cli.use_json() {
                let json = serde_json::json!({
                    "notification": { "title": note.title, "message": note.message },
                    "migration": &outcome,
                });
                eprintln!("{json}");
            } else {
                eprintln!("{}: {}", style(&note.title).cyan().bold(), note.message);
                eprintln!(
                    "  {} audio actions migrated into {} files, backup at {}",
                    report.actions_migrated,
                    report.audio_files_created,
                    style(report.backup_path.display()).dim()
                );
            }
        }
    }

    db.set_backup_hook(settings.backup_hook());
    Ok(db)
}

// === Quick Start ===

fn print_quick_start(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        let help = serde_json::json!({
            "tool": "sb",
            "version": build_info::VERSION,
            "description": "Soundboard audio store with legacy button migration",
            "categories": {
                "list": "sb categories list --robot",
                "add": "sb categories add <NAME>",
                "rename": "sb categories rename <ID> <NAME>",
                "delete": "sb categories delete <ID>",
            },
            "files": {
                "list": "sb files list [--category <ID>] --robot",
                "import": "sb files import <PATH|URL> [--category <ID>] [--name <NAME>]",
                "rename": "sb files rename <ID> <NAME>",
                "move": "sb files move <ID> <CATEGORY_ID>",
                "delete": "sb files delete <ID>",
            },
            "inspect": {
                "profiles": "sb profiles --robot",
                "backups": "sb backups --robot",
                "config": "sb config --robot",
            },
            "output_modes": {
                "human": "--format=text (default)",
                "robot": "--robot or --format=json",
                "compact": "--format=json-compact",
            },
        });
        return output_json(cli, &help);
    }

    println!("{} {} - Soundboard store\n", style("sb").bold().cyan(), build_info::VERSION);
    println!("{}", style("QUICK START").bold().underlined());
    println!();
    println!("  {}  List categories", style("sb categories list").green());
    println!("  {}  List audio files", style("sb files list").green());
    println!("  {}  Import a sound", style("sb files import horn.wav").green());
    println!("  {}  Audio buttons summary", style("sb profiles").green());
    println!("  {}  Store backups", style("sb backups").green());
    println!();
    println!("{}", style("ROBOT MODE").bold().underlined());
    println!();
    println!("  {}  JSON output", style("sb --robot <command>").cyan());
    println!();
    println!("Run {} for full help", style("sb --help").yellow());
    Ok(())
}

// === Categories ===

#[derive(Serialize)]
struct CategoryRow {
    id: i64,
    name: String,
    files: usize,
}

fn cmd_categories(cli: &Cli, db: &SoundboardDb, command: &CategoryCommand) -> Result<()> {
    match command {
        CategoryCommand::List => {
            let files = db.list_audio_files()?;
            let rows: Vec<CategoryRow> = db
                .list_categories()?
                .into_iter()
                .map(|c| CategoryRow {
                    files: files.iter().filter(|f| f.category_id == c.id).count(),
                    id: c.id,
                    name: c.name,
                })
                .collect();

            if cli.use_json() {
                return output_json(cli, &rows);
            }
            if rows.is_empty() {
                println!("No categories");
            }
            for row in &rows {
                println!(
                    "{:>4}  {}  {}",
                    style(row.id).bold(),
                    row.name,
                    style(format!("({} files)", row.files)).dim()
                );
            }
            Ok(())
        }
        CategoryCommand::Add { name } => {
            let id = db.insert_audio_category(name)?;
            report_change(cli, "Created category", &serde_json::json!({ "id": id, "name": name }))
        }
        CategoryCommand::Rename { id, name } => {
            db.update_category(&AudioCategory {
                id: *id,
                name: name.clone(),
            })?;
            report_change(cli, "Renamed category", &serde_json::json!({ "id": id, "name": name }))
        }
        CategoryCommand::Delete { id } => {
            db.delete_category(*id)?;
            report_change(cli, "Deleted category", &serde_json::json!({ "id": id }))
        }
    }
}

// === Files ===

fn cmd_files(cli: &Cli, db: &SoundboardDb, settings: &Settings, command: &FileCommand) -> Result<()> {
    match command {
        FileCommand::List { category } => {
            let rows: Vec<AudioFileSummary> = db
                .list_audio_files()?
                .iter()
                .filter(|f| category.is_none_or(|c| f.category_id == c))
                .map(AudioFileSummary::from)
                .collect();

            if cli.use_json() {
                return output_json(cli, &rows);
            }
            if rows.is_empty() {
                println!("No audio files");
            }
            for row in &rows {
                println!(
                    "{:>4}  {}  {}",
                    style(row.id).bold(),
                    row.name,
                    style(format!("category {}, {} bytes", row.category_id, row.size_bytes)).dim()
                );
            }
            Ok(())
        }
        FileCommand::Import(args) => {
            if args.category == DEFAULT_CATEGORY_ID {
                db.ensure_category(DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME)?;
            }
            let id = if audio::is_url(&args.source) {
                audio::import_url(
                    db,
                    &args.source,
                    args.name.as_deref(),
                    args.category,
                    &settings.download_policy(),
                    settings.download_timeout(),
                )?
            } else {
                audio::import_file(db, Path::new(&args.source), args.name.as_deref(), args.category)?
            };
            let file = db
                .get_audio_file(id)?
                .ok_or(SbError::AudioFileNotFound { id })?;
            report_change(cli, "Imported audio file", &AudioFileSummary::from(&file))
        }
        FileCommand::Rename { id, name } => {
            let mut file = db.get_audio_file(*id)?.ok_or(SbError::AudioFileNotFound { id: *id })?;
            file.name.clone_from(name);
            db.update_audio_file(&file)?;
            report_change(cli, "Renamed audio file", &AudioFileSummary::from(&file))
        }
        FileCommand::Move { id, category } => {
            let mut file = db.get_audio_file(*id)?.ok_or(SbError::AudioFileNotFound { id: *id })?;
            file.category_id = *category;
            db.update_audio_file(&file)?;
            report_change(cli, "Moved audio file", &AudioFileSummary::from(&file))
        }
        FileCommand::Delete { id } => {
            db.delete_audio_file(*id)?;
            report_change(cli, "Deleted audio file", &serde_json::json!({ "id": id }))
        }
    }
}

// === Profiles ===

#[derive(Serialize)]
struct ProfilesReport {
    config_version: u32,
    #[serde(flatten)]
    tree: TreeSummary,
    legacy_audio_actions: usize,
}

fn cmd_profiles(cli: &Cli, db: &SoundboardDb) -> Result<()> {
    let profiles = db.load_profiles()?;
    let legacy_audio_actions = profiles
        .iter()
        .flat_map(|p| p.buttons())
        .flat_map(|b| b.all_actions())
        .filter(|a| a.audio_kind().is_some())
        .filter(|a| codec::detect_format(&a.configuration) == BlobFormat::Legacy)
        .count();

    let report = ProfilesReport {
        config_version: db.config_version()?,
        tree: TreeSummary::of(&profiles),
        legacy_audio_actions,
    };

    if cli.use_json() {
        return output_json(cli, &report);
    }

    println!("{} {}", style("Config version:").bold(), report.config_version);
    println!(
        "{} profiles, {} folders, {} buttons",
        report.tree.profiles, report.tree.folders, report.tree.buttons
    );
    println!(
        "{} actions, {} audio actions ({} legacy)",
        report.tree.actions, report.tree.audio_actions, report.legacy_audio_actions
    );
    Ok(())
}

// === Backups ===

fn cmd_backups(cli: &Cli, settings: &Settings) -> Result<()> {
    let backups = list_backups(&settings.backup_dir)?;

    if cli.use_json() {
        return output_json(cli, &backups);
    }
    if backups.is_empty() {
        println!("No backups in {}", settings.backup_dir.display());
    }
    for backup in &backups {
        println!(
            "{}  {}  {}",
            backup.modified.format("%Y-%m-%d %H:%M:%S"),
            backup.path.display(),
            style(format!("{} bytes", backup.size_bytes)).dim()
        );
    }
    Ok(())
}

// === Configuration ===

fn cmd_config(cli: &Cli, settings: &Settings, args: &cli::ConfigArgs) -> Result<()> {
    if args.path {
        if cli.use_json() {
            return output_json(cli, &serde_json::json!({ "path": settings.source }));
        }
        println!("{}", settings.source.display());
        return Ok(());
    }

    if cli.use_json() {
        return output_json(cli, settings);
    }

    let exists = settings.source.exists();
    println!(
        "{} {}{}",
        style("Settings:").bold(),
        settings.source.display(),
        if exists { "" } else { " (not found, using defaults)" }
    );
    println!("{} {}", style("Database:").bold(), settings.database.display());
    println!("{} {}", style("Backups:").bold(), settings.backup_dir.display());
    println!(
        "{} {} attempts, {} ms apart, on write: {}",
        style("Backup retry:").bold(),
        settings.backup.attempts,
        settings.backup.retry_delay_ms,
        settings.backup.on_write
    );
    println!(
        "{} {} attempts, {} ms apart, timeout {} ms",
        style("Download retry:").bold(),
        settings.download.attempts,
        settings.download.retry_delay_ms,
        settings.download.timeout_ms
    );
    Ok(())
}

// === Utilities ===

fn cmd_version(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        return output_json(
            cli,
            &serde_json::json!({
                "version": build_info::VERSION,
                "git_sha": build_info::git_sha(),
                "git_dirty": build_info::git_dirty() == "true",
                "build_timestamp": build_info::build_timestamp(),
                "rustc_version": build_info::rustc_semver(),
                "target": build_info::target(),
            }),
        );
    }

    println!("sb {}", build_info::VERSION);
    println!(
        "git: {}{}",
        build_info::git_sha(),
        if build_info::git_dirty() == "true" {
            " (dirty)"
        } else {
            ""
        }
    );
    println!("built: {}", build_info::build_timestamp());
    println!("rustc: {}", build_info::rustc_semver());
    println!("target: {}", build_info::target());
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(args: &cli::CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "sb", &mut io::stdout());
    Ok(())
}

// === Output Helpers ===

/// Prints a one-line confirmation, or the affected record in JSON mode.
fn report_change<T: Serialize>(cli: &Cli, what: &str, record: &T) -> Result<()> {
    if cli.use_json() {
        return output_json(cli, &serde_json::json!({ "ok": true, "result": record }));
    }
    let json = serde_json::to_string(record).with_context(|| "Failed to format result")?;
    println!("{} {}", style(what).green(), style(json).dim());
    Ok(())
}

fn output_json<T: Serialize + ?Sized>(cli: &Cli, data: &T) -> Result<()> {
    let json = if cli.use_compact_json() {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    }
    .with_context(|| "Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn output_error(cli: &Cli, error: &SbError) {
    if cli.use_json() {
        let json = serde_json::json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        });
        eprintln!("{json}");
    } else {
        eprintln!("{}: {}", style("Error").red().bold(), error);
        if let Some(suggestion) = error.suggestion() {
            eprintln!("{}: {}", style("Hint").yellow(), suggestion);
        }
    }
}
