//! Shipyard mod CLI
//!
//! Entry point for the `shipyard` command-line tool.

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shipyard_mods::base::BaseDataset;
use shipyard_mods::bundle;
use shipyard_mods::config::{AppSettings, ConfigError, ConfigOrigin, EffectiveConfig};
use shipyard_mods::grid::{diff_against_base, DiffStatus, DiffSummary};
use shipyard_mods::merge::{Provenance, RuleSource};
use shipyard_mods::row::section_rows;
use shipyard_mods::ruleset::{EffectiveData, Ruleset};
use shipyard_mods::store::{Direction, ModManifest, ModStore};
use shipyard_mods::validation::validate_section;
use shipyard_schema::MergeMode;

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(about = "Manage and inspect starship data mods", version)]
struct Cli {
    /// Path to config file (default: ~/.config/shipyard/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Mods directory (overrides config)
    #[arg(long, global = true)]
    mods_dir: Option<PathBuf>,

    /// Base data directory (overrides config)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MoveArg {
    Up,
    Down,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Add,
    Replace,
    /// Remove the override and use the section default
    Default,
}

#[derive(Clone, Copy, ValueEnum)]
enum RuleArg {
    On,
    Off,
    Unset,
}

#[derive(Subcommand)]
enum Commands {
    /// List mods in load order
    List {
        #[arg(long)]
        json: bool,
    },

    /// Create an empty mod
    Create {
        name: String,

        #[arg(long, default_value = "")]
        author: String,

        #[arg(long, default_value = "1.0.0")]
        version: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Delete a mod folder (irreversible)
    Delete { folder: String },

    /// Enable a mod
    Enable { folder: String },

    /// Disable a mod
    Disable { folder: String },

    /// Move a mod one step in load order (up = higher priority)
    Move { folder: String, direction: MoveArg },

    /// Set a mod's merge mode for one section root key
    SetMode {
        folder: String,
        root_key: String,
        mode: ModeArg,
    },

    /// List known sections and house rules
    Sections {
        #[arg(long)]
        json: bool,
    },

    /// Print the effective rows of a section
    Resolve {
        section: String,

        #[arg(long)]
        json: bool,
    },

    /// Show resolved house rules, or set one for a mod
    Rule {
        /// Rule id (all rules when omitted)
        rule: Option<String>,

        /// Mod to change
        #[arg(long = "mod", requires = "set")]
        folder: Option<String>,

        /// New value for the mod
        #[arg(long, requires = "folder")]
        set: Option<RuleArg>,

        #[arg(long)]
        json: bool,
    },

    /// Validate a mod's data
    Validate { folder: String },

    /// Compare a mod's rows with the base data
    Diff {
        folder: String,
        section: String,

        #[arg(long)]
        json: bool,
    },

    /// Export a mod as a .shipmod bundle
    Export {
        folder: String,

        /// Output directory
        #[arg(long, short = 'o', default_value = ".")]
        out: PathBuf,
    },

    /// Install a .shipmod bundle as a new mod
    Import { path: PathBuf },

    /// Show the effective configuration and where it came from
    Config {
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };
    let settings = match config.settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli.command, &config, &settings) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<EffectiveConfig, ConfigError> {
    let mut overrides = Map::new();
    if let Some(ref dir) = cli.mods_dir {
        overrides.insert("mods_dir".into(), json!(dir.to_string_lossy()));
    }
    if let Some(ref dir) = cli.base_dir {
        overrides.insert("base_dir".into(), json!(dir.to_string_lossy()));
    }
    let user_path = cli.config.clone().or_else(EffectiveConfig::default_user_path);
    let overrides = (!overrides.is_empty()).then_some(Value::Object(overrides));

    EffectiveConfig::build(user_path.as_deref(), overrides)
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn run(command: Commands, config: &EffectiveConfig, settings: &AppSettings) -> CliResult {
    if let Commands::Config { json } = command {
        return run_config(config, json);
    }
    let mut store = ModStore::open(&settings.mods_dir)?;

    match command {
        Commands::List { json } => run_list(&store, json),
        Commands::Create {
            name,
            author,
            version,
            description,
        } => {
            let manifest = ModManifest::new(name)
                .with_author(author)
                .with_version(version)
                .with_description(description);
            let folder = store.create_mod(&manifest)?;
            println!("Created mod '{}' in {}", manifest.name, store.root().join(&folder).display());
            Ok(())
        }
        Commands::Delete { folder } => {
            store.delete_mod(&folder)?;
            println!("Deleted {}", folder);
            Ok(())
        }
        Commands::Enable { folder } => {
            store.set_enabled(&folder, true)?;
            println!("Enabled {}", folder);
            Ok(())
        }
        Commands::Disable { folder } => {
            store.set_enabled(&folder, false)?;
            println!("Disabled {}", folder);
            Ok(())
        }
        Commands::Move { folder, direction } => {
            let direction = match direction {
                MoveArg::Up => Direction::Up,
                MoveArg::Down => Direction::Down,
            };
            if store.reorder(&folder, direction)? {
                println!("Moved {}", folder);
            } else {
                println!("{} is already at the boundary", folder);
            }
            Ok(())
        }
        Commands::SetMode {
            folder,
            root_key,
            mode,
        } => {
            let mode = match mode {
                ModeArg::Add => Some(MergeMode::Add),
                ModeArg::Replace => Some(MergeMode::Replace),
                ModeArg::Default => None,
            };
            if shipyard_schema::sections().iter().all(|s| s.root_key != root_key) {
                return Err(format!("unknown root key '{}'", root_key).into());
            }
            store.set_merge_mode(&folder, &root_key, mode)?;
            println!("Updated merge mode of {} for {}", folder, root_key);
            Ok(())
        }
        Commands::Sections { json } => run_sections(json),
        Commands::Resolve { section, json } => {
            let ruleset = Ruleset::load(&store, &settings.base_dir)?;
            run_resolve(&ruleset, &section, json)
        }
        Commands::Rule {
            rule,
            folder,
            set,
            json,
        } => {
            if let (Some(folder), Some(set), Some(rule_id)) = (folder, set, rule.as_deref()) {
                let rule = shipyard_schema::house_rule(rule_id)
                    .ok_or_else(|| format!("unknown house rule '{}'", rule_id))?;
                let value = match set {
                    RuleArg::On => Some(true),
                    RuleArg::Off => Some(false),
                    RuleArg::Unset => None,
                };
                store.set_house_rule(&folder, rule, value)?;
            }
            let ruleset = Ruleset::load(&store, &settings.base_dir)?;
            run_rules(&ruleset, rule.as_deref(), json)
        }
        Commands::Validate { folder } => run_validate(&store, &folder),
        Commands::Diff {
            folder,
            section,
            json,
        } => run_diff(&store, &settings.base_dir, &folder, &section, json),
        Commands::Export { folder, out } => {
            let path = bundle::export_to_dir(&store, &folder, &out)?;
            println!("Exported {} to {}", folder, path.display());
            Ok(())
        }
        Commands::Import { path } => {
            let imported = bundle::import_file(&mut store, &path)?;
            println!(
                "Imported '{}' as {} ({} files)",
                imported.manifest.name, imported.folder_id, imported.files
            );
            Ok(())
        }
        Commands::Config { json } => run_config(config, json),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_config(config: &EffectiveConfig, json_output: bool) -> CliResult {
    if json_output {
        return print_json(config);
    }
    println!("{}", serde_json::to_string_pretty(&config.config)?);
    println!("\nSources (lowest precedence first):");
    for source in &config.sources {
        let origin = match source.origin {
            ConfigOrigin::Builtin => "builtin",
            ConfigOrigin::User => "user",
            ConfigOrigin::Cli => "cli",
        };
        match (&source.path, &source.digest) {
            (Some(path), Some(digest)) => println!("  {:<8} {} (sha256 {})", origin, path, digest),
            _ => println!("  {}", origin),
        }
    }
    Ok(())
}

fn run_list(store: &ModStore, json_output: bool) -> CliResult {
    let mods = store.list_mods()?;
    if json_output {
        return print_json(&mods);
    }
    if mods.is_empty() {
        println!("No mods installed in {}.", store.root().display());
        return Ok(());
    }

    println!("Mods in load order ({} total, last wins):\n", mods.len());
    for m in &mods {
        let state = if m.enabled { "on " } else { "off" };
        println!(
            "  [{}] {:>3}  {} ({} v{})",
            state, m.priority, m.folder_id, m.manifest.name, m.manifest.version
        );
        if !m.files_present.is_empty() {
            let files: Vec<_> = m.files_present.iter().map(String::as_str).collect();
            println!("             files: {}", files.join(", "));
        }
        if !m.manifest.file_modes.is_empty() {
            let modes: Vec<_> = m
                .manifest
                .file_modes
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            println!("             modes: {}", modes.join(", "));
        }
    }
    Ok(())
}

fn run_sections(json_output: bool) -> CliResult {
    if json_output {
        return print_json(&json!({
            "sections": shipyard_schema::sections(),
            "houseRules": shipyard_schema::house_rules(),
        }));
    }
    println!("Sections:");
    for s in shipyard_schema::sections() {
        println!(
            "  {:<16} {}.json#{} ({:?}, default {})",
            s.id, s.file_id, s.root_key, s.shape, s.default_merge_mode
        );
    }
    println!("\nHouse rules:");
    for r in shipyard_schema::house_rules() {
        println!(
            "  {:<20} {}.json#{} (default {})",
            r.id, r.file_id, r.json_key, r.default_value
        );
    }
    Ok(())
}

fn run_resolve(ruleset: &Ruleset, section: &str, json_output: bool) -> CliResult {
    let effective = ruleset.effective_section(section)?;
    if json_output {
        return print_json(&effective);
    }
    println!("{} ({} rows)\n", effective.section_id, effective.len());
    for resolved in &effective.rows {
        let source = match &resolved.provenance {
            Provenance::Base => "base".to_string(),
            Provenance::Mod { folder_id } => format!("mod:{}", folder_id),
        };
        println!(
            "  {:<24} {}",
            resolved.id().unwrap_or_else(|| "-".to_string()),
            source
        );
    }
    Ok(())
}

fn run_rules(ruleset: &Ruleset, rule: Option<&str>, json_output: bool) -> CliResult {
    let rules = match rule {
        Some(id) => vec![ruleset.explain_house_rule(id)?],
        None => ruleset.house_rules(),
    };
    if json_output {
        return print_json(&rules);
    }
    for r in &rules {
        let source = match &r.source {
            RuleSource::Default => "default".to_string(),
            RuleSource::Mod { folder_id } => format!("mod:{}", folder_id),
        };
        println!("  {:<20} {:<5} ({})", r.rule_id, r.value, source);
    }
    Ok(())
}

fn run_validate(store: &ModStore, folder: &str) -> CliResult {
    let entry = store.get(folder)?;
    let mut problems = 0;
    for file_id in &entry.files_present {
        let Some(file) = store.read_section(folder, file_id)? else {
            continue;
        };
        for schema in shipyard_schema::sections_for_file(file_id) {
            let Some(rows) = section_rows(schema, &file) else {
                continue;
            };
            for error in validate_section(schema, &rows) {
                println!("  {}: {}", schema.id, error);
                problems += 1;
            }
        }
    }
    if problems > 0 {
        return Err(format!("{} problem(s) found in {}", problems, folder).into());
    }
    println!("{} is valid", folder);
    Ok(())
}

fn run_diff(store: &ModStore, base_dir: &Path, folder: &str, section: &str, json_output: bool) -> CliResult {
    let schema = shipyard_schema::section(section)
        .ok_or_else(|| format!("unknown section '{}'", section))?;
    let base = BaseDataset::load(base_dir)?;
    let rows = store
        .read_section(folder, schema.file_id)?
        .and_then(|file| section_rows(schema, &file))
        .unwrap_or_default();

    let diffs = diff_against_base(schema, &rows, &base.rows(schema));
    if json_output {
        return print_json(&diffs);
    }
    for d in &diffs {
        let id = d.id.clone().unwrap_or_else(|| format!("#{}", d.index + 1));
        match &d.status {
            DiffStatus::Added => println!("  + {}", id),
            DiffStatus::Modified { fields } => println!("  ~ {} ({})", id, fields.join(", ")),
            DiffStatus::Unchanged => println!("  = {}", id),
        }
    }
    let summary = DiffSummary::of(&diffs);
    println!(
        "\n{} added, {} modified, {} unchanged",
        summary.added, summary.modified, summary.unchanged
    );
    Ok(())
}
