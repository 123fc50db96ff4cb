//! atfm - keep a scene's texture and cache files inside its project.
//!
//! Usage:
//!   atfm status                 Show existing, missing and in-place files
//!   atfm copy [IDS]...          Copy files into the source-images folder
//!   atfm move [IDS]...          Move files into the source-images folder
//!   atfm search --root <DIR>    Look for missing files on disk
//!   atfm types list             Show registered node types
//!   atfm --help                 Show help

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use atfm_core::{EngineConfig, LocationMatch, NodeId, TypeRegistry, REGISTRY_FILE_NAME};
use atfm_engine::{
    ConflictDialog, ManifestScene, ReconciliationEngine, Snapshot, TypeFilter, UserPrompt,
};
use atfm_ops::{ConflictPrompt, ConflictResolution, PolicyPrompt, TransferMode, TransferReport};

#[derive(Parser)]
#[command(
    name = "atfm",
    version,
    about = "Reconcile a scene's file references with its project folders",
    long_about = "atfm finds the textures and caches a scene references, tells you which \
                  exist and which already live in the project, and copies or moves them \
                  into the project's source-images folder while updating the scene."
)]
struct Cli {
    /// Scene manifest (JSON)
    #[arg(short, long, global = true, default_value = "scene.json")]
    scene: PathBuf,

    /// Node type registry (defaults to atfm_types.json next to the scene)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Only consider these node types
    #[arg(long, global = true, value_delimiter = ',', conflicts_with = "textures_only")]
    types: Vec<String>,

    /// Only consider node types stored in the source-images folder
    #[arg(long, global = true)]
    textures_only: bool,

    /// How files already inside a project folder are detected
    #[arg(long, global = true, default_value = "segment")]
    location_match: LocationMatch,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show existing, missing and in-place references
    Status {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Copy referenced files into the source-images folder
    Copy(TransferArgs),

    /// Move referenced files into the source-images folder
    Move(TransferArgs),

    /// Search drives for missing files and repoint their nodes
    Search {
        /// Folder to search (repeatable)
        #[arg(long = "root", required = true)]
        roots: Vec<PathBuf>,

        /// Do not ask before searching
        #[arg(short, long)]
        yes: bool,

        /// What to do with found files
        #[arg(long)]
        then: Option<FollowUp>,

        #[command(flatten)]
        transfer: TransferArgs,
    },

    /// Manage the node type registry
    Types {
        #[command(subcommand)]
        action: TypesAction,
    },

    /// List the project's top-level folders
    Folders,
}

#[derive(Args)]
struct TransferArgs {
    /// Node ids to act on (defaults to all)
    ids: Vec<String>,

    /// Recreate subfolders found below the source-images folder
    #[arg(long)]
    keep_subfolders: bool,

    /// Leave scene references unchanged
    #[arg(long)]
    no_update: bool,

    /// Resolve name conflicts without asking (overwrite, use-latest, use-largest, skip)
    #[arg(long)]
    on_conflict: Option<ConflictResolution>,
}

#[derive(Subcommand)]
enum TypesAction {
    /// Show registered node types
    List,

    /// Register a node type
    Add {
        /// Node type
        name: String,
        /// Attribute holding the file path
        attribute: String,
        /// Project folder files of this type belong in
        directory: String,
    },

    /// Unregister a node type
    Remove {
        /// Node type
        name: String,
    },

    /// Write the built-in registry
    Init {
        /// Replace an existing registry
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FollowUp {
    Copy,
    Move,
    None,
}

impl FollowUp {
    fn label(self) -> &'static str {
        match self {
            Self::Copy => "Copy",
            Self::Move => "Move",
            Self::None => "No Thanks",
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Status { format } => run_status(&cli, *format)?,
        Command::Copy(args) => run_transfer(&cli, args, TransferMode::Copy)?,
        Command::Move(args) => run_transfer(&cli, args, TransferMode::Move)?,
        Command::Search {
            roots,
            yes,
            then,
            transfer,
        } => run_search(&cli, roots, *yes, *then, transfer)?,
        Command::Types { action } => run_types(&cli, action)?,
        Command::Folders => run_folders(&cli)?,
    }

    Ok(())
}

/// Registry file named on the command line, or found next to the scene.
fn registry_path(cli: &Cli) -> Option<PathBuf> {
    if cli.registry.is_some() {
        return cli.registry.clone();
    }
    let scene_dir = cli
        .scene
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    TypeRegistry::discover([scene_dir, Path::new(".")])
}

fn type_filter(cli: &Cli) -> TypeFilter {
    if !cli.types.is_empty() {
        TypeFilter::Only(cli.types.clone())
    } else if cli.textures_only {
        TypeFilter::TexturesOnly
    } else {
        TypeFilter::All
    }
}

fn open_engine(
    cli: &Cli,
    args: Option<&TransferArgs>,
) -> Result<ReconciliationEngine<ManifestScene>> {
    let scene = ManifestScene::load(&cli.scene)
        .with_context(|| format!("Cannot open scene {}", cli.scene.display()))?;

    let config = EngineConfig::builder()
        .location_match(cli.location_match)
        .preserve_subfolders(args.is_some_and(|a| a.keep_subfolders))
        .update_references(!args.is_some_and(|a| a.no_update))
        .registry_path(registry_path(cli))
        .build()?;

    if config.registry_path.is_none() {
        tracing::info!("no {REGISTRY_FILE_NAME} found, using built-in node types");
    }

    Ok(ReconciliationEngine::from_config(scene, config))
}

fn node_ids(ids: &[String]) -> Vec<NodeId> {
    ids.iter().map(NodeId::new).collect()
}

/// Show the classified references.
fn run_status(cli: &Cli, format: OutputFormat) -> Result<()> {
    let engine = open_engine(cli, None)?;
    let snapshot = engine.refresh(&type_filter(cli))?;

    match format {
        OutputFormat::Text => print_snapshot(&snapshot),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
    }

    Ok(())
}

/// Copy or move references into the source-images folder.
fn run_transfer(cli: &Cli, args: &TransferArgs, mode: TransferMode) -> Result<()> {
    let mut engine = open_engine(cli, Some(args))?;
    let snapshot = engine.refresh(&type_filter(cli))?;

    let mut terminal = TerminalPrompt::default();
    let mut policy;
    let mut dialog;
    let prompt: &mut dyn ConflictPrompt = match args.on_conflict {
        Some(resolution) => {
            policy = PolicyPrompt(resolution);
            &mut policy
        }
        None => {
            dialog = ConflictDialog::new(&mut terminal);
            &mut dialog
        }
    };

    let (report, after) = engine.transfer(&snapshot, &node_ids(&args.ids), mode, prompt)?;
    print_report(&report);
    eprintln!(
        " {} missing, {} in place",
        after.classification.missing.len(),
        after.classification.in_place.len()
    );

    if report.is_success() {
        Ok(())
    } else {
        Err(eyre!("{} file(s) failed", report.failed))
    }
}

/// Search for missing files, optionally bringing them into the project.
fn run_search(
    cli: &Cli,
    roots: &[PathBuf],
    yes: bool,
    then: Option<FollowUp>,
    args: &TransferArgs,
) -> Result<()> {
    let mut engine = open_engine(cli, Some(args))?;
    let snapshot = engine.refresh(&type_filter(cli))?;

    let mut presets = Vec::new();
    if yes {
        presets.push("Yes!".to_string());
    }
    if let Some(then) = then {
        presets.push(then.label().to_string());
    }
    if let Some(resolution) = args.on_conflict {
        presets.push(resolution.to_string());
    }
    let mut prompt = TerminalPrompt { presets };

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Cancelling search...");
                cancel.cancel();
            }
        })
    };

    let result = tokio::task::block_in_place(|| {
        engine.search_missing(&snapshot, &node_ids(&args.ids), roots, &mut prompt, &cancel)
    });
    watcher.abort();
    let report = result?;

    if !report.confirmed {
        eprintln!("Search not started.");
        return Ok(());
    }

    if let Some(outcome) = &report.outcome {
        println!(" {}", outcome.summary());
        for (id, path) in &outcome.found {
            println!("   {:<24} {path}", id.as_str());
        }
        for id in &outcome.not_found {
            println!("   {:<24} (not found)", id.as_str());
        }
    }
    for error in &report.errors {
        println!("   {error}");
    }
    if let Some(transfer) = &report.transfer {
        print_report(transfer);
    }

    Ok(())
}

/// Inspect or edit the node type registry.
fn run_types(cli: &Cli, action: &TypesAction) -> Result<()> {
    let path = cli
        .registry
        .clone()
        .or_else(|| registry_path(cli))
        .unwrap_or_else(|| PathBuf::from(REGISTRY_FILE_NAME));

    match action {
        TypesAction::List => {
            let registry = if path.is_file() {
                TypeRegistry::load(&path)?
            } else {
                eprintln!("No registry at {}, showing built-in types", path.display());
                TypeRegistry::with_defaults()
            };
            println!(" {:<20} {:<20} Folder", "Type", "Attribute");
            println!("{}", "─".repeat(60));
            for (name, entry) in registry.iter() {
                println!(
                    " {:<20} {:<20} {}",
                    name, entry.attribute, entry.default_directory
                );
            }
        }
        TypesAction::Add {
            name,
            attribute,
            directory,
        } => {
            let mut registry = TypeRegistry::load(&path).with_context(|| {
                format!("Run `atfm types init` to create {}", path.display())
            })?;
            registry.add(name.as_str(), attribute.as_str(), directory.as_str())?;
            println!("Added {name} to {}", path.display());
        }
        TypesAction::Remove { name } => {
            let mut registry = TypeRegistry::load(&path)?;
            registry.remove(name)?;
            println!("Removed {name} from {}", path.display());
        }
        TypesAction::Init { force } => {
            if path.exists() && !force {
                return Err(eyre!(
                    "{} already exists (use --force to replace it)",
                    path.display()
                ));
            }
            let registry = TypeRegistry::create_default(&path)?;
            println!("Wrote {} node types to {}", registry.len(), path.display());
        }
    }

    Ok(())
}

/// List the project's top-level folders.
fn run_folders(cli: &Cli) -> Result<()> {
    let engine = open_engine(cli, None)?;
    let source = engine.source_images_folder().ok();
    for folder in engine.project_folders()? {
        let marker = if source.as_deref() == Some(folder.trim_start_matches('/')) {
            "  (source images)"
        } else {
            ""
        };
        println!("{folder}{marker}");
    }
    Ok(())
}

/// Print a snapshot as tables.
fn print_snapshot(snapshot: &Snapshot) {
    let classification = &snapshot.classification;

    println!();
    println!("{}", "─".repeat(70));
    println!(" Source images: {}", snapshot.source_root);
    println!(
        " {} references, {} existing, {} missing, {} in place",
        snapshot.references.len(),
        classification.existing.len(),
        classification.missing.len(),
        classification.in_place.len()
    );
    println!("{}", "─".repeat(70));

    if !classification.existing.is_empty() {
        println!();
        println!(" Existing:");
        for (id, path) in &classification.existing {
            let metadata = std::fs::metadata(path).ok();
            let size = metadata.as_ref().map(|m| m.len()).unwrap_or(0);
            let modified = metadata
                .and_then(|m| m.modified().ok())
                .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            let marker = if classification.is_in_place(id) { "*" } else { " " };
            println!(
                " {marker} {:<24} {:>10}  {:<16}  {}",
                truncate(id.as_str(), 24),
                format_size(size),
                modified,
                path
            );
        }
    }

    if !classification.missing.is_empty() {
        println!();
        println!(" Missing:");
        for (id, path) in &classification.missing {
            println!("   {:<24} {}", truncate(id.as_str(), 24), path);
        }
    }

    let ambiguous: Vec<_> = classification.ambiguous().collect();
    if !ambiguous.is_empty() {
        println!();
        println!(" Partially present sequences:");
        for (id, status) in ambiguous {
            println!("   {:<24} {status}", truncate(id.as_str(), 24));
        }
    }

    println!();
    println!(" * already in place");
}

fn print_report(report: &TransferReport) {
    println!(
        " {} ({})",
        report.summary(),
        format_size(report.bytes_processed)
    );
    for error in &report.errors {
        println!("   {error}");
    }
}

/// Asks on the terminal unless one of `presets` is among the choices.
#[derive(Default)]
struct TerminalPrompt {
    presets: Vec<String>,
}

impl UserPrompt for TerminalPrompt {
    fn choose(&mut self, message: &str, choices: &[&str], default: &str) -> Option<String> {
        if let Some(preset) = choices.iter().find(|c| self.presets.iter().any(|p| p == *c)) {
            return Some(preset.to_string());
        }

        let mut stderr = io::stderr();
        let _ = writeln!(stderr, "{message}");
        for (i, choice) in choices.iter().enumerate() {
            let marker = if *choice == default { " (default)" } else { "" };
            let _ = writeln!(stderr, "  {}) {choice}{marker}", i + 1);
        }
        let _ = write!(stderr, "> ");
        let _ = stderr.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
        let answer = line.trim();
        if answer.is_empty() {
            return Some(default.to_string());
        }
        if let Ok(n) = answer.parse::<usize>() {
            return choices.get(n.wrapping_sub(1)).map(|c| c.to_string());
        }
        choices
            .iter()
            .find(|c| c.eq_ignore_ascii_case(answer))
            .map(|c| c.to_string())
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 1).collect();
        format!("{head}…")
    }
}
