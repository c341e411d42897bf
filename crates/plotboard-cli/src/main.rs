//! Plotboard command-line tool: check, normalize and list scene files.

use clap::{Parser, Subcommand};
use plotboard_core::blocks::{ensure_template, required_body_block_id};
use plotboard_core::{
    ConfigError, ElementId, ElementKind, EngineConfig, FileStore, MappedScene, Scene, SceneError,
    SceneStore, StorageError,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a scene file and print a summary
    Check { file: PathBuf },
    /// Rewrite a scene file in canonical form
    Normalize {
        file: PathBuf,
        /// Write here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the scenes in a store directory
    List {
        /// Store directory (defaults to the platform data directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid scene {path}: {source}")]
    Scene { path: String, source: SceneError },
    #[error("Failed to encode scene: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Counts reported by `check`.
#[derive(Debug, Default, PartialEq)]
struct Summary {
    elements: BTreeMap<&'static str, usize>,
    relations: BTreeMap<&'static str, usize>,
    ambiguous_cards: Vec<ElementId>,
    inline_payload_bytes: usize,
}

fn summarize(scene: &Scene) -> Summary {
    let mut summary = Summary {
        inline_payload_bytes: scene.inline_payload_bytes(),
        ..Summary::default()
    };
    for element in &scene.elements {
        *summary.elements.entry(element.kind.name()).or_default() += 1;
        if element.kind == ElementKind::Card {
            let template = ensure_template(element.template.clone().unwrap_or_default());
            if required_body_block_id(&template).is_none() {
                summary.ambiguous_cards.push(element.id.clone());
            }
        }
    }
    for relation in &scene.relations {
        *summary.relations.entry(relation.kind.as_str()).or_default() += 1;
    }
    summary
}

fn read_scene(path: &Path) -> Result<Scene, CliError> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let scene_error = |source| CliError::Scene {
        path: path.display().to_string(),
        source,
    };
    let scene = Scene::from_json(&json).map_err(scene_error)?;
    scene.validate().map_err(scene_error)?;
    Ok(scene)
}

fn check(path: &Path, config: &EngineConfig) -> Result<(), CliError> {
    let scene = read_scene(path)?;
    let summary = summarize(&scene);

    println!("{}: version {}", path.display(), scene.version);
    println!("elements: {}", scene.elements.len());
    for (kind, count) in &summary.elements {
        println!("  {kind}: {count}");
    }
    println!("relations: {}", scene.relations.len());
    for (kind, count) in &summary.relations {
        println!("  {kind}: {count}");
    }
    for id in &summary.ambiguous_cards {
        println!("card {id} has no single required body block");
    }
    println!("inline payload: {} bytes", summary.inline_payload_bytes);
    if summary.inline_payload_bytes > config.max_inline_payload_bytes {
        log::warn!(
            "Inline payload exceeds the {} byte bound",
            config.max_inline_payload_bytes
        );
    }
    Ok(())
}

fn normalize(path: &Path, output: Option<&Path>) -> Result<(), CliError> {
    let scene = read_scene(path)?;
    let normalized = MappedScene::from_scene(&scene).to_scene();
    let json = normalized.to_json()?;

    let target = output.unwrap_or(path);
    std::fs::write(target, json).map_err(|source| CliError::Write {
        path: target.display().to_string(),
        source,
    })?;
    log::info!(
        "Wrote {} elements and {} relations to {}",
        normalized.elements.len(),
        normalized.relations.len(),
        target.display()
    );
    Ok(())
}

fn list(dir: Option<PathBuf>) -> Result<(), CliError> {
    let store = match dir {
        Some(dir) => FileStore::new(dir)?,
        None => FileStore::default_location()?,
    };
    log::debug!("Listing scenes in {}", store.base_path().display());
    for id in pollster::block_on(store.list())? {
        println!("{id}");
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    match cli.command {
        Command::Check { file } => check(&file, &config),
        Command::Normalize { file, output } => normalize(&file, output.as_deref()),
        Command::List { dir } => list(dir),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("Parsed arguments: {:?}", cli);

    if let Err(e) = run(cli) {
        log::error!("{e}");
        process::exit(1);
    }
}
