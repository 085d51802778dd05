//! `evacd` — evacuation routing from the command line.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use evac_cli::config::MirrorConfig;
use evac_cli::{Config, JsonLinesNotifier, logging, replay};
use evac_coord::EvacServiceBuilder;
use evac_registry::StateMirror;
use evac_spatial::{AStarRouter, load_graph_csv};

/// Evacuation routing engine
#[derive(Parser, Debug)]
#[command(name = "evacd", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shortest route between two waypoints
    Route {
        start: String,
        goal:  String,
        /// Waypoint to treat as blocked (repeatable)
        #[arg(long = "exclude")]
        exclude: Vec<String>,
    },
    /// Turn-by-turn directions between two waypoints
    Directions { start: String, goal: String },
    /// Exits reachable from a waypoint, best first
    BestExit { from: String },
    /// Replay a JSON-lines session script
    Replay { script: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loaded = Config::load(args.config.as_deref())?;
    logging::init(&loaded.config.logging);
    match &loaded.fallback {
        None    => info!(path = %loaded.source.display(), "config_loaded"),
        Some(e) => warn!(path = %loaded.source.display(), error = %format!("{e:#}"), "config_defaults_used"),
    }
    let config = loaded.config;

    let graph = load_graph_csv(&config.map.waypoints, &config.map.edges).with_context(|| {
        format!(
            "failed to load map from {} and {}",
            config.map.waypoints.display(),
            config.map.edges.display()
        )
    })?;

    let mut builder = EvacServiceBuilder::new(graph, AStarRouter)
        .config(config.engine.clone())
        .notifier(Arc::new(JsonLinesNotifier::new(io::stdout())));
    if let Some(mirror) = open_mirror(&config.mirror)? {
        builder = builder.mirror(mirror);
    }
    let service = builder.build().context("invalid [engine] configuration")?;

    match args.command {
        Command::Route { start, goal, exclude } => print_json(&service.test_route(&start, &goal, &exclude)?),
        Command::Directions { start, goal }     => print_json(&service.directions(&start, &goal)?),
        Command::BestExit { from }              => print_json(&service.ranked_exits(&from)?),
        Command::Replay { script } => {
            let file = File::open(&script)
                .with_context(|| format!("failed to open script {}", script.display()))?;
            replay(&service, BufReader::new(file))?;
            print_json(&service.stats())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(feature = "sqlite")]
fn open_mirror(config: &MirrorConfig) -> anyhow::Result<Option<Arc<dyn StateMirror>>> {
    let Some(path) = &config.sqlite else {
        return Ok(None);
    };
    let mirror = evac_registry::SqliteMirror::open(path)
        .with_context(|| format!("failed to open mirror database {}", path.display()))?;
    info!(path = %path.display(), "mirror_opened");
    Ok(Some(Arc::new(mirror)))
}

#[cfg(not(feature = "sqlite"))]
fn open_mirror(config: &MirrorConfig) -> anyhow::Result<Option<Arc<dyn StateMirror>>> {
    if let Some(path) = &config.sqlite {
        warn!(path = %path.display(), "mirror_unavailable_without_sqlite_feature");
    }
    Ok(None)
}
