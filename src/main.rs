//! Realpolitik adjudicator CLI.
//!
//! Reads a JSON document from a file or stdin:
//!
//! ```json
//! { "state": <GameState, optional>, "orders": { "france": [<Order>, ...] } }
//! ```
//!
//! A missing `state` starts a standard game. The current phase is resolved
//! and `{ "state": ..., "report": ... }` is written to stdout as JSON.
//! Logs go to stderr and honor `RUST_LOG`.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use adjudicator::{AdjacencyGraph, GameConfig, GameState, Order, PhaseReport, Power};

#[derive(Parser, Debug)]
#[command(author, version, about = "Resolve one phase of a Diplomacy game", long_about = None)]
struct Args {
    /// Input document; reads stdin when omitted
    input: Option<PathBuf>,

    /// Map specification (TOML); the standard map is used when omitted
    #[arg(long)]
    map: Option<PathBuf>,

    /// Game configuration (TOML); overrides the configuration stored in the state
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Deserialize)]
struct Input {
    state: Option<GameState>,
    #[serde(default)]
    orders: BTreeMap<Power, Vec<Order>>,
}

#[derive(Serialize)]
struct Output<'a> {
    state: &'a GameState,
    report: &'a PhaseReport,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let custom_map;
    let map = match &args.map {
        Some(path) => {
            let spec = fs::read_to_string(path)
                .with_context(|| format!("reading map {}", path.display()))?;
            custom_map = AdjacencyGraph::from_toml_str(&spec)
                .with_context(|| format!("loading map {}", path.display()))?;
            &custom_map
        }
        None => AdjacencyGraph::standard(),
    };
    info!(map = map.name(), provinces = map.province_count(), "map loaded");

    let config = args
        .config
        .as_ref()
        .map(|path| {
            GameConfig::load(path).with_context(|| format!("loading config {}", path.display()))
        })
        .transpose()?;

    let raw = match &args.input {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };
    let input: Input = serde_json::from_str(&raw).context("parsing input document")?;

    let mut game = match input.state {
        Some(mut game) => {
            if let Some(config) = config {
                game.config = config;
            }
            game
        }
        None => GameState::standard(config.unwrap_or_default()),
    };
    for (power, orders) in input.orders {
        game.submit_orders(power, orders)?;
    }

    let report = game.resolve_phase(map)?;
    let output = Output {
        state: &game,
        report: &report,
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{json}");
    Ok(())
}
