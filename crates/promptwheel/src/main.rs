//! Run one selection pass over a catalog file and print the result as JSON.
//!
//! # Examples
//!
//! ```sh
//! # Select three activities for right now
//! promptwheel activities.json
//!
//! # Reproduce a past window with a recorded completion history
//! promptwheel activities.json --now 1717588800000 \
//!   --last-times history.json --pretty
//!
//! # Merge user-defined prompts over the base catalog
//! promptwheel activities.json --overlay custom.json
//!
//! # Just the window (seed, expiry, time of day)
//! promptwheel activities.json --window-only
//! ```
//!
//! Logging follows `RUST_LOG`, e.g. `RUST_LOG=promptwheel=trace` to see
//! per-condition filter decisions. Exits with code 2 on configuration
//! errors.

use chrono::{DateTime, FixedOffset, Local, TimeZone};
use clap::Parser;
use promptwheel::{Catalog, CatalogOverlay, Selector};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Deterministic prompt selection from a catalog of journaling activities.
#[derive(Parser)]
#[command(name = "promptwheel")]
struct Cli {
    /// Path to the catalog JSON document
    catalog: PathBuf,

    /// Partial catalog merged over the base (replace by id, append, or
    /// disable)
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// JSON file mapping activity id to last completion time (ms since
    /// epoch)
    #[arg(long)]
    last_times: Option<PathBuf>,

    /// Fixed wall-clock time in ms since epoch (defaults to now)
    #[arg(long)]
    now: Option<i64>,

    /// Number of top-level activities to select
    #[arg(long, default_value_t = promptwheel::DEFAULT_ACTIVITY_COUNT)]
    count: usize,

    /// Print only the selection window, without running a pass
    #[arg(long)]
    window_only: bool,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
    }
}

fn run(cli: &Cli) -> Result<String, String> {
    let raw = read(&cli.catalog)?;
    let mut catalog = Catalog::from_json_str(&raw)?;

    if let Some(path) = &cli.overlay {
        let overlay = CatalogOverlay::from_json_str(&read(path)?)?;
        catalog = catalog.merged_with(&overlay);
    }

    let selector = Selector::new(catalog)?;
    let now = resolve_now(cli.now)?;

    if cli.window_only {
        return to_json(&selector.window(&now), cli.pretty);
    }

    let last_activity_times: HashMap<String, i64> = match &cli.last_times {
        Some(path) => serde_json::from_str(&read(path)?)
            .map_err(|e| format!("invalid last-times file {}: {e}", path.display()))?,
        None => HashMap::new(),
    };

    let selection = selector.choose_n_activities(&now, &last_activity_times, cli.count)?;
    to_json(&selection, cli.pretty)
}

/// Interpret `--now` in the local timezone so time-of-day bucketing
/// matches what the user's clock shows.
fn resolve_now(now_ms: Option<i64>) -> Result<DateTime<FixedOffset>, String> {
    match now_ms {
        Some(ms) => Local
            .timestamp_millis_opt(ms)
            .single()
            .map(|dt| dt.fixed_offset())
            .ok_or_else(|| format!("--now {ms} is out of range")),
        None => Ok(Local::now().fixed_offset()),
    }
}

fn read(path: &PathBuf) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| format!("failed to serialize output: {e}"))
}
