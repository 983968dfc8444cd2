//! `mirror-replay`: apply a recorded event stream to a snapshot.
//!
//! Usage:
//!   mirror-replay <snapshot.json> [config.toml] < events.ndjson
//!
//! Prints the final mirror as JSON and a summary line on stderr.

use std::io::{self, Read, Write};
use std::path::Path;

use orchestrator_mirror::cli::replay;
use orchestrator_mirror::MirrorConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let snapshot_path = match args.get(1) {
        Some(p) => p.clone(),
        None => {
            eprintln!("First argument must be a snapshot JSON file.");
            std::process::exit(1);
        }
    };

    let config = match MirrorConfig::load_or_default(args.get(2).map(Path::new)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let snapshot = match std::fs::read_to_string(&snapshot_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{snapshot_path}: {e}");
            std::process::exit(1);
        }
    };

    let mut events = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut events) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let report = match replay(&config, &snapshot, &events) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let stats = &report.stats;
    eprintln!(
        "snapshots: {}, applied: {}, rejected: {}, dropped: {}",
        stats.snapshots, stats.applied, stats.rejected, stats.dropped
    );

    let Some(mirror) = report.mirror else {
        eprintln!("no snapshot installed");
        std::process::exit(1);
    };
    match serde_json::to_string_pretty(&mirror) {
        Ok(out) => {
            let mut stdout = io::stdout();
            if writeln!(stdout, "{out}").is_err() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
