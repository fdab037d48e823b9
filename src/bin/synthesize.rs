//! Synthetic snapshot generator
//!
//! Usage:
//!   cargo run --bin synthesize -- 500 > captures/synthetic.ndjson
//!   cargo run --bin synthesize -- 500 --seed 7 --food 1000 --enemies 10

use fieldmap::{ArenaConfig, LogConfig, SyntheticArena};
use std::io::{self, Write};
use tracing::{info, warn};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    LogConfig::load_with_args(&args).init_tracing();

    let mut count: usize = 100;
    let mut seed: u64 = 42;
    let mut config = ArenaConfig::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--seed" => {
                seed = value.and_then(|v| v.parse().ok()).unwrap_or(seed);
                i += 1;
            }
            "--food" => {
                config.food = value.and_then(|v| v.parse().ok()).unwrap_or(config.food);
                i += 1;
            }
            "--prey" => {
                config.prey = value.and_then(|v| v.parse().ok()).unwrap_or(config.prey);
                i += 1;
            }
            "--enemies" => {
                config.enemies = value.and_then(|v| v.parse().ok()).unwrap_or(config.enemies);
                i += 1;
            }
            "--radius" => {
                config.radius = value.and_then(|v| v.parse().ok()).unwrap_or(config.radius);
                i += 1;
            }
            "--help" | "-h" => {
                println!("Usage: synthesize [COUNT] [--seed N] [--food N] [--prey N] [--enemies N] [--radius R]");
                return;
            }
            other => {
                if let Ok(n) = other.parse() {
                    count = n;
                }
            }
        }
        i += 1;
    }

    info!(count, seed, "Generating synthetic snapshots");
    let mut arena = SyntheticArena::new(seed, config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for _ in 0..count {
        let signals = arena.step();
        match serde_json::to_string(&signals) {
            Ok(line) => {
                if writeln!(out, "{}", line).is_err() {
                    break;
                }
            }
            Err(e) => warn!("Failed to encode snapshot: {}", e),
        }
    }
    let _ = out.flush();
}
