//! Fieldmap driver
//!
//! Replays newline-delimited JSON snapshots (or synthetic ones) through the
//! pipeline with one long-lived render session. Each input line produces one
//! JSON response line on stdout; logs and the run summary go to stderr.

use fieldmap::{
    ArenaConfig, Display, LogConfig, MemoryDisplay, Pipeline, PngDisplay, RenderSession,
    RenderStatus, Response, Settings, Signals, SyntheticArena, response_for,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::time::Instant;
use tracing::{info, warn};

/// Flags that consume the following argument
const VALUE_FLAGS: [&str; 8] = [
    "--settings",
    "--synthetic",
    "--seed",
    "--zoom",
    "--sigma",
    "--output",
    "--font",
    "--panel-size",
];

const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Default)]
struct RunStats {
    requests: u64,
    errors: u64,
    rendered: u64,
    not_rendered: u64,
    render_failures: u64,
    dropped_records: u64,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    LogConfig::load_with_args(&args).init_tracing();

    let settings = Settings::parse_args(&args);
    let pipeline = match Pipeline::new(settings.pipeline_config()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let display: Box<dyn Display> = if settings.headless {
        Box::new(MemoryDisplay::new().0)
    } else {
        let path = settings.output_path.clone().unwrap_or_else(|| {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            format!("frames/fieldmap_{}.png", timestamp)
        });
        Box::new(PngDisplay::new(path))
    };
    let mut session = RenderSession::new(settings.render_options(), display);
    info!(
        session = %session.id(),
        zoom_levels = ?settings.zoom_levels,
        headless = settings.headless,
        "Fieldmap session started"
    );

    let started = Instant::now();
    let mut stats = RunStats::default();

    let source: Box<dyn Iterator<Item = Result<Signals, String>>> =
        match flag_value(&args, "--synthetic") {
            Some(count) => {
                let count: usize = count.parse().unwrap_or(100);
                let seed = flag_value(&args, "--seed")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SEED);
                let mut arena = SyntheticArena::new(seed, ArenaConfig::default());
                Box::new(arena.frames(count).into_iter().map(Ok))
            }
            None => match open_input(positional(&args)) {
                Ok(reader) => Box::new(decode_lines(reader)),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            },
        };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for item in source {
        stats.requests += 1;
        let response = match item {
            Ok(signals) => {
                let result = pipeline.process(&signals, &mut session);
                match &result {
                    Ok(outcome) => {
                        stats.dropped_records += outcome.skipped as u64;
                        match outcome.render {
                            RenderStatus::Rendered(_) => stats.rendered += 1,
                            RenderStatus::Skipped => stats.not_rendered += 1,
                            RenderStatus::Failed(_) => stats.render_failures += 1,
                        }
                    }
                    Err(_) => stats.errors += 1,
                }
                response_for(&result)
            }
            Err(message) => {
                warn!("{}", message);
                stats.errors += 1;
                Response::Error { error: message }
            }
        };

        match serde_json::to_string(&response) {
            Ok(line) => {
                if writeln!(out, "{}", line).is_err() {
                    break;
                }
            }
            Err(e) => warn!("Failed to encode response: {}", e),
        }
    }
    let _ = out.flush();
    session.teardown();

    if !settings.quiet {
        print_summary(&stats, started);
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// First argument that is neither a flag nor a flag's value
fn positional(args: &[String]) -> Option<&str> {
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        if VALUE_FLAGS.contains(&arg) {
            i += 2;
            continue;
        }
        if !arg.starts_with('-') {
            return Some(arg);
        }
        i += 1;
    }
    None
}

fn open_input(path: Option<&str>) -> Result<Box<dyn BufRead>, String> {
    match path {
        None | Some("-") => Ok(Box::new(BufReader::new(io::stdin()))),
        Some(path) => File::open(path)
            .map(|f| Box::new(BufReader::new(f)) as Box<dyn BufRead>)
            .map_err(|e| format!("Failed to open {}: {}", path, e)),
    }
}

fn decode_lines(reader: Box<dyn BufRead>) -> impl Iterator<Item = Result<Signals, String>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(
                serde_json::from_str::<Signals>(&line)
                    .map_err(|e| format!("Invalid snapshot on line {}: {}", index + 1, e)),
            ),
            Err(e) => Some(Err(format!("Failed to read line {}: {}", index + 1, e))),
        })
}

fn print_summary(stats: &RunStats, started: Instant) {
    let elapsed = started.elapsed().as_secs_f64();
    let rate = if elapsed > 0.0 {
        stats.requests as f64 / elapsed
    } else {
        0.0
    };
    eprintln!();
    eprintln!("=== Fieldmap Summary ===");
    eprintln!("Requests:         {}", stats.requests);
    eprintln!("Errors:           {}", stats.errors);
    eprintln!("Rendered:         {}", stats.rendered);
    eprintln!("No food (kept):   {}", stats.not_rendered);
    eprintln!("Render failures:  {}", stats.render_failures);
    eprintln!("Dropped records:  {}", stats.dropped_records);
    eprintln!("Elapsed:          {:.2}s ({:.1} req/s)", elapsed, rate);
}
