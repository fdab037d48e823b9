//! Scenario test runner CLI
//!
//! Usage:
//!   cargo run --bin test-scenarios              # Run all scenarios
//!   cargo run --bin test-scenarios -- vectors/  # Run category
//!   cargo run --bin test-scenarios -- session/display_offline  # Run one
//!   cargo run --bin test-scenarios -- --verbose # Show details on failure

use std::env;
use std::path::Path;

use fieldmap::LogConfig;
use fieldmap::testing::{
    SCENARIOS_DIR, TestResult, discover_scenarios, parse_scenario_file, run_scenario,
};

fn main() {
    let args: Vec<String> = env::args().collect();
    LogConfig::load_with_args(&args).init_tracing();

    let mut verbose = false;
    let mut filter: Option<String> = None;

    for arg in &args[1..] {
        if arg == "--verbose" || arg == "-v" {
            verbose = true;
        } else if !arg.starts_with('-') {
            filter = Some(arg.clone());
        }
    }

    println!("Scenario Tests");
    println!("==============\n");

    let scenarios_path = Path::new(SCENARIOS_DIR);
    if !scenarios_path.exists() {
        println!("No scenarios directory found at {}", SCENARIOS_DIR);
        std::process::exit(1);
    }

    let scenarios = discover_scenarios(scenarios_path, filter.as_deref());
    if scenarios.is_empty() {
        println!("No scenario files found.");
        if let Some(f) = filter {
            println!("Filter: {}", f);
        }
        std::process::exit(1);
    }

    let mut passed = 0;
    let mut failed = 0;
    let mut errors = 0;
    let mut current_category = String::new();

    for path in &scenarios {
        let rel_path = path.strip_prefix(scenarios_path).unwrap_or(path);

        if let Some(parent) = rel_path.parent() {
            let category = parent.to_string_lossy().to_string();
            if category != current_category && !category.is_empty() {
                if !current_category.is_empty() {
                    println!();
                }
                println!("{}/", category);
                current_category = category;
            }
        }

        let name = rel_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let result = match parse_scenario_file(path) {
            Ok(def) => {
                if verbose && let Some(description) = &def.description {
                    println!("  # {}", description);
                }
                run_scenario(&def)
            }
            Err(message) => TestResult::Error { message },
        };

        match &result {
            TestResult::Pass { .. } => passed += 1,
            TestResult::Fail { .. } => failed += 1,
            TestResult::Error { .. } => errors += 1,
        }
        print_result(&name, &result, verbose);
    }

    println!("\n==============");
    println!("Results: {} passed, {} failed, {} errors", passed, failed, errors);

    if failed > 0 || errors > 0 {
        std::process::exit(1);
    }
}

fn print_result(name: &str, result: &TestResult, verbose: bool) {
    let dots = ".".repeat(40 - name.len().min(39));

    match result {
        TestResult::Pass { checks } => {
            println!("  {} {} PASS ({} checks)", name, dots, checks);
        }
        TestResult::Fail { error } => {
            println!("  {} {} FAIL", name, dots);
            if verbose {
                println!("    {}", error);
            } else {
                println!("    {}", error.message);
            }
        }
        TestResult::Error { message } => {
            println!("  {} {} ERROR", name, dots);
            println!("    {}", message);
        }
    }
}
