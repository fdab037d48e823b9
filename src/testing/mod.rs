//! Scenario testing for the aggregation pipeline
//!
//! A scenario is a TOML file holding one signals snapshot, optional pipeline
//! overrides and the expected response, render status and cell values.

pub mod assertions;
pub mod parser;
pub mod runner;

use std::fs;
use std::path::{Path, PathBuf};

pub use assertions::{AssertionError, RunRecord, check_expectations};
pub use parser::{
    CellAssertion, DisplayKind, ExpectedRender, PanelAssertion, ScenarioDefinition,
    ScenarioExpectations, ScenarioSetup, parse_scenario_file,
};
pub use runner::{TestResult, run_scenario};

/// Default path for scenario files
pub const SCENARIOS_DIR: &str = "tests/scenarios";

/// All `.toml` files under `base`, sorted, whose relative path contains `filter`
pub fn discover_scenarios(base: &Path, filter: Option<&str>) -> Vec<PathBuf> {
    let mut found = Vec::new();
    discover_recursive(base, base, filter, &mut found);
    found.sort();
    found
}

fn discover_recursive(base: &Path, current: &Path, filter: Option<&str>, found: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(current) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            discover_recursive(base, &path, filter, found);
        } else if path.extension().map(|e| e == "toml").unwrap_or(false) {
            if let Some(f) = filter {
                let rel = path.strip_prefix(base).unwrap_or(&path).to_string_lossy();
                if !rel.contains(f) {
                    continue;
                }
            }
            found.push(path);
        }
    }
}
