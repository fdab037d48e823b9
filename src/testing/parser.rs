//! TOML scenario file parsing

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::signals::Signals;

/// Complete scenario definition from a TOML file
#[derive(Debug, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub setup: ScenarioSetup,
    /// Snapshot fed to the pipeline, decoded exactly as the HTTP layer would
    #[serde(default)]
    pub signals: Signals,
    #[serde(default)]
    pub expect: ScenarioExpectations,
}

/// Pipeline and surface overrides for one scenario
#[derive(Debug, Deserialize)]
pub struct ScenarioSetup {
    pub zoom_levels: Option<Vec<f64>>,
    pub sigma: Option<f64>,
    #[serde(default)]
    pub display: DisplayKind,
    /// Feed the same snapshot this many times through one session
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

fn default_repeat() -> u32 {
    1
}

impl Default for ScenarioSetup {
    fn default() -> Self {
        Self {
            zoom_levels: None,
            sigma: None,
            display: DisplayKind::default(),
            repeat: default_repeat(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    /// In-memory surface
    #[default]
    Memory,
    /// Surface that refuses to open
    Unavailable,
}

/// Expected outcome of the last run
#[derive(Debug, Default, Deserialize)]
pub struct ScenarioExpectations {
    /// Error message returned instead of an action
    pub error: Option<String>,
    pub render: Option<ExpectedRender>,
    pub skipped: Option<usize>,
    pub observations: Option<usize>,
    /// Number of times the display was presented to
    pub presents: Option<u64>,
    #[serde(default)]
    pub panel: Vec<PanelAssertion>,
    #[serde(default)]
    pub cell: Vec<CellAssertion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedRender {
    Rendered,
    Skipped,
    Failed,
}

/// Whole-panel checks
#[derive(Debug, Clone, Deserialize)]
pub struct PanelAssertion {
    pub index: usize,
    /// `[rows, cols]`
    pub shape: Option<[usize; 2]>,
    /// Sum of the smoothed density
    pub total: Option<f64>,
    /// Cells carrying a vector
    pub vectors: Option<usize>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

/// Checks on the cell containing a player-frame point
#[derive(Debug, Clone, Deserialize)]
pub struct CellAssertion {
    pub panel: usize,
    pub x: f64,
    pub y: f64,
    pub density: Option<f64>,
    /// Expected `[u, v]`
    pub vector: Option<[f64; 2]>,
    /// true = no vector may be drawn in this cell
    pub empty: Option<bool>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    1e-6
}

/// Parse a scenario file from path
pub fn parse_scenario_file(path: &Path) -> Result<ScenarioDefinition, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}
