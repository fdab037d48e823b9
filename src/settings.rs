//! Runtime settings for the fieldmap binaries
//!
//! Loaded from JSON, then overridden from the command line.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::*;
use crate::field::{VectorRules, WeightRules};
use crate::pipeline::PipelineConfig;
use crate::render::RenderOptions;

/// Template settings (checked into git)
pub const SETTINGS_TEMPLATE: &str = "config/fieldmap_settings.template.json";
/// Local settings (gitignored, user's custom settings)
pub const SETTINGS_FILE: &str = "config/fieldmap_settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Half-extent of each panel, one panel per entry
    pub zoom_levels: Vec<f64>,
    pub density_factor: f64,
    pub smoothing_sigma: f64,
    pub food_default_weight: f64,
    pub prey_weight: f64,
    pub enemy_head_multiplier: f64,
    pub enemy_body_multiplier: f64,
    pub velocity_outlier_threshold: f64,
    pub velocity_gain_x: f64,
    pub velocity_gain_y: f64,
    pub marker_radius: f64,
    pub quiver_scale: f64,
    pub panel_size: u32,
    /// PNG kept current with the latest frame (None = timestamped default)
    pub output_path: Option<String>,
    /// Font for panel titles (None = no titles)
    pub font_path: Option<String>,
    /// Compute fields but never open a display
    pub headless: bool,
    /// Suppress the per-run summary
    pub quiet: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zoom_levels: DEFAULT_ZOOM_LEVELS.to_vec(),
            density_factor: DENSITY_FACTOR,
            smoothing_sigma: SMOOTHING_SIGMA,
            food_default_weight: FOOD_DEFAULT_WEIGHT,
            prey_weight: PREY_WEIGHT,
            enemy_head_multiplier: ENEMY_HEAD_MULTIPLIER,
            enemy_body_multiplier: ENEMY_BODY_MULTIPLIER,
            velocity_outlier_threshold: VELOCITY_OUTLIER_THRESHOLD,
            velocity_gain_x: VELOCITY_GAIN_X,
            velocity_gain_y: VELOCITY_GAIN_Y,
            marker_radius: PLAYER_MARKER_RADIUS,
            quiver_scale: QUIVER_SCALE,
            panel_size: PANEL_SIZE_PX,
            output_path: None,
            font_path: None,
            headless: false,
            quiet: false,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub fn from_file(path: &str) -> Result<Self, String> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))
    }

    /// Priority: local settings > template settings > built-in defaults
    pub fn from_config_files() -> Self {
        if let Ok(settings) = Self::from_file(SETTINGS_FILE) {
            return settings;
        }
        if let Ok(settings) = Self::from_file(SETTINGS_TEMPLATE) {
            return settings;
        }
        Self::default()
    }

    /// Parse settings from the process command line
    pub fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::parse_args(&args)
    }

    /// Config files (or `--settings FILE`) first, then flag overrides.
    /// `args[0]` is the program name.
    pub fn parse_args(args: &[String]) -> Self {
        let mut settings = Self::from_config_files();

        if let Some(pos) = args.iter().position(|a| a == "--settings")
            && let Some(path) = args.get(pos + 1)
        {
            match Self::from_file(path) {
                Ok(loaded) => settings = loaded,
                Err(e) => eprintln!("Warning: {}", e),
            }
        }

        settings.apply_overrides(args);
        settings
    }

    /// Apply command line flags on top of the current values
    pub fn apply_overrides(&mut self, args: &[String]) {
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--settings" => {
                    i += 1;
                }
                "--zoom" => {
                    if i + 1 < args.len() {
                        let levels: Vec<f64> = args[i + 1]
                            .split(',')
                            .filter_map(|s| s.trim().parse().ok())
                            .collect();
                        if !levels.is_empty() {
                            self.zoom_levels = levels;
                        }
                        i += 1;
                    }
                }
                "--sigma" => {
                    if i + 1 < args.len() {
                        self.smoothing_sigma = args[i + 1].parse().unwrap_or(SMOOTHING_SIGMA);
                        i += 1;
                    }
                }
                "--output" => {
                    if i + 1 < args.len() {
                        self.output_path = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--font" => {
                    if i + 1 < args.len() {
                        self.font_path = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--panel-size" => {
                    if i + 1 < args.len() {
                        self.panel_size = args[i + 1].parse().unwrap_or(PANEL_SIZE_PX);
                        i += 1;
                    }
                }
                "--headless" => {
                    self.headless = true;
                }
                "--quiet" | "-q" => {
                    self.quiet = true;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {}
            }
            i += 1;
        }
    }

    pub fn weight_rules(&self) -> WeightRules {
        WeightRules {
            food_default: self.food_default_weight,
            prey: self.prey_weight,
            enemy_head_multiplier: self.enemy_head_multiplier,
            enemy_body_multiplier: self.enemy_body_multiplier,
        }
    }

    pub fn vector_rules(&self) -> VectorRules {
        VectorRules {
            outlier_threshold: self.velocity_outlier_threshold,
            gain_x: self.velocity_gain_x,
            gain_y: self.velocity_gain_y,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            zoom_levels: self.zoom_levels.clone(),
            density_factor: self.density_factor,
            smoothing_sigma: self.smoothing_sigma,
            weights: self.weight_rules(),
            vectors: self.vector_rules(),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            panel_size: self.panel_size,
            marker_radius: self.marker_radius,
            quiver_scale: self.quiver_scale,
            font_path: self.font_path.as_ref().map(PathBuf::from),
        }
    }
}

fn print_help() {
    println!(
        r#"fieldmap - Spatial density and flow visualizer for bot snapshots

USAGE:
    cargo run --bin fieldmap -- [OPTIONS] [INPUT]

INPUT:
    Newline-delimited JSON snapshots (default: stdin)

OPTIONS:
    --settings <FILE>   Load settings from JSON file (CLI args override file settings)
    --synthetic <N>     Generate N synthetic snapshots instead of reading input
    --seed <N>          RNG seed for --synthetic (default: 42)
    --zoom <LIST>       Comma-separated zoom levels (default: "500,2000")
    --sigma <S>         Gaussian smoothing sigma in cells (default: 0.1)
    --output <FILE>     PNG kept current with the latest frame
                        (default: frames/fieldmap_<timestamp>.png)
    --font <FILE>       TTF/OTF font for panel titles
    --panel-size <PX>   Side of each plot in pixels (default: 480)
    --headless          Compute fields without rendering
    --quiet, -q         Suppress the run summary
    --debug-log         Enable debug logging
    --help, -h          Show this help

EXAMPLES:
    # Replay a capture
    cargo run --bin fieldmap -- captures/run1.ndjson --output frames/latest.png

    # Drive the renderer with generated data
    cargo run --bin fieldmap -- --synthetic 200 --zoom 300,1000,4000
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("fieldmap")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults_match_constants() {
        let settings = Settings::default();
        assert_eq!(settings.zoom_levels, vec![500.0, 2000.0]);
        assert_eq!(settings.pipeline_config(), PipelineConfig::default());
        assert_eq!(settings.render_options(), RenderOptions::default());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "zoom_levels": [100.0], "prey_weight": 20.0 }"#).unwrap();
        assert_eq!(settings.zoom_levels, vec![100.0]);
        assert_eq!(settings.weight_rules().prey, 20.0);
        assert_eq!(settings.smoothing_sigma, SMOOTHING_SIGMA);
        assert_eq!(settings.velocity_gain_y, VELOCITY_GAIN_Y);
    }

    #[test]
    fn overrides_apply_in_order() {
        let mut settings = Settings::default();
        settings.apply_overrides(&args(&[
            "--zoom",
            "300, 1000,x",
            "--sigma",
            "1.5",
            "--output",
            "out.png",
            "--headless",
            "-q",
            "input.ndjson",
        ]));
        assert_eq!(settings.zoom_levels, vec![300.0, 1000.0]);
        assert_eq!(settings.smoothing_sigma, 1.5);
        assert_eq!(settings.output_path.as_deref(), Some("out.png"));
        assert!(settings.headless);
        assert!(settings.quiet);
    }

    #[test]
    fn empty_zoom_list_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_overrides(&args(&["--zoom", "abc"]));
        assert_eq!(settings.zoom_levels, DEFAULT_ZOOM_LEVELS.to_vec());
    }

    #[test]
    fn settings_file_then_flags() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("fieldmap_settings_{}.json", nanos));
        std::fs::write(&path, r#"{ "panel_size": 200, "quiver_scale": 50.0 }"#).unwrap();
        let path_str = path.to_string_lossy().to_string();

        let settings = Settings::parse_args(&args(&["--settings", &path_str, "--panel-size", "64"]));
        assert_eq!(settings.panel_size, 64);
        assert_eq!(settings.quiver_scale, 50.0);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let err = Settings::from_file("/nonexistent/fieldmap.json").unwrap_err();
        assert!(err.starts_with("Failed to read"));
    }
}
