//! Scenario execution engine

use image::RgbImage;

use super::assertions::{AssertionError, RunRecord, check_expectations};
use super::parser::{DisplayKind, ScenarioDefinition};
use crate::error::RenderError;
use crate::field::FieldFrame;
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::render::{Display, MemoryDisplay, RenderOptions, RenderSession, RenderTarget, UpdateReport};

/// Small panels keep scenario runs fast
const SCENARIO_PANEL_PX: u32 = 48;

/// Result of running a scenario
#[derive(Debug)]
pub enum TestResult {
    Pass { checks: usize },
    Fail { error: AssertionError },
    Error { message: String },
}

/// Surface that never opens, for exercising render failure paths
struct UnavailableDisplay;

impl Display for UnavailableDisplay {
    fn open(&mut self, _width: u32, _height: u32) -> Result<(), RenderError> {
        Err(RenderError::SurfaceUnavailable("scenario display is offline".to_string()))
    }

    fn present(&mut self, _frame: &RgbImage) -> Result<(), RenderError> {
        Err(RenderError::SurfaceUnavailable("scenario display is offline".to_string()))
    }
}

/// Forwards to a real session while keeping the last frames for assertions
struct CapturingTarget {
    session: RenderSession,
    frames: Vec<FieldFrame>,
}

impl RenderTarget for CapturingTarget {
    fn render(&mut self, frames: &[FieldFrame]) -> Result<UpdateReport, RenderError> {
        self.frames = frames.to_vec();
        self.session.update(frames)
    }
}

/// Run a single scenario and return the result
pub fn run_scenario(scenario: &ScenarioDefinition) -> TestResult {
    let mut config = PipelineConfig::default();
    if let Some(levels) = &scenario.setup.zoom_levels {
        config.zoom_levels = levels.clone();
    }
    if let Some(sigma) = scenario.setup.sigma {
        config.smoothing_sigma = sigma;
    }

    let pipeline = match Pipeline::new(config) {
        Ok(p) => p,
        Err(e) => {
            return TestResult::Error {
                message: format!("Invalid setup: {}", e),
            };
        }
    };

    let display: Box<dyn Display> = match scenario.setup.display {
        DisplayKind::Memory => Box::new(MemoryDisplay::new().0),
        DisplayKind::Unavailable => Box::new(UnavailableDisplay),
    };
    let options = RenderOptions {
        panel_size: SCENARIO_PANEL_PX,
        ..RenderOptions::default()
    };
    let mut target = CapturingTarget {
        session: RenderSession::new(options, display),
        frames: Vec::new(),
    };

    let mut result = pipeline.process(&scenario.signals, &mut target);
    for _ in 1..scenario.setup.repeat {
        target.frames.clear();
        result = pipeline.process(&scenario.signals, &mut target);
    }

    let run = RunRecord {
        result,
        frames: target.frames,
        presents: target.session.presents(),
    };

    match check_expectations(&scenario.expect, &run) {
        Ok(checks) => TestResult::Pass { checks },
        Err(error) => TestResult::Fail { error },
    }
}
