//! `process(signals)`: the single entry point from the HTTP layer
//!
//! Merge -> reproject -> per zoom level {bin + smooth, vectors} -> render.
//! Zoom levels are independent, so their frames are computed on the Rayon
//! pool; rendering happens afterwards on the caller's thread.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::constants::{DENSITY_FACTOR, DEFAULT_ZOOM_LEVELS, SMOOTHING_SIGMA};
use crate::error::{ProcessError, RenderError};
use crate::field::{
    CoordinateTransformer, FieldFrame, Merged, Observation, ObservationMerger, VectorRules,
    WeightRules, ZoomLevel,
};
use crate::render::{RenderTarget, UpdateReport};
use crate::signals::{Action, Response, Signals};

/// Aggregation parameters shared by every request
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub zoom_levels: Vec<f64>,
    pub density_factor: f64,
    pub smoothing_sigma: f64,
    pub weights: WeightRules,
    pub vectors: VectorRules,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            zoom_levels: DEFAULT_ZOOM_LEVELS.to_vec(),
            density_factor: DENSITY_FACTOR,
            smoothing_sigma: SMOOTHING_SIGMA,
            weights: WeightRules::default(),
            vectors: VectorRules::default(),
        }
    }
}

/// What happened to the visualization on this request
#[derive(Debug, Clone, PartialEq)]
pub enum RenderStatus {
    /// No food in the snapshot; the previous frame stays on screen
    Skipped,
    Rendered(UpdateReport),
    /// The display failed; the action is still valid
    Failed(RenderError),
}

/// Successful result of one request
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub action: Action,
    pub render: RenderStatus,
    /// Malformed records dropped from this snapshot
    pub skipped: usize,
    /// Player-frame observations that were aggregated
    pub observations: Vec<Observation>,
}

impl Outcome {
    pub fn to_response(&self) -> Response {
        let render_error = match &self.render {
            RenderStatus::Failed(e) => Some(e.to_string()),
            _ => None,
        };
        Response::Action {
            action: self.action,
            render_error,
        }
    }
}

/// Collapse a request result into the payload for the HTTP layer
pub fn response_for(result: &Result<Outcome, ProcessError>) -> Response {
    match result {
        Ok(outcome) => outcome.to_response(),
        Err(e) => Response::Error {
            error: e.to_string(),
        },
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    merger: ObservationMerger,
    levels: Vec<ZoomLevel>,
}

impl Pipeline {
    /// Validate every zoom level up front so requests never hit a bad grid
    pub fn new(config: PipelineConfig) -> Result<Self, ProcessError> {
        if config.zoom_levels.is_empty() {
            return Err(ProcessError::NoZoomLevels);
        }
        let levels = config
            .zoom_levels
            .iter()
            .map(|&zoom| {
                ZoomLevel::new(zoom, config.density_factor)
                    .map_err(|source| ProcessError::InvalidGrid { zoom, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            merger: ObservationMerger::new(config.weights),
            config,
            levels,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn levels(&self) -> &[ZoomLevel] {
        &self.levels
    }

    /// Aggregate one snapshot and push it to `target`.
    ///
    /// Only a missing player fails the request. Render failures are folded
    /// into `RenderStatus::Failed` next to the (fixed) action.
    pub fn process<T: RenderTarget + ?Sized>(
        &self,
        signals: &Signals,
        target: &mut T,
    ) -> Result<Outcome, ProcessError> {
        let merged = match self.merger.merge(signals)? {
            Merged::Empty => {
                debug!("No food in snapshot, render skipped");
                return Ok(Outcome {
                    action: Action::default(),
                    render: RenderStatus::Skipped,
                    skipped: 0,
                    observations: Vec::new(),
                });
            }
            Merged::Ready(merged) => merged,
        };

        let (px, py) = merged.player;
        let observations = CoordinateTransformer::new(px, py).apply_all(&merged.observations);
        let frames = self.frames(&observations);

        let render = match target.render(&frames) {
            Ok(report) => RenderStatus::Rendered(report),
            Err(e) => {
                warn!("Render failed: {}", e);
                RenderStatus::Failed(e)
            }
        };

        Ok(Outcome {
            action: Action::default(),
            render,
            skipped: merged.skipped,
            observations,
        })
    }

    /// One frame per configured zoom level, in configuration order
    pub fn frames(&self, observations: &[Observation]) -> Vec<FieldFrame> {
        self.levels
            .par_iter()
            .map(|level| {
                FieldFrame::compute(
                    observations,
                    level,
                    self.config.smoothing_sigma,
                    &self.config.vectors,
                )
            })
            .collect()
    }
}
