//! Fieldmap - spatial density and flow visualizer for a game-playing bot
//!
//! Each request carries a snapshot of what the bot can see. The pipeline
//! reprojects it around the player, bins it into weighted density and mean
//! motion grids at several zoom levels, and pushes the result to a long-lived
//! render session. The action sent back is fixed.

pub mod constants;
pub mod debug_logging;
pub mod error;
pub mod field;
pub mod pipeline;
pub mod render;
pub mod settings;
pub mod signals;
pub mod synthetic;
pub mod testing;

pub use constants::*;
pub use debug_logging::LogConfig;
pub use error::{GridError, ProcessError, RenderError};
pub use field::{
    ColorScale, CoordinateTransformer, FieldFrame, GridSpec, Matrix, Observation,
    ObservationMerger, VectorField, VectorRules, WeightRules, ZoomLevel,
};
pub use pipeline::{Outcome, Pipeline, PipelineConfig, RenderStatus, response_for};
pub use render::{
    Display, MemoryDisplay, PngDisplay, RenderOptions, RenderSession, RenderTarget,
    SharedRenderSession, UpdateReport,
};
pub use settings::Settings;
pub use signals::{Action, EnemyRecord, EntityRecord, PlayerFrame, Response, Signals};
pub use synthetic::{ArenaConfig, SyntheticArena};
