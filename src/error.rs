//! Error types for the aggregation pipeline and render session

use thiserror::Error;

/// Failures that make the request itself undecidable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessError {
    #[error("No player")]
    MissingPlayer,
    #[error("at least one zoom level is required")]
    NoZoomLevels,
    #[error("invalid grid for zoom {zoom}: {source}")]
    InvalidGrid {
        zoom: f64,
        #[source]
        source: GridError,
    },
}

/// Rejected grid specifications.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("cell size must be positive and finite, got {0}")]
    CellSize(f64),
    #[error("extent [{min}, {max}) is empty or not finite")]
    Extent { min: f64, max: f64 },
}

/// Display failures. These never fail a request; the pipeline reports them
/// next to the action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("display surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("failed to load font {path}: {reason}")]
    Font { path: String, reason: String },
}
