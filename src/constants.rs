//! Tunable constants for fieldmap
//!
//! Default values for the aggregation pipeline and the render session.
//! Everything here can be overridden through `Settings`.

// =============================================================================
// ZOOM LEVELS
// =============================================================================

/// Half-extent of each default panel, in world units around the player
pub const DEFAULT_ZOOM_LEVELS: [f64; 2] = [500.0, 2000.0];
/// Color range scale: vmax = DENSITY_FACTOR * cell_size / 4
pub const DENSITY_FACTOR: f64 = 2.0;

// =============================================================================
// OBSERVATION WEIGHTING
// =============================================================================

pub const FOOD_DEFAULT_WEIGHT: f64 = 1.0; // Food without a size counts as one unit
pub const PREY_WEIGHT: f64 = 50.0; // Overrides any size sent for prey
pub const ENEMY_HEAD_MULTIPLIER: f64 = 5.0; // Segment 0 is 5x as dangerous
pub const ENEMY_BODY_MULTIPLIER: f64 = 1.0;

// =============================================================================
// SMOOTHING
// =============================================================================

/// Gaussian sigma in cell units
pub const SMOOTHING_SIGMA: f64 = 0.1;
/// Kernel radius = floor(TRUNCATE * sigma + 0.5)
pub const SMOOTHING_TRUNCATE: f64 = 4.0;

// =============================================================================
// VECTOR FIELD
// =============================================================================

/// Raw per-tick displacement above this magnitude is treated as a teleport
pub const VELOCITY_OUTLIER_THRESHOLD: f64 = 100.0;
pub const VELOCITY_GAIN_X: f64 = 500.0;
pub const VELOCITY_GAIN_Y: f64 = -500.0; // Negative: screen y grows downward

// =============================================================================
// RENDERING
// =============================================================================

pub const PANEL_SIZE_PX: u32 = 480; // Square plot area per zoom level
pub const PANEL_TITLE_PX: u32 = 32; // Title strip above each plot
pub const PANEL_MARGIN_PX: u32 = 16;
pub const TITLE_FONT_PX: f32 = 20.0;
pub const PLAYER_MARKER_RADIUS: f64 = 80.0; // World units
pub const PLAYER_MARKER_ALPHA: f32 = 0.5;
pub const QUIVER_SCALE: f64 = 200.0; // Vector units per world unit of arrow
pub const QUIVER_ALPHA: f32 = 0.7;
pub const GRID_LINE_ALPHA: f32 = 0.3;
pub const GRID_LINE_DIVISIONS: u32 = 4;

/// Action returned for every request; there is no steering logic
pub const DEFAULT_ANGLE: f64 = 0.0;
pub const DEFAULT_SPEEDBOOST: bool = false;
