//! Spatial aggregation: observations to density and flow grids

pub mod binning;
pub mod frame;
pub mod grid;
pub mod observation;
pub mod smoothing;
pub mod transform;
pub mod vectors;

pub use binning::bin_density;
pub use frame::{ColorScale, FieldFrame, ZoomLevel};
pub use grid::{GridSpec, Matrix, orient};
pub use observation::{Merged, MergedObservations, Observation, ObservationMerger, WeightRules};
pub use smoothing::smooth_density;
pub use transform::CoordinateTransformer;
pub use vectors::{VectorField, VectorRules, aggregate_vectors};
