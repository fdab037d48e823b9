//! One zoom level's worth of aggregated field data

use super::binning::bin_density;
use super::grid::{GridSpec, Matrix};
use super::observation::Observation;
use super::smoothing::smooth_density;
use super::vectors::{VectorField, VectorRules, aggregate_vectors};
use crate::error::GridError;

/// Fixed color range. Never derived from the data so colors keep their
/// meaning from frame to frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub vmin: f64,
    pub vmax: f64,
}

impl ColorScale {
    /// Symmetric range `±(density_factor * cell_size) / 4`
    pub fn for_cell_size(cell_size: f64, density_factor: f64) -> Self {
        let half = density_factor * cell_size / 4.0;
        Self {
            vmin: -half,
            vmax: half,
        }
    }

    /// Clamp into the range and map to `0.0..=1.0`
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.vmax - self.vmin;
        if span <= 0.0 || !value.is_finite() {
            return 0.5;
        }
        ((value - self.vmin) / span).clamp(0.0, 1.0)
    }
}

/// A configured zoom level: grid geometry plus color range.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomLevel {
    pub zoom: f64,
    pub grid: GridSpec,
    pub color_scale: ColorScale,
}

impl ZoomLevel {
    pub fn new(zoom: f64, density_factor: f64) -> Result<Self, GridError> {
        let grid = GridSpec::for_zoom(zoom)?;
        let color_scale = ColorScale::for_cell_size(grid.cell_size, density_factor);
        Ok(Self {
            zoom,
            grid,
            color_scale,
        })
    }
}

/// Smoothed density plus flow vectors for one zoom level, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFrame {
    pub zoom: f64,
    pub grid: GridSpec,
    pub color_scale: ColorScale,
    pub density: Matrix<f64>,
    pub vectors: VectorField,
}

impl FieldFrame {
    pub fn compute(
        observations: &[Observation],
        level: &ZoomLevel,
        sigma: f64,
        rules: &VectorRules,
    ) -> Self {
        let raw = bin_density(observations, &level.grid);
        Self {
            zoom: level.zoom,
            grid: level.grid.clone(),
            color_scale: level.color_scale,
            density: smooth_density(&raw, sigma),
            vectors: aggregate_vectors(observations, &level.grid, rules),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.density.shape()
    }

    /// Smoothed density of the cell containing a player-frame point
    pub fn density_at(&self, x: f64, y: f64) -> Option<f64> {
        let (row, col) = self.grid.cell_of(x, y)?;
        Some(self.density.get(row, col))
    }

    /// Mean vector of the cell containing a point; `Some(None)` for a masked
    /// cell inside the grid
    pub fn vector_at(&self, x: f64, y: f64) -> Option<Option<(f64, f64)>> {
        let (row, col) = self.grid.cell_of(x, y)?;
        Some(self.vectors.vector_at(row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_scale_tracks_cell_size() {
        let level = ZoomLevel::new(400.0, 2.0).unwrap();
        assert_eq!(level.grid.cell_size, 20.0);
        assert_eq!(level.color_scale, ColorScale { vmin: -10.0, vmax: 10.0 });
        assert_eq!(level.color_scale.normalize(0.0), 0.5);
        assert_eq!(level.color_scale.normalize(50.0), 1.0);
        assert_eq!(level.color_scale.normalize(-50.0), 0.0);
    }

    #[test]
    fn frame_shapes_agree() {
        let level = ZoomLevel::new(500.0, 2.0).unwrap();
        let observations = vec![Observation::new(5.0, -5.0, 10.0).with_velocity(0.1, 0.1)];
        let frame = FieldFrame::compute(&observations, &level, 0.1, &VectorRules::default());
        assert_eq!(frame.shape(), level.grid.shape());
        assert_eq!(frame.vectors.shape(), frame.shape());
        assert_eq!(frame.density_at(5.0, -5.0), Some(10.0));
        assert_eq!(frame.density.sum(), 10.0);
        assert!(matches!(frame.vector_at(5.0, -5.0), Some(Some(_))));
        assert_eq!(frame.vector_at(-400.0, 400.0), Some(None));
        assert_eq!(frame.vector_at(600.0, 0.0), None);
    }
}
