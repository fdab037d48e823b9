//! Per-cell mean motion vectors

use super::grid::{GridSpec, Matrix, orient};
use super::observation::Observation;
use crate::constants::{VELOCITY_GAIN_X, VELOCITY_GAIN_Y, VELOCITY_OUTLIER_THRESHOLD};

/// Scaling and rejection rules for velocities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorRules {
    /// Raw magnitudes strictly above this are ignored
    pub outlier_threshold: f64,
    pub gain_x: f64,
    pub gain_y: f64,
}

impl Default for VectorRules {
    fn default() -> Self {
        Self {
            outlier_threshold: VELOCITY_OUTLIER_THRESHOLD,
            gain_x: VELOCITY_GAIN_X,
            gain_y: VELOCITY_GAIN_Y,
        }
    }
}

/// Oriented flow field, aligned cell for cell with the density matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    pub u: Matrix<f64>,
    pub v: Matrix<f64>,
    /// Contributing observations per cell; zero means masked
    pub counts: Matrix<u32>,
    pub x_centers: Matrix<f64>,
    pub y_centers: Matrix<f64>,
}

impl VectorField {
    pub fn shape(&self) -> (usize, usize) {
        self.u.shape()
    }

    pub fn is_empty_at(&self, row: usize, col: usize) -> bool {
        self.counts.get(row, col) == 0
    }

    /// Mean vector, or None for a cell nothing moved through
    pub fn vector_at(&self, row: usize, col: usize) -> Option<(f64, f64)> {
        if self.is_empty_at(row, col) {
            return None;
        }
        Some((self.u.get(row, col), self.v.get(row, col)))
    }

    pub fn mask(&self) -> Matrix<bool> {
        self.counts.map(|n| n > 0)
    }

    /// Non-empty cells as `(x_center, y_center, u, v)`
    pub fn arrows(&self) -> impl Iterator<Item = (f64, f64, f64, f64)> + '_ {
        let (rows, cols) = self.shape();
        (0..rows)
            .flat_map(move |r| (0..cols).map(move |c| (r, c)))
            .filter_map(move |(r, c)| {
                let (u, v) = self.vector_at(r, c)?;
                Some((self.x_centers.get(r, c), self.y_centers.get(r, c), u, v))
            })
    }

    pub fn populated_cells(&self) -> usize {
        self.counts.as_slice().iter().filter(|n| **n > 0).count()
    }
}

/// Average the scaled velocities of observations per cell.
///
/// Outliers and non-finite velocities are skipped here only; they still count
/// towards density.
pub fn aggregate_vectors(
    observations: &[Observation],
    grid: &GridSpec,
    rules: &VectorRules,
) -> VectorField {
    let mut u_sum = grid.histogram(0.0);
    let mut v_sum = grid.histogram(0.0);
    let mut counts = grid.histogram(0u32);

    for obs in observations {
        let Some((dx, dy)) = obs.velocity else {
            continue;
        };
        let magnitude = dx.hypot(dy);
        if !magnitude.is_finite() || magnitude > rules.outlier_threshold {
            continue;
        }
        let Some((ix, iy)) = grid.bucket(obs.x, obs.y) else {
            continue;
        };
        *u_sum.get_mut(ix, iy) += dx * rules.gain_x;
        *v_sum.get_mut(ix, iy) += dy * rules.gain_y;
        *counts.get_mut(ix, iy) += 1;
    }

    let mean = |sums: &Matrix<f64>| {
        Matrix::from_fn(sums.rows(), sums.cols(), |ix, iy| match counts.get(ix, iy) {
            0 => 0.0,
            n => sums.get(ix, iy) / n as f64,
        })
    };
    let u = mean(&u_sum);
    let v = mean(&v_sum);

    let x_centers = grid.x_centers();
    let y_centers = grid.y_centers();
    let xs = Matrix::from_fn(grid.num_x_cells(), grid.num_y_cells(), |ix, _| x_centers[ix]);
    let ys = Matrix::from_fn(grid.num_x_cells(), grid.num_y_cells(), |_, iy| y_centers[iy]);

    VectorField {
        u: orient(&u),
        v: orient(&v),
        counts: orient(&counts),
        x_centers: orient(&xs),
        y_centers: orient(&ys),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::binning::bin_density;

    fn small_grid() -> GridSpec {
        GridSpec::new(5.0, -10.0, 10.0, -10.0, 10.0).unwrap()
    }

    #[test]
    fn averages_instead_of_summing() {
        let grid = small_grid();
        let observations = vec![
            Observation::new(1.0, 1.0, 1.0).with_velocity(1.0, 0.0),
            Observation::new(2.0, 2.0, 1.0).with_velocity(3.0, 0.0),
        ];
        let field = aggregate_vectors(&observations, &grid, &VectorRules::default());
        let (row, col) = grid.cell_of(1.0, 1.0).unwrap();
        let (u, v) = field.vector_at(row, col).unwrap();
        assert_eq!(u, 1000.0);
        assert_eq!(v, 0.0);
        assert_eq!(field.counts.get(row, col), 2);
    }

    #[test]
    fn vertical_gain_flips_sign() {
        let grid = small_grid();
        let observations = vec![Observation::new(1.0, 1.0, 1.0).with_velocity(0.0, 0.5)];
        let field = aggregate_vectors(&observations, &grid, &VectorRules::default());
        let (row, col) = grid.cell_of(1.0, 1.0).unwrap();
        assert_eq!(field.vector_at(row, col), Some((0.0, -250.0)));
    }

    #[test]
    fn outliers_keep_density_but_not_vectors() {
        let grid = small_grid();
        let observations = vec![Observation::new(-6.0, 6.0, 4.0).with_velocity(90.0, 120.0)];
        let field = aggregate_vectors(&observations, &grid, &VectorRules::default());
        let density = bin_density(&observations, &grid);
        let (row, col) = grid.cell_of(-6.0, 6.0).unwrap();

        assert_eq!(density.get(row, col), 4.0);
        assert!(field.is_empty_at(row, col));
        assert_eq!(field.vector_at(row, col), None);
        assert_eq!(field.populated_cells(), 0);
    }

    #[test]
    fn empty_cells_differ_from_zero_means() {
        let grid = small_grid();
        let observations = vec![
            Observation::new(1.0, 1.0, 1.0).with_velocity(2.0, 0.0),
            Observation::new(1.5, 1.5, 1.0).with_velocity(-2.0, 0.0),
        ];
        let field = aggregate_vectors(&observations, &grid, &VectorRules::default());
        let (row, col) = grid.cell_of(1.0, 1.0).unwrap();
        assert_eq!(field.vector_at(row, col), Some((0.0, 0.0)));
        assert!(!field.is_empty_at(row, col));

        let (erow, ecol) = grid.cell_of(-9.0, -9.0).unwrap();
        assert!(field.is_empty_at(erow, ecol));
        assert_eq!(field.u.get(erow, ecol), 0.0);
        assert_eq!(field.vector_at(erow, ecol), None);
        assert!(!field.mask().get(erow, ecol));
    }

    #[test]
    fn centers_line_up_with_density_cells() {
        let grid = small_grid();
        let field = aggregate_vectors(&[], &grid, &VectorRules::default());
        assert_eq!(field.shape(), grid.shape());
        // Top-left cell covers x in [-10, -5), y in [5, 10)
        assert_eq!(field.x_centers.get(0, 0), -7.5);
        assert_eq!(field.y_centers.get(0, 0), 7.5);
        assert_eq!(field.y_centers.get(3, 0), -7.5);
        assert_eq!(field.x_centers.get(0, 3), 7.5);
    }

    #[test]
    fn arrows_only_cover_populated_cells() {
        let grid = small_grid();
        let observations = vec![
            Observation::new(6.0, -6.0, 1.0).with_velocity(0.2, 0.0),
            Observation::new(6.0, 6.0, 1.0),
        ];
        let field = aggregate_vectors(&observations, &grid, &VectorRules::default());
        let arrows: Vec<_> = field.arrows().collect();
        assert_eq!(arrows, vec![(7.5, -7.5, 100.0, 0.0)]);
    }
}
