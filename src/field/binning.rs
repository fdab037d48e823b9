//! Weighted 2D histogram of observations

use super::grid::{GridSpec, Matrix, orient};
use super::observation::Observation;

/// Sum observation weights per cell and return the oriented matrix.
///
/// Observations outside the grid are dropped, so the matrix total equals the
/// weight total of in-bounds observations.
pub fn bin_density(observations: &[Observation], grid: &GridSpec) -> Matrix<f64> {
    let mut hist = grid.histogram(0.0);
    for obs in observations {
        if let Some((ix, iy)) = grid.bucket(obs.x, obs.y) {
            *hist.get_mut(ix, iy) += obs.weight;
        }
    }
    orient(&hist)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> GridSpec {
        GridSpec::new(5.0, -10.0, 10.0, -10.0, 10.0).unwrap()
    }

    #[test]
    fn conserves_mass_in_bounds() {
        let grid = small_grid();
        let observations = vec![
            Observation::new(-9.5, -9.5, 3.0),
            Observation::new(0.0, 0.0, 2.5),
            Observation::new(4.9, -0.1, -7.25),
            Observation::new(9.9, 9.9, 11.0),
            Observation::new(0.1, 0.2, 0.125),
        ];
        let density = bin_density(&observations, &grid);
        let expected: f64 = observations.iter().map(|o| o.weight).sum();
        assert_eq!(density.sum(), expected);
    }

    #[test]
    fn drops_observations_on_the_upper_bound() {
        let grid = small_grid();
        let observations = vec![
            Observation::new(10.0, 0.0, 4.0),
            Observation::new(0.0, 10.0, 4.0),
            Observation::new(-11.0, 0.0, 4.0),
            Observation::new(9.0, 0.0, 1.0),
        ];
        let density = bin_density(&observations, &grid);
        assert_eq!(density.sum(), 1.0);
        // x = 9 lands in the last column, y = 0 in the second row from the top
        let (row, col) = grid.cell_of(9.0, 0.0).unwrap();
        assert_eq!((row, col), (1, 3));
        assert_eq!(density.get(row, col), 1.0);
    }

    #[test]
    fn top_left_observation_lands_in_first_row() {
        let grid = small_grid();
        let density = bin_density(&[Observation::new(-9.0, 9.0, 5.0)], &grid);
        assert_eq!(density.get(0, 0), 5.0);
        assert_eq!(density.get(grid.num_y_cells() - 1, 0), 0.0);
    }

    #[test]
    fn signed_weights_cancel() {
        let grid = small_grid();
        let density = bin_density(
            &[
                Observation::new(1.0, 1.0, 10.0),
                Observation::new(2.0, 2.0, -10.0),
            ],
            &grid,
        );
        let (row, col) = grid.cell_of(1.0, 1.0).unwrap();
        assert_eq!(density.get(row, col), 0.0);
    }
}
