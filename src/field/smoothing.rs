//! Gaussian "spillover" between neighbouring cells

use super::grid::Matrix;
use crate::constants::SMOOTHING_TRUNCATE;

/// Separable Gaussian blur with sigma in cell units.
///
/// Kernel radius is `floor(4 * sigma + 0.5)`, so the default sigma of 0.1
/// collapses to a single tap and leaves the matrix unchanged. Edges reflect
/// (`d c b a | a b c d | d c b a`), which keeps the total mass intact.
pub fn smooth_density(density: &Matrix<f64>, sigma: f64) -> Matrix<f64> {
    let kernel = gaussian_kernel(sigma);
    if kernel.len() <= 1 || density.rows() == 0 || density.cols() == 0 {
        return density.clone();
    }
    let radius = (kernel.len() / 2) as isize;
    let (rows, cols) = density.shape();

    let horizontal = Matrix::from_fn(rows, cols, |r, c| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let src = reflect(c as isize + k as isize - radius, cols);
                w * density.get(r, src)
            })
            .sum::<f64>()
    });

    Matrix::from_fn(rows, cols, |r, c| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let src = reflect(r as isize + k as isize - radius, rows);
                w * horizontal.get(src, c)
            })
            .sum::<f64>()
    })
}

fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (SMOOTHING_TRUNCATE * sigma + 0.5).floor() as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|i| (-0.5 * (i * i) as f64 / (sigma * sigma)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Half-sample symmetric reflection into `0..len`
fn reflect(index: isize, len: usize) -> usize {
    let len = len as isize;
    let period = 2 * len;
    let i = index.rem_euclid(period);
    (if i >= len { period - 1 - i } else { i }) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spike(rows: usize, cols: usize, row: usize, col: usize) -> Matrix<f64> {
        let mut m = Matrix::zeros(rows, cols);
        m.set(row, col, 10.0);
        m
    }

    #[test]
    fn default_sigma_is_identity() {
        let m = spike(5, 5, 2, 2);
        assert_eq!(smooth_density(&m, 0.1), m);
    }

    #[test]
    fn wide_sigma_spreads_symmetrically() {
        let m = spike(7, 7, 3, 3);
        let s = smooth_density(&m, 1.0);
        assert!(s.get(3, 3) < 10.0);
        assert!(s.get(3, 2) > 0.0);
        assert!((s.get(3, 2) - s.get(3, 4)).abs() < 1e-12);
        assert!((s.get(2, 3) - s.get(3, 2)).abs() < 1e-12);
    }

    #[test]
    fn reflection_preserves_mass() {
        let m = spike(4, 6, 0, 5);
        let s = smooth_density(&m, 1.5);
        assert!((s.sum() - m.sum()).abs() < 1e-9);
    }

    #[test]
    fn reflect_wraps_both_sides() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(9, 4), 1);
        assert_eq!(reflect(0, 1), 0);
        assert_eq!(reflect(3, 1), 0);
    }
}
