//! Grid specification, bucketing and the shared orientation transform

use crate::error::GridError;

/// Dense row-major matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy> Matrix<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self.data[row * self.cols + col]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Copy another matrix of the same shape into this one without
    /// reallocating. Returns false (and leaves `self` alone) on a shape
    /// mismatch.
    pub fn copy_from(&mut self, other: &Matrix<T>) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        self.data.copy_from_slice(&other.data);
        true
    }

    pub fn transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |r, c| self.get(c, r))
    }

    pub fn flip_ud(&self) -> Self {
        Self::from_fn(self.rows, self.cols, |r, c| self.get(self.rows - 1 - r, c))
    }

    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Matrix<U> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|v| f(*v)).collect(),
        }
    }
}

impl Matrix<f64> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

/// Map a histogram laid out `[x_bin][y_bin]` to raster order: columns grow
/// with display x, row 0 is the top edge (`y_max`).
///
/// Every matrix that has to line up with the density image goes through this
/// one function.
pub fn orient<T: Copy>(hist: &Matrix<T>) -> Matrix<T> {
    hist.transpose().flip_ud()
}

/// One zoom level's binning geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    pub cell_size: f64,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub bin_edges_x: Vec<f64>,
    pub bin_edges_y: Vec<f64>,
}

impl GridSpec {
    pub fn new(
        cell_size: f64,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    ) -> Result<Self, GridError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(GridError::CellSize(cell_size));
        }
        for (min, max) in [(x_min, x_max), (y_min, y_max)] {
            if !min.is_finite() || !max.is_finite() || max <= min {
                return Err(GridError::Extent { min, max });
            }
        }

        Ok(Self {
            cell_size,
            x_min,
            x_max,
            y_min,
            y_max,
            bin_edges_x: bin_edges(x_min, x_max, cell_size),
            bin_edges_y: bin_edges(y_min, y_max, cell_size),
        })
    }

    /// Square grid `[-zoom, zoom)` on both axes with `sqrt(zoom)` cells.
    pub fn for_zoom(zoom: f64) -> Result<Self, GridError> {
        Self::new(zoom.sqrt(), -zoom, zoom, -zoom, zoom)
    }

    pub fn num_x_cells(&self) -> usize {
        self.bin_edges_x.len() - 1
    }

    pub fn num_y_cells(&self) -> usize {
        self.bin_edges_y.len() - 1
    }

    /// Oriented shape `(num_y_cells, num_x_cells)`
    pub fn shape(&self) -> (usize, usize) {
        (self.num_y_cells(), self.num_x_cells())
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Histogram bucket `(x_bin, y_bin)` for a point, None when out of bounds.
    pub fn bucket(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        Some((
            bucket_index(x, &self.bin_edges_x)?,
            bucket_index(y, &self.bin_edges_y)?,
        ))
    }

    /// Oriented `(row, col)` of the cell containing a point
    pub fn cell_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (ix, iy) = self.bucket(x, y)?;
        Some((self.num_y_cells() - 1 - iy, ix))
    }

    pub fn x_centers(&self) -> Vec<f64> {
        centers(&self.bin_edges_x)
    }

    pub fn y_centers(&self) -> Vec<f64> {
        centers(&self.bin_edges_y)
    }

    /// Empty histogram in `[x_bin][y_bin]` layout
    pub fn histogram<T: Copy>(&self, value: T) -> Matrix<T> {
        Matrix::filled(self.num_x_cells(), self.num_y_cells(), value)
    }
}

/// Fixed-step edges from `min`, closed by `max` itself. The last cell is
/// narrower when the extent is not a whole number of steps.
fn bin_edges(min: f64, max: f64, step: f64) -> Vec<f64> {
    // Tolerance keeps 20 / 5 at four cells instead of five.
    let cells = (((max - min) / step) - 1e-9).ceil().max(1.0) as usize;
    let mut edges: Vec<f64> = (0..cells).map(|k| min + k as f64 * step).collect();
    edges.push(max);
    edges
}

/// Inclusive-lower, exclusive-upper bucket lookup.
fn bucket_index(value: f64, edges: &[f64]) -> Option<usize> {
    let (&first, &last) = (edges.first()?, edges.last()?);
    if !value.is_finite() || value < first || value >= last {
        return None;
    }
    Some(edges.partition_point(|&e| e <= value) - 1)
}

fn centers(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> GridSpec {
        GridSpec::new(5.0, -10.0, 10.0, -10.0, 10.0).unwrap()
    }

    #[test]
    fn edges_are_fixed_step_with_inclusive_upper_bound() {
        let grid = small_grid();
        assert_eq!(grid.bin_edges_x, vec![-10.0, -5.0, 0.0, 5.0, 10.0]);
        assert_eq!(grid.shape(), (4, 4));
    }

    #[test]
    fn uneven_extent_closes_at_max() {
        let grid = GridSpec::for_zoom(500.0).unwrap();
        assert_eq!(grid.num_x_cells(), 45);
        assert_eq!(*grid.bin_edges_x.last().unwrap(), 500.0);
        assert_eq!(grid.bin_edges_x[0], -500.0);
    }

    #[test]
    fn upper_edge_is_exclusive() {
        let grid = small_grid();
        assert_eq!(grid.bucket(10.0, 0.0), None);
        assert_eq!(grid.bucket(9.999, 0.0), Some((3, 2)));
        assert_eq!(grid.bucket(-10.0, -10.0), Some((0, 0)));
        assert_eq!(grid.bucket(-10.001, 0.0), None);
        assert_eq!(grid.bucket(f64::NAN, 0.0), None);
    }

    #[test]
    fn orient_puts_top_left_at_origin() {
        let grid = small_grid();
        let mut hist = grid.histogram(0.0);
        let (ix, iy) = grid.bucket(-9.0, 9.0).unwrap();
        hist.set(ix, iy, 1.0);

        let oriented = orient(&hist);
        assert_eq!(oriented.shape(), (4, 4));
        assert_eq!(oriented.get(0, 0), 1.0);
        assert_eq!(oriented.get(3, 0), 0.0);
        assert_eq!(grid.cell_of(-9.0, 9.0), Some((0, 0)));
    }

    #[test]
    fn orient_handles_rectangular_grids() {
        let grid = GridSpec::new(5.0, -10.0, 10.0, 0.0, 10.0).unwrap();
        let mut hist = grid.histogram(0u32);
        let (ix, iy) = grid.bucket(7.0, 1.0).unwrap();
        hist.set(ix, iy, 9);

        let oriented = orient(&hist);
        assert_eq!(oriented.shape(), grid.shape());
        assert_eq!(oriented.shape(), (2, 4));
        assert_eq!(oriented.get(1, 3), 9);
        assert_eq!(grid.cell_of(7.0, 1.0), Some((1, 3)));
    }

    #[test]
    fn rejects_bad_specs() {
        assert_eq!(
            GridSpec::new(0.0, -1.0, 1.0, -1.0, 1.0),
            Err(GridError::CellSize(0.0))
        );
        assert!(matches!(
            GridSpec::new(1.0, 1.0, 1.0, -1.0, 1.0),
            Err(GridError::Extent { .. })
        ));
    }

    #[test]
    fn copy_from_refuses_shape_change() {
        let mut a = Matrix::zeros(2, 2);
        let b = Matrix::filled(2, 2, 3.0);
        assert!(a.copy_from(&b));
        assert_eq!(a.sum(), 12.0);
        assert!(!a.copy_from(&Matrix::zeros(3, 2)));
        assert_eq!(a.sum(), 12.0);
    }
}
