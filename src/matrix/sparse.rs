// CSR storage used by every worker

use faer::Mat;
use num_traits::Float;

/// Compressed sparse row matrix.
///
/// Invariants: `row_ptr.len() == nrows + 1`, `row_ptr[0] == 0`, `row_ptr` is
/// non-decreasing and ends at `nnz`; within a row, column indices are distinct.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T = f64> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Float> CsrMatrix<T> {
    /// Assemble from arrays the converter has already laid out.
    pub(crate) fn from_parts(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        debug_assert_eq!(row_ptr.len(), nrows + 1);
        debug_assert_eq!(col_idx.len(), values.len());
        Self { nrows, ncols, row_ptr, col_idx, values }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Column indices and values of local row `r`.
    pub fn row(&self, r: usize) -> (&[usize], &[T]) {
        let span = self.row_ptr[r]..self.row_ptr[r + 1];
        (&self.col_idx[span.clone()], &self.values[span])
    }

    #[inline]
    fn row_dot(&self, r: usize, x: &[T]) -> T {
        let (cols, vals) = self.row(r);
        cols.iter()
            .zip(vals)
            .filter(|&(&c, _)| c < x.len())
            .fold(T::zero(), |acc, (&c, &v)| acc + v * x[c])
    }

    /// y = A * x, one entry per local row.
    ///
    /// Column indices outside `x` are skipped; use [`Self::out_of_range_columns`]
    /// to find out whether that happened.
    pub fn multiply(&self, x: &[T]) -> Vec<T> {
        (0..self.nrows).map(|r| self.row_dot(r, x)).collect()
    }

    /// Number of stored entries whose column index does not address `x_len`.
    pub fn out_of_range_columns(&self, x_len: usize) -> usize {
        self.col_idx.iter().filter(|&&c| c >= x_len).count()
    }
}

impl CsrMatrix<f64> {
    /// Densify into a faer matrix. Entries with a column outside `ncols` are ignored.
    pub fn to_dense(&self) -> Mat<f64> {
        let mut dense = Mat::<f64>::zeros(self.nrows, self.ncols);
        for r in 0..self.nrows {
            let (cols, vals) = self.row(r);
            for (&c, &v) in cols.iter().zip(vals) {
                if c < self.ncols {
                    dense[(r, c)] += v;
                }
            }
        }
        dense
    }
}

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "rayon")]
impl<T: Float + Send + Sync> CsrMatrix<T> {
    /// Row-parallel multiply using Rayon; each row is summed in the same order as
    /// [`Self::multiply`], so the results are identical.
    pub fn multiply_parallel(&self, x: &[T]) -> Vec<T> {
        let mut y = vec![T::zero(); self.nrows];
        y.par_iter_mut().enumerate().for_each(|(r, yr)| {
            *yr = self.row_dot(r, x);
        });
        y
    }
}
