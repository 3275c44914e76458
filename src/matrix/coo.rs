//! Coordinate-list (COO) entries.

/// One nonzero contribution `(row, column, value)`, zero-based.
///
/// Several entries may share a `(row, column)` pair; conversion to CSR sums them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateEntry<T = f64> {
    pub row: usize,
    pub column: usize,
    pub value: T,
}

impl<T> CoordinateEntry<T> {
    pub const fn new(row: usize, column: usize, value: T) -> Self {
        Self { row, column, value }
    }

    /// Sort key used by every conversion: row-major, then column.
    #[inline]
    pub const fn key(&self) -> (usize, usize) {
        (self.row, self.column)
    }
}
