//! Dense right-hand vector assembled from a coordinate list.

use super::coo::CoordinateEntry;
use crate::error::SpmvError;

/// Orientation of a vector read from a matrix file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorShape {
    /// `n x 1`; element index is the entry row.
    Column,
    /// `1 x n`; element index is the entry column.
    Row,
}

impl VectorShape {
    /// Infer orientation and length from the file dimensions. A `1 x 1` file is a column.
    pub fn infer(rows: usize, cols: usize) -> Result<(Self, usize), SpmvError> {
        if cols == 1 {
            Ok((VectorShape::Column, rows))
        } else if rows == 1 {
            Ok((VectorShape::Row, cols))
        } else {
            Err(SpmvError::NotAVector { rows, cols })
        }
    }

    #[inline]
    fn index_of(self, entry: &CoordinateEntry) -> usize {
        match self {
            VectorShape::Column => entry.row,
            VectorShape::Row => entry.column,
        }
    }
}

/// Densify `entries` into a vector of length `len`, summing duplicates.
/// Entries addressing an index past `len` are ignored.
pub fn dense_vector_from_entries(shape: VectorShape, len: usize, entries: &[CoordinateEntry]) -> Vec<f64> {
    let mut dense = vec![0.0; len];
    for entry in entries {
        let i = shape.index_of(entry);
        if i < len {
            dense[i] += entry.value;
        }
    }
    dense
}
