//! COO -> CSR conversion.
//!
//! Both entry points sort by `(row, column)` with a stable sort, so duplicates are
//! summed in their input order and the result is bit-for-bit reproducible for a
//! given input sequence.

use num_traits::Float;
use tracing::warn;

use super::coo::CoordinateEntry;
use super::sparse::CsrMatrix;

/// Convert a global coordinate list into an `nrows x ncols` CSR matrix.
///
/// Entries sharing `(row, column)` are merged by summation. Entries whose row is
/// not below `nrows` cannot be stored and are dropped.
pub fn to_csr<T: Float>(nrows: usize, ncols: usize, entries: Vec<CoordinateEntry<T>>) -> CsrMatrix<T> {
    to_csr_windowed(entries, 0, nrows, ncols)
}

/// Convert the entries of the half-open global row window `[row_start, row_end)`
/// into a local CSR matrix with `row_end - row_start` rows.
///
/// Local row index is `global_row - row_start`. Entries outside the window are
/// dropped. The entry buffer is consumed so the caller's copy is released here.
pub fn to_csr_windowed<T: Float>(
    mut entries: Vec<CoordinateEntry<T>>,
    row_start: usize,
    row_end: usize,
    ncols: usize,
) -> CsrMatrix<T> {
    let nrows = row_end.saturating_sub(row_start);
    let before = entries.len();
    entries.retain(|e| e.row >= row_start && e.row < row_end);
    let dropped = before - entries.len();
    if dropped > 0 {
        warn!(dropped, row_start, row_end, "dropped entries outside the row window");
    }

    let mut row_ptr = vec![0usize; nrows + 1];
    if entries.is_empty() {
        return CsrMatrix::from_parts(nrows, ncols, row_ptr, Vec::new(), Vec::new());
    }

    entries.sort_by_key(CoordinateEntry::key);

    let mut col_idx = Vec::with_capacity(entries.len());
    let mut values = Vec::with_capacity(entries.len());
    let mut sorted = entries.into_iter().peekable();
    while let Some(first) = sorted.next() {
        let mut acc = first.value;
        while let Some(dup) = sorted.next_if(|e| e.key() == first.key()) {
            acc = acc + dup.value;
        }
        col_idx.push(first.column);
        values.push(acc);
        row_ptr[first.row - row_start + 1] += 1;
    }

    // per-row counts -> prefix sums
    for r in 1..=nrows {
        row_ptr[r] += row_ptr[r - 1];
    }

    CsrMatrix::from_parts(nrows, ncols, row_ptr, col_idx, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(row: usize, column: usize, value: f64) -> CoordinateEntry {
        CoordinateEntry::new(row, column, value)
    }

    #[test]
    fn merges_duplicates_and_sorts() {
        let entries = vec![e(1, 2, 1.0), e(0, 1, 2.0), e(1, 0, 3.0), e(1, 2, 4.0)];
        let m = to_csr(2, 3, entries);
        assert_eq!(m.row_ptr(), &[0, 1, 3]);
        assert_eq!(m.col_idx(), &[1, 0, 2]);
        assert_eq!(m.values(), &[2.0, 3.0, 5.0]);
        assert_eq!(m.nnz(), 3);
    }

    #[test]
    fn empty_input_gives_zero_row_pointers() {
        let m = to_csr::<f64>(4, 4, Vec::new());
        assert_eq!(m.row_ptr(), &[0, 0, 0, 0, 0]);
        assert_eq!(m.nnz(), 0);
    }

    #[test]
    fn windowed_uses_local_rows_and_drops_outsiders() {
        let entries = vec![e(3, 0, 1.0), e(5, 1, 2.0), e(4, 1, 7.0), e(0, 0, 9.0)];
        let m = to_csr_windowed(entries, 3, 5, 2);
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.row_ptr(), &[0, 1, 2]);
        assert_eq!(m.col_idx(), &[0, 1]);
        assert_eq!(m.values(), &[1.0, 7.0]);
    }

    #[test]
    fn empty_window() {
        let m = to_csr_windowed(vec![e(0, 0, 1.0)], 2, 2, 3);
        assert_eq!(m.nrows(), 0);
        assert_eq!(m.row_ptr(), &[0]);
    }

    #[test]
    fn rows_without_entries_keep_pointer() {
        let m = to_csr(4, 4, vec![e(3, 3, 1.0), e(0, 0, 1.0)]);
        assert_eq!(m.row_ptr(), &[0, 1, 1, 1, 2]);
    }
}
