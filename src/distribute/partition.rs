//! Contiguous row-block partitioning.

use std::ops::Range;

use crate::error::SpmvError;

/// `P + 1` non-decreasing row boundaries; rank `k` owns `[b[k], b[k+1])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDistribution {
    boundaries: Vec<usize>,
}

impl RowDistribution {
    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    pub fn workers(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub fn total_rows(&self) -> usize {
        self.boundaries[self.workers()]
    }

    /// Global rows owned by `worker`.
    pub fn range(&self, worker: usize) -> Range<usize> {
        self.boundaries[worker]..self.boundaries[worker + 1]
    }

    pub fn rows_of(&self, worker: usize) -> usize {
        self.range(worker).len()
    }

    /// Rank owning global `row`, found by binary search over the boundaries and
    /// clamped to `[0, P - 1]`; rows past the end map to the last rank.
    pub fn owner_of(&self, row: usize) -> usize {
        let upper = self.boundaries.partition_point(|&b| b <= row);
        upper.saturating_sub(1).min(self.workers() - 1)
    }
}

/// Split `total_rows` into `workers` contiguous blocks.
///
/// Closed form: with `base = total_rows / workers` and `rem = total_rows % workers`,
/// worker `k` starts at `k * base + min(k, rem)`, so the first `rem` workers get one
/// extra row. Workers beyond `total_rows` receive empty ranges.
pub fn partition_rows(total_rows: usize, workers: usize) -> Result<RowDistribution, SpmvError> {
    if workers == 0 {
        return Err(SpmvError::InvalidWorkerCount);
    }
    let base = total_rows / workers;
    let rem = total_rows % workers;
    let mut boundaries: Vec<usize> = (0..workers).map(|k| k * base + k.min(rem)).collect();
    boundaries.push(total_rows);
    Ok(RowDistribution { boundaries })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_rows_three_workers() {
        let d = partition_rows(10, 3).unwrap();
        assert_eq!(d.boundaries(), &[0, 4, 7, 10]);
        assert_eq!(d.rows_of(0), 4);
        assert_eq!(d.range(2), 7..10);
    }

    #[test]
    fn fewer_rows_than_workers() {
        let d = partition_rows(2, 5).unwrap();
        assert_eq!(d.boundaries(), &[0, 1, 2, 2, 2, 2]);
        assert_eq!((0..5).filter(|&k| d.rows_of(k) == 0).count(), 3);
        assert_eq!(d.total_rows(), 2);
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(partition_rows(4, 0), Err(SpmvError::InvalidWorkerCount)));
    }

    #[test]
    fn owner_lookup() {
        let d = partition_rows(10, 3).unwrap();
        let owners: Vec<usize> = (0..10).map(|r| d.owner_of(r)).collect();
        assert_eq!(owners, vec![0, 0, 0, 0, 1, 1, 1, 2, 2, 2]);
        assert_eq!(d.owner_of(42), 2);

        let sparse = partition_rows(2, 5).unwrap();
        assert_eq!(sparse.owner_of(0), 0);
        assert_eq!(sparse.owner_of(1), 1);
        assert_eq!(sparse.owner_of(2), 4);
    }

    #[test]
    fn balanced_for_many_shapes() {
        for rows in 0..40 {
            for workers in 1..9 {
                let d = partition_rows(rows, workers).unwrap();
                let b = d.boundaries();
                assert_eq!(b[0], 0);
                assert_eq!(b[workers], rows);
                assert!(b.windows(2).all(|w| w[0] <= w[1]));
                let sizes: Vec<usize> = (0..workers).map(|k| d.rows_of(k)).collect();
                let (lo, hi) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
                assert!(hi - lo <= 1);
            }
        }
    }
}
