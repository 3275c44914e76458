//! Variable-size gather of per-rank results.

use tracing::debug;

use crate::error::SpmvError;
use crate::parallel::Comm;

/// Exclusive prefix sums of `counts`.
pub fn displacements(counts: &[usize]) -> Vec<usize> {
    counts
        .iter()
        .scan(0usize, |offset, &c| {
            let start = *offset;
            *offset += c;
            Some(start)
        })
        .collect()
}

/// Collect every rank's `local` segment on `root`, in rank order.
///
/// Each rank first reports its length; root turns the lengths into
/// displacements and a single variable-count gather moves the data. Because
/// ranks own ascending contiguous row blocks, the result on root is already in
/// global row order. Returns `Some` on root and `None` elsewhere.
pub fn gather_result<C: Comm>(comm: &C, local: &[f64], root: usize) -> Result<Option<Vec<f64>>, SpmvError> {
    let lengths = comm.gather_ints(&[local.len() as u64], root)?;
    let counts: Vec<usize> = lengths.iter().map(|&n| n as usize).collect();
    let displs = displacements(&counts);
    let gathered = comm.gather_varcount_floats(local, &counts, &displs, root)?;
    if comm.is_root(root) {
        debug!(total = gathered.len(), "gathered local results");
        Ok(Some(gathered))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::LocalComm;

    #[test]
    fn prefix_sums() {
        assert_eq!(displacements(&[4, 0, 3, 3]), vec![0, 4, 4, 7]);
        assert!(displacements(&[]).is_empty());
    }

    #[test]
    fn segments_land_in_rank_order() {
        let got = LocalComm::run(4, |comm| {
            // rank r contributes r copies of r
            let local = vec![comm.rank() as f64; comm.rank()];
            gather_result(comm, &local, 0).unwrap()
        });
        assert_eq!(got[0].as_deref(), Some(&[1.0, 2.0, 2.0, 3.0, 3.0, 3.0][..]));
        assert!(got[1..].iter().all(Option::is_none));
    }
}
