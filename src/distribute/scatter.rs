//! Root-driven fan-out of matrix entries to their owning ranks.

use tracing::debug;

use super::partition::RowDistribution;
use super::protocol::{recv_bucket, send_bucket};
use crate::error::SpmvError;
use crate::matrix::CoordinateEntry;
use crate::parallel::Comm;

/// Split `entries` into one bucket per rank of `dist`, keeping input order inside
/// each bucket. The global list is consumed.
pub fn bucket_by_owner(entries: Vec<CoordinateEntry>, dist: &RowDistribution) -> Vec<Vec<CoordinateEntry>> {
    let mut buckets = vec![Vec::new(); dist.workers()];
    for entry in entries {
        buckets[dist.owner_of(entry.row)].push(entry);
    }
    buckets
}

/// Deliver every entry to the rank that owns its row and return this rank's share.
///
/// On `root`, `entries` must hold the global list; it is consumed and each
/// outgoing bucket is dropped as soon as it has been sent. Other ranks pass
/// `None` and block until their bucket arrives. Every rank of the job must call
/// this exactly once per run.
///
/// `dist` must be built from the same broadcast row count on every rank, so a
/// size mismatch is seen by all ranks alike and none of them waits. Passing
/// `None` on root is a caller bug that leaves the other ranks blocked on
/// their count frame.
pub fn scatter_entries<C: Comm>(
    comm: &C,
    root: usize,
    entries: Option<Vec<CoordinateEntry>>,
    dist: &RowDistribution,
) -> Result<Vec<CoordinateEntry>, SpmvError> {
    if dist.workers() != comm.size() {
        return Err(SpmvError::Protocol(format!(
            "distribution has {} ranges for {} ranks",
            dist.workers(),
            comm.size()
        )));
    }
    if !comm.is_root(root) {
        let local = recv_bucket(comm, root)?;
        debug!(rank = comm.rank(), received = local.len(), "received entry bucket");
        return Ok(local);
    }

    let entries = entries
        .ok_or_else(|| SpmvError::Protocol("root rank has no entries to distribute".into()))?;
    let mut buckets = bucket_by_owner(entries, dist);
    let local = std::mem::take(&mut buckets[root]);
    for (dest, bucket) in buckets.into_iter().enumerate() {
        if dest == root {
            continue;
        }
        debug!(dest, count = bucket.len(), "sending entry bucket");
        send_bucket(comm, dest, &bucket)?;
    }
    Ok(local)
}
