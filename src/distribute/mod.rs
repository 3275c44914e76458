//! Row-block distribution of a matrix across the ranks of a job.
//!
//! - [`partition`]: contiguous, balanced row ranges per rank.
//! - [`protocol`]: framing of an entry bucket on the wire.
//! - [`scatter`]: root-driven fan-out of coordinate entries to their owners.
//! - [`gather`]: variable-size collection of local results on the root.

pub mod gather;
pub mod partition;
pub mod protocol;
pub mod scatter;

pub use gather::{displacements, gather_result};
pub use partition::{RowDistribution, partition_rows};
pub use scatter::{bucket_by_owner, scatter_entries};
