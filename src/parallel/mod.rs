//! Communication runtime boundary.
//!
//! The pipeline only talks to the job through [`Comm`]: rank/size discovery,
//! broadcast, tagged blocking point-to-point transfers of integer and float
//! arrays, and (variable-count) gather to a root. Collective calls must be
//! issued by every rank in the same order; there is no timeout.

use crate::error::CommError;

/// Tags of the point-to-point messages exchanged during distribution.
///
/// Each tag identifies one message kind per destination; see
/// [`crate::distribute::protocol`] for the ordering contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    EntryCount,
    Rows,
    Columns,
    Values,
}

impl Tag {
    /// Numeric tag on the wire.
    pub const fn id(self) -> i32 {
        match self {
            Tag::EntryCount => 0,
            Tag::Rows => 1,
            Tag::Columns => 2,
            Tag::Values => 3,
        }
    }
}

pub trait Comm {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    fn is_root(&self, root: usize) -> bool {
        self.rank() == root
    }
    fn barrier(&self) -> Result<(), CommError>;

    // Collectives. `buf` is read on `root` and overwritten everywhere else.
    fn broadcast_ints(&self, buf: &mut [u64], root: usize) -> Result<(), CommError>;
    fn broadcast_floats(&self, buf: &mut [f64], root: usize) -> Result<(), CommError>;

    // Blocking point-to-point. A receive expects exactly `buf.len()` elements.
    fn send_ints(&self, data: &[u64], dest: usize, tag: Tag) -> Result<(), CommError>;
    fn send_floats(&self, data: &[f64], dest: usize, tag: Tag) -> Result<(), CommError>;
    fn recv_ints(&self, buf: &mut [u64], source: usize, tag: Tag) -> Result<(), CommError>;
    fn recv_floats(&self, buf: &mut [f64], source: usize, tag: Tag) -> Result<(), CommError>;

    /// Fixed-count gather: every rank contributes `local.len()` elements (the same
    /// on all ranks). Root receives the concatenation in rank order; other ranks
    /// get an empty vector.
    fn gather_ints(&self, local: &[u64], root: usize) -> Result<Vec<u64>, CommError>;

    /// Variable-count gather. `counts[r]` elements from rank `r` land at
    /// `displs[r]` in the root buffer; `counts` and `displs` are only read on root.
    ///
    /// The caller must pass exactly `size()` counts and displacements on root,
    /// with `counts[root] == local.len()`. A root that rejects its layout
    /// returns without collecting, and under MPI the other ranks may then
    /// block; derive the layout from [`Comm::gather_ints`] as
    /// `distribute::gather_result` does.
    fn gather_varcount_floats(
        &self,
        local: &[f64],
        counts: &[usize],
        displs: &[usize],
        root: usize,
    ) -> Result<Vec<f64>, CommError>;
}

pub mod local_comm;
pub use local_comm::LocalComm;

#[cfg(feature = "mpi")]
pub mod mpi_comm;
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;
