//! MPI-based parallel communication module.
//!
//! This module provides an implementation of the `Comm` trait using the MPI (Message Passing Interface)
//! backend for distributed-memory parallelism. Every rank is a separate process started by the MPI
//! launcher; the tagged point-to-point calls map onto `MPI_Send`/`MPI_Recv`, and the collectives onto
//! `MPI_Bcast`, `MPI_Gather` and `MPI_Gatherv`. The implementation is only available when the `mpi`
//! feature is enabled.
//!
//! MPI itself aborts the job on communication failure, so every method here returns `Ok` once the
//! underlying call returns.
//!
//! # Example
//! ```no_run
//! # #[cfg(feature = "mpi")] {
//! use rowspmv::parallel::{Comm, MpiComm};
//! let comm = MpiComm::new().expect("MPI already initialized");
//! println!("Rank: {} / {}", comm.rank(), comm.size());
//! # }
//! ```

use mpi::Count;
use mpi::datatype::PartitionMut;
use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use super::{Comm, Tag};
use crate::error::CommError;

/// MPI communicator wrapper for distributed parallelism.
///
/// Holds the MPI world communicator, the rank of the current process, and the total number of processes.
/// Dropping it finalizes MPI.
pub struct MpiComm {
    /// The MPI world communicator (all processes in the job).
    world: SimpleCommunicator,
    /// The rank (ID) of this process within the communicator.
    rank: usize,
    /// The total number of processes in the communicator.
    size: usize,
    // declared last so the world communicator is released before finalization
    _universe: Universe,
}

impl MpiComm {
    /// Initializes MPI and constructs a new `MpiComm` instance.
    ///
    /// Returns `None` if MPI was already initialized in this process.
    pub fn new() -> Option<Self> {
        let universe = mpi::initialize()?;
        let world = universe.world();
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        Some(MpiComm { world, rank, size, _universe: universe })
    }

    fn check_rank(&self, rank: usize) -> Result<i32, CommError> {
        if rank < self.size {
            Ok(rank as i32)
        } else {
            Err(CommError::InvalidRank { rank, size: self.size })
        }
    }
}

fn to_counts(values: &[usize]) -> Vec<Count> {
    values.iter().map(|&v| v as Count).collect()
}

impl Comm for MpiComm {
    /// Returns the rank (ID) of this process.
    fn rank(&self) -> usize {
        self.rank
    }
    /// Returns the total number of processes in the communicator.
    fn size(&self) -> usize {
        self.size
    }
    /// Synchronizes all processes at a barrier.
    fn barrier(&self) -> Result<(), CommError> {
        self.world.barrier();
        Ok(())
    }

    fn broadcast_ints(&self, buf: &mut [u64], root: usize) -> Result<(), CommError> {
        let root = self.check_rank(root)?;
        self.world.process_at_rank(root).broadcast_into(buf);
        Ok(())
    }

    fn broadcast_floats(&self, buf: &mut [f64], root: usize) -> Result<(), CommError> {
        let root = self.check_rank(root)?;
        self.world.process_at_rank(root).broadcast_into(buf);
        Ok(())
    }

    fn send_ints(&self, data: &[u64], dest: usize, tag: Tag) -> Result<(), CommError> {
        let dest = self.check_rank(dest)?;
        self.world.process_at_rank(dest).send_with_tag(data, tag.id());
        Ok(())
    }

    fn send_floats(&self, data: &[f64], dest: usize, tag: Tag) -> Result<(), CommError> {
        let dest = self.check_rank(dest)?;
        self.world.process_at_rank(dest).send_with_tag(data, tag.id());
        Ok(())
    }

    fn recv_ints(&self, buf: &mut [u64], source: usize, tag: Tag) -> Result<(), CommError> {
        let source = self.check_rank(source)?;
        let status = self.world.process_at_rank(source).receive_into_with_tag(buf, tag.id());
        let found = status.count(u64::equivalent_datatype()) as usize;
        if found != buf.len() {
            return Err(CommError::LengthMismatch { tag: Some(tag), expected: buf.len(), found });
        }
        Ok(())
    }

    fn recv_floats(&self, buf: &mut [f64], source: usize, tag: Tag) -> Result<(), CommError> {
        let source = self.check_rank(source)?;
        let status = self.world.process_at_rank(source).receive_into_with_tag(buf, tag.id());
        let found = status.count(f64::equivalent_datatype()) as usize;
        if found != buf.len() {
            return Err(CommError::LengthMismatch { tag: Some(tag), expected: buf.len(), found });
        }
        Ok(())
    }

    /// Gathers equally sized arrays from all processes to the root process (`MPI_Gather`).
    fn gather_ints(&self, local: &[u64], root: usize) -> Result<Vec<u64>, CommError> {
        let root_rank = self.check_rank(root)?;
        let root_process = self.world.process_at_rank(root_rank);
        if self.rank == root {
            let mut recvbuf = vec![0u64; local.len() * self.size];
            root_process.gather_into_root(local, &mut recvbuf[..]);
            Ok(recvbuf)
        } else {
            root_process.gather_into(local);
            Ok(Vec::new())
        }
    }

    /// Gathers variable-length arrays to the root process (`MPI_Gatherv`).
    fn gather_varcount_floats(
        &self,
        local: &[f64],
        counts: &[usize],
        displs: &[usize],
        root: usize,
    ) -> Result<Vec<f64>, CommError> {
        let root_rank = self.check_rank(root)?;
        let root_process = self.world.process_at_rank(root_rank);
        if self.rank != root {
            root_process.gather_varcount_into(local);
            return Ok(Vec::new());
        }
        for layout in [counts.len(), displs.len()] {
            if layout != self.size {
                return Err(CommError::LengthMismatch { tag: None, expected: self.size, found: layout });
            }
        }
        let total = counts.iter().zip(displs).map(|(c, d)| c + d).max().unwrap_or(0);
        let mut recvbuf = vec![0.0f64; total];
        {
            let mut partition = PartitionMut::new(&mut recvbuf[..], to_counts(counts), to_counts(displs));
            root_process.gather_varcount_into_root(local, &mut partition);
        }
        Ok(recvbuf)
    }
}
