//! rowspmv: row-distributed sparse matrix-vector multiplication
//!
//! This crate computes `y = A x` for a sparse matrix `A` whose rows are spread
//! in contiguous blocks over the ranks of a message-passing job. The root rank
//! reads the inputs, fans matrix entries out to their owners, every rank
//! multiplies its CSR block against the broadcast vector, and a variable-size
//! gather reassembles `y` in global row order on the root.
//!
//! Ranks talk through the [`parallel::Comm`] trait: an in-process thread
//! backend is always available, and an MPI backend with the `mpi` feature.

pub mod parallel;

pub mod config;
pub mod context;
pub mod distribute;
pub mod error;
pub mod io;
pub mod matrix;

// Re-exports for convenience
pub use config::*;
pub use context::*;
pub use error::*;
pub use matrix::*;
pub use parallel::{Comm, LocalComm, Tag};
#[cfg(feature = "mpi")]
pub use parallel::MpiComm;
