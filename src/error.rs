use std::path::PathBuf;

use thiserror::Error;

use crate::parallel::Tag;

// Unified error types for rowspmv

/// Failures of the Matrix Market boundary reader.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),
    #[error("missing %%MatrixMarket banner")]
    MissingBanner,
    #[error("unsupported Matrix Market format: {0}")]
    UnsupportedFormat(String),
    #[error("no size line found")]
    MissingSize,
}

/// Failures of the communication runtime.
#[derive(Error, Debug)]
pub enum CommError {
    #[error("a peer rank aborted; the job cannot make progress")]
    Aborted,
    #[error("message on {tag:?} carried {found} payload, expected {expected}")]
    PayloadMismatch {
        tag: Option<Tag>,
        expected: &'static str,
        found: &'static str,
    },
    #[error("message on {tag:?} carried {found} elements, expected {expected}")]
    LengthMismatch { tag: Option<Tag>, expected: usize, found: usize },
    #[error("rank {rank} left the group while rank {waiting} still waited on it")]
    PeerDeparted { rank: usize, waiting: usize },
    #[error("rank {rank} is outside a group of {size}")]
    InvalidRank { rank: usize, size: usize },
}

#[derive(Error, Debug)]
pub enum SpmvError {
    #[error(transparent)]
    Market(#[from] MarketError),
    #[error(transparent)]
    Comm(#[from] CommError),
    #[error("second input must be a vector (one row or one column), got {rows} x {cols}")]
    NotAVector { rows: usize, cols: usize },
    #[error("dimension mismatch: matrix columns = {matrix_cols}, vector length = {vector_len}")]
    DimensionMismatch { matrix_cols: usize, vector_len: usize },
    #[error("input validation failed on the root rank")]
    ValidationFailed,
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error("failed to write output file {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,
}
