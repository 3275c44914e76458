//! Command-line or API options for a distributed multiply run.
//!
//! This module provides the `SpmvOptions` struct, which names the input matrix,
//! the input vector, and the output file, plus the zero tolerance applied when
//! the result is written and the rank that owns file I/O.

use std::path::PathBuf;

/// Results with `|y_i| <= DEFAULT_ZERO_TOLERANCE` are not written.
pub const DEFAULT_ZERO_TOLERANCE: f64 = 1e-12;

/// Rank that reads the inputs, drives distribution and writes the output.
pub const ROOT_RANK: usize = 0;

/// Inputs, output and tolerance for one run.
#[derive(Debug, Clone)]
pub struct SpmvOptions {
    /// Matrix `A` in Matrix Market coordinate format
    pub matrix_path: PathBuf,

    /// Vector `x` (one row or one column) in Matrix Market coordinate format
    pub vector_path: PathBuf,

    /// Where `y = A x` is written
    pub output_path: PathBuf,

    /// Zero tolerance applied to the output
    pub zero_tolerance: f64,

    /// Root rank
    pub root: usize,
}

impl SpmvOptions {
    pub fn new(
        matrix_path: impl Into<PathBuf>,
        vector_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            matrix_path: matrix_path.into(),
            vector_path: vector_path.into(),
            output_path: output_path.into(),
            zero_tolerance: DEFAULT_ZERO_TOLERANCE,
            root: ROOT_RANK,
        }
    }

    pub fn with_tolerance(mut self, zero_tolerance: f64) -> Self {
        self.zero_tolerance = zero_tolerance;
        self
    }

    pub fn with_root(mut self, root: usize) -> Self {
        self.root = root;
        self
    }
}
