//! Orchestration of one distributed multiply `y = A x`.
//!
//! Every rank runs [`SpmvContext::run`] with the same options. The collective
//! sequence is identical on all ranks, including the failure path: the root
//! decides validity locally and broadcasts a flag before any point-to-point
//! traffic, so a failed root never leaves workers waiting on a bucket.
//!
//! Root-held global buffers (matrix entries, vector entries) are moved into the
//! phase that consumes them and dropped there.

use tracing::{debug, error, info, info_span, warn};

use crate::config::SpmvOptions;
use crate::distribute::{gather_result, partition_rows, scatter_entries};
use crate::error::SpmvError;
use crate::io::{MarketMatrix, read_matrix_market, write_vector_file};
use crate::matrix::{CoordinateEntry, VectorShape, dense_vector_from_entries, to_csr_windowed};
use crate::parallel::Comm;

/// What the root reports after a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub rows: usize,
    pub cols: usize,
    /// Entries written to the output (above the zero tolerance).
    pub nnz_written: usize,
    /// Stored entries, summed over all ranks, whose column did not address the vector.
    pub skipped_columns: usize,
}

/// Validated inputs, only ever materialized on the root.
struct RootInputs {
    matrix: MarketMatrix,
    vector: MarketMatrix,
    vector_shape: VectorShape,
    vector_len: usize,
}

/// Context for one distributed multiply on one rank.
pub struct SpmvContext<'a, C: Comm> {
    comm: &'a C,
    options: SpmvOptions,
}

impl<'a, C: Comm> SpmvContext<'a, C> {
    pub fn new(comm: &'a C, options: SpmvOptions) -> Self {
        Self { comm, options }
    }

    fn load_inputs(&self) -> Result<RootInputs, SpmvError> {
        let matrix = read_matrix_market(&self.options.matrix_path)?;
        let vector = read_matrix_market(&self.options.vector_path)?;
        let (vector_shape, vector_len) = VectorShape::infer(vector.rows, vector.cols)?;
        if matrix.cols != vector_len {
            return Err(SpmvError::DimensionMismatch { matrix_cols: matrix.cols, vector_len });
        }
        let outside = matrix
            .entries
            .iter()
            .filter(|e| e.row >= matrix.rows || e.column >= matrix.cols)
            .count();
        if outside > 0 {
            warn!(outside, rows = matrix.rows, cols = matrix.cols, "matrix entries outside the declared shape");
        }
        Ok(RootInputs { matrix, vector, vector_shape, vector_len })
    }

    /// Run the whole pipeline on this rank.
    ///
    /// Returns `Ok(Some(summary))` on the root, `Ok(None)` on other ranks. When
    /// root validation fails, the root returns its specific error and every other
    /// rank returns [`SpmvError::ValidationFailed`].
    pub fn run(&self) -> Result<Option<RunSummary>, SpmvError> {
        let comm = self.comm;
        let root = self.options.root;
        let is_root = comm.is_root(root);
        let _span = info_span!("spmv", rank = comm.rank(), size = comm.size()).entered();

        // 1-2: validate on root, then agree on the outcome everywhere
        let loaded = if is_root { Some(self.load_inputs()) } else { None };
        let mut valid = [u64::from(matches!(loaded, Some(Ok(_))))];
        comm.broadcast_ints(&mut valid, root)?;
        let inputs = match loaded {
            Some(Ok(inputs)) => Some(inputs),
            Some(Err(err)) => {
                error!(%err, "input validation failed");
                return Err(err);
            }
            None if valid[0] == 0 => return Err(SpmvError::ValidationFailed),
            None => None,
        };

        // 3: shapes
        let mut dims = match &inputs {
            Some(i) => [i.matrix.rows as u64, i.matrix.cols as u64, i.vector_len as u64],
            None => [0; 3],
        };
        comm.broadcast_ints(&mut dims, root)?;
        let [rows, cols, vector_len] = dims.map(|d| d as usize);
        debug!(rows, cols, vector_len, "shapes agreed");

        // split the root buffers so each can be handed to its phase
        let (matrix_entries, vector_input) = match inputs {
            Some(RootInputs { matrix, vector, vector_shape, .. }) => {
                (Some(matrix.entries), Some((vector_shape, vector.entries)))
            }
            None => (None, None),
        };

        // 4-6: partition, distribute, convert
        let dist = partition_rows(rows, comm.size())?;
        let window = dist.range(comm.rank());
        let local_entries = scatter_entries(comm, root, matrix_entries, &dist)?;
        let local = to_csr_windowed(local_entries, window.start, window.end, cols);
        debug!(rows = local.nrows(), nnz = local.nnz(), "local matrix ready");

        // 7: dense vector
        let x = self.broadcast_vector(vector_input, vector_len)?;

        // 8: local multiply
        let skipped = local.out_of_range_columns(x.len());
        if skipped > 0 {
            warn!(skipped, "skipped entries with column outside the vector");
        }
        let local_y = local.multiply(&x);
        drop(local);

        // 9: gather
        let gathered = gather_result(comm, &local_y, root)?;
        let skipped_total: usize = comm
            .gather_ints(&[skipped as u64], root)?
            .iter()
            .map(|&n| n as usize)
            .sum();

        // 10: output, root only
        let Some(y) = gathered else {
            return Ok(None);
        };
        let path = &self.options.output_path;
        let nnz_written = match write_vector_file(path, &y, self.options.zero_tolerance) {
            Ok(n) => n,
            Err(err) => {
                error!(%err, "output write failed");
                return Err(err);
            }
        };
        info!(path = %path.display(), nnz = nnz_written, "wrote output");
        Ok(Some(RunSummary { rows, cols, nnz_written, skipped_columns: skipped_total }))
    }

    /// Build the dense vector on root (consuming its entries) and broadcast
    /// length, then values, to every rank.
    fn broadcast_vector(
        &self,
        input: Option<(VectorShape, Vec<CoordinateEntry>)>,
        vector_len: usize,
    ) -> Result<Vec<f64>, SpmvError> {
        let root = self.options.root;
        let mut x = match input {
            Some((shape, entries)) => dense_vector_from_entries(shape, vector_len, &entries),
            None => Vec::new(),
        };
        let mut len = [x.len() as u64];
        self.comm.broadcast_ints(&mut len, root)?;
        x.resize(len[0] as usize, 0.0);
        if !x.is_empty() {
            self.comm.broadcast_floats(&mut x, root)?;
        }
        Ok(x)
    }
}
