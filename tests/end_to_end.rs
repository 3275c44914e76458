//! End-to-end runs: Matrix Market files in, Matrix Market file out.
//!
//! Each test writes its inputs to a temporary directory and runs the full
//! context on every rank of an in-process group.

use std::fs;
use std::path::{Path, PathBuf};

use rowspmv::config::SpmvOptions;
use rowspmv::context::{RunSummary, SpmvContext};
use rowspmv::error::{MarketError, SpmvError};
use rowspmv::parallel::LocalComm;
use tempfile::TempDir;

const DIAG_MATRIX: &str = "%%MatrixMarket matrix coordinate real general\n2 2 2\n1 1 2.0\n2 2 3.0\n";
const ONES_VECTOR: &str = "%%MatrixMarket matrix coordinate real general\n2 1 2\n1 1 1.0\n2 1 1.0\n";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(matrix: &str, vector: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("A.mtx"), matrix).unwrap();
        fs::write(dir.path().join("x.mtx"), vector).unwrap();
        Fixture { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn options(&self, output: &str) -> SpmvOptions {
        SpmvOptions::new(self.path("A.mtx"), self.path("x.mtx"), self.path(output))
    }
}

fn run_all(workers: usize, options: &SpmvOptions) -> Vec<Result<Option<RunSummary>, SpmvError>> {
    LocalComm::run(workers, |comm| SpmvContext::new(comm, options.clone()).run())
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn diagonal_example_is_independent_of_worker_count() {
    let fx = Fixture::new(DIAG_MATRIX, ONES_VECTOR);

    let one = run_all(1, &fx.options("y1.mtx"));
    let four = run_all(4, &fx.options("y4.mtx"));

    let summary = one[0].as_ref().unwrap().unwrap();
    assert_eq!(summary, RunSummary { rows: 2, cols: 2, nnz_written: 2, skipped_columns: 0 });
    assert_eq!(four[0].as_ref().unwrap().unwrap(), summary);
    assert!(four[1..].iter().all(|r| matches!(r, Ok(None))));

    let expected = "%%MatrixMarket matrix coordinate real general\n2 1 2\n1 1 2\n2 1 3\n";
    assert_eq!(read(&fx.path("y1.mtx")), expected);
    assert_eq!(fs::read(fx.path("y1.mtx")).unwrap(), fs::read(fx.path("y4.mtx")).unwrap());
}

#[test]
fn symmetric_matrix_is_expanded() {
    let matrix = "%%MatrixMarket matrix coordinate real symmetric\n2 2 1\n1 2 5.0\n";
    let vector = "%%MatrixMarket matrix coordinate real general\n1 2 2\n1 1 1.0\n1 2 2.0\n";
    let fx = Fixture::new(matrix, vector);
    let out = run_all(3, &fx.options("y.mtx"));
    assert!(out[0].is_ok());
    // [[0,5],[5,0]] * [1,2] = [10, 5]
    assert_eq!(
        read(&fx.path("y.mtx")),
        "%%MatrixMarket matrix coordinate real general\n2 1 2\n1 1 10\n2 1 5\n"
    );
}

#[test]
fn duplicates_and_tolerance_filter() {
    let matrix = "%%MatrixMarket matrix coordinate real general\n3 2 4\n1 1 1.0\n1 1 0.5\n2 2 1e-14\n3 1 -2.0\n";
    let vector = "%%MatrixMarket matrix coordinate real general\n2 1 2\n1 1 2.0\n2 1 1.0\n";
    let fx = Fixture::new(matrix, vector);
    let out = run_all(2, &fx.options("y.mtx"));
    assert_eq!(out[0].as_ref().unwrap().unwrap().nnz_written, 2);
    assert_eq!(
        read(&fx.path("y.mtx")),
        "%%MatrixMarket matrix coordinate real general\n3 1 2\n1 1 3\n3 1 -4\n"
    );

    let loose = run_all(2, &fx.options("loose.mtx").with_tolerance(0.0));
    assert_eq!(loose[0].as_ref().unwrap().unwrap().nnz_written, 3);
}

#[test]
fn missing_matrix_fails_on_every_rank_without_output() {
    let fx = Fixture::new(DIAG_MATRIX, ONES_VECTOR);
    let options = SpmvOptions::new(fx.path("nope.mtx"), fx.path("x.mtx"), fx.path("y.mtx"));
    let out = run_all(3, &options);
    assert!(matches!(out[0], Err(SpmvError::Market(MarketError::Open { .. }))));
    assert!(out[1..].iter().all(|r| matches!(r, Err(SpmvError::ValidationFailed))));
    assert!(!fx.path("y.mtx").exists());
}

#[test]
fn dimension_mismatch_is_fatal() {
    let vector = "%%MatrixMarket matrix coordinate real general\n3 1 1\n1 1 1.0\n";
    let fx = Fixture::new(DIAG_MATRIX, vector);
    let out = run_all(2, &fx.options("y.mtx"));
    assert!(matches!(out[0], Err(SpmvError::DimensionMismatch { matrix_cols: 2, vector_len: 3 })));
    assert!(matches!(out[1], Err(SpmvError::ValidationFailed)));
    assert!(!fx.path("y.mtx").exists());
}

#[test]
fn non_vector_second_input_is_rejected() {
    let vector = "%%MatrixMarket matrix coordinate real general\n2 2 1\n1 1 1.0\n";
    let fx = Fixture::new(DIAG_MATRIX, vector);
    let out = run_all(1, &fx.options("y.mtx"));
    assert!(matches!(out[0], Err(SpmvError::NotAVector { rows: 2, cols: 2 })));
}

#[test]
fn unwritable_output_is_reported_on_root() {
    let fx = Fixture::new(DIAG_MATRIX, ONES_VECTOR);
    let out = run_all(2, &fx.options("missing-dir/y.mtx"));
    assert!(matches!(out[0], Err(SpmvError::OutputWrite { .. })));
    assert!(matches!(out[1], Ok(None)));
}

#[test]
fn out_of_range_columns_are_counted() {
    // declared 2 columns but one entry sits in column 3
    let matrix = "%%MatrixMarket matrix coordinate real general\n2 2 3\n1 1 1.0\n2 3 9.0\n2 2 1.0\n";
    let fx = Fixture::new(matrix, ONES_VECTOR);
    let out = run_all(2, &fx.options("y.mtx"));
    let summary = out[0].as_ref().unwrap().unwrap();
    assert_eq!(summary.skipped_columns, 1);
    assert_eq!(
        read(&fx.path("y.mtx")),
        "%%MatrixMarket matrix coordinate real general\n2 1 2\n1 1 1\n2 1 1\n"
    );
}

#[test]
fn inflated_entry_count_on_size_line_still_runs() {
    let matrix = "%%MatrixMarket matrix coordinate real general\n2 2 18446744073709551615\n1 1 1.0\n2 1 0.5\n";
    let fx = Fixture::new(matrix, ONES_VECTOR);
    let out = run_all(3, &fx.options("y.mtx"));
    let summary = out[0].as_ref().unwrap().unwrap();
    assert_eq!(summary.nnz_written, 2);
    assert!(out[1..].iter().all(|r| matches!(r, Ok(None))));
    assert_eq!(
        read(&fx.path("y.mtx")),
        "%%MatrixMarket matrix coordinate real general\n2 1 2\n1 1 1\n2 1 0.5\n"
    );
}
