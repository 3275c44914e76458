//! Command-line driver: `rowspmv A.mtx x.mtx out.mtx [tolerance]`.
//!
//! Built with the `mpi` feature, launch under `mpirun -n P`; otherwise the ranks
//! run as threads of this process and `--workers P` picks their number.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rowspmv::config::{DEFAULT_ZERO_TOLERANCE, SpmvOptions};
use rowspmv::context::SpmvContext;
use tracing_subscriber::EnvFilter;

/// Distributed sparse matrix-vector product y = A x over Matrix Market files
#[derive(Parser, Debug)]
#[command(name = "rowspmv")]
#[command(version)]
struct Args {
    /// Input matrix file in Matrix Market coordinate format
    matrix: PathBuf,

    /// Input vector file (one row or one column) in Matrix Market coordinate format
    vector: PathBuf,

    /// Output file path
    output: PathBuf,

    /// Zero tolerance: results with |y_i| <= tolerance are not written
    #[arg(default_value_t = DEFAULT_ZERO_TOLERANCE, allow_negative_numbers = true)]
    tolerance: f64,

    /// Number of in-process worker ranks
    #[cfg(not(feature = "mpi"))]
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    workers: u16,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(not(feature = "mpi"))]
fn run(args: &Args, options: SpmvOptions) -> Result<()> {
    use rowspmv::parallel::LocalComm;

    let outcomes = LocalComm::run(usize::from(args.workers), |comm| {
        SpmvContext::new(comm, options.clone()).run()
    });
    // the root carries the specific error; the others only know validation failed
    let mut failures: Vec<_> = outcomes
        .into_iter()
        .enumerate()
        .filter_map(|(rank, outcome)| outcome.err().map(|err| (rank, err)))
        .collect();
    if failures.is_empty() {
        return Ok(());
    }
    let pick = failures.iter().position(|(rank, _)| *rank == options.root).unwrap_or(0);
    let (rank, err) = failures.swap_remove(pick);
    Err(err).with_context(|| format!("rank {rank} failed"))
}

#[cfg(feature = "mpi")]
fn run(_args: &Args, options: SpmvOptions) -> Result<()> {
    use rowspmv::parallel::{Comm, MpiComm};

    let Some(comm) = MpiComm::new() else {
        bail!("MPI was already initialized");
    };
    SpmvContext::new(&comm, options)
        .run()
        .with_context(|| format!("rank {} failed", comm.rank()))?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    if !(args.tolerance >= 0.0) {
        bail!("tolerance must be a non-negative number, got {}", args.tolerance);
    }
    let options = SpmvOptions::new(&args.matrix, &args.vector, &args.output).with_tolerance(args.tolerance);
    run(&args, options)
}
