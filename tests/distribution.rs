//! Distribution, local multiply and gather over in-process rank groups.
//!
//! These tests drive the pipeline stages directly (no files): entries are
//! scattered from a root, converted per rank, multiplied and gathered back,
//! for several group sizes including groups larger than the row count.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rowspmv::distribute::{gather_result, partition_rows, scatter_entries};
use rowspmv::matrix::{CoordinateEntry, to_csr, to_csr_windowed};
use rowspmv::parallel::{Comm, LocalComm};

fn random_entries(seed: u64, nrows: usize, ncols: usize, count: usize) -> Vec<CoordinateEntry> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            CoordinateEntry::new(
                rng.gen_range(0..nrows),
                rng.gen_range(0..ncols),
                rng.gen_range(-1.0..1.0),
            )
        })
        .collect()
}

fn sorted(mut entries: Vec<CoordinateEntry>) -> Vec<CoordinateEntry> {
    entries.sort_by(|a, b| a.key().cmp(&b.key()).then(a.value.total_cmp(&b.value)));
    entries
}

/// Distributed y = A x with `workers` ranks, returned from the root.
fn distributed_multiply(workers: usize, nrows: usize, ncols: usize, entries: &[CoordinateEntry], x: &[f64]) -> Vec<f64> {
    let results = LocalComm::run(workers, |comm| {
        let dist = partition_rows(nrows, comm.size()).unwrap();
        let root_entries = (comm.rank() == 0).then(|| entries.to_vec());
        let local_entries = scatter_entries(comm, 0, root_entries, &dist).unwrap();
        let window = dist.range(comm.rank());
        let local = to_csr_windowed(local_entries, window.start, window.end, ncols);
        let y = local.multiply(x);
        gather_result(comm, &y, 0).unwrap()
    });
    results.into_iter().next().flatten().unwrap()
}

#[test]
fn scatter_is_lossless_and_non_duplicating() {
    let (nrows, ncols) = (17, 9);
    let entries = random_entries(1, nrows, ncols, 150);
    for workers in 1..=5 {
        let received = LocalComm::run(workers, |comm| {
            let dist = partition_rows(nrows, comm.size()).unwrap();
            let root_entries = (comm.rank() == 0).then(|| entries.clone());
            let local = scatter_entries(comm, 0, root_entries, &dist).unwrap();
            let window = dist.range(comm.rank());
            assert!(local.iter().all(|e| window.contains(&e.row)), "rank {} got a foreign row", comm.rank());
            local
        });
        let union: Vec<CoordinateEntry> = received.into_iter().flatten().collect();
        assert_eq!(sorted(union), sorted(entries.clone()), "workers = {workers}");
    }
}

#[test]
fn scatter_from_a_non_zero_root() {
    let entries = random_entries(2, 6, 3, 20);
    let received = LocalComm::run(3, |comm| {
        let dist = partition_rows(6, comm.size()).unwrap();
        let root_entries = (comm.rank() == 2).then(|| entries.clone());
        scatter_entries(comm, 2, root_entries, &dist).unwrap()
    });
    let union: Vec<CoordinateEntry> = received.into_iter().flatten().collect();
    assert_eq!(sorted(union), sorted(entries));
}

#[test]
fn identity_times_vector_for_any_worker_count() {
    let identity: Vec<CoordinateEntry> = (0..3).map(|i| CoordinateEntry::new(i, i, 1.0)).collect();
    for workers in 1..=5 {
        let y = distributed_multiply(workers, 3, 3, &identity, &[1.0, 2.0, 3.0]);
        assert_eq!(y, vec![1.0, 2.0, 3.0], "workers = {workers}");
    }
}

#[test]
fn distributed_matches_serial_bit_for_bit() {
    let (nrows, ncols) = (23, 11);
    let entries = random_entries(9, nrows, ncols, 200);
    let x: Vec<f64> = (0..ncols).map(|j| (j as f64).sin()).collect();
    let serial = to_csr(nrows, ncols, entries.clone()).multiply(&x);
    for workers in [1, 2, 3, 4, 7, 30] {
        assert_eq!(distributed_multiply(workers, nrows, ncols, &entries, &x), serial, "workers = {workers}");
    }
}

#[test]
fn empty_matrix_gathers_nothing() {
    let y = distributed_multiply(3, 0, 4, &[], &[1.0; 4]);
    assert!(y.is_empty());
}
