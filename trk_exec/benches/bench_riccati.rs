//! # Riccati solve benchmark
//!
//! The Riccati solve dominates the per-cycle cost of lateral control (the
//! eigen-decomposition of the Hamiltonian matrix, not the rest of the
//! pipeline). This benchmark confirms the solve fits comfortably inside a
//! 100 ms control period.

use criterion::{criterion_group, criterion_main, Criterion};

use nalgebra::{DMatrix, DVector};
use trk_lib::riccati::{self, SolverParams};

fn riccati_benchmark(c: &mut Criterion) {
    // ---- Build the lateral-error model at a representative speed ----

    let speed_ms = 2.0;
    let wheelbase_m = 2.5;

    let a = DMatrix::from_row_slice(2, 2, &[0.0, speed_ms, 0.0, 0.0]);
    let b = DMatrix::from_row_slice(2, 1, &[0.0, speed_ms / wheelbase_m]);
    let q = DMatrix::from_diagonal(&DVector::from_vec(vec![20.0, 30.0]));
    let r = DMatrix::from_element(1, 1, 15.0);

    let params = SolverParams::default();

    c.bench_function("riccati_solve_lateral_model", |bench| {
        bench.iter(|| riccati::solve(&a, &b, &q, &r, &params).unwrap())
    });
}

criterion_group!(benches, riccati_benchmark);
criterion_main!(benches);
