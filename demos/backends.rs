//! Evaluates the same formulas through every argument container `Formula::eval`
//! accepts:
//! - Vec<f64>
//! - fixed-size arrays
//! - nalgebra::DVector
//! - ndarray::Array1
//!
//! For each backend it reports the sequential evaluation time, the average
//! nanoseconds per evaluation and a checksum that must agree across backends.
//! Parallel evaluation over plain vectors is timed at the end.
//!
//! Run with: `cargo run --release --example backends --features ndarray,nalgebra`

use colored::Colorize;
use formula_vm::prelude::*;
use nalgebra::DVector;
use ndarray::Array1;
use std::{sync::Arc, time::Instant};

const FORMULAS: [&str; 4] = [
    "2*X0 + X1^2/X2 + SQRT(X2^2) + VDOT(X0{}, X1{})",
    "EXP(X0/2) + X1^2/SQRT(X2) + LN(X2+X0) + VSUM(X0{})",
    "IF(X0 > X1, VMAX({X0, X1, X0{}}), VMIN({X2, X1{}}))",
    "VNORM(VADD(X0{}, VSCALE(X1{}, X2))) + VMEAN({X0, X1, X2})",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let n_runs = 10_000;
    let registry = Arc::new(Registry::standard());

    let mut formulas = Vec::with_capacity(FORMULAS.len());
    let start = Instant::now();
    for source in FORMULAS {
        let mut formula = Formula::new(Arc::clone(&registry), OptimizationFlags::default());
        formula.set_formula(source)?;
        formulas.push(formula);
    }
    println!(
        "Compilation: {}",
        format!("{:?} for {} formulas", start.elapsed(), FORMULAS.len())
            .bright_yellow()
            .italic()
    );

    println!("\n{}", "=== Vec<f64> Backend ===".bright_blue().bold());
    run_backend(&mut formulas, n_runs, |i| {
        let x = i as f64;
        (vec![x + 1.0, x + 2.0, x + 3.0], [vec![0.5, 1.5, x], vec![2.0, 1.0, 0.5]])
    })?;

    println!("\n{}", "=== Array Backend ===".bright_magenta().bold());
    run_backend(&mut formulas, n_runs, |i| {
        let x = i as f64;
        ([x + 1.0, x + 2.0, x + 3.0], [[0.5, 1.5, x], [2.0, 1.0, 0.5]])
    })?;

    println!("\n{}", "=== nalgebra Backend ===".bright_green().bold());
    run_backend(&mut formulas, n_runs, |i| {
        let x = i as f64;
        (
            DVector::from_vec(vec![x + 1.0, x + 2.0, x + 3.0]),
            [
                DVector::from_vec(vec![0.5, 1.5, x]),
                DVector::from_vec(vec![2.0, 1.0, 0.5]),
            ],
        )
    })?;

    println!("\n{}", "=== ndarray Backend ===".bright_yellow().bold());
    run_backend(&mut formulas, n_runs, |i| {
        let x = i as f64;
        (
            Array1::from_vec(vec![x + 1.0, x + 2.0, x + 3.0]),
            [
                Array1::from_vec(vec![0.5, 1.5, x]),
                Array1::from_vec(vec![2.0, 1.0, 0.5]),
            ],
        )
    })?;

    println!("\n{}", "=== Parallel (Vec<f64>) ===".bright_cyan().bold());
    let batch_input = (0..n_runs)
        .map(|i| vec![(i + 1) as f64, (i + 2) as f64, (i + 3) as f64])
        .collect::<Vec<_>>();
    let shared: [&[f64]; 2] = [&[0.5, 1.5, 2.5], &[2.0, 1.0, 0.5]];
    let start = Instant::now();
    for formula in &formulas {
        let _results = formula.eval_parallel(&batch_input, &shared)?;
    }
    print_metrics(n_runs, formulas.len(), start.elapsed());

    Ok(())
}

/// Times `n_runs` evaluations of every formula with arguments built by `make`.
fn run_backend<S, V, F>(
    formulas: &mut [Formula],
    n_runs: usize,
    make: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: Vector,
    V: Vector,
    F: Fn(usize) -> (S, [V; 2]),
{
    let inputs = (0..n_runs).map(&make).collect::<Vec<_>>();

    let mut checksum = 0.0;
    let start = Instant::now();
    for (scalars, vectors) in &inputs {
        for formula in formulas.iter_mut() {
            checksum += formula.eval(scalars, &vectors[..])?;
        }
    }
    print_metrics(n_runs, formulas.len(), start.elapsed());
    println!(
        "Checksum: {}",
        format!("{checksum:.6}").bright_white().italic()
    );
    Ok(())
}

fn print_metrics(n_runs: usize, n_formulas: usize, duration: std::time::Duration) {
    println!(
        "Evaluation: {}",
        format!("{duration:?} for {n_runs} runs and {n_formulas} formulas")
            .bright_yellow()
            .italic()
    );

    let ns_per_eval =
        (duration.as_secs_f64() * 1_000_000_000.0) / (n_runs as f64 * n_formulas as f64);
    println!(
        "Average: {}",
        format!("{ns_per_eval:.2} ns/evaluation").bright_yellow().italic()
    );
}
