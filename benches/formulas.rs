//! Formula Evaluation Benchmarks
//!
//! Compares compiled formulas running on the stack machine against hand-written
//! Rust, and measures how long compilation takes.
//!
//! ## Benchmark Structure
//!
//! ### 1. Formula Evaluation (`benchmark_formulas`)
//! - **Direct**: hand-written Rust computing the same value
//! - **Optimized**: the program compiled with every optimizer pass enabled
//! - **Unoptimized**: the program as emitted by the code generator
//!
//! Compilation is done during setup and excluded from these measurements.
//!
//! ### 2. Compilation Time (`benchmark_compilation_time`)
//! Measures tokenizing, code generation, optimization and stack sizing.
//!
//! ### 3. Parallel Evaluation (`benchmark_parallel`)
//! Evaluates one formula over many argument sets with `Formula::eval_parallel`.
//!
//! ## Usage
//!
//! Run with: `cargo bench --bench formulas`

use std::{f64::consts::PI, hint::black_box, sync::Arc};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use formula_vm::prelude::*;

struct DirectEvaluator;

impl DirectEvaluator {
    fn simple_add(a: f64) -> f64 {
        a + 1.1
    }

    fn linear(a: f64) -> f64 {
        2.2 * a + 1.1
    }

    fn polynomial(a: f64, b: f64) -> f64 {
        a.powf(2.0) / (2.0 * PI / b) - a / 2.2
    }

    /// (a + b) * (a - b) / ((c + 1) * (c - 1))
    fn nested(a: f64, b: f64, c: f64) -> f64 {
        ((a + b) * (a - b)) / ((c + 1.0) * (c - 1.0))
    }

    /// Repeated subterm, the optimizer evaluates it once
    fn repeated(a: f64, b: f64) -> f64 {
        (a + b).sqrt() * (a + b).sqrt() + (a + b).sqrt()
    }

    fn conditional(a: f64, b: f64) -> f64 {
        if a > b {
            (a - b).sqrt()
        } else {
            (b - a).sqrt()
        }
    }

    fn vector_sum(a: f64, v: &[f64]) -> f64 {
        a + v.iter().sum::<f64>()
    }

    fn vector_literal(a: f64, b: f64, v: &[f64]) -> f64 {
        let norm = (a * a + b * b + v.iter().map(|x| x * x).sum::<f64>()).sqrt();
        let max = v.iter().fold(a.max(b), |m, &x| m.max(x));
        norm + max
    }
}

const FORMULAS: [(&str, &str); 8] = [
    ("simple_add", "X0 + 1.1"),
    ("linear", "2.2 * X0 + 1.1"),
    ("polynomial", "X0^2 / (2 * PI / X1) - X0 / 2.2"),
    ("nested", "((X0 + X1) * (X0 - X1)) / ((X2 + 1) * (X2 - 1))"),
    ("repeated", "SQRT(X0 + X1) * SQRT(X0 + X1) + SQRT(X0 + X1)"),
    ("conditional", "IF(X0 > X1, SQRT(X0 - X1), SQRT(X1 - X0))"),
    ("vector_sum", "X0 + VSUM(X0{})"),
    ("vector_literal", "VNORM({X0, X1, X0{}}) + VMAX({X0, X1, X0{}})"),
];

fn direct(index: usize, s: &[f64], v: &[f64]) -> f64 {
    match index {
        0 => DirectEvaluator::simple_add(black_box(s[0])),
        1 => DirectEvaluator::linear(black_box(s[0])),
        2 => DirectEvaluator::polynomial(black_box(s[0]), black_box(s[1])),
        3 => DirectEvaluator::nested(black_box(s[0]), black_box(s[1]), black_box(s[2])),
        4 => DirectEvaluator::repeated(black_box(s[0]), black_box(s[1])),
        5 => DirectEvaluator::conditional(black_box(s[0]), black_box(s[1])),
        6 => DirectEvaluator::vector_sum(black_box(s[0]), black_box(v)),
        7 => DirectEvaluator::vector_literal(black_box(s[0]), black_box(s[1]), black_box(v)),
        _ => unreachable!(),
    }
}

fn benchmark_formulas(c: &mut Criterion) {
    let registry = Arc::new(Registry::standard());
    let scalars = [2.5, 1.8, 0.7];
    let vector = [0.5, 1.5, 2.5, 3.5];
    let vectors: [&[f64]; 1] = [&vector];

    let mut group = c.benchmark_group("Formula Evaluation");

    for (i, (name, source)) in FORMULAS.iter().enumerate() {
        group.bench_with_input(BenchmarkId::new("Direct", name), &i, |b, &i| {
            b.iter(|| black_box(direct(i, &scalars, &vector)))
        });

        for (label, flags) in [
            ("Optimized", OptimizationFlags::default()),
            ("Unoptimized", OptimizationFlags::none()),
        ] {
            let program =
                Program::compile(source, &registry, flags).expect("benchmark formula compiles");
            let mut ctx = program.context();
            group.bench_function(BenchmarkId::new(label, name), |b| {
                b.iter(|| {
                    let result = program
                        .evaluate(&mut ctx, black_box(&scalars), black_box(&vectors))
                        .expect("arguments are complete");
                    black_box(result)
                })
            });
        }
    }

    group.finish();
}

fn benchmark_compilation_time(c: &mut Criterion) {
    let registry = Arc::new(Registry::standard());
    let mut group = c.benchmark_group("Compilation Time");

    for (name, source) in FORMULAS {
        group.bench_with_input(BenchmarkId::new("Compile", name), source, |b, source| {
            b.iter(|| {
                let program = Program::compile(source, &registry, OptimizationFlags::default());
                black_box(program)
            })
        });
    }

    group.finish();
}

fn benchmark_parallel(c: &mut Criterion) {
    let mut formula = Formula::new(Arc::new(Registry::standard()), OptimizationFlags::default());
    formula
        .set_formula("SQRT(X0 * X0 + X1 * X1) + VDOT(X0{}, X0{})")
        .expect("benchmark formula compiles");
    let vector = [1.0, 2.0, 3.0];

    let mut group = c.benchmark_group("Parallel Evaluation");
    for size in [1_000, 100_000] {
        let inputs: Vec<Vec<f64>> = (0..size).map(|i| vec![i as f64, 0.5]).collect();
        group.bench_with_input(BenchmarkId::new("eval_parallel", size), &inputs, |b, inputs| {
            b.iter(|| black_box(formula.eval_parallel(inputs, &[&vector])))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_formulas,
    benchmark_compilation_time,
    benchmark_parallel
);
criterion_main!(benches);
