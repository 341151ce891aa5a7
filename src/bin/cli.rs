use clap::Parser;
use formula_vm::prelude::*;
use std::{process, sync::Arc};

#[derive(Parser)]
#[command(name = "formula-vm")]
#[command(about = "Compile a formula to stack machine code and evaluate it")]
#[command(version)]
struct Args {
    /// Formula to compile, e.g. "SQRT(X0) + VSUM(X0{})"
    #[arg(required_unless_present = "builtins")]
    formula: Option<String>,

    /// Scalar argument values X0, X1, ... in order
    #[arg(short, long = "scalar", num_args = 1.., allow_negative_numbers = true)]
    scalars: Vec<f64>,

    /// A vector argument as a comma separated list; repeat for X0{}, X1{}, ...
    #[arg(short, long = "vector", allow_hyphen_values = true)]
    vectors: Vec<String>,

    /// Print the annotated instruction listing
    #[arg(short, long)]
    listing: bool,

    /// Compile without running the optimizer
    #[arg(long)]
    no_optimize: bool,

    /// List the available functions and constants and exit
    #[arg(long)]
    builtins: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<String, Box<dyn std::error::Error>> {
    let registry = Arc::new(Registry::standard());
    if args.builtins {
        return Ok(builtins(&registry));
    }

    let flags = if args.no_optimize {
        OptimizationFlags::none()
    } else {
        OptimizationFlags::default()
    };
    let source = args.formula.as_deref().unwrap_or_default();
    let program = Program::compile(source, &registry, flags)?;

    let mut lines = Vec::new();
    if args.listing {
        lines.push(program.listing());
    } else {
        lines.push(program.to_string());
    }

    if !args.scalars.is_empty() || !args.vectors.is_empty() || program.scalar_arguments() == 0 {
        let vectors = args
            .vectors
            .iter()
            .map(|v| parse_vector(v))
            .collect::<Result<Vec<_>, _>>()?;
        let slices: Vec<&[f64]> = vectors.iter().map(Vec::as_slice).collect();

        let mut ctx = program.context();
        let result = program.evaluate(&mut ctx, &args.scalars, &slices)?;
        lines.push(format!("= {}", result));
    }

    Ok(lines.join("\n"))
}

fn parse_vector(text: &str) -> Result<Vec<f64>, std::num::ParseFloatError> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

fn builtins(registry: &Registry) -> String {
    let mut lines = vec!["Functions:".to_string()];
    for (name, description) in registry.function_descriptions() {
        lines.push(format!("  {:<8} {}", name, description));
    }
    lines.push("Constants:".to_string());
    for (name, description) in registry.constant_descriptions() {
        lines.push(format!("  {:<8} {}", name, description));
    }
    lines.join("\n")
}
