//! Compiled formulas.
//!
//! A [`Program`] is the immutable result of running a formula through every
//! compile stage. It can be shared between threads; all mutable state of an
//! evaluation lives in a [`Context`] that the caller owns.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use formula_vm::prelude::*;
//!
//! let registry = Arc::new(Registry::standard());
//! let program = Program::compile("X0^2 + X0", &registry, OptimizationFlags::default()).unwrap();
//! let mut ctx = program.context();
//! assert_eq!(program.evaluate(&mut ctx, &[3.0], &[]).unwrap(), 12.0);
//! ```

use std::fmt;
use std::sync::Arc;

use colored::Colorize;
use itertools::Itertools;
use log::{debug, trace};

use crate::codegen::generate;
use crate::errors::{CompileError, EvalError};
use crate::jumps::resolve;
use crate::lexer::tokenize;
use crate::op::{Instr, Op};
use crate::opt::{optimize, OptimizationFlags};
use crate::registry::Registry;
use crate::sizing::{measure, StackSizes};
use crate::token::{classify, Usage};
use crate::vm::{execute, Context};

/// Value pools that instructions refer to by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pools {
    /// Numeric literals and scalar registry constants
    pub constants: Vec<f64>,
    /// Constant vectors, from brace literals and vector registry constants
    pub vector_constants: Vec<Vec<f64>>,
    /// Values computed by constant folding
    pub calculated: Vec<f64>,
    pub subterm_count: usize,
    pub vector_subterm_count: usize,
}

/// A compiled formula, ready to be evaluated any number of times.
#[derive(Debug, Clone)]
pub struct Program {
    source: String,
    code: Vec<Instr>,
    pools: Pools,
    registry: Arc<Registry>,
    usage: Usage,
    sizes: StackSizes,
    has_jump: bool,
    has_vector: bool,
    has_nested_vector: bool,
}

impl Program {
    /// Compiles `source` against `registry`.
    ///
    /// # Arguments
    /// * `source` - The formula text, e.g. `"IF(X0 > 0, SQRT(X0), 0)"`
    /// * `registry` - Functions and constants the formula may use
    /// * `flags` - Which optimizer passes to run
    ///
    /// # Errors
    /// Returns the first [`CompileError`] of the lexer, classifier, parser or
    /// stack analysis.
    pub fn compile(
        source: &str,
        registry: &Arc<Registry>,
        flags: OptimizationFlags,
    ) -> Result<Program, CompileError> {
        let lexemes = tokenize(source)?;
        let classified = classify(source, &lexemes, registry)?;
        debug!(
            "classified {} lexemes into {} tokens",
            lexemes.len(),
            classified.tokens.len()
        );

        let generated = generate(&classified.tokens, registry)?;
        debug!("generated {} instructions", generated.code.len());

        let mut pools = Pools {
            constants: classified.constants,
            vector_constants: classified.vector_constants,
            ..Pools::default()
        };
        let optimized = optimize(
            generated.code,
            &mut pools,
            registry,
            generated.has_vector,
            flags,
        );
        let code = resolve(&optimized);
        let sizes = measure(&code, registry)?;
        debug!(
            "compiled '{}': {} instructions, stacks {}/{}/{}",
            source,
            code.len(),
            sizes.scalar,
            sizes.vector,
            sizes.staging
        );

        let has_jump = code
            .iter()
            .any(|i| matches!(i.op, Op::Jump(_) | Op::JumpIfFalse(_)));
        let program = Program {
            source: source.to_string(),
            code,
            pools,
            registry: Arc::clone(registry),
            usage: classified.usage,
            sizes,
            has_jump,
            has_vector: generated.has_vector,
            has_nested_vector: generated.has_nested_vector,
        };
        trace!("\n{}", program.listing());
        Ok(program)
    }

    /// A fresh context sized for this program.
    pub fn context(&self) -> Context {
        Context::new(
            &self.sizes,
            self.pools.subterm_count,
            self.pools.vector_subterm_count,
        )
    }

    /// Evaluates the program.
    ///
    /// `scalars[i]` is the value of `Xi`, `vectors[i]` the value of `Xi{}`.
    /// Extra arguments are ignored. The context grows if it is too small.
    ///
    /// # Errors
    /// Returns [`EvalError`] when fewer arguments are supplied than the formula
    /// references.
    pub fn evaluate(
        &self,
        ctx: &mut Context,
        scalars: &[f64],
        vectors: &[&[f64]],
    ) -> Result<f64, EvalError> {
        self.validate_input_length(scalars, vectors)?;
        ctx.ensure(
            &self.sizes,
            self.pools.subterm_count,
            self.pools.vector_subterm_count,
        );
        Ok(execute(
            &self.code,
            &self.pools,
            &self.registry,
            scalars,
            vectors,
            ctx,
        ))
    }

    fn validate_input_length(&self, scalars: &[f64], vectors: &[&[f64]]) -> Result<(), EvalError> {
        if scalars.len() < self.usage.scalar_arguments {
            return Err(EvalError::MissingScalarArguments {
                expected: self.usage.scalar_arguments,
                got: scalars.len(),
            });
        }
        if vectors.len() < self.usage.vector_arguments {
            return Err(EvalError::MissingVectorArguments {
                expected: self.usage.vector_arguments,
                got: vectors.len(),
            });
        }
        Ok(())
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn code(&self) -> &[Instr] {
        &self.code
    }

    pub fn pools(&self) -> &Pools {
        &self.pools
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn usage(&self) -> &Usage {
        &self.usage
    }

    pub fn stack_sizes(&self) -> &StackSizes {
        &self.sizes
    }

    /// Number of scalar arguments the formula needs (highest index plus one).
    pub fn scalar_arguments(&self) -> usize {
        self.usage.scalar_arguments
    }

    /// Number of vector arguments the formula needs (highest index plus one).
    pub fn vector_arguments(&self) -> usize {
        self.usage.vector_arguments
    }

    pub fn has_jump(&self) -> bool {
        self.has_jump
    }

    pub fn has_vector(&self) -> bool {
        self.has_vector
    }

    /// True when a vector literal is built while another one is still open,
    /// e.g. `{1, VSCALE({X0, 2}, 3)}`.
    pub fn has_nested_vector(&self) -> bool {
        self.has_nested_vector
    }

    /// Operand detail shown next to an instruction in the listing.
    fn annotation(&self, op: Op) -> Option<String> {
        let fmt_vector = |v: &[f64]| format!("{{{}}}", v.iter().join(", "));
        match op {
            Op::Const(i) => self.pools.constants.get(i as usize).map(f64::to_string),
            Op::Calculated(i) => self.pools.calculated.get(i as usize).map(f64::to_string),
            Op::VecConst(i) => self
                .pools
                .vector_constants
                .get(i as usize)
                .map(|v| fmt_vector(v)),
            Op::Call(f) => Some(self.registry.function(f).name().to_string()),
            Op::CallVector(f) => Some(self.registry.vector_function(f).name().to_string()),
            _ => None,
        }
    }

    /// Human-readable disassembly, one instruction per line.
    ///
    /// A `+` after the instruction marks the push flag.
    pub fn listing(&self) -> String {
        self.code
            .iter()
            .enumerate()
            .map(|(index, instr)| {
                let text = format!("{}{}", instr.op, if instr.push { " +" } else { "" });
                match self.annotation(instr.op) {
                    Some(note) => format!("{index:>4}  {text:<20} ; {note}\n"),
                    None => format!("{index:>4}  {text}\n"),
                }
            })
            .collect()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", "Formula".cyan(), self.source)?;
        writeln!(
            f,
            "{}: {} scalar, {} vector",
            "Arguments".cyan(),
            self.usage.scalar_arguments,
            self.usage.vector_arguments
        )?;
        writeln!(
            f,
            "{}: scalar {}, vector {}, staging {}",
            "Stacks".cyan(),
            self.sizes.scalar,
            self.sizes.vector,
            self.sizes.staging
        )?;
        writeln!(f, "{}:", "Code".cyan())?;
        write!(f, "{}", self.listing())
    }
}
