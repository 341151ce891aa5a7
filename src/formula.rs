//! The `Formula` facade: compile once, evaluate many times.
//!
//! A `Formula` holds a registry, a set of optimizer switches and at most one
//! compiled [`Program`]. Setting a new formula replaces the program; if
//! compilation fails, the previous program is discarded as well, so a failed
//! `set_formula` never leaves a stale formula behind.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use formula_vm::prelude::*;
//!
//! let mut formula = Formula::new(Arc::new(Registry::standard()), OptimizationFlags::default());
//! formula.set_formula("IF(X0 > 0, SQRT(X0), VSUM(X0{}))").unwrap();
//! assert_eq!(formula.calculate(&[16.0], &[&[1.0, 2.0]]).unwrap(), 4.0);
//! assert_eq!(formula.calculate(&[-1.0], &[&[1.0, 2.0]]).unwrap(), 3.0);
//! ```

use std::sync::Arc;

use log::debug;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::backends::vector::Vector;
use crate::errors::{CompileError, EvalError};
use crate::opt::OptimizationFlags;
use crate::program::Program;
use crate::registry::Registry;
use crate::vm::Context;

/// A formula compiled against a registry.
#[derive(Debug, Clone)]
pub struct Formula {
    registry: Arc<Registry>,
    flags: OptimizationFlags,
    program: Option<Program>,
    ctx: Context,
}

impl Formula {
    pub fn new(registry: Arc<Registry>, flags: OptimizationFlags) -> Self {
        Formula {
            registry,
            flags,
            program: None,
            ctx: Context::default(),
        }
    }

    /// Compiles `source`, replacing any previous formula.
    ///
    /// # Errors
    /// Returns the [`CompileError`] that stopped compilation. The formula is
    /// left without a program in that case.
    pub fn set_formula(&mut self, source: &str) -> Result<(), CompileError> {
        self.program = None;
        let program = Program::compile(source, &self.registry, self.flags)?;
        self.ctx = program.context();
        self.program = Some(program);
        Ok(())
    }

    /// Evaluates the current formula.
    ///
    /// # Errors
    /// Returns `EvalError::NotCompiled` when no formula compiled successfully,
    /// or a missing-argument error when the slices are too short.
    pub fn calculate(&mut self, scalars: &[f64], vectors: &[&[f64]]) -> Result<f64, EvalError> {
        let program = self.program.as_ref().ok_or(EvalError::NotCompiled)?;
        program.evaluate(&mut self.ctx, scalars, vectors)
    }

    /// Evaluates with arguments held in any [`Vector`] container.
    ///
    /// # Example
    /// ```
    /// # use std::sync::Arc;
    /// # use formula_vm::prelude::*;
    /// let mut formula = Formula::new(Arc::new(Registry::standard()), OptimizationFlags::default());
    /// formula.set_formula("X0 * VDOT(X0{}, X1{})").unwrap();
    /// let result = formula.eval(&[2.0], &[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    /// assert_eq!(result, 22.0);
    /// ```
    ///
    /// # Errors
    /// Same as [`Formula::calculate`].
    pub fn eval<S, V>(&mut self, scalars: &S, vectors: &[V]) -> Result<f64, EvalError>
    where
        S: Vector + ?Sized,
        V: Vector,
    {
        let slices: SmallVec<[&[f64]; 4]> = vectors.iter().map(Vector::as_slice).collect();
        self.calculate(scalars.as_slice(), &slices)
    }

    /// Evaluates the formula for many scalar argument sets in parallel.
    ///
    /// The vector arguments are shared by every evaluation. Each rayon task
    /// works through a chunk of the input sets with its own context.
    ///
    /// # Errors
    /// Returns the first [`EvalError`] encountered.
    pub fn eval_parallel(
        &self,
        input_sets: &[Vec<f64>],
        vectors: &[&[f64]],
    ) -> Result<Vec<f64>, EvalError> {
        let program = self.program.as_ref().ok_or(EvalError::NotCompiled)?;
        let num_threads = rayon::current_num_threads();
        let chunk_size = (input_sets.len() / (num_threads * 4)).max(1);
        debug!(
            "evaluating {} input sets in chunks of {}",
            input_sets.len(),
            chunk_size
        );

        input_sets
            .par_chunks(chunk_size)
            .map(|chunk| {
                let mut ctx = program.context();
                chunk
                    .iter()
                    .map(|inputs| program.evaluate(&mut ctx, inputs, vectors))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|chunks| chunks.into_iter().flatten().collect())
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn flags(&self) -> OptimizationFlags {
        self.flags
    }

    /// Number of scalar arguments the current formula needs, 0 without one.
    pub fn scalar_argument_count(&self) -> usize {
        self.program.as_ref().map_or(0, Program::scalar_arguments)
    }

    /// Number of vector arguments the current formula needs, 0 without one.
    pub fn vector_argument_count(&self) -> usize {
        self.program.as_ref().map_or(0, Program::vector_arguments)
    }

    /// Names of all scalar and vector functions, in registration order.
    pub fn function_names(&self) -> Vec<&str> {
        self.registry.function_names()
    }

    /// `(name, description)` of every function.
    pub fn function_descriptions(&self) -> Vec<(&str, &str)> {
        self.registry.function_descriptions()
    }

    pub fn constant_names(&self) -> Vec<&str> {
        self.registry.constant_names()
    }

    /// `(name, description)` of every constant.
    pub fn constant_descriptions(&self) -> Vec<(&str, &str)> {
        self.registry.constant_descriptions()
    }
}
