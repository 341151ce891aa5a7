//! Formula compiler and stack virtual machine.
//!
//! This crate compiles single-line formulas over scalar and vector arguments
//! into a compact instruction sequence for an accumulator-based stack machine,
//! optimizes it, and evaluates it as often as needed.
//!
//! # Features
//!
//! - Arithmetic, comparisons (`=`, `<>`, `<`, `<=`, `>=`, `>`), `AND`/`OR`/`NOT`
//!   and `IF(cond, then, else)`
//! - Scalar arguments `X0, X1, ...` and vector arguments `X0{}, X1{}, ...`
//! - Vector literals such as `{1, X0, X1{}}`, where vector elements are spliced in
//! - Functions and constants from a [`Registry`], looked up case-insensitively
//! - Four optimizer passes: constant folding, common subterms, push
//!   coalescing and shared vector literals
//! - Parallel evaluation over many argument sets with rayon
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use formula_vm::prelude::*;
//!
//! let mut registry = Registry::standard();
//! registry
//!     .register_function("CUBE", "x^3", 1, |a| a[0] * a[0] * a[0])
//!     .unwrap();
//!
//! let mut formula = Formula::new(Arc::new(registry), OptimizationFlags::default());
//! formula.set_formula("cube(X0) + VSUM({X1, X0{}})").unwrap();
//!
//! // X0 = 2, X1 = 1, X0{} = [3, 4]
//! let result = formula.calculate(&[2.0, 1.0], &[&[3.0, 4.0]]).unwrap();
//! assert_eq!(result, 16.0);
//! ```
//!
//! # Built-ins
//!
//! [`Registry::standard`] provides ABS, SQRT, EXP, LN, LOG, SIN, COS, TAN,
//! ASIN, ACOS, ATAN, SINH, COSH, TANH, FLOOR, CEIL, ROUND, TRUNC, SIGN, MIN,
//! MAX, POW, ATAN2, HYPOT and MOD; the vector functions VSUM, VMEAN, VMIN, VMAX,
//! VLEN, VNORM, VDOT, VGET, VSCALE and VADD; and the constants PI and E.
//!
//! Registered functions must be pure: the optimizer may evaluate them at
//! compile time and may evaluate a shared subterm even on a branch of `IF`
//! that is not taken.

pub use errors::{CompileError, ErrorCode, EvalError, RegistryError};
pub use formula::Formula;
pub use program::Program;
pub use registry::Registry;

pub mod prelude {
    pub use crate::backends::vector::Vector;
    pub use crate::errors::{CompileError, ErrorCode, EvalError, RegistryError};
    pub use crate::formula::Formula;
    pub use crate::opt::OptimizationFlags;
    pub use crate::program::Program;
    pub use crate::registry::{ArgKind, Registry};
    pub use crate::vm::Context;
}

/// Containers accepted as formula arguments
pub mod backends {
    pub mod vector;
}
/// Recursive-descent parser emitting machine code
pub mod codegen;
/// Error types for the various failure modes
pub mod errors;
/// Compile-once, evaluate-many facade
pub mod formula;
/// Jump label resolution
pub mod jumps;
/// Splitting formula text into lexemes
pub mod lexer;
/// Instruction set
pub mod op;
/// Optimizer passes
pub mod opt;
/// Compiled programs
pub mod program;
/// Functions and constants available to formulas
pub mod registry;
/// Static stack-depth analysis
pub mod sizing;
/// Lexeme classification
pub mod token;
/// Shared function type aliases
pub mod types;
/// Virtual machine
pub mod vm;
