//! Static stack-depth analysis.
//!
//! Walks the instruction sequence once, tracking the depth of the scalar,
//! vector and staging stacks. The maxima size the evaluation context; any
//! underflow, or a value left on a stack at the end, is a compile error.
//!
//! The walk is linear even across jumps: both branches of a conditional leave
//! the stacks as they found them, so the straight-line depth bounds every path.

use crate::errors::CompileError;
use crate::op::{Instr, Op};
use crate::registry::{ArgKind, Registry};

/// Stack traffic of a single instruction, push flag included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effect {
    pub scalar_pop: usize,
    pub scalar_push: usize,
    pub vector_pop: usize,
    pub vector_push: usize,
    pub staging_pop: usize,
    pub staging_push: usize,
    /// Needs an open staging list without changing the staging depth
    pub staging_read: bool,
}

/// Computes the stack traffic of `instr`.
pub fn effect(instr: &Instr, registry: &Registry) -> Effect {
    let mut e = Effect::default();
    match instr.op {
        Op::Push => e.scalar_push = 1,
        Op::Binary(_) => e.scalar_pop = 1,
        Op::Call(f) => e.scalar_pop = registry.function(f).arity(),
        Op::CallVector(f) => {
            let function = registry.vector_function(f);
            e.scalar_pop = function.scalar_arity();
            e.vector_pop = function.vector_arity();
            if function.output() == ArgKind::Vector {
                e.vector_push = 1;
            }
        }
        Op::VecArg(_) | Op::VecConst(_) | Op::VecSubterm(_) => e.vector_push = 1,
        Op::StoreVecSubterm(_) => {
            e.vector_pop = 1;
            e.vector_push = 1;
        }
        Op::VecBegin => e.staging_push = 1,
        Op::Append => e.staging_read = true,
        Op::Spread => {
            e.vector_pop = 1;
            e.staging_read = true;
        }
        Op::VecEnd => {
            e.staging_pop = 1;
            e.vector_push = 1;
        }
        Op::Neg
        | Op::Not
        | Op::JumpIfFalse(_)
        | Op::Jump(_)
        | Op::Label(_)
        | Op::Arg(_)
        | Op::Const(_)
        | Op::Subterm(_)
        | Op::StoreSubterm(_)
        | Op::Calculated(_) => {}
    }
    if instr.push {
        e.scalar_push += 1;
    }
    e
}

/// Current depth of the three stacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Depths {
    pub scalar: usize,
    pub vector: usize,
    pub staging: usize,
}

impl Depths {
    /// Applies an effect; `None` when it would underflow a stack.
    pub fn apply(self, e: &Effect) -> Option<Depths> {
        if e.staging_read && self.staging == 0 {
            return None;
        }
        Some(Depths {
            scalar: self.scalar.checked_sub(e.scalar_pop)? + e.scalar_push,
            vector: self.vector.checked_sub(e.vector_pop)? + e.vector_push,
            staging: self.staging.checked_sub(e.staging_pop)? + e.staging_push,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.scalar == 0 && self.vector == 0 && self.staging == 0
    }
}

/// Maximum depth each stack reaches during evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackSizes {
    pub scalar: usize,
    pub vector: usize,
    pub staging: usize,
}

fn imbalance(before: Depths, e: &Effect, index: usize) -> CompileError {
    let stack = if before.scalar < e.scalar_pop {
        "scalar"
    } else if before.vector < e.vector_pop {
        "vector"
    } else {
        "staging"
    };
    CompileError::StackImbalance { stack, index }
}

/// Measures the stack sizes `code` needs.
///
/// # Errors
/// Returns `CompileError::StackImbalance` when an instruction would pop from an
/// empty stack or the sequence ends with values left on a stack.
pub fn measure(code: &[Instr], registry: &Registry) -> Result<StackSizes, CompileError> {
    let mut depths = Depths::default();
    let mut sizes = StackSizes::default();

    for (index, instr) in code.iter().enumerate() {
        let e = effect(instr, registry);
        depths = depths
            .apply(&e)
            .ok_or_else(|| imbalance(depths, &e, index))?;
        sizes.scalar = sizes.scalar.max(depths.scalar);
        sizes.vector = sizes.vector.max(depths.vector);
        sizes.staging = sizes.staging.max(depths.staging);
    }

    let stack = if depths.scalar > 0 {
        "scalar"
    } else if depths.vector > 0 {
        "vector"
    } else if depths.staging > 0 {
        "staging"
    } else {
        return Ok(sizes);
    };
    Err(CompileError::StackImbalance {
        stack,
        index: code.len(),
    })
}
