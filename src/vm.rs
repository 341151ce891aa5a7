//! The stack machine that evaluates compiled instructions.
//!
//! All working storage lives in a [`Context`], sized once from the static
//! stack analysis. Stacks are index-based: a push writes into a preallocated
//! slot and bumps a length, so evaluation does not allocate on the scalar path.
//! Vector buffers are recycled between evaluations.

use std::mem;

use smallvec::SmallVec;

use crate::op::{truth, Instr, JumpTarget, Op};
use crate::program::Pools;
use crate::registry::{Registry, VectorKernel};
use crate::sizing::StackSizes;

/// Per-evaluation working storage.
///
/// A context is owned by one evaluation at a time and never shared. It can be
/// reused for any number of evaluations of programs whose sizes it covers.
#[derive(Debug, Clone, Default)]
pub struct Context {
    scalars: Vec<f64>,
    scalar_len: usize,
    vectors: Vec<Vec<f64>>,
    vector_len: usize,
    staging: Vec<Vec<f64>>,
    staging_len: usize,
    subterms: Vec<f64>,
    vector_subterms: Vec<Vec<f64>>,
    output: Vec<f64>,
}

impl Context {
    pub fn new(sizes: &StackSizes, subterms: usize, vector_subterms: usize) -> Self {
        let mut ctx = Context::default();
        ctx.ensure(sizes, subterms, vector_subterms);
        ctx
    }

    /// Grows the storage to cover `sizes` and the given slot counts.
    pub fn ensure(&mut self, sizes: &StackSizes, subterms: usize, vector_subterms: usize) {
        if self.scalars.len() < sizes.scalar {
            self.scalars.resize(sizes.scalar, 0.0);
        }
        if self.vectors.len() < sizes.vector {
            self.vectors.resize_with(sizes.vector, Vec::new);
        }
        if self.staging.len() < sizes.staging {
            self.staging.resize_with(sizes.staging, Vec::new);
        }
        if self.subterms.len() < subterms {
            self.subterms.resize(subterms, 0.0);
        }
        if self.vector_subterms.len() < vector_subterms {
            self.vector_subterms.resize_with(vector_subterms, Vec::new);
        }
    }

    /// True when the storage covers `sizes` and the given slot counts.
    pub fn covers(&self, sizes: &StackSizes, subterms: usize, vector_subterms: usize) -> bool {
        self.scalars.len() >= sizes.scalar
            && self.vectors.len() >= sizes.vector
            && self.staging.len() >= sizes.staging
            && self.subterms.len() >= subterms
            && self.vector_subterms.len() >= vector_subterms
    }

    /// Empties all stacks. Buffers keep their capacity.
    pub fn reset(&mut self) {
        self.scalar_len = 0;
        self.vector_len = 0;
        self.staging_len = 0;
    }
}

/// Runs `code` and returns the final accumulator.
///
/// The caller guarantees that `ctx` covers the program's stack sizes and slot
/// counts, and that `scalars` and `vectors` hold every argument the code
/// references.
pub fn execute(
    code: &[Instr],
    pools: &Pools,
    registry: &Registry,
    scalars: &[f64],
    vectors: &[&[f64]],
    ctx: &mut Context,
) -> f64 {
    ctx.reset();
    let mut acc = 0.0;
    let mut ip = 0;

    while ip < code.len() {
        let Instr { op, push } = code[ip];
        match op {
            Op::Push => {
                ctx.scalars[ctx.scalar_len] = acc;
                ctx.scalar_len += 1;
            }
            Op::Neg => acc = -acc,
            Op::Not => acc = truth(acc == 0.0),
            Op::Binary(bin) => {
                ctx.scalar_len -= 1;
                acc = bin.apply(ctx.scalars[ctx.scalar_len], acc);
            }
            Op::JumpIfFalse(target) => {
                if acc == 0.0 {
                    ip += skip(target);
                }
            }
            Op::Jump(target) => ip += skip(target),
            Op::Label(_) => {}
            Op::VecBegin => {
                ctx.staging[ctx.staging_len].clear();
                ctx.staging_len += 1;
            }
            Op::Append => ctx.staging[ctx.staging_len - 1].push(acc),
            Op::Spread => {
                ctx.vector_len -= 1;
                let top = &ctx.vectors[ctx.vector_len];
                ctx.staging[ctx.staging_len - 1].extend_from_slice(top);
            }
            Op::VecEnd => {
                ctx.staging_len -= 1;
                mem::swap(
                    &mut ctx.vectors[ctx.vector_len],
                    &mut ctx.staging[ctx.staging_len],
                );
                ctx.vector_len += 1;
            }
            Op::Arg(i) => acc = scalars[i as usize],
            Op::Const(i) => acc = pools.constants[i as usize],
            Op::Call(f) => {
                let function = registry.function(f);
                let base = ctx.scalar_len - function.arity();
                acc = function.compute(&ctx.scalars[base..ctx.scalar_len]);
                ctx.scalar_len = base;
            }
            Op::Subterm(k) => acc = ctx.subterms[k as usize],
            Op::StoreSubterm(k) => ctx.subterms[k as usize] = acc,
            Op::Calculated(i) => acc = pools.calculated[i as usize],
            Op::CallVector(f) => {
                let function = registry.vector_function(f);
                let scalar_base = ctx.scalar_len - function.scalar_arity();
                let vector_base = ctx.vector_len - function.vector_arity();
                {
                    let args: SmallVec<[&[f64]; 4]> = ctx.vectors[vector_base..ctx.vector_len]
                        .iter()
                        .map(Vec::as_slice)
                        .collect();
                    let scalar_args = &ctx.scalars[scalar_base..ctx.scalar_len];
                    match function.kernel() {
                        VectorKernel::Scalar(kernel) => acc = kernel(scalar_args, &args[..]),
                        VectorKernel::Vector(kernel) => {
                            ctx.output.clear();
                            kernel(scalar_args, &args[..], &mut ctx.output);
                        }
                    }
                }
                ctx.scalar_len = scalar_base;
                ctx.vector_len = vector_base;
                if let VectorKernel::Vector(_) = function.kernel() {
                    mem::swap(&mut ctx.vectors[ctx.vector_len], &mut ctx.output);
                    ctx.vector_len += 1;
                }
            }
            Op::VecArg(i) => push_vector(ctx, vectors[i as usize]),
            Op::VecConst(i) => push_vector(ctx, &pools.vector_constants[i as usize]),
            Op::VecSubterm(k) => {
                let slot = &ctx.vector_subterms[k as usize];
                let top = &mut ctx.vectors[ctx.vector_len];
                top.clear();
                top.extend_from_slice(slot);
                ctx.vector_len += 1;
            }
            Op::StoreVecSubterm(k) => {
                let top = &ctx.vectors[ctx.vector_len - 1];
                let slot = &mut ctx.vector_subterms[k as usize];
                slot.clear();
                slot.extend_from_slice(top);
            }
        }
        if push {
            ctx.scalars[ctx.scalar_len] = acc;
            ctx.scalar_len += 1;
        }
        ip += 1;
    }

    ctx.reset();
    acc
}

/// Instructions to skip for a resolved jump. Symbolic labels never reach the
/// machine in a compiled program, and optimizer snippets contain no jumps.
#[inline(always)]
fn skip(target: JumpTarget) -> usize {
    match target {
        JumpTarget::Offset(n) => n as usize,
        JumpTarget::Label(_) => 0,
    }
}

fn push_vector(ctx: &mut Context, values: &[f64]) {
    let top = &mut ctx.vectors[ctx.vector_len];
    top.clear();
    top.extend_from_slice(values);
    ctx.vector_len += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::BinOp;
    use crate::op::Op::*;
    use crate::registry::Entry;
    use crate::sizing::measure;

    fn run(code: &[Instr], pools: &Pools, scalars: &[f64], vectors: &[&[f64]]) -> f64 {
        let registry = Registry::standard();
        let sizes = measure(code, &registry).unwrap();
        let mut ctx = Context::new(&sizes, pools.subterm_count, pools.vector_subterm_count);
        execute(code, pools, &registry, scalars, vectors, &mut ctx)
    }

    fn ops(ops: &[Op]) -> Vec<Instr> {
        ops.iter().copied().map(Instr::from).collect()
    }

    #[test]
    fn test_arithmetic() {
        let pools = Pools {
            constants: vec![2.0, 3.0],
            ..Pools::default()
        };
        // (X0 + 2) * 3
        let code = ops(&[
            Arg(0),
            Push,
            Const(0),
            Binary(BinOp::Add),
            Push,
            Const(1),
            Binary(BinOp::Mul),
        ]);
        assert_eq!(run(&code, &pools, &[4.0], &[]), 18.0);

        // same with coalesced pushes
        let code = vec![
            Instr::pushed(Arg(0)),
            Instr::new(Const(0)),
            Instr::pushed(Binary(BinOp::Add)),
            Instr::new(Const(1)),
            Instr::new(Binary(BinOp::Mul)),
        ];
        assert_eq!(run(&code, &pools, &[4.0], &[]), 18.0);
    }

    #[test]
    fn test_resolved_conditional() {
        let pools = Pools {
            constants: vec![1.0, 2.0],
            ..Pools::default()
        };
        // IF(X0, 1, 2)
        let code = ops(&[
            Arg(0),
            JumpIfFalse(JumpTarget::Offset(2)),
            Const(0),
            Jump(JumpTarget::Offset(1)),
            Const(1),
        ]);
        assert_eq!(run(&code, &pools, &[5.0], &[]), 1.0);
        assert_eq!(run(&code, &pools, &[0.0], &[]), 2.0);
        assert_eq!(run(&code, &pools, &[f64::NAN], &[]), 1.0);
    }

    #[test]
    fn test_function_calls() {
        let registry = Registry::standard();
        let Some(Entry::Function(max)) = registry.lookup("MAX") else {
            panic!("MAX missing");
        };
        let pools = Pools::default();
        let code = vec![Instr::pushed(Arg(0)), Instr::pushed(Arg(1)), Instr::new(Call(max))];
        assert_eq!(run(&code, &pools, &[1.0, 7.0], &[]), 7.0);
    }

    #[test]
    fn test_vector_assembly() {
        let pools = Pools {
            vector_constants: vec![vec![10.0, 20.0]],
            ..Pools::default()
        };
        // VSUM({X0, X0{}, {10, 20}}) with VSCALE(X0{}, X1) spread in as well
        let code = vec![
            Instr::new(VecBegin),
            Instr::new(Arg(0)),
            Instr::new(Append),
            Instr::new(VecArg(0)),
            Instr::new(Spread),
            Instr::new(VecConst(0)),
            Instr::new(Spread),
            Instr::new(VecArg(0)),
            Instr::pushed(Arg(1)),
            Instr::new(CallVector(8)),
            Instr::new(Spread),
            Instr::new(VecEnd),
            Instr::new(CallVector(0)),
        ];
        let v = [1.0, 2.0];
        // 5 + 3 + 30 + (1 + 2) * 2
        assert_eq!(run(&code, &pools, &[5.0, 2.0], &[&v]), 44.0);
    }

    #[test]
    fn test_subterm_slots() {
        let pools = Pools {
            subterm_count: 1,
            vector_subterm_count: 1,
            ..Pools::default()
        };
        // S0 = X0 * X0; VS0 = {S0}; S0 + VSUM(VS0) + VSUM(VS0)
        let code = vec![
            Instr::pushed(Arg(0)),
            Instr::new(Arg(0)),
            Instr::new(Binary(BinOp::Mul)),
            Instr::new(StoreSubterm(0)),
            Instr::pushed(Subterm(0)),
            Instr::new(VecBegin),
            Instr::new(Subterm(0)),
            Instr::new(Append),
            Instr::new(VecEnd),
            Instr::new(StoreVecSubterm(0)),
            Instr::new(CallVector(0)),
            Instr::pushed(Binary(BinOp::Add)),
            Instr::new(VecSubterm(0)),
            Instr::new(CallVector(0)),
            Instr::new(Binary(BinOp::Add)),
        ];
        assert_eq!(run(&code, &pools, &[3.0], &[]), 27.0);
    }

    #[test]
    fn test_context_reuse() {
        let registry = Registry::standard();
        let pools = Pools::default();
        let code = ops(&[Arg(0), Push, Arg(1), Binary(BinOp::Sub)]);
        let sizes = measure(&code, &registry).unwrap();
        let mut ctx = Context::new(&sizes, 0, 0);
        assert!(ctx.covers(&sizes, 0, 0));
        assert!(!ctx.covers(&sizes, 1, 0));
        for i in 0..10 {
            let x = i as f64;
            assert_eq!(
                execute(&code, &pools, &registry, &[x, 1.0], &[], &mut ctx),
                x - 1.0
            );
        }
    }
}
