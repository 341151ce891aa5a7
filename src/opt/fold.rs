//! Constant folding.
//!
//! We walk the instruction stream left-to-right while mirroring its effect on
//! shadow copies of the accumulator and the three stacks. Instead of values,
//! the shadows hold the index where the constant computation that produced
//! each value starts (`None` once anything non-constant is involved). Every
//! accumulator write whose value is constant closes a candidate run; the
//! maximal runs are then evaluated by the machine itself and replaced with a
//! single calculated constant.

use log::trace;

use crate::op::{Instr, Op};
use crate::program::Pools;
use crate::registry::{ArgKind, Registry};
use crate::sizing::measure;
use crate::token::intern;
use crate::vm::{execute, Context};

type Start = Option<usize>;

fn join(a: Start, b: Start) -> Start {
    Some(a?.min(b?))
}

#[derive(Default)]
struct Shadow {
    acc: Start,
    scalars: Vec<Start>,
    vectors: Vec<Start>,
    staging: Vec<Start>,
}

impl Shadow {
    /// Forgets every tracked constant.
    fn clear(&mut self) {
        self.acc = None;
        for slot in self
            .scalars
            .iter_mut()
            .chain(self.vectors.iter_mut())
            .chain(self.staging.iter_mut())
        {
            *slot = None;
        }
    }

    fn pop_scalars(&mut self, n: usize, start: Start) -> Start {
        (0..n).fold(start, |s, _| join(s, self.scalars.pop().flatten()))
    }

    fn pop_vectors(&mut self, n: usize, start: Start) -> Start {
        (0..n).fold(start, |s, _| join(s, self.vectors.pop().flatten()))
    }

    fn staging_top(&mut self) -> &mut Start {
        if self.staging.is_empty() {
            self.staging.push(None);
        }
        let last = self.staging.len() - 1;
        &mut self.staging[last]
    }
}

/// Finds the maximal constant runs as `(start, end)` pairs, both inclusive.
fn constant_runs(code: &[Instr], registry: &Registry) -> Vec<(usize, usize)> {
    let mut shadow = Shadow::default();
    let mut candidates = Vec::new();

    for (j, instr) in code.iter().enumerate() {
        let mut wrote = false;
        match instr.op {
            Op::Push => shadow.scalars.push(shadow.acc),
            Op::Neg | Op::Not => wrote = true,
            Op::Binary(_) => {
                let lhs = shadow.scalars.pop().flatten();
                shadow.acc = join(lhs, shadow.acc);
                wrote = true;
            }
            Op::JumpIfFalse(_) | Op::Jump(_) | Op::Label(_) => shadow.clear(),
            Op::Const(_) | Op::Calculated(_) => shadow.acc = Some(j),
            Op::Arg(_) | Op::Subterm(_) => shadow.acc = None,
            Op::StoreSubterm(_) | Op::StoreVecSubterm(_) => {}
            Op::Call(f) => {
                let arity = registry.function(f).arity();
                shadow.acc = shadow.pop_scalars(arity, Some(j));
                wrote = true;
            }
            Op::CallVector(f) => {
                let function = registry.vector_function(f);
                let start = shadow.pop_scalars(function.scalar_arity(), Some(j));
                let start = shadow.pop_vectors(function.vector_arity(), start);
                match function.output() {
                    ArgKind::Scalar => {
                        shadow.acc = start;
                        wrote = true;
                    }
                    ArgKind::Vector => shadow.vectors.push(start),
                }
            }
            Op::VecArg(_) | Op::VecSubterm(_) => shadow.vectors.push(None),
            Op::VecConst(_) => shadow.vectors.push(Some(j)),
            Op::VecBegin => shadow.staging.push(Some(j)),
            Op::Append => {
                let acc = shadow.acc;
                let top = shadow.staging_top();
                *top = join(*top, acc);
            }
            Op::Spread => {
                let vector = shadow.vectors.pop().flatten();
                let top = shadow.staging_top();
                *top = join(*top, vector);
            }
            Op::VecEnd => {
                let list = shadow.staging.pop().flatten();
                shadow.vectors.push(list);
            }
        }
        if wrote {
            if let Some(s) = shadow.acc.filter(|&s| s < j) {
                candidates.push((s, j));
            }
        }
        if instr.push {
            shadow.scalars.push(shadow.acc);
        }
    }

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for (s, e) in candidates {
        if runs.last().map_or(true, |&(_, last)| s > last) {
            runs.push((s, e));
        }
    }
    runs
}

/// Evaluates a constant snippet. `None` when it is not self-contained.
fn evaluate(snippet: &[Instr], pools: &Pools, registry: &Registry) -> Option<f64> {
    let reads_input = snippet.iter().any(|i| {
        i.op.is_control()
            || matches!(
                i.op,
                Op::Arg(_) | Op::Subterm(_) | Op::VecArg(_) | Op::VecSubterm(_)
            )
    });
    if reads_input {
        return None;
    }
    let sizes = measure(snippet, registry).ok()?;
    let mut ctx = Context::new(&sizes, 0, 0);
    Some(execute(snippet, pools, registry, &[], &[], &mut ctx))
}

/// Replaces every maximal constant-only run with a `Calculated` instruction.
pub fn fold_constants(code: Vec<Instr>, pools: &mut Pools, registry: &Registry) -> Vec<Instr> {
    let runs = constant_runs(&code, registry);
    if runs.is_empty() {
        return code;
    }

    let mut out = Vec::with_capacity(code.len());
    let mut next = 0;
    for (s, e) in runs {
        let mut snippet = code[s..=e].to_vec();
        if let Some(last) = snippet.last_mut() {
            last.push = false;
        }
        let Some(value) = evaluate(&snippet, pools, registry) else {
            continue;
        };
        let k = intern(&mut pools.calculated, value);
        trace!("folded {} instructions at {} into {}", e - s + 1, s, value);

        out.extend_from_slice(&code[next..s]);
        out.push(Instr {
            op: Op::Calculated(k),
            push: code[e].push,
        });
        next = e + 1;
    }
    out.extend_from_slice(&code[next..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Op::*;
    use crate::opt::testing::{generated, run};

    fn fold(source: &str) -> (Vec<Instr>, Pools) {
        let registry = Registry::standard();
        let (code, mut pools) = generated(source, &registry);
        let folded = fold_constants(code, &mut pools, &registry);
        (folded, pools)
    }

    fn ops(code: &[Instr]) -> Vec<Op> {
        code.iter().map(|i| i.op).collect()
    }

    #[test]
    fn test_whole_constant_formula() {
        let (code, pools) = fold("1+2*3");
        assert_eq!(ops(&code), vec![Calculated(0)]);
        assert_eq!(pools.calculated, vec![7.0]);
    }

    #[test]
    fn test_partial_folding() {
        let (code, pools) = fold("X0 * (2 + SQRT(16)) - -1");
        assert_eq!(
            ops(&code),
            vec![
                Arg(0),
                Push,
                Calculated(0),
                Binary(crate::op::BinOp::Mul),
                Push,
                Calculated(1),
                Binary(crate::op::BinOp::Sub),
            ]
        );
        assert_eq!(pools.calculated, vec![6.0, -1.0]);
    }

    #[test]
    fn test_vector_functions_fold() {
        let (code, pools) = fold("VSUM({1, 2, 3}) + VSUM(VSCALE({1,2}, 2))");
        assert_eq!(ops(&code), vec![Calculated(0)]);
        assert_eq!(pools.calculated, vec![12.0]);
    }

    #[test]
    fn test_values_are_interned() {
        let (code, pools) = fold("X0 + (1+1) * X1 + 2*1");
        assert_eq!(pools.calculated, vec![2.0]);
        assert_eq!(code.iter().filter(|i| i.op == Calculated(0)).count(), 2);
    }

    #[test]
    fn test_nan_folds() {
        let (code, pools) = fold("0/0");
        assert_eq!(ops(&code), vec![Calculated(0)]);
        assert!(pools.calculated[0].is_nan());
    }

    #[test]
    fn test_conditional_branches_fold_separately() {
        let registry = Registry::standard();
        let (original, original_pools) = generated("IF(X0, 1+1, 2+2) * (3-1)", &registry);
        let (code, pools) = fold("IF(X0, 1+1, 2+2) * (3-1)");
        assert!(code.iter().any(|i| i.op.is_control()));
        assert_eq!(pools.calculated, vec![2.0, 4.0]);
        for x in [0.0, 1.0] {
            assert_eq!(
                run(&code, &pools, &registry, &[x], &[]),
                run(&original, &original_pools, &registry, &[x], &[])
            );
        }
    }

    #[test]
    fn test_arguments_block_folding() {
        let (code, pools) = fold("X0 + X1");
        assert_eq!(code.len(), 4);
        assert!(pools.calculated.is_empty());
    }
}
