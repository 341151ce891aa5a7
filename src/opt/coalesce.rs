//! Push coalescing: `X, Push` becomes `X` with the push flag set.

use crate::op::{Instr, Op};

/// Merges every standalone `Push` into the instruction before it, unless that
/// instruction is a jump, a label, another push, or already pushes.
pub fn coalesce_pushes(code: Vec<Instr>) -> Vec<Instr> {
    let mut out: Vec<Instr> = Vec::with_capacity(code.len());
    for instr in code {
        if instr.op == Op::Push && !instr.push {
            if let Some(prev) = out.last_mut() {
                if !prev.push && !prev.op.is_control() && prev.op != Op::Push {
                    prev.push = true;
                    continue;
                }
            }
        }
        out.push(instr);
    }
    out
}
