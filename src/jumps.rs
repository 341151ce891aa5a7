//! Replaces symbolic jump labels with relative offsets.

use std::collections::HashMap;

use crate::op::{Instr, JumpTarget, Op};

/// Removes every `Label` and rewrites each jump to the number of instructions
/// it skips, so that the machine continues at `jump + 1 + offset`.
pub fn resolve(code: &[Instr]) -> Vec<Instr> {
    let mut labels = HashMap::new();
    let mut next = 0u32;
    for instr in code {
        match instr.op {
            Op::Label(l) => {
                labels.insert(l, next);
            }
            _ => next += 1,
        }
    }

    let offset = |target: JumpTarget, at: u32| match target {
        JumpTarget::Label(l) => labels
            .get(&l)
            .map_or(target, |&to| JumpTarget::Offset(to - at - 1)),
        JumpTarget::Offset(_) => target,
    };

    let mut resolved = Vec::with_capacity(next as usize);
    for instr in code {
        let at = resolved.len() as u32;
        let op = match instr.op {
            Op::Label(_) => continue,
            Op::JumpIfFalse(target) => Op::JumpIfFalse(offset(target, at)),
            Op::Jump(target) => Op::Jump(offset(target, at)),
            op => op,
        };
        resolved.push(Instr { op, push: instr.push });
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Op::*;

    #[test]
    fn test_offsets_skip_to_label() {
        let code: Vec<Instr> = [
            Arg(0),
            JumpIfFalse(JumpTarget::Label(0)),
            Const(0),
            Jump(JumpTarget::Label(1)),
            Label(0),
            Const(1),
            Neg,
            Label(1),
        ]
        .into_iter()
        .map(Instr::from)
        .collect();

        let ops: Vec<Op> = resolve(&code).iter().map(|i| i.op).collect();
        assert_eq!(
            ops,
            vec![
                Arg(0),
                JumpIfFalse(JumpTarget::Offset(2)),
                Const(0),
                Jump(JumpTarget::Offset(2)),
                Const(1),
                Neg,
            ]
        );
    }

    #[test]
    fn test_nested_labels_and_push_flags() {
        let code = vec![
            Instr::new(Arg(0)),
            Instr::new(JumpIfFalse(JumpTarget::Label(0))),
            Instr::new(Arg(1)),
            Instr::new(JumpIfFalse(JumpTarget::Label(2))),
            Instr::new(Const(0)),
            Instr::new(Jump(JumpTarget::Label(3))),
            Instr::new(Label(2)),
            Instr::new(Const(1)),
            Instr::new(Label(3)),
            Instr::new(Jump(JumpTarget::Label(1))),
            Instr::new(Label(0)),
            Instr::pushed(Const(2)),
            Instr::new(Label(1)),
        ];
        let resolved = resolve(&code);
        assert_eq!(resolved.len(), 9);
        assert_eq!(resolved[1].op, JumpIfFalse(JumpTarget::Offset(6)));
        assert_eq!(resolved[3].op, JumpIfFalse(JumpTarget::Offset(2)));
        assert_eq!(resolved[5].op, Jump(JumpTarget::Offset(1)));
        // a jump to the very end lands one past the last instruction
        assert_eq!(resolved[7].op, Jump(JumpTarget::Offset(1)));
        assert!(resolved[8].push);
    }
}
