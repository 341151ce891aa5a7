//! Sharing of repeated vector literal constructions.
//!
//! A `VecBegin .. VecEnd` span without jumps builds the same vector wherever
//! it appears. The first occurrence keeps building it and stores a copy into a
//! vector subterm slot; later occurrences that always run after the first one
//! read the slot instead.
//!
//! "Always runs after" is decided on `IF` regions: every position has a path
//! of `(conditional, branch)` pairs, and the first occurrence dominates a later
//! one when its path is a prefix of the later one's.

use log::trace;

use crate::op::{Instr, JumpTarget, Op};
use crate::program::Pools;

type Path = Vec<(u32, bool)>;

/// Region path of every instruction.
fn region_paths(code: &[Instr]) -> Vec<Path> {
    let mut path: Path = Vec::new();
    // label that closes the else branch, per open conditional
    let mut closing: Vec<Option<u32>> = Vec::new();
    let mut paths = Vec::with_capacity(code.len());

    for instr in code {
        paths.push(path.clone());
        match instr.op {
            Op::JumpIfFalse(JumpTarget::Label(l)) => {
                path.push((l, false));
                closing.push(None);
            }
            Op::Jump(JumpTarget::Label(l)) => {
                if let Some(end) = closing.last_mut() {
                    *end = Some(l);
                }
            }
            Op::Label(l) => match path.last_mut() {
                Some(top) if top.0 == l && !top.1 => top.1 = true,
                Some(_) if closing.last() == Some(&Some(l)) => {
                    path.pop();
                    closing.pop();
                }
                _ => {}
            },
            _ => {}
        }
    }
    paths
}

fn dominates(earlier: &Path, later: &Path) -> bool {
    later.starts_with(earlier)
}

/// `(begin, end)` of every jump-free vector literal, both inclusive.
fn spans(code: &[Instr]) -> Vec<(usize, usize)> {
    let mut open = Vec::new();
    let mut found = Vec::new();
    for (i, instr) in code.iter().enumerate() {
        match instr.op {
            Op::VecBegin => open.push(i),
            Op::VecEnd => {
                if let Some(begin) = open.pop() {
                    if !code[begin..=i].iter().any(|x| x.op.is_control()) {
                        found.push((begin, i));
                    }
                }
            }
            _ => {}
        }
    }
    // longest first, then by position
    found.sort_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)).then(a.0.cmp(&b.0)));
    found
}

/// Finds one sharable span and rewrites the code for it.
fn share_one(code: &[Instr], pools: &mut Pools) -> Option<Vec<Instr>> {
    let paths = region_paths(code);
    let spans = spans(code);

    for &(begin, end) in &spans {
        let body = &code[begin..=end];
        let copies: Vec<(usize, usize)> = spans
            .iter()
            .copied()
            .filter(|&(b, e)| {
                b > end && code[b..=e] == *body && dominates(&paths[begin], &paths[b])
            })
            .collect();
        if copies.is_empty() {
            continue;
        }

        let (slot, store) = match code.get(end + 1).map(|i| i.op) {
            Some(Op::StoreVecSubterm(k)) => (k, false),
            _ => {
                pools.vector_subterm_count += 1;
                ((pools.vector_subterm_count - 1) as u32, true)
            }
        };
        trace!(
            "vector literal at {} shared as VS{} by {} later copies",
            begin,
            slot,
            copies.len()
        );

        let mut out = Vec::with_capacity(code.len());
        out.extend_from_slice(&code[..=end]);
        if store {
            out.push(Instr::new(Op::StoreVecSubterm(slot)));
        }
        let mut next = end + 1;
        for (b, e) in copies {
            out.extend_from_slice(&code[next..b]);
            out.push(Instr {
                op: Op::VecSubterm(slot),
                push: code[e].push,
            });
            next = e + 1;
        }
        out.extend_from_slice(&code[next..]);
        return Some(out);
    }
    None
}

/// Shares repeated vector literals until no candidate is left. Updates
/// `pools.vector_subterm_count`.
pub fn deduplicate_vectors(code: Vec<Instr>, pools: &mut Pools) -> Vec<Instr> {
    let mut code = code;
    while let Some(next) = share_one(&code, pools) {
        code = next;
    }
    code
}
