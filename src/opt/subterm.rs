//! Common subterm extraction and the single-use inliner.
//!
//! A window of instructions is *self-contained* when it starts with a value
//! producing leaf, never pops below the stack depths it started with, leaves
//! every stack as it found it, and ends with a scalar in the accumulator. Such
//! a window can be replaced by a read of a slot holding its value, wherever it
//! occurs. Extracted windows become a prologue that fills the slots before the
//! body runs.

use std::collections::HashMap;

use log::trace;

use crate::op::{Instr, Op};
use crate::program::Pools;
use crate::registry::{ArgKind, Registry};
use crate::sizing::{effect, Depths};

/// Orders the operands of `leaf, Push, leaf, op` for symmetric operators, so
/// that `X1 + X0` and `X0 + X1` produce identical windows.
fn normalize_symmetric(code: &mut [Instr]) {
    for i in 0..code.len().saturating_sub(3) {
        let (a, push, b, op) = (code[i], code[i + 1], code[i + 2], code[i + 3]);
        let symmetric = matches!(op.op, Op::Binary(bin) if bin.is_symmetric());
        if symmetric
            && push.op == Op::Push
            && !push.push
            && !a.push
            && !b.push
            && a.op.is_scalar_leaf()
            && b.op.is_scalar_leaf()
            && b.op < a.op
        {
            code[i].op = b.op;
            code[i + 2].op = a.op;
        }
    }
}

fn self_contained(window: &[Instr], registry: &Registry) -> bool {
    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return false;
    };
    if !first.op.is_value_producer() || last.push {
        return false;
    }
    let ends_scalar = match last.op {
        Op::CallVector(f) => registry.vector_function(f).output() == ArgKind::Scalar,
        op => op.writes_accumulator(),
    };
    if !ends_scalar {
        return false;
    }

    let mut depths = Depths::default();
    for instr in window {
        if instr.op.is_control() || matches!(instr.op, Op::StoreSubterm(_) | Op::StoreVecSubterm(_)) {
            return false;
        }
        match depths.apply(&effect(instr, registry)) {
            Some(next) => depths = next,
            None => return false,
        }
    }
    depths.is_empty()
}

/// Smallest self-contained window occurring at least twice without overlap.
fn find_repeat(code: &[Instr], registry: &Registry) -> Option<Vec<Instr>> {
    for len in 2..=code.len() / 2 {
        let mut first_seen: HashMap<&[Instr], usize> = HashMap::new();
        for s in 0..=code.len() - len {
            let window = &code[s..s + len];
            if !self_contained(window, registry) {
                continue;
            }
            match first_seen.get(window) {
                Some(&prev) if prev + len <= s => return Some(window.to_vec()),
                Some(_) => {}
                None => {
                    first_seen.insert(window, s);
                }
            }
        }
    }
    None
}

/// Replaces non-overlapping occurrences of `window`, left to right.
fn replace(code: &[Instr], window: &[Instr], with: Instr) -> Vec<Instr> {
    let mut out = Vec::with_capacity(code.len());
    let mut i = 0;
    while i < code.len() {
        if code[i..].starts_with(window) {
            out.push(with);
            i += window.len();
        } else {
            out.push(code[i]);
            i += 1;
        }
    }
    out
}

/// Extracts repeated subterms until none are left.
///
/// Returns the rewritten body and the slot definitions in slot order; a
/// definition only reads slots with smaller numbers.
pub fn deduplicate_subterms(code: Vec<Instr>, registry: &Registry) -> (Vec<Instr>, Vec<Vec<Instr>>) {
    let mut code = code;
    normalize_symmetric(&mut code);

    let mut defs = Vec::new();
    while let Some(window) = find_repeat(&code, registry) {
        let slot = defs.len() as u32;
        trace!("subterm S{} = {} instructions", slot, window.len());
        code = replace(&code, &window, Instr::new(Op::Subterm(slot)));
        defs.push(window);
    }
    (code, defs)
}

fn references(code: &[Instr], slot: u32) -> usize {
    code.iter().filter(|i| i.op == Op::Subterm(slot)).count()
}

/// Splices `body` in place of the single read of `slot`, keeping its push flag.
fn splice(code: &mut Vec<Instr>, slot: u32, body: &[Instr]) -> bool {
    let Some(at) = code.iter().position(|i| i.op == Op::Subterm(slot)) else {
        return false;
    };
    let push = code[at].push;
    let mut body = body.to_vec();
    if let Some(last) = body.last_mut() {
        last.push = push;
    }
    code.splice(at..=at, body);
    true
}

/// Inlines the slots read at most once, renumbers the rest and assembles the
/// final `prologue + body` sequence. Sets `pools.subterm_count`.
pub fn inline_single_use(code: Vec<Instr>, defs: Vec<Vec<Instr>>, pools: &mut Pools) -> Vec<Instr> {
    let mut code = code;
    let counts: Vec<usize> = (0..defs.len() as u32)
        .map(|slot| references(&code, slot) + defs.iter().map(|d| references(d, slot)).sum::<usize>())
        .collect();
    let mut defs: Vec<Option<Vec<Instr>>> = defs.into_iter().map(Some).collect();

    // later slots first, so a body inlined into another definition moves along
    for slot in (0..defs.len()).rev() {
        if counts[slot] > 1 {
            continue;
        }
        let Some(body) = defs[slot].take() else {
            continue;
        };
        let id = slot as u32;
        if splice(&mut code, id, &body) {
            continue;
        }
        for def in defs.iter_mut().flatten() {
            if splice(def, id, &body) {
                break;
            }
        }
    }

    let mut renumber = HashMap::new();
    for (old, def) in defs.iter().enumerate() {
        if def.is_some() {
            let new = renumber.len() as u32;
            renumber.insert(old as u32, new);
        }
    }
    let remap = |instr: &mut Instr| {
        if let Op::Subterm(old) = instr.op {
            if let Some(&new) = renumber.get(&old) {
                instr.op = Op::Subterm(new);
            }
        }
    };

    let mut out = Vec::with_capacity(code.len());
    for (old, def) in defs.into_iter().enumerate() {
        let Some(mut def) = def else {
            continue;
        };
        def.iter_mut().for_each(remap);
        out.extend(def);
        if let Some(&new) = renumber.get(&(old as u32)) {
            out.push(Instr::new(Op::StoreSubterm(new)));
        }
    }
    code.iter_mut().for_each(remap);
    out.extend(code);

    pools.subterm_count = renumber.len();
    out
}
