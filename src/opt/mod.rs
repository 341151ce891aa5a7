//! Optimizer for the accumulator instruction stream.
//!
//! Pass pipeline
//! -------------
//!  1. **fold**    : evaluate constant-only runs at compile time.
//!  2. **subterm** : extract repeated self-contained windows into subterm
//!                 slots, then inline slots that ended up used only once.
//!  3. **coalesce**: merge `X, Push` into `X` with the push flag set.
//!  4. **vector**  : share repeated vector literal constructions.
//!
//! The passes run in this order exactly once. Each one can be switched off
//! through [`OptimizationFlags`]; every combination yields the same results,
//! only the instruction count differs. Jump labels are still symbolic while the
//! optimizer runs and act as barriers for every pass.

mod coalesce;
mod fold;
mod subterm;
mod vector;

use log::debug;

use crate::op::Instr;
use crate::program::Pools;
use crate::registry::Registry;

pub use coalesce::coalesce_pushes;
pub use fold::fold_constants;
pub use subterm::{deduplicate_subterms, inline_single_use};
pub use vector::deduplicate_vectors;

/// Switches for the optimizer passes. All are enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptimizationFlags {
    pub constant_folding: bool,
    /// Subterm extraction together with the single-use inliner
    pub subterms: bool,
    pub push_coalescing: bool,
    /// Only runs when `constant_folding` and `subterms` are enabled too
    pub vector_dedup: bool,
}

impl Default for OptimizationFlags {
    fn default() -> Self {
        OptimizationFlags {
            constant_folding: true,
            subterms: true,
            push_coalescing: true,
            vector_dedup: true,
        }
    }
}

impl OptimizationFlags {
    /// Every pass disabled.
    pub fn none() -> Self {
        OptimizationFlags {
            constant_folding: false,
            subterms: false,
            push_coalescing: false,
            vector_dedup: false,
        }
    }

    /// All 16 on/off combinations.
    pub fn all_combinations() -> impl Iterator<Item = OptimizationFlags> {
        (0u8..16).map(|bits| OptimizationFlags {
            constant_folding: bits & 1 != 0,
            subterms: bits & 2 != 0,
            push_coalescing: bits & 4 != 0,
            vector_dedup: bits & 8 != 0,
        })
    }
}

/// Runs the enabled passes over `code`, filling the calculated-constant pool
/// and the slot counts in `pools`.
pub fn optimize(
    code: Vec<Instr>,
    pools: &mut Pools,
    registry: &Registry,
    has_vector: bool,
    flags: OptimizationFlags,
) -> Vec<Instr> {
    let mut code = code;
    let initial = code.len();

    if flags.constant_folding {
        code = fold_constants(code, pools, registry);
        debug!(
            "constant folding: {} -> {} instructions, {} calculated constants",
            initial,
            code.len(),
            pools.calculated.len()
        );
    }

    if flags.subterms {
        let before = code.len();
        let (body, defs) = deduplicate_subterms(code, registry);
        let extracted = defs.len();
        code = inline_single_use(body, defs, pools);
        debug!(
            "subterms: {} -> {} instructions, {} extracted, {} kept",
            before,
            code.len(),
            extracted,
            pools.subterm_count
        );
    }

    if flags.push_coalescing {
        let before = code.len();
        code = coalesce_pushes(code);
        debug!("push coalescing: {} -> {} instructions", before, code.len());
    }

    if flags.vector_dedup && has_vector && flags.constant_folding && flags.subterms {
        let before = code.len();
        code = deduplicate_vectors(code, pools);
        debug!(
            "vector dedup: {} -> {} instructions, {} vector subterms",
            before,
            code.len(),
            pools.vector_subterm_count
        );
    }

    code
}

/// Helpers shared by the pass tests.
#[cfg(test)]
pub(crate) mod testing {
    use crate::codegen::generate;
    use crate::jumps::resolve;
    use crate::lexer::tokenize;
    use crate::op::Instr;
    use crate::program::Pools;
    use crate::registry::Registry;
    use crate::sizing::measure;
    use crate::token::classify;
    use crate::vm::{execute, Context};

    /// Unoptimized code and pools for `source`.
    pub(crate) fn generated(source: &str, registry: &Registry) -> (Vec<Instr>, Pools) {
        let lexemes = tokenize(source).unwrap();
        let classified = classify(source, &lexemes, registry).unwrap();
        let code = generate(&classified.tokens, registry).unwrap().code;
        let pools = Pools {
            constants: classified.constants,
            vector_constants: classified.vector_constants,
            ..Pools::default()
        };
        (code, pools)
    }

    /// Resolves, sizes and executes `code`.
    pub(crate) fn run(
        code: &[Instr],
        pools: &Pools,
        registry: &Registry,
        scalars: &[f64],
        vectors: &[&[f64]],
    ) -> f64 {
        let code = resolve(code);
        let sizes = measure(&code, registry).unwrap();
        let mut ctx = Context::new(&sizes, pools.subterm_count, pools.vector_subterm_count);
        execute(&code, pools, registry, scalars, vectors, &mut ctx)
    }
}
