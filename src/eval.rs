//! Generic bottom-up evaluation over a diagram.
//!
//! Grounded on `tdzdd/DdEval.hpp`'s three-hook interface
//! (`initialize`/`evaluate_terminal`/`evaluate_node`) and on bex's
//! `vhl::Walkable` bottom-up walk. Unlike `tdzdd` (ZDD-only, no complement
//! edges) this engine's BDD arcs can be complemented, so the trait adds a
//! fourth, defaulted hook (`negate`) that only BDD-flavoured evaluators
//! need to override.

use std::collections::HashMap;

use fxhash::FxBuildHasher;

use crate::arc::Arc;
use crate::engine::Engine;

/// A user-supplied bottom-up computation over a diagram.
pub trait DdEval<T: Clone> {
    /// Called once before the walk begins; default no-op.
    fn initialize(&mut self, _engine: &Engine) {}

    /// Value associated with a terminal arc.
    fn evaluate_terminal(&mut self, value: bool) -> T;

    /// Value associated with an internal node, given its children's
    /// already-computed values.
    fn evaluate_node(&mut self, var: u32, low: T, high: T) -> T;

    /// Adjusts a value for a complemented incoming arc. Identity by
    /// default; ZDD evaluators never see a complemented arc and so never
    /// need to override this.
    fn negate(&mut self, value: T) -> T {
        value
    }
}

/// Runs `evaluator` bottom-up over the diagram rooted at `root`, memoising
/// on node index so each node is visited once regardless of fan-in.
pub fn eval_bottom_up<T, E>(engine: &Engine, root: Arc, evaluator: &mut E) -> T
where
    T: Clone,
    E: DdEval<T>,
{
    evaluator.initialize(engine);
    let mut memo: HashMap<u64, T, FxBuildHasher> = HashMap::default();
    walk(engine, root, evaluator, &mut memo)
}

fn walk<T, E>(engine: &Engine, arc: Arc, evaluator: &mut E, memo: &mut HashMap<u64, T, FxBuildHasher>) -> T
where
    T: Clone,
    E: DdEval<T>,
{
    if arc.is_terminal() {
        return evaluator.evaluate_terminal(arc.terminal_value());
    }
    let key = arc.without_complement().bits();
    let base = if let Some(v) = memo.get(&key) {
        v.clone()
    } else {
        let node = *engine.node(arc);
        let lo = walk(engine, node.low, evaluator, memo);
        let hi = walk(engine, node.high, evaluator, memo);
        let v = evaluator.evaluate_node(node.var, lo, hi);
        memo.insert(key, v.clone());
        v
    };
    if arc.is_complemented() {
        evaluator.negate(base)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply_bdd::and;

    /// Counts satisfying paths without the level-gap scaling `solve.rs`
    /// applies — just exercises that the walk visits every node once and
    /// respects the `negate` hook.
    struct PathCount;
    impl DdEval<u64> for PathCount {
        fn evaluate_terminal(&mut self, value: bool) -> u64 {
            value as u64
        }
        fn evaluate_node(&mut self, _var: u32, low: u64, high: u64) -> u64 {
            low + high
        }
        fn negate(&mut self, value: u64) -> u64 {
            // only meaningful as "1 - value" when value is itself a 0/1
            // flag; used here just to prove the hook fires.
            1 - value.min(1)
        }
    }

    #[test]
    fn evaluator_visits_shared_subgraphs_once() {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let y = e.new_variable().unwrap();
        let vx = e.var_bdd(x).unwrap();
        let vy = e.var_bdd(y).unwrap();
        let f = and(&mut e, vx, vy).unwrap();
        let mut ev = PathCount;
        let count = eval_bottom_up(&e, f, &mut ev);
        assert_eq!(count, 1); // exactly one path reaches T1: x=1,y=1
    }

    #[test]
    fn negate_hook_fires_on_complemented_root() {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let vx = e.var_bdd(x).unwrap();
        let mut ev = PathCount;
        let direct = eval_bottom_up(&e, vx, &mut ev);
        let negated = eval_bottom_up(&e, vx.negated(), &mut ev);
        assert_eq!(negated, 1 - direct.min(1));
    }
}
