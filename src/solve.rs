//! Counting, one-sat extraction and relational product.
//!
//! `count_sat_bdd`/`count_zdd` are grounded on bex's
//! `BddBase::solution_count` — a memoised bottom-up walk that multiplies by
//! `2^gap` whenever a child's top variable isn't the very next level down,
//! to account for the "don't care" variables the reduced diagram skips.
//! ZDD cardinality doesn't need that factor: a ZDD's low/high split already
//! enumerates every represented set explicitly.

use std::collections::HashMap;

use fxhash::FxBuildHasher;

use crate::apply_bdd::{and, compose, exist};
use crate::arc::{Arc, T0, T1};
use crate::engine::Engine;
use crate::error::DdResult;
use crate::reg::{PartialAssignment, Trit};

fn level_of_arc(engine: &Engine, arc: Arc) -> DdResult<u32> {
    if arc.is_terminal() {
        Ok(0)
    } else {
        engine.level_of(engine.node(arc).var)
    }
}

fn count_signed(engine: &Engine, arc: Arc, memo: &mut HashMap<u64, u128, FxBuildHasher>) -> DdResult<u128> {
    if arc.is_terminal() {
        return Ok(arc.terminal_value() as u128);
    }
    if let Some(&v) = memo.get(&arc.bits()) {
        return Ok(v);
    }
    let node = *engine.node(arc);
    let level = engine.level_of(node.var)?;
    let lo_level = level_of_arc(engine, node.low)?;
    let hi_level = level_of_arc(engine, node.high)?;
    let lo_count = count_signed(engine, node.low, memo)? << (level - 1 - lo_level);
    let hi_count = count_signed(engine, node.high, memo)? << (level - 1 - hi_level);
    let mut total = lo_count + hi_count;
    if arc.is_complemented() {
        total = (1u128 << level) - total;
    }
    memo.insert(arc.bits(), total);
    Ok(total)
}

/// Number of satisfying assignments of `f` over `nvars` boolean variables.
/// `nvars` must be at least `f`'s own top variable's level.
pub fn count_sat_bdd(engine: &Engine, f: Arc, nvars: u32) -> DdResult<u128> {
    let mut memo = HashMap::default();
    let top = level_of_arc(engine, f)?;
    let local = count_signed(engine, f, &mut memo)?;
    Ok(local << (nvars - top))
}

fn count_zdd_rec(engine: &Engine, f: Arc, memo: &mut HashMap<u64, u128, FxBuildHasher>) -> DdResult<u128> {
    if f == T0 {
        return Ok(0);
    }
    if f == T1 {
        return Ok(1);
    }
    if let Some(&v) = memo.get(&f.bits()) {
        return Ok(v);
    }
    let node = *engine.node(f);
    let lo = count_zdd_rec(engine, node.low, memo)?;
    let hi = count_zdd_rec(engine, node.high, memo)?;
    let total = lo + hi;
    memo.insert(f.bits(), total);
    Ok(total)
}

/// Number of member sets of the ZDD family rooted at `f`.
pub fn count_zdd(engine: &Engine, f: Arc) -> DdResult<u128> {
    let mut memo = HashMap::default();
    count_zdd_rec(engine, f, &mut memo)
}

#[cfg(feature = "bigint")]
pub mod bigint {
    use super::*;
    use num_bigint::BigUint;
    use num_traits::{One, Zero};

    fn level_of_arc(engine: &Engine, arc: Arc) -> DdResult<u32> {
        super::level_of_arc(engine, arc)
    }

    fn count_signed(
        engine: &Engine,
        arc: Arc,
        memo: &mut HashMap<u64, BigUint, FxBuildHasher>,
    ) -> DdResult<BigUint> {
        if arc.is_terminal() {
            return Ok(if arc.terminal_value() { BigUint::one() } else { BigUint::zero() });
        }
        if let Some(v) = memo.get(&arc.bits()) {
            return Ok(v.clone());
        }
        let node = *engine.node(arc);
        let level = engine.level_of(node.var)?;
        let lo_level = level_of_arc(engine, node.low)?;
        let hi_level = level_of_arc(engine, node.high)?;
        let lo_count = count_signed(engine, node.low, memo)? << (level - 1 - lo_level);
        let hi_count = count_signed(engine, node.high, memo)? << (level - 1 - hi_level);
        let mut total = lo_count + hi_count;
        if arc.is_complemented() {
            total = (BigUint::one() << level) - total;
        }
        memo.insert(arc.bits(), total.clone());
        Ok(total)
    }

    /// Arbitrary-precision variant of [`super::count_sat_bdd`], for
    /// variable counts large enough that `2^nvars` overflows `u128`.
    pub fn count_sat_bdd(engine: &Engine, f: Arc, nvars: u32) -> DdResult<BigUint> {
        let mut memo = HashMap::default();
        let top = level_of_arc(engine, f)?;
        let local = count_signed(engine, f, &mut memo)?;
        Ok(local << (nvars - top))
    }
}

/// Extracts one satisfying assignment of `f` as a partial assignment over
/// `nvars` variables, or `None` if `f` is unsatisfiable. A single
/// root-to-leaf walk visits only the variables the path actually branches
/// on; every other variable — whether skipped between two levels or never
/// reached before the walk hits `T1` — is reported as
/// [`Trit::DontCare`] rather than defaulted to a concrete value, since `f`
/// is satisfied regardless of what it's set to.
pub fn one_sat(engine: &Engine, f: Arc, nvars: u32) -> DdResult<Option<PartialAssignment>> {
    if f == T0 {
        return Ok(None);
    }
    let mut asn = PartialAssignment::new(nvars as usize);
    let mut cur = f;
    while cur != T1 {
        let neg = cur.is_complemented();
        let node = *engine.node(cur);
        let high = if neg { node.high.negated() } else { node.high };
        if high != T0 {
            asn.var_put(node.var, Trit::One);
            cur = high;
        } else {
            let low = if neg { node.low.negated() } else { node.low };
            asn.var_put(node.var, Trit::Zero);
            cur = low;
        }
    }
    Ok(Some(asn))
}

/// Splits `pairs` state-variable pairs into `(current, next)` variable
/// lists using the even/odd convention: current-state variables are
/// even-numbered (2, 4, 6, ...), their corresponding next-state variables
/// are the preceding odd number (1, 3, 5, ...).
pub fn even_odd_pairs(pairs: u32) -> (Vec<u32>, Vec<u32>) {
    let mut current = Vec::with_capacity(pairs as usize);
    let mut next = Vec::with_capacity(pairs as usize);
    for i in 1..=pairs {
        current.push(2 * i);
        next.push(2 * i - 1);
    }
    (current, next)
}

/// Relational product (image computation): given a set of `states` and a
/// `trans`ition relation over `current_vars`/`next_vars`, returns the set
/// of successor states, expressed back in terms of `current_vars`.
///
/// Computes `∃ current_vars. states(current) ∧ trans(current, next)`, then
/// renames each `next_vars[i]` back to `current_vars[i]` so the result is
/// directly usable as the next iteration's `states`.
pub fn rel_prod(
    engine: &mut Engine,
    states: Arc,
    trans: Arc,
    current_vars: &[u32],
    next_vars: &[u32],
) -> DdResult<Arc> {
    let conj = and(engine, states, trans)?;
    let projected = exist(engine, conj, current_vars)?;
    let mut renamed = projected;
    for (&next_var, &cur_var) in next_vars.iter().zip(current_vars.iter()) {
        let literal = engine.var_bdd(cur_var)?;
        renamed = compose(engine, renamed, next_var, literal)?;
    }
    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply_bdd::and;

    #[test]
    fn count_sat_of_single_variable_is_half_the_space() {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let _y = e.new_variable().unwrap();
        let vx = e.var_bdd(x).unwrap();
        assert_eq!(count_sat_bdd(&e, vx, 2).unwrap(), 2);
        assert_eq!(count_sat_bdd(&e, vx.negated(), 2).unwrap(), 2);
    }

    #[test]
    fn count_sat_of_true_is_full_space() {
        let e = Engine::new();
        assert_eq!(count_sat_bdd(&e, T1, 3).unwrap(), 8);
        assert_eq!(count_sat_bdd(&e, T0, 3).unwrap(), 0);
    }

    #[test]
    fn count_zdd_counts_member_sets() {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let y = e.new_variable().unwrap();
        let sx = e.zdd_single(x).unwrap();
        let sy = e.zdd_single(y).unwrap();
        let u = crate::apply_zdd::union(&mut e, sx, sy).unwrap();
        assert_eq!(count_zdd(&e, u).unwrap(), 2);
        assert_eq!(count_zdd(&e, e.zdd_empty()).unwrap(), 0);
        assert_eq!(count_zdd(&e, e.zdd_base()).unwrap(), 1);
    }

    #[test]
    fn one_sat_finds_a_witness_consistent_with_membership() {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let y = e.new_variable().unwrap();
        let vx = e.var_bdd(x).unwrap();
        let vy = e.var_bdd(y).unwrap();
        let f = and(&mut e, vx, vy.negated()).unwrap();
        let witness = one_sat(&e, f, 2).unwrap().unwrap();
        assert_eq!(witness.var_get(x), Trit::One);
        assert_eq!(witness.var_get(y), Trit::Zero);
    }

    #[test]
    fn one_sat_reports_dont_care_for_unvisited_variables() {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let y = e.new_variable().unwrap();
        let z = e.new_variable().unwrap();
        let vx = e.var_bdd(x).unwrap();
        let witness = one_sat(&e, vx, 3).unwrap().unwrap();
        assert_eq!(witness.var_get(x), Trit::One);
        assert_eq!(witness.var_get(y), Trit::DontCare);
        assert_eq!(witness.var_get(z), Trit::DontCare);
    }

    #[test]
    fn one_sat_of_false_is_none() {
        let e = Engine::new();
        assert_eq!(one_sat(&e, T0, 0).unwrap(), None);
    }

    #[test]
    fn rel_prod_computes_successor_states() {
        // one boolean variable of state; transition always flips it.
        let mut e = Engine::new();
        let (cur, nxt) = even_odd_pairs(1);
        let cx = cur[0];
        let nx = nxt[0];
        let c_lit = e.var_bdd(cx).unwrap();
        let n_lit = e.var_bdd(nx).unwrap();
        // states = {x=false}; trans = (x' = !x)
        let states = c_lit.negated();
        let trans = crate::apply_bdd::xor(&mut e, c_lit, n_lit.negated()).unwrap();
        let succ = rel_prod(&mut e, states, trans, &cur, &nxt).unwrap();
        // successor of x=false under "flip" is x=true
        assert_eq!(succ, c_lit);
    }
}
