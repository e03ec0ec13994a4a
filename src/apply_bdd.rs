//! BDD apply engine: Shannon-decomposition recursion over complemented
//! arcs, memoised through the engine's operation cache.
//!
//! `ite` is grounded on bex's `ITE::norm` (Bryant's normal-form
//! algorithm) and on `OBDDimal`'s plain recursive `ite()` found among the
//! retrieval pack's standalone examples — this crate keeps bex's terminal
//! short circuits (the `f.is_const()`, `g==h`, `g.is_const() &&
//! h.is_const()` cases) but drops the swarm/continuation machinery
//! `bdd_swarm.rs` builds around it, since apply here runs on one thread
//! only.
//! `AND`/`OR`/`XOR` are expressed in terms of `ite`, matching bex's
//! `Base::and`/`Base::xor`/`Base::or` impls for `BddBase`. `NOT` never
//! appears here: it's `Arc::negated`, O(1).
//!
//! `cofactor`/`compose`/`exist1`/`forall1` each memoise through the same
//! operation cache `ite` uses, keyed on the extra `var`/`value` scalar
//! packed into a synthetic arc the way `apply_zdd::change` packs its own
//! variable argument. `exist`/`forall` loop `exist1`/`forall1` once per
//! eliminated variable, so without this a later iteration would re-walk
//! subgraphs the earlier iteration already visited.

use std::cmp::Ordering;

use crate::arc::{Arc, T0, T1};
use crate::engine::Engine;
use crate::error::DdResult;
use crate::ops::Opcode;
use crate::unique::Flavor;

fn top_level(engine: &Engine, arcs: &[Arc]) -> DdResult<u32> {
    let mut top = 0u32;
    for &a in arcs {
        if !a.is_terminal() {
            let node = *engine.node(a);
            let lvl = engine.level_of(node.var)?;
            if lvl > top {
                top = lvl;
            }
        }
    }
    Ok(top)
}

/// Cofactor `a` on the variable at `top_level`, returning `(low, high)`.
/// If `a`'s top variable sits below `top_level`, `a` doesn't depend on it
/// and both cofactors are `a` unchanged.
fn split(engine: &Engine, a: Arc, top_level: u32) -> DdResult<(Arc, Arc)> {
    if a.is_terminal() {
        return Ok((a, a));
    }
    let neg = a.is_complemented();
    let node = *engine.node(a);
    let level = engine.level_of(node.var)?;
    if level != top_level {
        return Ok((a, a));
    }
    Ok(if neg { (node.low.negated(), node.high.negated()) } else { (node.low, node.high) })
}

/// `if f then g else h`, the one primitive every binary BDD operator
/// reduces to.
pub fn ite(engine: &mut Engine, f: Arc, g: Arc, h: Arc) -> DdResult<Arc> {
    if f == T1 {
        return Ok(g);
    }
    if f == T0 {
        return Ok(h);
    }
    if g == h {
        return Ok(g);
    }
    if g == T1 && h == T0 {
        return Ok(f);
    }
    if g == T0 && h == T1 {
        return Ok(f.negated());
    }

    if let Some(hit) = engine.cache_mut().get3(Opcode::Ite, f, g, h, true) {
        return Ok(hit);
    }

    let top = top_level(engine, &[f, g, h])?;
    let var = engine.var_at_level(top)?;
    let (f0, f1) = split(engine, f, top)?;
    let (g0, g1) = split(engine, g, top)?;
    let (h0, h1) = split(engine, h, top)?;
    let lo = ite(engine, f0, g0, h0)?;
    let hi = ite(engine, f1, g1, h1)?;
    let result = engine.make(Flavor::Bdd, var, lo, hi)?;
    engine.cache_mut().put3(Opcode::Ite, f, g, h, true, result);
    Ok(result)
}

pub fn and(engine: &mut Engine, x: Arc, y: Arc) -> DdResult<Arc> {
    ite(engine, x, y, T0)
}

pub fn or(engine: &mut Engine, x: Arc, y: Arc) -> DdResult<Arc> {
    ite(engine, x, T1, y)
}

pub fn xor(engine: &mut Engine, x: Arc, y: Arc) -> DdResult<Arc> {
    ite(engine, x, y.negated(), y)
}

pub fn not(x: Arc) -> Arc {
    x.negated()
}

pub fn gt(engine: &mut Engine, x: Arc, y: Arc) -> DdResult<Arc> {
    ite(engine, x, y.negated(), T0)
}

pub fn lt(engine: &mut Engine, x: Arc, y: Arc) -> DdResult<Arc> {
    ite(engine, x, T0, y)
}

/// Packs `(var, value)` into a synthetic cache-key arc, the same trick
/// `apply_zdd::change` uses for its own extra scalar argument.
fn var_value_key(var: u32, value: bool) -> Arc {
    Arc::from_bits(((var as u64) << 1) | value as u64)
}

/// Single-variable Shannon cofactor: the function `f` restricted to
/// `var = value`.
pub fn cofactor(engine: &mut Engine, f: Arc, var: u32, value: bool) -> DdResult<Arc> {
    if f.is_terminal() {
        return Ok(f);
    }
    let neg = f.is_complemented();
    let node = *engine.node(f);
    let node_level = engine.level_of(node.var)?;
    let var_level = engine.level_of(var)?;
    let result = match var_level.cmp(&node_level) {
        Ordering::Greater => f.without_complement(),
        Ordering::Equal => {
            if value {
                node.high
            } else {
                node.low
            }
        }
        Ordering::Less => {
            let key = var_value_key(var, value);
            if let Some(hit) = engine.cache_mut().get2(Opcode::Cofactor, f, key) {
                hit
            } else {
                let lo = cofactor(engine, node.low, var, value)?;
                let hi = cofactor(engine, node.high, var, value)?;
                let made = engine.make(Flavor::Bdd, node.var, lo, hi)?;
                engine.cache_mut().put2(Opcode::Cofactor, f, key, made);
                made
            }
        }
    };
    Ok(if neg { result.negated() } else { result })
}

/// Simultaneous restriction to several `(var, value)` pairs, applied
/// innermost-variable-first so each step only ever cofactors on a variable
/// still present in the diagram.
pub fn restrict(engine: &mut Engine, f: Arc, assignment: &[(u32, bool)]) -> DdResult<Arc> {
    let mut vars = assignment.to_vec();
    vars.sort_by_key(|&(var, _)| std::cmp::Reverse(engine.level_of(var).unwrap_or(0)));
    let mut result = f;
    for (var, value) in vars {
        result = cofactor(engine, result, var, value)?;
    }
    Ok(result)
}

/// Substitutes `g` for `var` everywhere in `f`.
pub fn compose(engine: &mut Engine, f: Arc, var: u32, g: Arc) -> DdResult<Arc> {
    if f.is_terminal() {
        return Ok(f);
    }
    let neg = f.is_complemented();
    let node = *engine.node(f);
    let node_level = engine.level_of(node.var)?;
    let var_level = engine.level_of(var)?;
    let result = match var_level.cmp(&node_level) {
        Ordering::Greater => f.without_complement(),
        Ordering::Equal => ite(engine, g, node.high, node.low)?,
        Ordering::Less => {
            let key = Arc::from_bits(var as u64);
            if let Some(hit) = engine.cache_mut().get3(Opcode::Compose, f, key, g, true) {
                hit
            } else {
                let lo = compose(engine, node.low, var, g)?;
                let hi = compose(engine, node.high, var, g)?;
                let made = engine.make(Flavor::Bdd, node.var, lo, hi)?;
                engine.cache_mut().put3(Opcode::Compose, f, key, g, true, made);
                made
            }
        }
    };
    Ok(if neg { result.negated() } else { result })
}

/// Existential quantification over a single variable: `f[var=0] OR f[var=1]`.
pub fn exist1(engine: &mut Engine, f: Arc, var: u32) -> DdResult<Arc> {
    if f.is_terminal() {
        return Ok(f);
    }
    let key = Arc::from_bits(var as u64);
    if let Some(hit) = engine.cache_mut().get2(Opcode::Exist, f, key) {
        return Ok(hit);
    }
    let lo = cofactor(engine, f, var, false)?;
    let hi = cofactor(engine, f, var, true)?;
    let result = or(engine, lo, hi)?;
    engine.cache_mut().put2(Opcode::Exist, f, key, result);
    Ok(result)
}

/// Universal quantification over a single variable: `f[var=0] AND f[var=1]`.
pub fn forall1(engine: &mut Engine, f: Arc, var: u32) -> DdResult<Arc> {
    if f.is_terminal() {
        return Ok(f);
    }
    let key = Arc::from_bits(var as u64);
    if let Some(hit) = engine.cache_mut().get2(Opcode::Forall, f, key) {
        return Ok(hit);
    }
    let lo = cofactor(engine, f, var, false)?;
    let hi = cofactor(engine, f, var, true)?;
    let result = and(engine, lo, hi)?;
    engine.cache_mut().put2(Opcode::Forall, f, key, result);
    Ok(result)
}

/// Existential quantification over a set of variables.
pub fn exist(engine: &mut Engine, f: Arc, vars: &[u32]) -> DdResult<Arc> {
    let mut result = f;
    for &var in vars {
        result = exist1(engine, result, var)?;
    }
    Ok(result)
}

/// Universal quantification over a set of variables.
pub fn forall(engine: &mut Engine, f: Arc, vars: &[u32]) -> DdResult<Arc> {
    let mut result = f;
    for &var in vars {
        result = forall1(engine, result, var)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_var_engine() -> (Engine, u32, u32) {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let y = e.new_variable().unwrap();
        (e, x, y)
    }

    #[test]
    fn and_of_a_variable_with_itself_is_itself() {
        let (mut e, x, _y) = two_var_engine();
        let vx = e.var_bdd(x).unwrap();
        let r = and(&mut e, vx, vx).unwrap();
        assert_eq!(r, vx);
    }

    #[test]
    fn xor_is_antisymmetric_under_negation() {
        let (mut e, x, y) = two_var_engine();
        let vx = e.var_bdd(x).unwrap();
        let vy = e.var_bdd(y).unwrap();
        let a = xor(&mut e, vx, vy).unwrap();
        let b = xor(&mut e, vx, vy.negated()).unwrap();
        assert_eq!(a, b.negated());
    }

    #[test]
    fn cofactor_on_top_variable_yields_constant_branches() {
        let (mut e, x, _y) = two_var_engine();
        let vx = e.var_bdd(x).unwrap();
        assert_eq!(cofactor(&mut e, vx, x, true).unwrap(), T1);
        assert_eq!(cofactor(&mut e, vx, x, false).unwrap(), T0);
    }

    #[test]
    fn exist_over_both_variables_of_and_is_true_unless_unsat() {
        let (mut e, x, y) = two_var_engine();
        let vx = e.var_bdd(x).unwrap();
        let vy = e.var_bdd(y).unwrap();
        let conj = and(&mut e, vx, vy).unwrap();
        let q = exist(&mut e, conj, &[x, y]).unwrap();
        assert_eq!(q, T1);
    }

    #[test]
    fn compose_substitutes_variable_with_constant() {
        let (mut e, x, y) = two_var_engine();
        let vx = e.var_bdd(x).unwrap();
        let vy = e.var_bdd(y).unwrap();
        let f = and(&mut e, vx, vy).unwrap();
        let g = compose(&mut e, f, x, T1).unwrap();
        assert_eq!(g, vy);
        let h = compose(&mut e, f, x, T0).unwrap();
        assert_eq!(h, T0);
    }
}
