//! ZDD apply engine: the family-of-sets algebra.
//!
//! ZDD arcs never carry the complement bit, so unlike `apply_bdd.rs` every
//! operation here is a plain top-down recursion with no sign-pushing.
//! Grounded on bex's zero-suppression handling in `vhl.rs` plus
//! the ZDD operator set from SAPPOROBDD2 (`dd_node.hpp`'s union/intersect/
//! difference/change). `Join`/`Meet` (cartesian union-combine and
//! intersection-combine of two families) are not in either source
//! directly; they're Minato's standard ZDD set-algebra operators, and
//! `Meet` here is derived from `Join` by duality (swap which combination
//! of the two branches contributes to `high` vs `low`) — see `DESIGN.md`.

use crate::arc::{Arc, T0, T1};
use crate::engine::Engine;
use crate::error::{DdError, DdResult};
use crate::ops::Opcode;
use crate::unique::Flavor;

/// Every public entry point below takes only ZDD arcs, which must never
/// carry the complement bit (see `crate::arc::Arc`'s own doc comment). A
/// complemented arc handed in here is a caller bug — a BDD arc crossing
/// into ZDD code — so it's rejected up front rather than silently
/// misread as a valid-looking uncomplemented node reference.
fn check_zdd_arc(a: Arc) -> DdResult<()> {
    if a.is_complemented() {
        Err(DdError::FlavourMismatch("ZDD operation received a complemented (BDD) arc"))
    } else {
        Ok(())
    }
}

/// Cofactor `a` on the variable at `top_level`. A ZDD node whose own top
/// variable sits below `top_level` doesn't mention that variable at all
/// (level order is strict), so its "has the variable" branch is empty.
fn split(engine: &Engine, a: Arc, top_level: u32) -> DdResult<(Arc, Arc)> {
    if a.is_terminal() {
        return Ok((a, T0));
    }
    let node = *engine.node(a);
    let level = engine.level_of(node.var)?;
    if level != top_level {
        return Ok((a, T0));
    }
    Ok((node.low, node.high))
}

fn top_level(engine: &Engine, f: Arc, g: Arc) -> DdResult<u32> {
    let lf = if f.is_terminal() { 0 } else { engine.level_of(engine.node(f).var)? };
    let lg = if g.is_terminal() { 0 } else { engine.level_of(engine.node(g).var)? };
    Ok(lf.max(lg))
}

pub fn union(engine: &mut Engine, f: Arc, g: Arc) -> DdResult<Arc> {
    check_zdd_arc(f)?;
    check_zdd_arc(g)?;
    if f == T0 {
        return Ok(g);
    }
    if g == T0 {
        return Ok(f);
    }
    if f == g {
        return Ok(f);
    }
    if let Some(hit) = engine.cache_mut().get2(Opcode::ZddUnion, f, g) {
        return Ok(hit);
    }
    let top = top_level(engine, f, g)?;
    let var = engine.var_at_level(top)?;
    let (f0, f1) = split(engine, f, top)?;
    let (g0, g1) = split(engine, g, top)?;
    let lo = union(engine, f0, g0)?;
    let hi = union(engine, f1, g1)?;
    let result = engine.make(Flavor::Zdd, var, lo, hi)?;
    engine.cache_mut().put2(Opcode::ZddUnion, f, g, result);
    Ok(result)
}

pub fn intersect(engine: &mut Engine, f: Arc, g: Arc) -> DdResult<Arc> {
    check_zdd_arc(f)?;
    check_zdd_arc(g)?;
    if f == T0 || g == T0 {
        return Ok(T0);
    }
    if f == g {
        return Ok(f);
    }
    if let Some(hit) = engine.cache_mut().get2(Opcode::ZddIntersect, f, g) {
        return Ok(hit);
    }
    let top = top_level(engine, f, g)?;
    let var = engine.var_at_level(top)?;
    let (f0, f1) = split(engine, f, top)?;
    let (g0, g1) = split(engine, g, top)?;
    let lo = intersect(engine, f0, g0)?;
    let hi = intersect(engine, f1, g1)?;
    let result = engine.make(Flavor::Zdd, var, lo, hi)?;
    engine.cache_mut().put2(Opcode::ZddIntersect, f, g, result);
    Ok(result)
}

/// `f \ g`: sets present in `f` but absent from `g`.
pub fn difference(engine: &mut Engine, f: Arc, g: Arc) -> DdResult<Arc> {
    check_zdd_arc(f)?;
    check_zdd_arc(g)?;
    if f == T0 {
        return Ok(T0);
    }
    if g == T0 {
        return Ok(f);
    }
    if f == g {
        return Ok(T0);
    }
    if let Some(hit) = engine.cache_mut().get2(Opcode::ZddDifference, f, g) {
        return Ok(hit);
    }
    let top = top_level(engine, f, g)?;
    let var = engine.var_at_level(top)?;
    let (f0, f1) = split(engine, f, top)?;
    let (g0, g1) = split(engine, g, top)?;
    let lo = difference(engine, f0, g0)?;
    let hi = difference(engine, f1, g1)?;
    let result = engine.make(Flavor::Zdd, var, lo, hi)?;
    engine.cache_mut().put2(Opcode::ZddDifference, f, g, result);
    Ok(result)
}

/// Cartesian union-combine: `{ a ∪ b : a ∈ f, b ∈ g }`.
pub fn join(engine: &mut Engine, f: Arc, g: Arc) -> DdResult<Arc> {
    check_zdd_arc(f)?;
    check_zdd_arc(g)?;
    if f == T0 || g == T0 {
        return Ok(T0);
    }
    if f == T1 {
        return Ok(g);
    }
    if g == T1 {
        return Ok(f);
    }
    if let Some(hit) = engine.cache_mut().get2(Opcode::ZddJoin, f, g) {
        return Ok(hit);
    }
    let top = top_level(engine, f, g)?;
    let var = engine.var_at_level(top)?;
    let (f0, f1) = split(engine, f, top)?;
    let (g0, g1) = split(engine, g, top)?;
    // var present in the union iff either side has it at this level.
    let a = join(engine, f0, g0)?;
    let b = join(engine, f0, g1)?;
    let c = join(engine, f1, g0)?;
    let d = join(engine, f1, g1)?;
    let lo = a;
    let hi_bg = union(engine, b, c)?;
    let hi = union(engine, hi_bg, d)?;
    let result = engine.make(Flavor::Zdd, var, lo, hi)?;
    engine.cache_mut().put2(Opcode::ZddJoin, f, g, result);
    Ok(result)
}

/// Cartesian intersection-combine: `{ a ∩ b : a ∈ f, b ∈ g }`, deduplicated.
/// The dual of [`join`]: `var` survives only when *both* sides carry it.
pub fn meet(engine: &mut Engine, f: Arc, g: Arc) -> DdResult<Arc> {
    check_zdd_arc(f)?;
    check_zdd_arc(g)?;
    if f == T0 || g == T0 {
        return Ok(T0);
    }
    if f == T1 {
        return Ok(if g != T0 { T1 } else { T0 });
    }
    if g == T1 {
        return Ok(if f != T0 { T1 } else { T0 });
    }
    if let Some(hit) = engine.cache_mut().get2(Opcode::ZddMeet, f, g) {
        return Ok(hit);
    }
    let top = top_level(engine, f, g)?;
    let var = engine.var_at_level(top)?;
    let (f0, f1) = split(engine, f, top)?;
    let (g0, g1) = split(engine, g, top)?;
    let a = meet(engine, f0, g0)?;
    let b = meet(engine, f0, g1)?;
    let c = meet(engine, f1, g0)?;
    let lo_ab = union(engine, a, b)?;
    let lo = union(engine, lo_ab, c)?;
    let hi = meet(engine, f1, g1)?;
    let result = engine.make(Flavor::Zdd, var, lo, hi)?;
    engine.cache_mut().put2(Opcode::ZddMeet, f, g, result);
    Ok(result)
}

/// Toggles membership of `var` in every set of the family `f`.
pub fn change(engine: &mut Engine, f: Arc, var: u32) -> DdResult<Arc> {
    check_zdd_arc(f)?;
    if f == T0 {
        return Ok(T0);
    }
    if f == T1 {
        return engine.make(Flavor::Zdd, var, T0, T1);
    }
    if let Some(hit) = engine.cache_mut().get2(Opcode::ZddChange, f, Arc::from_bits(var as u64)) {
        return Ok(hit);
    }
    let node = *engine.node(f);
    let node_level = engine.level_of(node.var)?;
    let var_level = engine.level_of(var)?;
    let result = match var_level.cmp(&node_level) {
        std::cmp::Ordering::Greater => engine.make(Flavor::Zdd, var, T0, f)?,
        std::cmp::Ordering::Equal => engine.make(Flavor::Zdd, node.var, node.high, node.low)?,
        std::cmp::Ordering::Less => {
            let lo = change(engine, node.low, var)?;
            let hi = change(engine, node.high, var)?;
            engine.make(Flavor::Zdd, node.var, lo, hi)?
        }
    };
    engine.cache_mut().put2(Opcode::ZddChange, f, Arc::from_bits(var as u64), result);
    Ok(result)
}

/// `{ s \ {var} : s ∈ f, var ∈ s }` — the subfamily of sets containing
/// `var`, with `var` itself stripped out of each.
pub fn onset(engine: &mut Engine, f: Arc, var: u32) -> DdResult<Arc> {
    check_zdd_arc(f)?;
    let var_level = engine.level_of(var)?;
    onset_rec(engine, f, var, var_level)
}

fn onset_rec(engine: &mut Engine, f: Arc, var: u32, var_level: u32) -> DdResult<Arc> {
    if f.is_terminal() {
        return Ok(T0);
    }
    let node = *engine.node(f);
    let node_level = engine.level_of(node.var)?;
    match var_level.cmp(&node_level) {
        std::cmp::Ordering::Greater => Ok(T0),
        std::cmp::Ordering::Equal => Ok(node.high),
        std::cmp::Ordering::Less => {
            let key = Arc::from_bits(var as u64);
            if let Some(hit) = engine.cache_mut().get2(Opcode::ZddOnset, f, key) {
                return Ok(hit);
            }
            let lo = onset_rec(engine, node.low, var, var_level)?;
            let hi = onset_rec(engine, node.high, var, var_level)?;
            let result = engine.make(Flavor::Zdd, node.var, lo, hi)?;
            engine.cache_mut().put2(Opcode::ZddOnset, f, key, result);
            Ok(result)
        }
    }
}

/// `{ s : s ∈ f, var ∉ s }` — the subfamily of sets absent `var`.
pub fn offset(engine: &mut Engine, f: Arc, var: u32) -> DdResult<Arc> {
    check_zdd_arc(f)?;
    let var_level = engine.level_of(var)?;
    offset_rec(engine, f, var, var_level)
}

fn offset_rec(engine: &mut Engine, f: Arc, var: u32, var_level: u32) -> DdResult<Arc> {
    if f.is_terminal() {
        return Ok(f);
    }
    let node = *engine.node(f);
    let node_level = engine.level_of(node.var)?;
    match var_level.cmp(&node_level) {
        std::cmp::Ordering::Greater => Ok(f),
        std::cmp::Ordering::Equal => Ok(node.low),
        std::cmp::Ordering::Less => {
            let key = Arc::from_bits(var as u64);
            if let Some(hit) = engine.cache_mut().get2(Opcode::ZddOffset, f, key) {
                return Ok(hit);
            }
            let lo = offset_rec(engine, node.low, var, var_level)?;
            let hi = offset_rec(engine, node.high, var, var_level)?;
            let result = engine.make(Flavor::Zdd, node.var, lo, hi)?;
            engine.cache_mut().put2(Opcode::ZddOffset, f, key, result);
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_two_vars() -> (Engine, u32, u32) {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let y = e.new_variable().unwrap();
        (e, x, y)
    }

    #[test]
    fn union_of_two_singletons_has_two_members() {
        let (mut e, x, y) = engine_with_two_vars();
        let sx = e.zdd_single(x).unwrap();
        let sy = e.zdd_single(y).unwrap();
        let u = union(&mut e, sx, sy).unwrap();
        assert_ne!(u, sx);
        assert_ne!(u, sy);
        // {x} union {x} is just {x}
        assert_eq!(union(&mut e, sx, sx).unwrap(), sx);
    }

    #[test]
    fn intersect_of_disjoint_singletons_is_empty() {
        let (mut e, x, y) = engine_with_two_vars();
        let sx = e.zdd_single(x).unwrap();
        let sy = e.zdd_single(y).unwrap();
        assert_eq!(intersect(&mut e, sx, sy).unwrap(), T0);
    }

    #[test]
    fn difference_removes_shared_member() {
        let (mut e, x, y) = engine_with_two_vars();
        let sx = e.zdd_single(x).unwrap();
        let sy = e.zdd_single(y).unwrap();
        let u = union(&mut e, sx, sy).unwrap();
        assert_eq!(difference(&mut e, u, sy).unwrap(), sx);
    }

    #[test]
    fn change_toggles_membership_of_the_empty_set() {
        let (mut e, x, _y) = engine_with_two_vars();
        let base = e.zdd_base();
        let toggled = change(&mut e, base, x).unwrap();
        assert_eq!(toggled, e.zdd_single(x).unwrap());
        let back = change(&mut e, toggled, x).unwrap();
        assert_eq!(back, T1);
    }

    #[test]
    fn join_combines_every_pair_by_union() {
        let (mut e, x, y) = engine_with_two_vars();
        let sx = e.zdd_single(x).unwrap();
        let sy = e.zdd_single(y).unwrap();
        // {{x}} join {{y}} == {{x,y}}
        let j = join(&mut e, sx, sy).unwrap();
        let expected = change(&mut e, sx, y).unwrap();
        assert_eq!(j, expected);
    }

    #[test]
    fn meet_of_disjoint_singletons_contains_only_empty_set() {
        let (mut e, x, y) = engine_with_two_vars();
        let sx = e.zdd_single(x).unwrap();
        let sy = e.zdd_single(y).unwrap();
        assert_eq!(meet(&mut e, sx, sy).unwrap(), T1);
    }

    #[test]
    fn onset_strips_the_variable_from_sets_that_contain_it() {
        let (mut e, x, y) = engine_with_two_vars();
        let sx = e.zdd_single(x).unwrap();
        let pair = change(&mut e, sx, y).unwrap(); // {x,y}
        let family = union(&mut e, sx, pair).unwrap(); // {{x}, {x,y}}
        let on_y = onset(&mut e, family, y).unwrap();
        // only {x,y} contains y; stripping y leaves {x}
        assert_eq!(on_y, sx);
    }

    #[test]
    fn offset_keeps_only_sets_without_the_variable() {
        let (mut e, x, y) = engine_with_two_vars();
        let sx = e.zdd_single(x).unwrap();
        let pair = change(&mut e, sx, y).unwrap(); // {x,y}
        let family = union(&mut e, sx, pair).unwrap(); // {{x}, {x,y}}
        let off_y = offset(&mut e, family, y).unwrap();
        assert_eq!(off_y, sx);
    }

    #[test]
    fn complemented_arc_is_rejected_as_a_flavour_mismatch() {
        let (mut e, x, y) = engine_with_two_vars();
        let sx = e.zdd_single(x).unwrap();
        let sy = e.zdd_single(y).unwrap();
        let bdd_like = sx.negated();
        assert!(matches!(union(&mut e, bdd_like, sy), Err(crate::error::DdError::FlavourMismatch(_))));
    }
}
