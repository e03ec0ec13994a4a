//! ZDD enumeration: dictionary order, weight order, and random sampling
//! over a family of sets.
//!
//! Grounded on `zdd_index.hpp`/`zdd_iterators.hpp`: the subfamily-count
//! index is built lazily for a given root and memoised ([`ZddIndex`]),
//! then `get_set(k)` walks top-down consulting the low subtree's count to
//! decide whether the `k`-th set (in dictionary order: "absent" sorts
//! before "present") lies in the low or high branch — the walk is
//! `O(height)` per set, never materialising the whole family.

use std::collections::HashMap;

use fxhash::FxBuildHasher;
use rand::Rng;

use crate::apply_zdd::{change, difference};
use crate::arc::{Arc, T0, T1};
use crate::engine::Engine;
use crate::error::DdResult;
use crate::reg::Reg;

/// Per-root, memoised subfamily-count index: `counts[node] == number of
/// member sets in the family rooted at that node`.
#[derive(Debug)]
pub struct ZddIndex {
    counts: HashMap<u64, u128, FxBuildHasher>,
}

impl ZddIndex {
    pub fn build(engine: &Engine, root: Arc) -> DdResult<Self> {
        let mut counts = HashMap::default();
        Self::count_into(engine, root, &mut counts)?;
        Ok(ZddIndex { counts })
    }

    fn count_into(engine: &Engine, f: Arc, counts: &mut HashMap<u64, u128, FxBuildHasher>) -> DdResult<u128> {
        if f == T0 {
            return Ok(0);
        }
        if f == T1 {
            return Ok(1);
        }
        if let Some(&v) = counts.get(&f.bits()) {
            return Ok(v);
        }
        let node = *engine.node(f);
        let lo = Self::count_into(engine, node.low, counts)?;
        let hi = Self::count_into(engine, node.high, counts)?;
        let total = lo + hi;
        counts.insert(f.bits(), total);
        Ok(total)
    }

    /// Number of member sets at `f`. `f` must be part of the subgraph this
    /// index was [`ZddIndex::build`]t from.
    pub fn count(&self, f: Arc) -> u128 {
        match f {
            T0 => 0,
            T1 => 1,
            _ => *self
                .counts
                .get(&f.bits())
                .expect("ZddIndex::count: arc not covered by this index's root"),
        }
    }

    /// The `k`-th set (0-indexed) in dictionary order, or `None` if `k` is
    /// out of range.
    pub fn get_set(&self, engine: &Engine, root: Arc, k: u128, nvars: u32) -> DdResult<Option<Reg>> {
        if k >= self.count(root) {
            return Ok(None);
        }
        let mut reg = Reg::new(nvars as usize);
        let mut cur = root;
        let mut rem = k;
        while cur != T1 {
            let node = *engine.node(cur);
            let lo_count = self.count(node.low);
            if rem < lo_count {
                reg.var_put(node.var, false);
                cur = node.low;
            } else {
                rem -= lo_count;
                reg.var_put(node.var, true);
                cur = node.high;
            }
        }
        Ok(Some(reg))
    }

    pub fn iter_dictionary<'a>(&'a self, engine: &'a Engine, root: Arc, nvars: u32) -> DictIter<'a> {
        DictIter { index: self, engine, root, nvars, next: 0, total: self.count(root) }
    }

    pub fn iter_dictionary_rev<'a>(&'a self, engine: &'a Engine, root: Arc, nvars: u32) -> DictIterRev<'a> {
        let total = self.count(root);
        DictIterRev { index: self, engine, root, nvars, next: total }
    }
}

pub struct DictIter<'a> {
    index: &'a ZddIndex,
    engine: &'a Engine,
    root: Arc,
    nvars: u32,
    next: u128,
    total: u128,
}

impl<'a> Iterator for DictIter<'a> {
    type Item = Reg;
    fn next(&mut self) -> Option<Reg> {
        if self.next >= self.total {
            return None;
        }
        let reg = self
            .index
            .get_set(self.engine, self.root, self.next, self.nvars)
            .ok()
            .flatten();
        self.next += 1;
        reg
    }
}

pub struct DictIterRev<'a> {
    index: &'a ZddIndex,
    engine: &'a Engine,
    root: Arc,
    nvars: u32,
    next: u128,
}

impl<'a> Iterator for DictIterRev<'a> {
    type Item = Reg;
    fn next(&mut self) -> Option<Reg> {
        if self.next == 0 {
            return None;
        }
        self.next -= 1;
        self.index.get_set(self.engine, self.root, self.next, self.nvars).ok().flatten()
    }
}

/// Uniformly samples one member set at random, weighting the low/high
/// branch choice at each node by its subfamily count so every set has
/// equal probability.
pub fn random_member(
    engine: &Engine,
    index: &ZddIndex,
    root: Arc,
    nvars: u32,
    rng: &mut impl Rng,
) -> DdResult<Option<Reg>> {
    let total = index.count(root);
    if total == 0 {
        return Ok(None);
    }
    let k = rng.gen_range(0..total);
    index.get_set(engine, root, k, nvars)
}

fn extremum_weight(
    engine: &Engine,
    f: Arc,
    weight_of: &impl Fn(u32) -> i64,
    better: &impl Fn(i64, i64) -> bool,
    memo: &mut HashMap<u64, Option<i64>, FxBuildHasher>,
) -> DdResult<Option<i64>> {
    if f == T0 {
        return Ok(None);
    }
    if f == T1 {
        return Ok(Some(0));
    }
    if let Some(&v) = memo.get(&f.bits()) {
        return Ok(v);
    }
    let node = *engine.node(f);
    let lo = extremum_weight(engine, node.low, weight_of, better, memo)?;
    let hi = extremum_weight(engine, node.high, weight_of, better, memo)?.map(|w| w + weight_of(node.var));
    let best = match (lo, hi) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (Some(a), Some(b)) => Some(if better(b, a) { b } else { a }),
    };
    memo.insert(f.bits(), best);
    Ok(best)
}

fn extremum_member(
    engine: &Engine,
    root: Arc,
    nvars: u32,
    weight_of: impl Fn(u32) -> i64,
    better: impl Fn(i64, i64) -> bool,
) -> DdResult<Option<Reg>> {
    let mut memo = HashMap::default();
    if extremum_weight(engine, root, &weight_of, &better, &mut memo)?.is_none() {
        return Ok(None);
    }
    let mut reg = Reg::new(nvars as usize);
    let mut cur = root;
    while cur != T1 {
        let node = *engine.node(cur);
        let lo = extremum_weight(engine, node.low, &weight_of, &better, &mut memo)?;
        let hi = extremum_weight(engine, node.high, &weight_of, &better, &mut memo)?.map(|w| w + weight_of(node.var));
        let take_high = match (lo, hi) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => better(b, a),
        };
        if take_high {
            reg.var_put(node.var, true);
            cur = node.high;
        } else {
            reg.var_put(node.var, false);
            cur = node.low;
        }
    }
    Ok(Some(reg))
}

/// The member set minimizing `sum(weight_of(var) for var in set)`.
/// Passing `|_| 1` minimizes cardinality.
pub fn min_weight_member(engine: &Engine, root: Arc, nvars: u32, weight_of: impl Fn(u32) -> i64) -> DdResult<Option<Reg>> {
    extremum_member(engine, root, nvars, weight_of, |b, a| b < a)
}

/// The member set maximizing `sum(weight_of(var) for var in set)`.
pub fn max_weight_member(engine: &Engine, root: Arc, nvars: u32, weight_of: impl Fn(u32) -> i64) -> DdResult<Option<Reg>> {
    extremum_member(engine, root, nvars, weight_of, |b, a| b > a)
}

/// Builds the singleton family `{ members }` (a ZDD with exactly one set,
/// the one whose high bits are `reg`'s) by starting from the family
/// containing only the empty set and toggling in each member variable —
/// the same `change` primitive `apply_zdd::change` already provides, just
/// applied once per bit instead of to every set in a larger family.
fn singleton_from_members(engine: &mut Engine, reg: &Reg) -> DdResult<Arc> {
    let mut fam = T1;
    for bit in reg.hi_bits() {
        fam = change(engine, fam, bit as u32 + 1)?;
    }
    Ok(fam)
}

/// True consuming enumeration in weight order: repeatedly pulls the
/// current extremum member out of what remains of the family (via ZDD
/// `difference`) until nothing is left, so each call yields a genuinely
/// distinct member rather than re-deriving the same single extraction.
pub struct WeightIter<'a> {
    engine: &'a mut Engine,
    nvars: u32,
    remaining: Arc,
    weight_of: Box<dyn Fn(u32) -> i64 + 'a>,
    minimize: bool,
}

impl<'a> Iterator for WeightIter<'a> {
    type Item = DdResult<Reg>;

    fn next(&mut self) -> Option<DdResult<Reg>> {
        if self.remaining == T0 {
            return None;
        }
        let picked = if self.minimize {
            min_weight_member(self.engine, self.remaining, self.nvars, &self.weight_of)
        } else {
            max_weight_member(self.engine, self.remaining, self.nvars, &self.weight_of)
        };
        let reg = match picked {
            Ok(Some(reg)) => reg,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };
        let single = match singleton_from_members(self.engine, &reg) {
            Ok(s) => s,
            Err(e) => return Some(Err(e)),
        };
        match difference(self.engine, self.remaining, single) {
            Ok(rest) => self.remaining = rest,
            Err(e) => return Some(Err(e)),
        }
        Some(Ok(reg))
    }
}

/// Enumerates every member of `root` from lightest to heaviest, by
/// `sum(weight_of(var) for var in set)`.
pub fn min_weight_iter<'a>(
    engine: &'a mut Engine,
    root: Arc,
    nvars: u32,
    weight_of: impl Fn(u32) -> i64 + 'a,
) -> WeightIter<'a> {
    WeightIter { engine, nvars, remaining: root, weight_of: Box::new(weight_of), minimize: true }
}

/// Enumerates every member of `root` from heaviest to lightest.
pub fn max_weight_iter<'a>(
    engine: &'a mut Engine,
    root: Arc,
    nvars: u32,
    weight_of: impl Fn(u32) -> i64 + 'a,
) -> WeightIter<'a> {
    WeightIter { engine, nvars, remaining: root, weight_of: Box::new(weight_of), minimize: false }
}

/// True consuming random enumeration: a uniformly-random permutation of
/// every member of `root`, each drawn via [`random_member`] and then
/// removed from what remains — as opposed to [`random_member`] itself,
/// which only ever draws one sample and leaves the family untouched.
pub struct RandomIter<'a, R: Rng> {
    engine: &'a mut Engine,
    nvars: u32,
    remaining: Arc,
    rng: &'a mut R,
}

impl<'a, R: Rng> Iterator for RandomIter<'a, R> {
    type Item = DdResult<Reg>;

    fn next(&mut self) -> Option<DdResult<Reg>> {
        if self.remaining == T0 {
            return None;
        }
        let index = match ZddIndex::build(self.engine, self.remaining) {
            Ok(ix) => ix,
            Err(e) => return Some(Err(e)),
        };
        let reg = match random_member(self.engine, &index, self.remaining, self.nvars, self.rng) {
            Ok(Some(reg)) => reg,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };
        let single = match singleton_from_members(self.engine, &reg) {
            Ok(s) => s,
            Err(e) => return Some(Err(e)),
        };
        match difference(self.engine, self.remaining, single) {
            Ok(rest) => self.remaining = rest,
            Err(e) => return Some(Err(e)),
        }
        Some(Ok(reg))
    }
}

/// Begins a true consuming random enumeration of every member of `root`,
/// visited in a uniformly-random order with no repeats.
pub fn random_begin<'a, R: Rng>(engine: &'a mut Engine, root: Arc, nvars: u32, rng: &'a mut R) -> RandomIter<'a, R> {
    RandomIter { engine, nvars, remaining: root, rng }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply_zdd::{change, union};

    fn three_singletons() -> (Engine, Arc, u32) {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let y = e.new_variable().unwrap();
        let z = e.new_variable().unwrap();
        let sx = e.zdd_single(x).unwrap();
        let sy = e.zdd_single(y).unwrap();
        let sz = e.zdd_single(z).unwrap();
        let u = union(&mut e, sx, sy).unwrap();
        let u = union(&mut e, u, sz).unwrap();
        (e, u, 3)
    }

    #[test]
    fn dictionary_iteration_covers_every_member_exactly_once() {
        let (e, root, nvars) = three_singletons();
        let index = ZddIndex::build(&e, root).unwrap();
        assert_eq!(index.count(root), 3);
        let sets: Vec<Reg> = index.iter_dictionary(&e, root, nvars).collect();
        assert_eq!(sets.len(), 3);
        let mut weights: Vec<usize> = sets.iter().map(|r| r.hi_bits().len()).collect();
        weights.sort();
        assert_eq!(weights, vec![1, 1, 1]);
    }

    #[test]
    fn reverse_iteration_is_the_mirror_of_forward() {
        let (e, root, nvars) = three_singletons();
        let index = ZddIndex::build(&e, root).unwrap();
        let fwd: Vec<Reg> = index.iter_dictionary(&e, root, nvars).collect();
        let mut rev: Vec<Reg> = index.iter_dictionary_rev(&e, root, nvars).collect();
        rev.reverse();
        assert_eq!(fwd, rev);
    }

    #[test]
    fn get_set_out_of_range_is_none() {
        let (e, root, nvars) = three_singletons();
        let index = ZddIndex::build(&e, root).unwrap();
        assert_eq!(index.get_set(&e, root, 3, nvars).unwrap(), None);
    }

    #[test]
    fn min_and_max_weight_pick_extreme_cardinality_sets() {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let y = e.new_variable().unwrap();
        let sx = e.zdd_single(x).unwrap();
        let pair = change(&mut e, sx, y).unwrap(); // {x,y}
        let family = union(&mut e, sx, pair).unwrap(); // {{x}, {x,y}}
        let min = min_weight_member(&e, family, 2, |_| 1).unwrap().unwrap();
        assert_eq!(min.hi_bits().len(), 1);
        let max = max_weight_member(&e, family, 2, |_| 1).unwrap().unwrap();
        assert_eq!(max.hi_bits().len(), 2);
    }

    #[test]
    fn random_member_is_always_a_real_member() {
        let (e, root, nvars) = three_singletons();
        let index = ZddIndex::build(&e, root).unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..10 {
            let picked = random_member(&e, &index, root, nvars, &mut rng).unwrap().unwrap();
            assert_eq!(picked.hi_bits().len(), 1);
        }
    }

    #[test]
    fn weight_iter_yields_every_member_in_ascending_weight_order() {
        let (mut e, root, nvars) = three_singletons();
        let members: Vec<Reg> = min_weight_iter(&mut e, root, nvars, |_| 1).map(|r| r.unwrap()).collect();
        assert_eq!(members.len(), 3);
        assert_eq!(e.zdd_empty(), T0); // sanity: engine still usable afterwards
        let seen: std::collections::HashSet<usize> = members.iter().flat_map(|r| r.hi_bits()).collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn max_weight_iter_starts_from_the_heaviest_member() {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let y = e.new_variable().unwrap();
        let sx = e.zdd_single(x).unwrap();
        let pair = change(&mut e, sx, y).unwrap();
        let family = union(&mut e, sx, pair).unwrap();
        let mut it = max_weight_iter(&mut e, family, 2, |_| 1);
        let first = it.next().unwrap().unwrap();
        assert_eq!(first.hi_bits().len(), 2);
        let second = it.next().unwrap().unwrap();
        assert_eq!(second.hi_bits().len(), 1);
        assert!(it.next().is_none());
    }

    #[test]
    fn random_iter_visits_every_member_exactly_once() {
        let (mut e, root, nvars) = three_singletons();
        let mut rng = rand::thread_rng();
        let members: Vec<Reg> = random_begin(&mut e, root, nvars, &mut rng).map(|r| r.unwrap()).collect();
        assert_eq!(members.len(), 3);
        let seen: std::collections::HashSet<usize> = members.iter().flat_map(|r| r.hi_bits()).collect();
        assert_eq!(seen.len(), 3);
    }
}
