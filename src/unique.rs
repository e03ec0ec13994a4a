//! The unique table: hash-consing keyed by `(variable, low, high)`, enforcing
//! structural canonicity.
//!
//! An open-addressed table with linear probing is one obvious way to build
//! this. This crate uses `std::collections::HashMap` keyed by the same
//! triple and hashed with bex's `fxhash::FxBuildHasher` instead —
//! `HashMap`'s backing `hashbrown` table already *is* open-addressed (a
//! SIMD-probed variant of Robin Hood hashing) with the same load-factor
//! behaviour, so hand-rolling a second probing scheme on top would just be
//! the same algorithm under a different name. See `DESIGN.md`.

use std::collections::HashMap;

use fxhash::FxBuildHasher;

use crate::arc::{Arc, T0};
use crate::error::{DdError, DdResult};
use crate::node::Node;
use crate::store::NodeStore;

/// Which reduction rules `find_or_create` applies to a candidate triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Bdd,
    Zdd,
}

type Key = (u32, u64, u64);

#[derive(Debug, Default)]
pub struct UniqueTable {
    index: HashMap<Key, u64, FxBuildHasher>,
}

impl UniqueTable {
    pub fn new() -> Self {
        UniqueTable { index: HashMap::with_hasher(FxBuildHasher::default()) }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Removes every entry whose node index is not found live in `store`.
    /// Called during GC sweep, after the store itself has been swept.
    pub fn retain_live(&mut self, store: &NodeStore) {
        self.index.retain(|_, &mut ix| store.is_live(ix));
    }

    pub fn clear(&mut self) {
        self.index.clear();
    }

    fn key_for(var: u32, low: Arc, high: Arc) -> Key {
        (var, low.bits(), high.bits())
    }

    /// `find_or_create`: applies the reduction rule, flavour-specific
    /// zero-suppression / complement-canonicalisation, then probes the
    /// table, allocating a fresh node on miss.
    ///
    /// Callers must already have fully reduced `low`/`high` (the recursive
    /// apply algorithms guarantee this); this function only reduces at the
    /// single level of `var`.
    pub fn find_or_create(
        &mut self,
        store: &mut NodeStore,
        flavor: Flavor,
        var: u32,
        low: Arc,
        high: Arc,
    ) -> DdResult<Arc> {
        // reduction rule: a node that doesn't discriminate on `var` collapses
        // to its (identical) child.
        if low == high {
            return Ok(low);
        }

        if flavor == Flavor::Zdd {
            if low.is_complemented() || high.is_complemented() {
                return Err(DdError::FlavourMismatch(
                    "ZDD node construction received a complemented child arc",
                ));
            }
            // zero-suppression: a node whose high child is the empty family
            // contributes nothing, so it is replaced by its low child.
            if high == T0 {
                return Ok(low);
            }
            return self.probe_or_insert(store, var, low, high, false);
        }

        // BDD complement-edge canonicalisation: push negation to the
        // incoming edge so the stored low arc is never complemented.
        if low.is_complemented() {
            return Ok(self
                .probe_or_insert(store, var, low.negated(), high.negated(), true)?
                .negated());
        }
        self.probe_or_insert(store, var, low, high, false)
    }

    fn probe_or_insert(
        &mut self,
        store: &mut NodeStore,
        var: u32,
        low: Arc,
        high: Arc,
        then_negate: bool,
    ) -> DdResult<Arc> {
        let key = Self::key_for(var, low, high);
        let ix = if let Some(&ix) = self.index.get(&key) {
            ix
        } else {
            let ix = store.allocate(Node::new(var, low, high))?;
            self.index.insert(key, ix);
            ix
        };
        let arc = Arc::node(ix, false);
        Ok(if then_negate { arc.negated() } else { arc })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arc::T1;

    #[test]
    fn identical_children_reduce_without_allocating() {
        let mut store = NodeStore::new();
        let mut table = UniqueTable::new();
        let before = store.capacity();
        let a = table.find_or_create(&mut store, Flavor::Bdd, 1, T0, T0).unwrap();
        assert_eq!(a, T0);
        assert_eq!(store.capacity(), before);
    }

    #[test]
    fn equal_triples_share_one_node() {
        let mut store = NodeStore::new();
        let mut table = UniqueTable::new();
        let a = table.find_or_create(&mut store, Flavor::Bdd, 1, T0, T1).unwrap();
        let b = table.find_or_create(&mut store, Flavor::Bdd, 1, T0, T1).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn zdd_high_t0_is_zero_suppressed() {
        let mut store = NodeStore::new();
        let mut table = UniqueTable::new();
        let low = table.find_or_create(&mut store, Flavor::Zdd, 1, T0, T1).unwrap();
        let suppressed = table.find_or_create(&mut store, Flavor::Zdd, 2, low, T0).unwrap();
        assert_eq!(suppressed, low);
    }

    #[test]
    fn zdd_rejects_a_complemented_child_arc() {
        let mut store = NodeStore::new();
        let mut table = UniqueTable::new();
        let child = table.find_or_create(&mut store, Flavor::Zdd, 1, T0, T1).unwrap();
        let result = table.find_or_create(&mut store, Flavor::Zdd, 2, child.negated(), T1);
        assert!(matches!(result, Err(crate::error::DdError::FlavourMismatch(_))));
    }

    #[test]
    fn bdd_never_stores_a_complemented_low_arc() {
        let mut store = NodeStore::new();
        let mut table = UniqueTable::new();
        let child = table.find_or_create(&mut store, Flavor::Bdd, 2, T0, T1).unwrap();
        // low is complemented going in...
        let a = table.find_or_create(&mut store, Flavor::Bdd, 1, child.negated(), T1).unwrap();
        // ... so the stored node's low must not carry the complement bit.
        assert!(!store.at(a.without_complement().index()).low.is_complemented());
    }
}
