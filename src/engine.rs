//! The engine (manager): owns the node store, unique table, operation
//! cache and variable ordering, and exposes the public surface other
//! modules build on.
//!
//! Grounded on bex's `BddBase`: one struct holding all mutable state, a
//! `new()`/`new_with_threads(n)` constructor pair (here:
//! `new()`/`with_config()`), and `tags: HashMap<String, NID>` for naming
//! roots, kept as `tags`.

use std::collections::HashMap;

use log::{debug, error, trace, warn};

use crate::arc::{Arc, T0, T1};
use crate::cache::OperationCache;
use crate::error::{DdError, DdResult};
use crate::gc;
use crate::level::VarOrder;
use crate::node::Node;
use crate::store::NodeStore;
use crate::unique::{Flavor, UniqueTable};

/// Construction-time policy knobs. Mirrors bex's `BddBase::new()` /
/// `new_with_threads(n)` pair: one zero-config constructor, one that
/// takes an explicit policy.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// `2^bits` slots in the operation cache.
    pub cache_bits: u32,
    /// Run [`Engine::collect_garbage`] automatically once this many node
    /// allocations have happened since the last collection.
    pub auto_gc_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { cache_bits: 16, auto_gc_threshold: 1 << 15 }
    }
}

/// The shared BDD/ZDD engine. A single node store and unique table back
/// both diagram kinds; [`Flavor`] only changes which reduction rule
/// `find_or_create` applies, so structurally identical BDD and ZDD
/// subgraphs are shared rather than duplicated.
#[derive(Debug)]
pub struct Engine {
    store: NodeStore,
    table: UniqueTable,
    cache: OperationCache,
    vars: VarOrder,
    config: EngineConfig,
    allocs_since_gc: usize,
    /// user-friendly names for specific roots, as bex's `BddBase::tags`.
    pub tags: HashMap<String, Arc>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Engine {
            store: NodeStore::new(),
            table: UniqueTable::new(),
            cache: OperationCache::with_capacity_bits(config.cache_bits),
            vars: VarOrder::new(),
            config,
            allocs_since_gc: 0,
            tags: HashMap::new(),
        }
    }

    // -- variables --------------------------------------------------

    pub fn new_variable(&mut self) -> DdResult<u32> {
        self.vars.new_variable()
    }

    pub fn variable_count(&self) -> usize {
        self.vars.variable_count()
    }

    pub fn level_of(&self, var: u32) -> DdResult<u32> {
        self.vars.level_of(var)
    }

    pub fn var_at_level(&self, lvl: u32) -> DdResult<u32> {
        self.vars.var_at_level(lvl)
    }

    // -- terminals and single-variable diagrams ----------------------

    pub fn bdd_zero(&self) -> Arc {
        T0
    }

    pub fn bdd_one(&self) -> Arc {
        T1
    }

    /// The empty family (ZDD terminal false).
    pub fn zdd_empty(&self) -> Arc {
        T0
    }

    /// The family containing only the empty set (ZDD terminal true).
    pub fn zdd_base(&self) -> Arc {
        T1
    }

    /// The BDD for the literal `var` (positive, unnegated).
    pub fn var_bdd(&mut self, var: u32) -> DdResult<Arc> {
        self.vars.ensure_registered(var)?;
        self.make(Flavor::Bdd, var, T0, T1)
    }

    /// The ZDD for the singleton family `{ {var} }`.
    pub fn zdd_single(&mut self, var: u32) -> DdResult<Arc> {
        self.vars.ensure_registered(var)?;
        self.make(Flavor::Zdd, var, T0, T1)
    }

    // -- node construction / access -----------------------------------

    /// Build (or find) a node, applying reduction. Triggers an automatic
    /// GC sweep first if the allocation budget since the last collection
    /// has been exhausted — this crate's only automatic-GC trigger; the
    /// threshold policy itself is just a knob, see `DESIGN.md`.
    pub fn make(&mut self, flavor: Flavor, var: u32, low: Arc, high: Arc) -> DdResult<Arc> {
        trace!("make({flavor:?}, var={var}, low={low:?}, high={high:?})");
        let arc = self.table.find_or_create(&mut self.store, flavor, var, low, high)?;
        self.allocs_since_gc += 1;
        Ok(arc)
    }

    pub fn node(&self, arc: Arc) -> &Node {
        self.store.at(arc.without_complement().index())
    }

    pub fn cache_mut(&mut self) -> &mut OperationCache {
        &mut self.cache
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NodeStore {
        &mut self.store
    }

    pub fn table_mut(&mut self) -> &mut UniqueTable {
        &mut self.table
    }

    // -- reference counting (driven by handle.rs) ----------------------

    pub fn incref_root(&mut self, arc: Arc) {
        if !arc.is_terminal() {
            let node = self.store.at_mut(arc.without_complement().index());
            if node.is_saturated() {
                warn!("refcount saturated at {} for node #{}", crate::node::REFCOUNT_MAX, arc.index());
            }
            node.incref();
        }
    }

    /// Called from `BddRef`/`ZddRef`'s `Drop` impls, which have no way to
    /// propagate a `Result` to their caller. A real
    /// [`DdError::InvariantViolation`] here means a node's refcount
    /// underflowed — one more decref than matching increfs — which can only
    /// happen if the handle bookkeeping itself is broken. That is
    /// unconditionally fatal, so this logs and panics rather than limping
    /// on with a corrupted node store.
    pub fn decref_root(&mut self, arc: Arc) {
        if !arc.is_terminal() {
            match self.store.at_mut(arc.without_complement().index()).decref() {
                Ok(_) => self.maybe_auto_gc(&[]),
                Err(e) => {
                    error!("decref_root(#{}): {e}", arc.index());
                    panic!("decref_root(#{}): {e}", arc.index());
                }
            }
        }
    }

    /// Count of distinct nodes reachable from `root`, including terminals.
    pub fn size(&self, root: Arc) -> usize {
        let mut seen: std::collections::HashSet<u64> = std::collections::HashSet::new();
        let mut stack = vec![root];
        let mut count = 0usize;
        while let Some(a) = stack.pop() {
            let key = if a.is_terminal() { a.bits() } else { a.without_complement().index() as u64 };
            if !seen.insert(key) {
                continue;
            }
            count += 1;
            if !a.is_terminal() {
                let node = *self.node(a);
                stack.push(node.low);
                stack.push(node.high);
            }
        }
        count
    }

    /// The variable at `root`'s top level, or `None` if `root` is a terminal.
    pub fn top_var(&self, root: Arc) -> Option<u32> {
        if root.is_terminal() {
            None
        } else {
            Some(self.node(root).var)
        }
    }

    fn maybe_auto_gc(&mut self, extra_roots: &[Arc]) {
        if self.allocs_since_gc >= self.config.auto_gc_threshold {
            self.collect_garbage(extra_roots);
        }
    }

    // -- garbage collection --------------------------------------------

    /// Mark-and-sweep from every rooted node (`refcount > 0`) plus any
    /// caller-supplied `extra_roots` not yet reflected in a refcount.
    pub fn collect_garbage(&mut self, extra_roots: &[Arc]) {
        debug!(
            "collect_garbage: {} live nodes before sweep",
            self.store.live_count()
        );
        self.cache.flush();
        gc::sweep(&mut self.store, &mut self.table, extra_roots);
        self.allocs_since_gc = 0;
        debug!(
            "collect_garbage: {} live nodes after sweep",
            self.store.live_count()
        );
    }

    pub fn alive_count(&self) -> usize {
        self.store.live_count()
    }

    // -- tags ------------------------------------------------------------

    pub fn tag(&mut self, name: String, arc: Arc) {
        self.tags.insert(name, arc);
    }

    pub fn get_tag(&self, name: &str) -> Option<Arc> {
        self.tags.get(name).copied()
    }

    // -- import ------------------------------------------------------------

    /// Register an externally-imported node, bypassing `find_or_create`'s
    /// reduction (the importer is trusted to hand back already-reduced
    /// triples).
    pub fn register_imported(&mut self, var: u32, low: Arc, high: Arc) -> DdResult<Arc> {
        self.vars.ensure_registered(var)?;
        let ix = self.store.allocate(Node::new(var, low, high))?;
        Ok(Arc::node(ix, false))
    }

    pub fn fail_if_unknown(&self, var: u32) -> DdResult<()> {
        if self.vars.is_known(var) {
            Ok(())
        } else {
            Err(DdError::VariableUnknown(var))
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_bdd_and_zdd_single_are_distinct_flavours_but_share_storage() {
        let mut e = Engine::new();
        let v = e.new_variable().unwrap();
        let b = e.var_bdd(v).unwrap();
        let z = e.zdd_single(v).unwrap();
        // both reduce to the same (var, T0, T1) triple, so they share storage
        assert_eq!(b.without_complement().index(), z.without_complement().index());
    }

    #[test]
    fn tags_round_trip() {
        let mut e = Engine::new();
        e.tag("foo".into(), T1);
        assert_eq!(e.get_tag("foo"), Some(T1));
        assert_eq!(e.get_tag("bar"), None);
    }

    #[test]
    fn unknown_variable_is_reported() {
        let e = Engine::new();
        assert_eq!(e.fail_if_unknown(1), Err(DdError::VariableUnknown(1)));
    }

    #[test]
    fn size_counts_shared_nodes_once() {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let y = e.new_variable().unwrap();
        let vx = e.var_bdd(x).unwrap();
        let vy = e.var_bdd(y).unwrap();
        let f = crate::apply_bdd::and(&mut e, vx, vy).unwrap();
        // one node for each variable plus the two terminals
        assert_eq!(e.size(f), 4);
        assert_eq!(e.size(T0), 1);
        assert_eq!(e.size(T1), 1);
    }

    #[test]
    fn top_var_is_none_for_terminals() {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let vx = e.var_bdd(x).unwrap();
        assert_eq!(e.top_var(vx), Some(x));
        assert_eq!(e.top_var(T0), None);
        assert_eq!(e.top_var(T1), None);
    }

    #[test]
    fn decref_underflow_is_an_invariant_violation() {
        let mut e = Engine::new();
        let x = e.new_variable().unwrap();
        let vx = e.var_bdd(x).unwrap();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            e.decref_root(vx);
        }));
        assert!(result.is_err());
    }
}
