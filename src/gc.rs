//! Mark-and-sweep garbage collection.
//!
//! Roots are every node whose `refcount > 0` (tracked by
//! [`crate::handle::BddRef`]/[`crate::handle::ZddRef`] acquire/drop), plus
//! any arcs the caller passes in directly that haven't gone through a
//! handle yet. Grounded on the free-list idea already in `store.rs`
//! (itself a generalisation of bex's `vhl::VhlVec`): sweeping
//! just means handing dead slots back to that free list.

use std::collections::HashSet;

use log::trace;

use crate::arc::Arc;
use crate::store::NodeStore;
use crate::unique::UniqueTable;

fn mark(store: &NodeStore, seeds: impl Iterator<Item = u64>) -> HashSet<u64> {
    let mut seen = HashSet::new();
    let mut stack: Vec<u64> = seeds.collect();
    while let Some(ix) = stack.pop() {
        if !seen.insert(ix) {
            continue;
        }
        let node = store.at(ix);
        for child in [node.low, node.high] {
            if !child.is_terminal() {
                stack.push(child.without_complement().index());
            }
        }
    }
    seen
}

/// Sweep the store: anything not reachable from a rooted node or
/// `extra_roots` is reclaimed.
pub fn sweep(store: &mut NodeStore, table: &mut UniqueTable, extra_roots: &[Arc]) {
    let rooted = store
        .iter_live()
        .filter(|(_, n)| n.refcount > 0)
        .map(|(ix, _)| ix);
    let extra = extra_roots
        .iter()
        .filter(|a| !a.is_terminal())
        .map(|a| a.without_complement().index());
    let live = mark(store, rooted.chain(extra));

    let dead: Vec<u64> = store
        .iter_live()
        .map(|(ix, _)| ix)
        .filter(|ix| !live.contains(ix))
        .collect();
    trace!("sweep: reclaiming {} of {} live slots", dead.len(), store.live_count());
    for ix in dead {
        store.mark_empty(ix);
    }
    table.retain_live(store);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arc::{T0, T1};
    use crate::node::Node;
    use crate::unique::{Flavor, UniqueTable as UT};

    #[test]
    fn unrooted_nodes_are_reclaimed() {
        let mut store = NodeStore::new();
        let mut table = UT::new();
        let kept = table.find_or_create(&mut store, Flavor::Bdd, 1, T0, T1).unwrap();
        store.at_mut(kept.index()).incref();
        let _orphan = table.find_or_create(&mut store, Flavor::Bdd, 2, T1, T0).unwrap();
        assert_eq!(store.live_count(), 2);
        sweep(&mut store, &mut table, &[]);
        assert_eq!(store.live_count(), 1);
        assert!(store.is_live(kept.index()));
    }

    #[test]
    fn extra_roots_survive_without_a_refcount() {
        let mut store = NodeStore::new();
        let mut table = UT::new();
        let root = table.find_or_create(&mut store, Flavor::Bdd, 1, T0, T1).unwrap();
        sweep(&mut store, &mut table, &[root]);
        assert!(store.is_live(root.index()));
    }

    #[test]
    fn reachable_descendants_of_a_root_survive() {
        let mut store = NodeStore::new();
        let mut table = UT::new();
        let child = table.find_or_create(&mut store, Flavor::Bdd, 2, T0, T1).unwrap();
        let parent = table.find_or_create(&mut store, Flavor::Bdd, 1, T0, child).unwrap();
        store.at_mut(parent.index()).incref();
        sweep(&mut store, &mut table, &[]);
        assert!(store.is_live(child.index()));
    }
}
