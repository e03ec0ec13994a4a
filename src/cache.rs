//! The operation cache: a bounded, direct-mapped associative cache from
//! `(opcode, operand arcs)` to a result arc.
//!
//! Grounded on bex's `wip::WorkState` cache, but de-threaded (no
//! `DashMap`, no work-in-progress bookkeeping — this crate's apply runs
//! single-threaded) and bounded: a direct-mapped table rather than a
//! growing hash map, since this cache is semantically weak by design —
//! entries may be dropped at any time, and every consumer already
//! tolerates a miss. A collision simply overwrites the resident entry
//! instead of chaining or growing.

use crate::arc::Arc;
use crate::ops::Opcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    op: Opcode,
    a0: u64,
    a1: u64,
    a2: u64, // unused slot packs to 0 for binary ops
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    key: CacheKey,
    result: Arc,
    occupied: bool,
}

impl Default for Slot {
    fn default() -> Self {
        Slot {
            key: CacheKey { op: Opcode::Ite, a0: 0, a1: 0, a2: 0 },
            result: crate::arc::T0,
            occupied: false,
        }
    }
}

/// Default table size: `2^16` slots.
const DEFAULT_BITS: u32 = 16;

#[derive(Debug)]
pub struct OperationCache {
    slots: Vec<Slot>,
    mask: u64,
    pub hits: u64,
    pub misses: u64,
}

impl OperationCache {
    pub fn new() -> Self {
        Self::with_capacity_bits(DEFAULT_BITS)
    }

    pub fn with_capacity_bits(bits: u32) -> Self {
        let n = 1usize << bits;
        OperationCache { slots: vec![Slot::default(); n], mask: (n as u64) - 1, hits: 0, misses: 0 }
    }

    fn mix(op: Opcode, a0: u64, a1: u64, a2: u64) -> u64 {
        // 64-bit mixing function derived from the three arc words; shares
        // its shape with the unique table's own key hash.
        let mut h = (op as u64).wrapping_mul(0x9E3779B97F4A7C15);
        h ^= a0.wrapping_mul(0xBF58476D1CE4E5B9);
        h = h.rotate_left(31);
        h ^= a1.wrapping_mul(0x94D049BB133111EB);
        h = h.rotate_left(29);
        h ^= a2.wrapping_mul(0xD6E8FEB86659FD93);
        h ^ (h >> 32)
    }

    pub fn get2(&mut self, op: Opcode, a0: Arc, a1: Arc) -> Option<Arc> {
        self.get3(op, a0, a1, crate::arc::T0, false)
    }

    pub fn get3(&mut self, op: Opcode, a0: Arc, a1: Arc, a2: Arc, ternary: bool) -> Option<Arc> {
        let a2bits = if ternary { a2.bits() } else { 0 };
        let key = CacheKey { op, a0: a0.bits(), a1: a1.bits(), a2: a2bits };
        let ix = (Self::mix(op, key.a0, key.a1, key.a2) & self.mask) as usize;
        let slot = &self.slots[ix];
        if slot.occupied && slot.key == key {
            self.hits += 1;
            Some(slot.result)
        } else {
            self.misses += 1;
            None
        }
    }

    pub fn put2(&mut self, op: Opcode, a0: Arc, a1: Arc, result: Arc) {
        self.put3(op, a0, a1, crate::arc::T0, false, result)
    }

    pub fn put3(&mut self, op: Opcode, a0: Arc, a1: Arc, a2: Arc, ternary: bool, result: Arc) {
        let a2bits = if ternary { a2.bits() } else { 0 };
        let key = CacheKey { op, a0: a0.bits(), a1: a1.bits(), a2: a2bits };
        let ix = (Self::mix(op, key.a0, key.a1, key.a2) & self.mask) as usize;
        self.slots[ix] = Slot { key, result, occupied: true };
    }

    /// Drops every entry. Called immediately before garbage collection,
    /// since cached node indices may become invalid once the sweep runs.
    pub fn flush(&mut self) {
        for slot in &mut self.slots {
            slot.occupied = false;
        }
        self.hits = 0;
        self.misses = 0;
    }
}

impl Default for OperationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arc::{T0, T1};

    #[test]
    fn put_then_get_hits() {
        let mut cache = OperationCache::new();
        assert_eq!(cache.get2(Opcode::Ite, T0, T1), None);
        cache.put2(Opcode::Ite, T0, T1, T1);
        assert_eq!(cache.get2(Opcode::Ite, T0, T1), Some(T1));
    }

    #[test]
    fn flush_clears_everything() {
        let mut cache = OperationCache::new();
        cache.put2(Opcode::ZddUnion, T0, T1, T1);
        cache.flush();
        assert_eq!(cache.get2(Opcode::ZddUnion, T0, T1), None);
    }

    #[test]
    fn cache_is_semantically_weak_consumers_handle_miss() {
        // a fresh, tiny cache forces collisions; correctness must not depend
        // on every put() surviving until the matching get().
        let mut cache = OperationCache::with_capacity_bits(1);
        cache.put2(Opcode::Ite, T0, T1, T1);
        cache.put2(Opcode::ZddUnion, T1, T0, T0); // may evict the entry above
        // whichever of the two is still resident is a legitimate hit; the
        // other, if evicted, must report a clean miss rather than garbage.
        let a = cache.get2(Opcode::Ite, T0, T1);
        let b = cache.get2(Opcode::ZddUnion, T1, T0);
        assert!(a == Some(T1) || a.is_none());
        assert!(b == Some(T0) || b.is_none());
    }
}
