//! Operation codes used as cache keys. BDD `NOT` is not listed: it's O(1)
//! (a complement-bit flip on the incoming arc) and never touches the cache.
//!
//! `And`/`Or`/`Xor` have no variant of their own: `apply_bdd::and/or/xor`
//! are expressed purely in terms of `ite`, so they already share `Ite`'s
//! cache entries. `Restrict` likewise has none: it iterates `Cofactor`,
//! which is what actually gets memoised. `Count`/`OneSat` have no variant
//! either — `solve::count_sat_bdd`/`count_zdd` keep their own local
//! per-call memo table (a top-level walk doesn't benefit from living past
//! the call that built it), and `one_sat` is a single O(height)
//! root-to-leaf walk that never revisits a node, so it has nothing to
//! memoise. `RelProd` has no variant: it's `and` + `exist` + `compose`,
//! each already cached at its own granularity; a single combined entry
//! would need the whole `current_vars`/`next_vars` list folded into the
//! key, which doesn't fit the cache's fixed three-arc-slot shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Ite,
    ZddUnion,
    ZddIntersect,
    ZddDifference,
    ZddJoin,
    ZddMeet,
    ZddChange,
    ZddOnset,
    ZddOffset,
    Cofactor,
    Compose,
    Exist,
    Forall,
}
