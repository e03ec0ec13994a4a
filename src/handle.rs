//! Reference-counted root handles for BDD and ZDD diagrams, and the
//! algebra surface built on top of them.
//!
//! Grounded on SAPPOROBDD2's `dd_node_ref` — a small wrapper around a raw
//! node reference that increments on construction/clone and decrements on
//! drop, triggering collection once the engine's GC threshold is crossed.
//! `Rc<RefCell<Engine>>` stands in for that single-threaded shared-engine
//! ownership: one engine, never mutated from more than one thread at a
//! time. The operator-trait surface (`BitAnd`/`BitOr`/`BitXor`/`Not` for
//! `BddRef`, `Add`/`Sub`/`Mul`/`BitAnd` for `ZddRef`) follows bex's
//! `BaseBit` impls for `BddBase`: by-value `self`/`other: Self`, the
//! actual op delegated to the engine, the result rewrapped in a fresh
//! handle. Unlike bex's own ops, every `apply_bdd`/`apply_zdd` primitive
//! here is fallible (`DdResult`), so the named methods (`and`, `or`, ...)
//! are the primary API and return `DdResult<Self>`; the operator traits
//! exist for ergonomics and carry the same `Output = DdResult<Self>`,
//! except `Not`, which is genuinely infallible (`Arc::negated` is an O(1)
//! complement-bit flip) and so returns a plain `Self`.

use std::cell::RefCell;
use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Mul, Not, Sub};
use std::rc::Rc;

use crate::apply_bdd;
use crate::apply_zdd;
use crate::arc::Arc;
use crate::engine::Engine;
use crate::error::{DdError, DdResult};
use crate::reg::PartialAssignment;
use crate::solve;

/// A rooted reference to a BDD. Holding one keeps every node it (and its
/// descendants) depend on alive across GC sweeps.
pub struct BddRef {
    engine: Rc<RefCell<Engine>>,
    arc: Arc,
}

impl BddRef {
    /// Wrap `arc` (already produced by BDD-flavoured engine operations),
    /// incrementing its root refcount.
    pub fn new(engine: Rc<RefCell<Engine>>, arc: Arc) -> Self {
        engine.borrow_mut().incref_root(arc);
        BddRef { engine, arc }
    }

    pub fn arc(&self) -> Arc {
        self.arc
    }

    pub fn engine(&self) -> &Rc<RefCell<Engine>> {
        &self.engine
    }

    /// Rewrap a different arc from the same engine, e.g. the result of an
    /// apply operation, preserving the shared `Rc`.
    pub fn with_arc(&self, arc: Arc) -> Self {
        BddRef::new(self.engine.clone(), arc)
    }

    fn same_engine(&self, other: &BddRef) {
        debug_assert!(
            Rc::ptr_eq(&self.engine, &other.engine),
            "BddRef operation mixed handles from two different engines"
        );
    }

    pub fn and(&self, other: &BddRef) -> DdResult<BddRef> {
        self.same_engine(other);
        let arc = apply_bdd::and(&mut self.engine.borrow_mut(), self.arc, other.arc)?;
        Ok(self.with_arc(arc))
    }

    pub fn or(&self, other: &BddRef) -> DdResult<BddRef> {
        self.same_engine(other);
        let arc = apply_bdd::or(&mut self.engine.borrow_mut(), self.arc, other.arc)?;
        Ok(self.with_arc(arc))
    }

    pub fn xor(&self, other: &BddRef) -> DdResult<BddRef> {
        self.same_engine(other);
        let arc = apply_bdd::xor(&mut self.engine.borrow_mut(), self.arc, other.arc)?;
        Ok(self.with_arc(arc))
    }

    pub fn gt(&self, other: &BddRef) -> DdResult<BddRef> {
        self.same_engine(other);
        let arc = apply_bdd::gt(&mut self.engine.borrow_mut(), self.arc, other.arc)?;
        Ok(self.with_arc(arc))
    }

    pub fn lt(&self, other: &BddRef) -> DdResult<BddRef> {
        self.same_engine(other);
        let arc = apply_bdd::lt(&mut self.engine.borrow_mut(), self.arc, other.arc)?;
        Ok(self.with_arc(arc))
    }

    /// Boolean negation. `O(1)`: a complement-bit flip on the arc, never
    /// touches the engine or the operation cache.
    pub fn not(&self) -> BddRef {
        self.with_arc(apply_bdd::not(self.arc))
    }

    /// `if self then then_ else else_`, the primitive every binary
    /// operator above reduces to.
    pub fn ite(&self, then_: &BddRef, else_: &BddRef) -> DdResult<BddRef> {
        self.same_engine(then_);
        self.same_engine(else_);
        let arc = apply_bdd::ite(&mut self.engine.borrow_mut(), self.arc, then_.arc, else_.arc)?;
        Ok(self.with_arc(arc))
    }

    pub fn cofactor(&self, var: u32, value: bool) -> DdResult<BddRef> {
        let arc = apply_bdd::cofactor(&mut self.engine.borrow_mut(), self.arc, var, value)?;
        Ok(self.with_arc(arc))
    }

    pub fn restrict(&self, assignment: &[(u32, bool)]) -> DdResult<BddRef> {
        let arc = apply_bdd::restrict(&mut self.engine.borrow_mut(), self.arc, assignment)?;
        Ok(self.with_arc(arc))
    }

    pub fn compose(&self, var: u32, g: &BddRef) -> DdResult<BddRef> {
        self.same_engine(g);
        let arc = apply_bdd::compose(&mut self.engine.borrow_mut(), self.arc, var, g.arc)?;
        Ok(self.with_arc(arc))
    }

    pub fn exist1(&self, var: u32) -> DdResult<BddRef> {
        let arc = apply_bdd::exist1(&mut self.engine.borrow_mut(), self.arc, var)?;
        Ok(self.with_arc(arc))
    }

    pub fn forall1(&self, var: u32) -> DdResult<BddRef> {
        let arc = apply_bdd::forall1(&mut self.engine.borrow_mut(), self.arc, var)?;
        Ok(self.with_arc(arc))
    }

    pub fn exist(&self, vars: &[u32]) -> DdResult<BddRef> {
        let arc = apply_bdd::exist(&mut self.engine.borrow_mut(), self.arc, vars)?;
        Ok(self.with_arc(arc))
    }

    pub fn forall(&self, vars: &[u32]) -> DdResult<BddRef> {
        let arc = apply_bdd::forall(&mut self.engine.borrow_mut(), self.arc, vars)?;
        Ok(self.with_arc(arc))
    }

    /// Number of satisfying assignments over `nvars` boolean variables.
    pub fn count_sat(&self, nvars: u32) -> DdResult<u128> {
        solve::count_sat_bdd(&self.engine.borrow(), self.arc, nvars)
    }

    /// One satisfying assignment, or `None` if unsatisfiable.
    pub fn one_sat(&self, nvars: u32) -> DdResult<Option<PartialAssignment>> {
        solve::one_sat(&self.engine.borrow(), self.arc, nvars)
    }

    /// Number of distinct nodes reachable from this root, including terminals.
    pub fn size(&self) -> usize {
        self.engine.borrow().size(self.arc)
    }

    /// The variable at this root's top level, or `None` for a terminal.
    pub fn top_var(&self) -> Option<u32> {
        self.engine.borrow().top_var(self.arc)
    }
}

impl Clone for BddRef {
    fn clone(&self) -> Self {
        BddRef::new(self.engine.clone(), self.arc)
    }
}

impl Drop for BddRef {
    fn drop(&mut self) {
        self.engine.borrow_mut().decref_root(self.arc);
    }
}

impl fmt::Debug for BddRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BddRef({:?})", self.arc)
    }
}

impl PartialEq for BddRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.engine, &other.engine) && self.arc == other.arc
    }
}

impl Eq for BddRef {}

impl BitAnd for BddRef {
    type Output = DdResult<BddRef>;
    fn bitand(self, rhs: Self) -> DdResult<BddRef> {
        self.and(&rhs)
    }
}

impl BitOr for BddRef {
    type Output = DdResult<BddRef>;
    fn bitor(self, rhs: Self) -> DdResult<BddRef> {
        self.or(&rhs)
    }
}

impl BitXor for BddRef {
    type Output = DdResult<BddRef>;
    fn bitxor(self, rhs: Self) -> DdResult<BddRef> {
        self.xor(&rhs)
    }
}

impl Not for BddRef {
    type Output = BddRef;
    fn not(self) -> BddRef {
        BddRef::not(&self)
    }
}

impl Not for &BddRef {
    type Output = BddRef;
    fn not(self) -> BddRef {
        BddRef::not(self)
    }
}

/// A rooted reference to a ZDD. Structurally identical to [`BddRef`]; kept
/// as a distinct type so the two diagram kinds can't be mixed up at a call
/// site even though they share one engine underneath: the public contract
/// exposes only `T0` and `T1`, with flavour tracked by the handle type
/// rather than a runtime tag on every arc.
pub struct ZddRef {
    engine: Rc<RefCell<Engine>>,
    arc: Arc,
}

impl ZddRef {
    /// Wrap `arc`, which must not carry the complement bit — ZDD arcs
    /// never do by construction, so a complemented arc reaching here means
    /// a BDD arc crossed over into ZDD code.
    pub fn new(engine: Rc<RefCell<Engine>>, arc: Arc) -> DdResult<Self> {
        if arc.is_complemented() {
            return Err(DdError::FlavourMismatch("ZDD handle constructed from a complemented (BDD) arc"));
        }
        Ok(Self::new_unchecked(engine, arc))
    }

    /// Skips the complement check `new` performs. Only safe when `arc` is
    /// already known-valid, which is the case for `Clone` (it can't return
    /// `Result` and every `ZddRef` that exists already passed the check
    /// once at construction).
    fn new_unchecked(engine: Rc<RefCell<Engine>>, arc: Arc) -> Self {
        engine.borrow_mut().incref_root(arc);
        ZddRef { engine, arc }
    }

    pub fn arc(&self) -> Arc {
        self.arc
    }

    pub fn engine(&self) -> &Rc<RefCell<Engine>> {
        &self.engine
    }

    pub fn with_arc(&self, arc: Arc) -> DdResult<Self> {
        ZddRef::new(self.engine.clone(), arc)
    }

    fn same_engine(&self, other: &ZddRef) {
        debug_assert!(
            Rc::ptr_eq(&self.engine, &other.engine),
            "ZddRef operation mixed handles from two different engines"
        );
    }

    pub fn union(&self, other: &ZddRef) -> DdResult<ZddRef> {
        self.same_engine(other);
        let arc = apply_zdd::union(&mut self.engine.borrow_mut(), self.arc, other.arc)?;
        self.with_arc(arc)
    }

    pub fn intersect(&self, other: &ZddRef) -> DdResult<ZddRef> {
        self.same_engine(other);
        let arc = apply_zdd::intersect(&mut self.engine.borrow_mut(), self.arc, other.arc)?;
        self.with_arc(arc)
    }

    pub fn difference(&self, other: &ZddRef) -> DdResult<ZddRef> {
        self.same_engine(other);
        let arc = apply_zdd::difference(&mut self.engine.borrow_mut(), self.arc, other.arc)?;
        self.with_arc(arc)
    }

    pub fn join(&self, other: &ZddRef) -> DdResult<ZddRef> {
        self.same_engine(other);
        let arc = apply_zdd::join(&mut self.engine.borrow_mut(), self.arc, other.arc)?;
        self.with_arc(arc)
    }

    pub fn meet(&self, other: &ZddRef) -> DdResult<ZddRef> {
        self.same_engine(other);
        let arc = apply_zdd::meet(&mut self.engine.borrow_mut(), self.arc, other.arc)?;
        self.with_arc(arc)
    }

    pub fn change(&self, var: u32) -> DdResult<ZddRef> {
        let arc = apply_zdd::change(&mut self.engine.borrow_mut(), self.arc, var)?;
        self.with_arc(arc)
    }

    /// The subfamily of sets containing `var`, with `var` removed from each.
    pub fn onset(&self, var: u32) -> DdResult<ZddRef> {
        let arc = apply_zdd::onset(&mut self.engine.borrow_mut(), self.arc, var)?;
        self.with_arc(arc)
    }

    /// The subfamily of sets that don't contain `var`.
    pub fn offset(&self, var: u32) -> DdResult<ZddRef> {
        let arc = apply_zdd::offset(&mut self.engine.borrow_mut(), self.arc, var)?;
        self.with_arc(arc)
    }

    /// Number of member sets in this family.
    pub fn count(&self) -> DdResult<u128> {
        solve::count_zdd(&self.engine.borrow(), self.arc)
    }

    /// Number of distinct nodes reachable from this root, including terminals.
    pub fn size(&self) -> usize {
        self.engine.borrow().size(self.arc)
    }

    /// The variable at this root's top level, or `None` for a terminal.
    pub fn top_var(&self) -> Option<u32> {
        self.engine.borrow().top_var(self.arc)
    }
}

impl Clone for ZddRef {
    fn clone(&self) -> Self {
        ZddRef::new_unchecked(self.engine.clone(), self.arc)
    }
}

impl Drop for ZddRef {
    fn drop(&mut self) {
        self.engine.borrow_mut().decref_root(self.arc);
    }
}

impl fmt::Debug for ZddRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZddRef({:?})", self.arc)
    }
}

impl PartialEq for ZddRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.engine, &other.engine) && self.arc == other.arc
    }
}

impl Eq for ZddRef {}

/// `+` is family union, matching the Minato-style ZDD-algebra convention
/// `apply_zdd`'s own doc comments already use for `join`/`meet`.
impl Add for ZddRef {
    type Output = DdResult<ZddRef>;
    fn add(self, rhs: Self) -> DdResult<ZddRef> {
        self.union(&rhs)
    }
}

/// `-` is family difference.
impl Sub for ZddRef {
    type Output = DdResult<ZddRef>;
    fn sub(self, rhs: Self) -> DdResult<ZddRef> {
        self.difference(&rhs)
    }
}

/// `*` is the cartesian union-product (`join`).
impl Mul for ZddRef {
    type Output = DdResult<ZddRef>;
    fn mul(self, rhs: Self) -> DdResult<ZddRef> {
        self.join(&rhs)
    }
}

/// `&` is family intersection.
impl BitAnd for ZddRef {
    type Output = DdResult<ZddRef>;
    fn bitand(self, rhs: Self) -> DdResult<ZddRef> {
        self.intersect(&rhs)
    }
}
