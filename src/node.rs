//! The node record.
//!
//! A node needs two child arcs, a variable, a reduced flag, and a saturating
//! 16-bit reference count. This crate keeps those as plain struct fields
//! rather than hand-rolled bit-packing, the same way bex reserves manual
//! bit-packing (`nid::NID`) for the arc type only and uses plain fields for
//! compound records like `vhl::Vhl`.

use crate::arc::Arc;
use crate::error::{DdError, DdResult};

/// Saturating reference-count ceiling (`2^16 - 1`).
pub const REFCOUNT_MAX: u16 = u16::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node {
    pub low: Arc,
    pub high: Arc,
    pub var: u32,
    pub reduced: bool,
    pub refcount: u16,
}

impl Node {
    pub fn new(var: u32, low: Arc, high: Arc) -> Node {
        Node { low, high, var, reduced: false, refcount: 0 }
    }

    /// Saturating increment: once [`REFCOUNT_MAX`] is hit, further
    /// increments are no-ops and the node is never collected again.
    #[inline]
    pub fn incref(&mut self) {
        if self.refcount < REFCOUNT_MAX {
            self.refcount += 1;
        }
    }

    /// Saturating decrement: a no-op once the count has saturated.
    /// Decrementing a count that is already zero and not saturated is a
    /// caller bug — one more `decref` than there were matching `incref`s —
    /// and is reported as [`DdError::InvariantViolation`] rather than left
    /// to silently underflow.
    #[inline]
    pub fn decref(&mut self) -> DdResult<bool> {
        if self.refcount == REFCOUNT_MAX {
            return Ok(false);
        }
        if self.refcount == 0 {
            return Err(DdError::InvariantViolation("reference count underflow with non-saturated count"));
        }
        self.refcount -= 1;
        Ok(self.refcount == 0)
    }

    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.refcount == REFCOUNT_MAX
    }
}
