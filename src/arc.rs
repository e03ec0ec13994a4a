//! The 44-bit packed arc: one complement bit, one terminal bit, 42 bits of
//! node index. Packed into a `u64` the way [`crate::nid`]-style node ids are
//! packed in bex, except the bit layout here follows the
//! `sbdd2::Arc` wire format (bit 0 = negation, bit 1 = terminal, bits 2..43 =
//! index) rather than bex's own.

use std::fmt;

const INV_BIT: u64 = 1 << 0;
const TERM_BIT: u64 = 1 << 1;
const INDEX_SHIFT: u32 = 2;

/// Largest node index representable in the 42 index bits of an [`Arc`].
pub const MAX_INDEX: u64 = (1u64 << 42) - 1;

/// A typed edge: either a reference to a stored node, or one of the two
/// terminals, with an independent complement bit.
///
/// ZDD arcs must never carry the complement bit; `duodd` enforces this at
/// every boundary where an `Arc` crosses from BDD to ZDD code (see
/// [`crate::error::DdError::FlavourMismatch`]).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Arc(u64);

impl Arc {
    #[inline]
    const fn raw(data: u64) -> Arc {
        Arc(data)
    }

    /// Arc to a non-terminal node at `index`, optionally complemented.
    #[inline]
    pub fn node(index: u64, negated: bool) -> Arc {
        debug_assert!(index <= MAX_INDEX, "node index overflows 42-bit arc field");
        Arc((index << INDEX_SHIFT) | if negated { INV_BIT } else { 0 })
    }

    /// Arc to one of the two terminals.
    #[inline]
    pub const fn terminal(value: bool) -> Arc {
        Arc(((value as u64) << INDEX_SHIFT) | TERM_BIT)
    }

    #[inline]
    pub fn is_complemented(self) -> bool {
        self.0 & INV_BIT != 0
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self.0 & TERM_BIT != 0
    }

    /// Node index this arc refers to. Meaningless (but well-defined: 0 or 1)
    /// when [`Arc::is_terminal`].
    #[inline]
    pub fn index(self) -> u64 {
        self.0 >> INDEX_SHIFT
    }

    /// The boolean value of a terminal arc.
    ///
    /// # Panics
    /// Panics (debug) if called on a non-terminal arc.
    #[inline]
    pub fn terminal_value(self) -> bool {
        debug_assert!(self.is_terminal());
        self.index() != 0
    }

    /// Returns the arc with the complement bit toggled.
    ///
    /// Terminals are special-cased: `T0`/`T1` are the only two terminal
    /// bit-patterns the public contract exposes, so negating a
    /// terminal swaps between the literal `T0`/`T1` constants rather than
    /// setting the complement bit on a terminal arc — that keeps `!T1 == T0`
    /// true by `Arc` equality instead of merely "true after normalisation".
    #[inline]
    pub fn negated(self) -> Arc {
        if self.is_terminal() {
            Arc::terminal(!self.terminal_value())
        } else {
            Arc(self.0 ^ INV_BIT)
        }
    }

    /// Returns this arc with the complement bit cleared.
    #[inline]
    pub fn without_complement(self) -> Arc {
        Arc(self.0 & !INV_BIT)
    }

    /// The raw packed payload, e.g. for use as a stable cache/table key.
    #[inline]
    pub fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_bits(bits: u64) -> Arc {
        Arc(bits)
    }
}

/// Terminal arc for constant-false.
pub const T0: Arc = Arc::terminal(false);
/// Terminal arc for constant-true.
pub const T1: Arc = Arc::terminal(true);

impl fmt::Debug for Arc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            write!(f, "{}", if self.terminal_value() ^ self.is_complemented() { "T1" } else { "T0" })
        } else {
            if self.is_complemented() {
                write!(f, "~")?;
            }
            write!(f, "#{}", self.index())
        }
    }
}

impl fmt::Display for Arc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::ops::Not for Arc {
    type Output = Arc;
    #[inline]
    fn not(self) -> Arc {
        self.negated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminals_are_distinct_and_complementary() {
        assert_ne!(T0, T1);
        assert_eq!(!T0, T1);
        assert_eq!(!T1, T0);
        assert!(T0.is_terminal());
        assert!(T1.is_terminal());
        assert!(!T0.terminal_value());
        assert!(T1.terminal_value());
    }

    #[test]
    fn node_arcs_round_trip_index_and_sign() {
        let a = Arc::node(12345, false);
        assert!(!a.is_terminal());
        assert!(!a.is_complemented());
        assert_eq!(a.index(), 12345);
        let b = a.negated();
        assert!(b.is_complemented());
        assert_eq!(b.index(), 12345);
        assert_eq!(b.without_complement(), a);
    }

    #[test]
    fn max_index_fits_in_42_bits() {
        let a = Arc::node(MAX_INDEX, false);
        assert_eq!(a.index(), MAX_INDEX);
    }
}
