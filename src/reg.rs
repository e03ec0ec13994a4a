//! Registers: arbitrarily large bit vectors, used for variable valuations,
//! one-sat witnesses, and weight-order enumeration.
//!
//! Kept from bex's `reg.rs` almost verbatim; the only change is that
//! bit positions are addressed by plain 1-based variable numbers (`u32`, this
//! crate's variable type per `level.rs`) instead of bex's `VID`.

use std::fmt;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reg {
    nbits: usize,
    data: Vec<usize>,
}

const USIZE: usize = usize::BITS as usize;

impl Reg {
    /// create a new register with the given number of bits
    pub fn new(nbits: usize) -> Self {
        Reg { nbits, data: vec![0; (nbits as f64 / USIZE as f64).ceil() as usize] }
    }

    /// constructor that takes the indices of the high bits
    pub fn from_bits(nbits: usize, hi_bits: &[usize]) -> Self {
        let mut res = Reg::new(nbits);
        for &bit in hi_bits {
            res.put(bit, true)
        }
        res
    }

    /// indices of the bits that are set, in ascending order
    pub fn hi_bits(&self) -> Vec<usize> {
        let mut res = vec![];
        for (j, &raw) in self.data.iter().enumerate() {
            let mut bits = raw;
            let offset = j * USIZE;
            for i in 0..USIZE {
                if (bits & 1) == 1 {
                    res.push(offset + i)
                }
                bits >>= 1
            }
        }
        res
    }

    /// fetch value of a bit by index
    pub fn get(&self, ix: usize) -> bool {
        0 < (self.data[ix / USIZE] & (1 << (ix % USIZE)))
    }

    /// assign value of a bit by index
    pub fn put(&mut self, ix: usize, v: bool) {
        let i = ix / USIZE;
        let x = self.data[i];
        self.data[i] = if v { x | (1 << (ix % USIZE)) } else { x & !(1 << (ix % USIZE)) }
    }

    /// fetch the value assigned to 1-based variable `var` (level.rs's numbering)
    pub fn var_get(&self, var: u32) -> bool {
        self.get(var as usize - 1)
    }

    /// assign the value for 1-based variable `var`
    pub fn var_put(&mut self, var: u32, val: bool) {
        self.put(var as usize - 1, val)
    }

    /// number of bits in the register
    pub fn len(&self) -> usize {
        self.nbits
    }

    pub fn is_empty(&self) -> bool {
        self.nbits == 0
    }

    /// build a usize from the least significant bits of the register.
    pub fn as_usize(&self) -> usize {
        self.data[0]
    }

    /// build a usize from the least significant bits of the register, in reverse order.
    pub fn as_usize_rev(&self) -> usize {
        assert!(self.nbits <= 64, "usize_rev only works for <= 64 bits!");
        let mut tmp = self.as_usize();
        let mut res = 0;
        for _ in 0..self.nbits {
            res <<= 1;
            res += tmp & 1;
            tmp >>= 1;
        }
        res
    }

    /// permute the bits according to the given permutation vector.
    /// b=pv[i] means to grab bit b from x and move to position i in the result.
    pub fn permute_bits(&self, pv: &[usize]) -> Self {
        let mut res = self.clone();
        for (i, b) in pv.iter().enumerate() {
            res.put(i, self.get(*b));
        }
        res
    }

    /// ripple add with carry within the region specified by start and end
    /// (inclusive), returning Some position where a 0 became a 1, or None on overflow.
    pub fn ripple(&mut self, start: usize, end: usize) -> Option<usize> {
        let mut j = start as i64;
        let end = end as i64;
        if j == end {
            return None;
        }
        let dj: i64 = if j > end { -1 } else { 1 };
        loop {
            let u = j as usize;
            let old = self.get(u);
            self.put(u, !old);
            if !old {
                break;
            } else if j == end {
                return None;
            } else {
                j += dj
            }
        }
        Some(j as usize)
    }

    /// increment the register as if adding 1.
    /// return position where the ripple-carry stopped.
    pub fn increment(&mut self) -> Option<usize> {
        self.ripple(0, self.nbits - 1)
    }
}

/// display the bits of the register and the usize
/// e.g. reg[11o=06]
impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "reg[")?;
        let mut write_bit = |i| write!(f, "{}", if self.get(i) { '1' } else { 'o' });
        for i in (0..self.nbits).rev() {
            write_bit(i)?
        }
        write!(f, "={:02x}]", self.as_usize())
    }
}

impl fmt::Debug for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// A single variable's value in a partial assignment: forced to `0`,
/// forced to `1`, or free to take either value without affecting whether
/// the assignment satisfies the function it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trit {
    Zero,
    One,
    DontCare,
}

/// The result of a satisfying-assignment search that tracks, per
/// variable, whether the search ever had to commit to a value for it.
/// Unlike [`Reg`] (strictly 2-valued), a `PartialAssignment` can report a
/// variable as [`Trit::DontCare`] when the function being solved doesn't
/// depend on it along the path the search took — `one_sat`'s witness is
/// exactly this shape, since short-circuiting at a terminal leaves every
/// variable below it unexamined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialAssignment {
    nbits: usize,
    trits: Vec<Trit>,
}

impl PartialAssignment {
    pub fn new(nbits: usize) -> Self {
        PartialAssignment { nbits, trits: vec![Trit::DontCare; nbits] }
    }

    pub fn len(&self) -> usize {
        self.nbits
    }

    pub fn is_empty(&self) -> bool {
        self.nbits == 0
    }

    /// fetch the trit assigned to 1-based variable `var`
    pub fn var_get(&self, var: u32) -> Trit {
        self.trits[var as usize - 1]
    }

    /// assign the trit for 1-based variable `var`
    pub fn var_put(&mut self, var: u32, t: Trit) {
        self.trits[var as usize - 1] = t;
    }

    /// Lowers this assignment to a [`Reg`], mapping every
    /// [`Trit::DontCare`] to `false`.
    pub fn to_reg(&self) -> Reg {
        let mut reg = Reg::new(self.nbits);
        for (i, t) in self.trits.iter().enumerate() {
            reg.put(i, matches!(t, Trit::One));
        }
        reg
    }
}

impl fmt::Display for PartialAssignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "asn[")?;
        for t in self.trits.iter().rev() {
            let c = match t {
                Trit::Zero => '0',
                Trit::One => '1',
                Trit::DontCare => '-',
            };
            write!(f, "{c}")?;
        }
        write!(f, "]")
    }
}
