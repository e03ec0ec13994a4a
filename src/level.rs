//! Variable numbers and the level ordering that drives Shannon-splitting.
//!
//! Variables are 1-based; 0 is reserved to mean "no variable" /
//! terminal. A [`VarOrder`] is the sole driver of split order: new variables
//! are appended at the top (highest level), and `level_of`/`var_at_level` are
//! the bijection between the two spaces.

use crate::error::{DdError, DdResult};

/// Maximum number of variables a single engine may allocate (`2^20 - 1`).
pub const MAX_VARS: u32 = (1 << 20) - 1;

/// Terminals live at level 0; the first allocated variable sits at level 1.
pub const TERMINAL_LEVEL: u32 = 0;

/// Tracks the bijection between 1-based variable numbers and their level
/// (position in the ordering). Dynamic reordering is out of scope:
/// variables are only ever appended.
#[derive(Debug, Default, Clone)]
pub struct VarOrder {
    /// `var_at_level[level - 1] == variable number at that level`.
    var_at_level: Vec<u32>,
}

impl VarOrder {
    pub fn new() -> Self {
        VarOrder::default()
    }

    pub fn variable_count(&self) -> usize {
        self.var_at_level.len()
    }

    /// Appends a new variable at the top level and returns its number.
    pub fn new_variable(&mut self) -> DdResult<u32> {
        if self.var_at_level.len() as u32 >= MAX_VARS {
            return Err(DdError::CapacityExceeded("variable count"));
        }
        let var = self.var_at_level.len() as u32 + 1;
        self.var_at_level.push(var);
        Ok(var)
    }

    /// Registers `var` if it is not already known, extending the ordering
    /// (appending any skipped intermediate variables too). Used by
    /// [`crate::io`] import, which may see variable numbers out of order.
    pub fn ensure_registered(&mut self, var: u32) -> DdResult<()> {
        while (self.var_at_level.len() as u32) < var {
            self.new_variable()?;
        }
        Ok(())
    }

    /// `lvl == 0` denotes the terminal level.
    pub fn level_of(&self, var: u32) -> DdResult<u32> {
        if var == 0 {
            return Ok(TERMINAL_LEVEL);
        }
        if var as usize > self.var_at_level.len() {
            return Err(DdError::VariableUnknown(var));
        }
        // levels are assigned in allocation order: level == var for this
        // append-only ordering, but the indirection is kept explicit so
        // a future reordering scheme only has to change this file.
        Ok(self
            .var_at_level
            .iter()
            .position(|&v| v == var)
            .map(|ix| ix as u32 + 1)
            .expect("variable registered but not present in level table"))
    }

    pub fn var_at_level(&self, lvl: u32) -> DdResult<u32> {
        if lvl == TERMINAL_LEVEL {
            return Ok(0);
        }
        self.var_at_level
            .get(lvl as usize - 1)
            .copied()
            .ok_or(DdError::VariableUnknown(0))
    }

    pub fn is_known(&self, var: u32) -> bool {
        var == 0 || var as usize <= self.var_at_level.len()
    }
}
