//! A shared binary/zero-suppressed decision diagram engine.
//!
//! One node store and unique table back both diagram kinds: [`arc::Arc`]
//! is a packed, 44-bit-addressable edge (complemented for BDDs, never for
//! ZDDs); [`engine::Engine`] owns the store, the hash-consing unique
//! table, the operation cache and the variable ordering, and is the
//! entry point everything else in this crate builds on.

#![allow(clippy::many_single_char_names)]

#[macro_use]
extern crate log;

pub mod arc;
pub mod error;
pub mod level;
pub mod node;
pub mod store;
pub mod unique;

pub mod cache;
pub mod ops;

pub mod engine;
pub mod gc;
pub mod handle;

pub mod apply_bdd;
pub mod apply_zdd;

pub mod eval;
pub mod reg;
pub mod solve;

pub mod enumerate;
pub mod io;

pub use arc::{Arc, T0, T1};
pub use engine::{Engine, EngineConfig};
pub use error::{DdError, DdResult};
pub use handle::{BddRef, ZddRef};
pub use unique::Flavor;
