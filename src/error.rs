//! Error kinds surfaced by the engine.
use std::fmt;

/// Failure modes of the decision-diagram engine.
///
/// `InvariantViolation` is the one kind that is not meant to be handled: it
/// indicates that the unique table, node store or reference counts have
/// become internally inconsistent (the canonical example: a reference
/// count underflowing while not yet saturated). It is constructed, not
/// merely asserted, in both debug and release builds, since a corrupted
/// engine is exactly the condition release builds can least afford to run
/// past silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdError {
    /// A hard cap (variable count, node index space, or cache capacity) was reached.
    CapacityExceeded(&'static str),
    /// An operation referenced a variable that was never allocated.
    VariableUnknown(u32),
    /// A ZDD operation received a complemented (BDD) arc, or vice versa.
    FlavourMismatch(&'static str),
    /// An externally-serialised diagram was malformed or truncated.
    SerializationError(String),
    /// A detectable internal inconsistency. Fatal and non-recoverable.
    InvariantViolation(&'static str),
}

impl fmt::Display for DdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdError::CapacityExceeded(what) => write!(f, "capacity exceeded: {what}"),
            DdError::VariableUnknown(v) => write!(f, "variable {v} is not known to this engine"),
            DdError::FlavourMismatch(what) => write!(f, "flavour mismatch: {what}"),
            DdError::SerializationError(msg) => write!(f, "serialization error: {msg}"),
            DdError::InvariantViolation(what) => write!(f, "invariant violation: {what}"),
        }
    }
}

impl std::error::Error for DdError {}

impl From<std::io::Error> for DdError {
    fn from(e: std::io::Error) -> Self {
        DdError::SerializationError(e.to_string())
    }
}

pub type DdResult<T> = Result<T, DdError>;
