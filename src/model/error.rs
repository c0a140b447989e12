//! Habit chain validation errors
//!
//! Chains authored by hand (or loaded from an external store) must respect the
//! same invariants as recommended ones before they are handed back out.

use thiserror::Error;

/// Errors raised when a chain violates its structural invariants
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// A chain must contain at least one habit
    #[error("Chain has no habits")]
    Empty,

    /// The same habit appears twice in one chain
    #[error("Duplicate habit in chain: {0}")]
    DuplicateHabit(String),

    /// Orders must be a contiguous permutation of 1..=n
    #[error("Non-contiguous chain order: expected {expected}, found {found}")]
    NonContiguousOrder { expected: u32, found: u32 },

    /// Chain references a habit that is not part of the supplied roster
    #[error("Unknown habit in chain: {0}")]
    UnknownHabit(String),
}

/// Result type alias for chain validation
pub type ChainResult<T> = Result<T, ChainError>;
