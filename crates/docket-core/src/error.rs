//! # Error Types: Structured Error Hierarchy
//!
//! Foundational error types shared across the Docket Stack. Every crate
//! layers its own `thiserror` enum on top of these.
//!
//! ## Design
//!
//! - Validation errors carry the offending value and the identifier kind.
//! - State machine errors (in `docket-state`) carry the current state,
//!   the attempted target, and the rejection reason.

use thiserror::Error;

/// Top-level error type for the Docket Stack.
#[derive(Error, Debug)]
pub enum DocketError {
    /// A domain primitive failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A lifecycle transition was rejected.
    #[error("invalid state transition: {0}")]
    InvalidTransition(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation failures for domain primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A slug identifier was empty after trimming.
    #[error("{kind} must not be empty")]
    EmptyIdentifier {
        /// The identifier kind (e.g. "document type").
        kind: &'static str,
    },

    /// A slug identifier contained characters outside `[a-z0-9-]`.
    #[error("invalid {kind} \"{value}\" (expected lowercase letters, digits and '-')")]
    InvalidSlug {
        /// The identifier kind.
        kind: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A slug identifier exceeded the maximum length.
    #[error("{kind} exceeds {max} characters")]
    TooLong {
        /// The identifier kind.
        kind: &'static str,
        /// Maximum permitted length.
        max: usize,
    },

    /// A timestamp string was not valid RFC 3339 UTC.
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
}
