//! # Error Types
//!
//! Domain-specific error types for weft-core.
//!
//! ## Error Hierarchy
//! ```text
//! weft-core errors (this file)
//! ├── CoreError        - Reconciliation failures, wrapped validation
//! └── ValidationError  - Input validation failures (pre-transaction)
//!
//! weft-db errors (separate crate)
//! └── DbError          - NotFound/Conflict/transaction failures
//! ```
//!
//! ## Design Principles
//! 1. `thiserror` derive macros, never manual impls
//! 2. Context in every message (bale number, declared vs computed values)
//! 3. Errors are enum variants, never strings

use thiserror::Error;

use crate::money::Money;
use crate::weight::Weight;

// =============================================================================
// Core Error
// =============================================================================

/// Business-rule violations detected by the pure core: a detail set that does
/// not reconcile against its header, or invalid input.
///
/// Repositories surface these from inside the owning transaction and roll the
/// transaction back; partial writes are never committed.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Detail-line weights do not sum to the header-declared aggregate
    /// within tolerance.
    #[error("detail weight mismatch: computed={computed}, expected={declared}")]
    WeightMismatch { declared: Weight, computed: Weight },

    /// Detail-line amounts do not sum to the header-declared total within
    /// tolerance.
    #[error("detail amount mismatch: computed={computed}, expected={declared}")]
    AmountMismatch { declared: Money, computed: Money },

    /// Detail-row count diverges from a header-declared count
    /// (e.g. waste-packing lines vs declared number of bales).
    #[error("{what}: declared {declared}, got {actual}")]
    CountMismatch {
        what: String,
        declared: i64,
        actual: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any transaction is opened.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. a document number with forbidden characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A weighed row whose tare is not below its gross; the nett weight
    /// would be zero or negative.
    #[error("row {line}: tare {tare} must be below gross {gross}")]
    TareExceedsGross {
        line: usize,
        gross: Weight,
        tare: Weight,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience type alias for Results with ValidationError.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
