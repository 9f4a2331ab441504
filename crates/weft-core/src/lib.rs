//! # weft-core: Pure Business Logic for the Mill Allocation Core
//!
//! The numbering/allocation subsystem of the mill ERP, pure half. Everything
//! here is deterministic and I/O-free; the database half lives in `weft-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              Surrounding ERP (out of this repo)                 │
//! │   gate-inward capture ── QC entry ── waste sale ── masters      │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ typed requests (types.rs)
//! ┌─────────────────────────────▼───────────────────────────────────┐
//! │                 ★ weft-core (THIS CRATE) ★                      │
//! │                                                                 │
//! │   fiscal      weight/money    reconcile      validation         │
//! │   FY + doc    integer grams   header vs      pre-transaction    │
//! │   numbers     and paise       line sums      field rules        │
//! │                                                                 │
//! │   NO I/O • NO DATABASE • PURE FUNCTIONS                         │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────▼───────────────────────────────────┐
//! │                  weft-db (Database Layer)                       │
//! │        SQLite repositories, counters, transactions              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`fiscal`] - Fiscal years and `family/YY-YY/NNNN` document numbers
//! - [`weight`] - Integer-gram weight type (no floating point!)
//! - [`money`] - Integer-paise money type
//! - [`types`] - Domain rows and request payloads
//! - [`reconcile`] - Detail-set aggregates vs declared header totals
//! - [`validation`] - Pre-transaction input validation
//! - [`error`] - Typed domain errors
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: same input, same output - every rule testable
//!    without a database
//! 2. **Integer quantities**: grams and paise, never floats; the 0.01 kg
//!    reconciliation tolerance is exactly 10 g
//! 3. **Explicit errors**: typed enums, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fiscal;
pub mod money;
pub mod reconcile;
pub mod types;
pub mod validation;
pub mod weight;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, ValidationResult};
pub use fiscal::{DocumentFamily, FiscalYear};
pub use money::Money;
pub use types::*;
pub use weight::Weight;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum bales a single lot may hold.
///
/// Bale numbers are derived as `{lot_no}-NN` with a two-digit serial, so a
/// lot is bounded at 99 weighed units. Inward batches larger than this are
/// split into multiple lots at the gate.
pub const MAX_BALES_PER_LOT: usize = 99;
