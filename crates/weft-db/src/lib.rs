//! # weft-db: Database Layer for the Mill Allocation Core
//!
//! SQLite data access for the numbering/allocation subsystem.
//!
//! ## Data Flow
//! ```text
//! caller (gate desk / issue desk / billing)
//!      │
//!      ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     weft-db (THIS CRATE)                        │
//! │                                                                 │
//! │   Database        Repositories            Migrations            │
//! │   (pool.rs)       (repository/*)          (embedded)            │
//! │                                                                 │
//! │   SqlitePool      sequences  lots         001_initial_...       │
//! │   WAL + FK on     weightments issues                            │
//! │                   detail sets                                   │
//! └─────────────────────────────────────────────────────────────────┘
//!      │
//!      ▼
//! SQLite database file (one per mill)
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use weft_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("mill.db")).await?;
//!
//! let lot = db.lots().create(batch).await?;
//! let issue = db.issues().create(issue_request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::invoice::InvoiceRepository;
pub use repository::issue::IssueRepository;
pub use repository::lot::LotRepository;
pub use repository::sales_order::SalesOrderRepository;
pub use repository::sequence::SequenceRepository;
pub use repository::waste_packing::WastePackingRepository;
pub use repository::weightment::WeightmentRepository;
