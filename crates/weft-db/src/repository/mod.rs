//! # Repository Module
//!
//! Database repository implementations for the allocation core.
//!
//! ## Repository Pattern
//! Each aggregate gets one repository over the shared pool. Call sites reach
//! them through `Database` accessors (`db.issues().create(..)`); SQL stays
//! isolated here, and every multi-row mutation owns exactly one transaction.
//!
//! ## Available Repositories
//!
//! - [`sequence::SequenceRepository`] - Fiscal-year document counters
//! - [`lot::LotRepository`] - Gate-inward lot finalization
//! - [`weightment::WeightmentRepository`] - Per-lot bale sets (the
//!   WeightmentStore)
//! - [`issue::IssueRepository`] - Allocation transactions
//! - [`waste_packing::WastePackingRepository`] /
//!   [`invoice::InvoiceRepository`] /
//!   [`sales_order::SalesOrderRepository`] - reconciled detail sets

pub mod invoice;
pub mod issue;
pub mod lot;
pub mod sales_order;
pub mod sequence;
pub mod waste_packing;
pub mod weightment;
