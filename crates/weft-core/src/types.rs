//! # Domain Types
//!
//! Rows and request payloads for the numbering/allocation core.
//!
//! ## Type Hierarchy
//! ```text
//! Lot ──owns──► Weightment (bale)     Issue ──owns──► IssueItem ──refs──► Weightment
//!
//! WastePacking ─► WastePackingDetail ┐
//! Invoice ──────► InvoiceDetail      ├── header-plus-lines "detail set" pattern,
//! SalesOrder ───► SalesOrderDetail   ┘   reconciled by weft_core::reconcile
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every row has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - a business number (lot number, bale number, issue number) minted from
//!   the fiscal-year counters or supplied by the caller
//!
//! Quantities are stored as raw integers (grams / paise) exactly as they are
//! persisted; typed accessors return [`Weight`](crate::weight::Weight) /
//! [`Money`](crate::money::Money). Request structs use the camelCase wire
//! names of the surrounding ERP.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::weight::Weight;

// =============================================================================
// Lot
// =============================================================================

/// A received consignment under one gate-inward entry.
///
/// Created when a gate-inward weighment batch is finalized; never mutated
/// once any of its bales has been issued; deletable only while none has.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Lot {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Lot number minted from the `UC` fiscal-year counter.
    pub lot_no: String,

    /// Owning gate-inward entry number.
    pub inward_no: String,

    /// Cotton/waste variety received under this lot.
    pub variety: Option<String>,

    /// Bale count declared on the inward paperwork; must equal the number of
    /// weighed rows when the lot is finalized.
    pub declared_bales: i64,

    /// Sum of bale gross weights, in grams.
    pub gross_grams: i64,

    /// Sum of bale tare weights, in grams.
    pub tare_grams: i64,

    /// Sum of bale nett weights, in grams.
    pub net_grams: i64,

    /// Contracted rate per kilogram, in paise.
    pub rate_paise: i64,

    pub created_at: DateTime<Utc>,
}

impl Lot {
    #[inline]
    pub fn gross(&self) -> Weight {
        Weight::from_grams(self.gross_grams)
    }

    #[inline]
    pub fn tare(&self) -> Weight {
        Weight::from_grams(self.tare_grams)
    }

    #[inline]
    pub fn nett(&self) -> Weight {
        Weight::from_grams(self.net_grams)
    }

    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_paise(self.rate_paise)
    }
}

// =============================================================================
// Weightment
// =============================================================================

/// One individually weighed bale belonging to exactly one lot - the unit of
/// allocation.
///
/// `issued` transitions `false -> true` exactly once, inside a successful
/// allocation transaction; the only path that writes `false` again is
/// the whole-set replace, which is legal only before any issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Weightment {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning lot number.
    pub lot_no: String,

    /// Bale identifier derived as `{lot_no}-NN` (`UC/24-25/0007-01`).
    pub bale_no: String,

    /// 1-based position within the lot (the `NN` of the bale number).
    pub serial: i64,

    pub gross_grams: i64,
    pub tare_grams: i64,

    /// Nett weight in grams, always `gross - tare`.
    pub net_grams: i64,

    /// Declared value of the bale, in paise.
    pub value_paise: i64,

    /// Whether the bale has been consumed by an issue.
    pub issued: bool,

    pub created_at: DateTime<Utc>,
}

impl Weightment {
    #[inline]
    pub fn gross(&self) -> Weight {
        Weight::from_grams(self.gross_grams)
    }

    #[inline]
    pub fn tare(&self) -> Weight {
        Weight::from_grams(self.tare_grams)
    }

    #[inline]
    pub fn nett(&self) -> Weight {
        Weight::from_grams(self.net_grams)
    }

    #[inline]
    pub fn value(&self) -> Money {
        Money::from_paise(self.value_paise)
    }
}

// =============================================================================
// Issue
// =============================================================================

/// An allocation event consuming one or more weightments toward a mixing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Issue {
    pub id: String,
    /// Issue number (`IS/24-25/0001`), minted in-transaction when the
    /// request does not carry one.
    pub issue_no: String,
    pub issue_date: NaiveDate,
    /// Source mixing group.
    pub mixing_group_id: String,
    /// Destination mixing group.
    pub to_mixing_group_id: String,
    /// Number of lines; always `items.len()` of the creating request.
    pub issue_qty: i64,
    pub created_at: DateTime<Utc>,
}

/// One line of an issue, referencing exactly one weightment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct IssueItem {
    pub id: String,
    pub issue_id: String,
    pub weightment_id: String,
    /// Weight actually issued for this line, in grams.
    pub issue_grams: i64,
    pub created_at: DateTime<Utc>,
}

impl IssueItem {
    #[inline]
    pub fn issue_weight(&self) -> Weight {
        Weight::from_grams(self.issue_grams)
    }
}

/// An issue header with its lines attached, ordered by insertion.
#[derive(Debug, Clone, Serialize)]
pub struct IssueWithItems {
    #[serde(flatten)]
    pub issue: Issue,
    pub items: Vec<IssueItem>,
}

// =============================================================================
// Detail Sets
// =============================================================================

/// Waste-packing header: waste packed into bales for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct WastePacking {
    pub id: String,
    pub packing_no: String,
    pub packing_date: NaiveDate,
    /// Waste category being packed (e.g. "comber noil", "flat strip").
    pub waste_type: String,
    /// Declared number of packed bales; must equal the detail-row count.
    pub no_of_bales: i64,
    /// Declared total weight in grams; must reconcile with the line sum.
    pub total_grams: i64,
    pub created_at: DateTime<Utc>,
}

impl WastePacking {
    #[inline]
    pub fn total(&self) -> Weight {
        Weight::from_grams(self.total_grams)
    }
}

/// One packed bale within a waste packing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct WastePackingDetail {
    pub id: String,
    pub packing_id: String,
    /// 1-based position; details are returned ordered by it.
    pub line_no: i64,
    pub weight_grams: i64,
}

impl WastePackingDetail {
    #[inline]
    pub fn weight(&self) -> Weight {
        Weight::from_grams(self.weight_grams)
    }
}

/// Waste-packing header with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct WastePackingWithDetails {
    #[serde(flatten)]
    pub packing: WastePacking,
    pub details: Vec<WastePackingDetail>,
}

/// Waste-sale invoice header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: String,
    pub invoice_no: String,
    pub invoice_date: NaiveDate,
    /// Buying party.
    pub party: String,
    /// Declared total nett weight in grams.
    pub total_net_grams: i64,
    /// Declared total amount in paise.
    pub total_amount_paise: i64,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn total_nett(&self) -> Weight {
        Weight::from_grams(self.total_net_grams)
    }

    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_paise(self.total_amount_paise)
    }
}

/// One invoice line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceDetail {
    pub id: String,
    pub invoice_id: String,
    pub line_no: i64,
    pub description: String,
    pub net_grams: i64,
    pub rate_paise: i64,
    pub amount_paise: i64,
}

impl InvoiceDetail {
    #[inline]
    pub fn nett(&self) -> Weight {
        Weight::from_grams(self.net_grams)
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }
}

/// Invoice header with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceWithDetails {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub details: Vec<InvoiceDetail>,
}

/// Sales-order header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesOrder {
    pub id: String,
    pub order_no: String,
    pub order_date: NaiveDate,
    pub party: String,
    /// Broker the order was placed through, if any.
    pub broker: Option<String>,
    /// Declared total nett weight in grams.
    pub total_net_grams: i64,
    pub created_at: DateTime<Utc>,
}

impl SalesOrder {
    #[inline]
    pub fn total_nett(&self) -> Weight {
        Weight::from_grams(self.total_net_grams)
    }
}

/// One sales-order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesOrderDetail {
    pub id: String,
    pub order_id: String,
    pub line_no: i64,
    pub variety: String,
    pub net_grams: i64,
    pub rate_paise: i64,
}

impl SalesOrderDetail {
    #[inline]
    pub fn nett(&self) -> Weight {
        Weight::from_grams(self.net_grams)
    }
}

/// Sales-order header with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct SalesOrderWithDetails {
    #[serde(flatten)]
    pub order: SalesOrder,
    pub details: Vec<SalesOrderDetail>,
}

// =============================================================================
// Request Payloads
// =============================================================================
// Explicit structs per operation; required/optional fields are enumerated
// here and validated (weft_core::validation) before any transaction opens.

/// One weighed row of a gate-inward batch (input to lot finalization and to
/// the whole-set replace).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightmentRow {
    pub gross_grams: i64,
    pub tare_grams: i64,
    pub value_paise: i64,
}

impl WeightmentRow {
    #[inline]
    pub fn gross(&self) -> Weight {
        Weight::from_grams(self.gross_grams)
    }

    #[inline]
    pub fn tare(&self) -> Weight {
        Weight::from_grams(self.tare_grams)
    }

    /// Nett weight the row will be persisted with.
    #[inline]
    pub fn nett(&self) -> Weight {
        self.gross().less_tare(self.tare())
    }
}

/// Finalization of a gate-inward weighment batch into a lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotCreateRequest {
    pub inward_no: String,
    pub lot_date: NaiveDate,
    pub variety: Option<String>,
    /// Declared bale count; must equal `rows.len()`.
    pub declared_bales: i64,
    pub rate_paise: i64,
    pub rows: Vec<WeightmentRow>,
}

/// One requested allocation line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueItemRequest {
    pub weightment_id: String,
    /// Weight to issue for this line, in grams.
    #[serde(rename = "issueWeight")]
    pub issue_weight_grams: i64,
}

impl IssueItemRequest {
    #[inline]
    pub fn issue_weight(&self) -> Weight {
        Weight::from_grams(self.issue_weight_grams)
    }
}

/// The issue-creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCreateRequest {
    /// Caller-supplied issue number; minted from the `IS` counter when
    /// absent.
    pub issue_number: Option<String>,
    pub issue_date: NaiveDate,
    pub mixing_group_id: String,
    pub to_mixing_group_id: String,
    pub items: Vec<IssueItemRequest>,
}

/// One line of a waste-packing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WastePackingLine {
    pub weight_grams: i64,
}

/// Waste-packing creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WastePackingCreateRequest {
    pub packing_no: String,
    pub packing_date: NaiveDate,
    pub waste_type: String,
    pub no_of_bales: i64,
    pub total_weight_grams: i64,
    pub details: Vec<WastePackingLine>,
}

/// Full replacement of a waste packing's detail set (header aggregates move
/// with the lines).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WastePackingDetailsUpdate {
    pub no_of_bales: i64,
    pub total_weight_grams: i64,
    pub details: Vec<WastePackingLine>,
}

/// One line of an invoice request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub description: String,
    pub net_grams: i64,
    pub rate_paise: i64,
    pub amount_paise: i64,
}

/// Invoice creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCreateRequest {
    pub invoice_no: String,
    pub invoice_date: NaiveDate,
    pub party: String,
    pub total_net_grams: i64,
    pub total_amount_paise: i64,
    pub details: Vec<InvoiceLine>,
}

/// Full replacement of an invoice's detail set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetailsUpdate {
    pub total_net_grams: i64,
    pub total_amount_paise: i64,
    pub details: Vec<InvoiceLine>,
}

/// One line of a sales-order request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderLine {
    pub variety: String,
    pub net_grams: i64,
    pub rate_paise: i64,
}

/// Sales-order creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderCreateRequest {
    pub order_no: String,
    pub order_date: NaiveDate,
    pub party: String,
    pub broker: Option<String>,
    pub total_net_grams: i64,
    pub details: Vec<SalesOrderLine>,
}

/// Full replacement of a sales order's detail set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderDetailsUpdate {
    pub total_net_grams: i64,
    pub details: Vec<SalesOrderLine>,
}

// =============================================================================
// Unit Tests
// =============================================================================
