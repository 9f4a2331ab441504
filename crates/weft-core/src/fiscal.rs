//! # Fiscal Year & Document Numbers
//!
//! The pure half of document numbering: fiscal-year derivation and the
//! `family/YY-YY/NNNN` number format.
//!
//! ## Number Anatomy
//! ```text
//! UC / 24-25 / 0007
//! │    │       └── 4-digit zero-padded sequence, scoped to (family, FY)
//! │    └────────── fiscal year label: Apr 2024 - Mar 2025
//! └─────────────── document family prefix (lot)
//! ```
//!
//! The fiscal year runs April 1 - March 31: a calendar date in January-March
//! belongs to the fiscal year that started the previous April. Sequence
//! allocation itself is persistent state and lives in weft-db.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the zero-padded sequence segment.
pub const SEQUENCE_WIDTH: usize = 4;

// =============================================================================
// Fiscal Year
// =============================================================================

/// An April-to-March accounting year, identified by its starting calendar
/// year (`FiscalYear(2024)` is Apr 2024 - Mar 2025, labelled `"24-25"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FiscalYear(i32);

impl FiscalYear {
    /// The fiscal year a calendar date falls in.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use weft_core::fiscal::FiscalYear;
    ///
    /// let d = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
    /// assert_eq!(FiscalYear::from_date(d).label(), "24-25");
    /// ```
    pub fn from_date(date: NaiveDate) -> Self {
        let year = if date.month() < 4 {
            date.year() - 1
        } else {
            date.year()
        };
        FiscalYear(year)
    }

    /// Creates a fiscal year from its starting calendar year.
    #[inline]
    pub const fn starting(year: i32) -> Self {
        FiscalYear(year)
    }

    /// The calendar year the fiscal year starts in.
    #[inline]
    pub const fn start_year(&self) -> i32 {
        self.0
    }

    /// Two-digit label, e.g. `"24-25"`.
    pub fn label(&self) -> String {
        format!("{:02}-{:02}", self.0.rem_euclid(100), (self.0 + 1).rem_euclid(100))
    }

    /// Parses a two-digit label back into a fiscal year.
    ///
    /// Two-digit years are anchored to the 2000s; the second half must be
    /// the first plus one (modulo 100) or the label is rejected.
    pub fn parse_label(label: &str) -> Option<Self> {
        let (first, second) = label.split_once('-')?;
        if first.len() != 2 || second.len() != 2 {
            return None;
        }
        let first: i32 = first.parse().ok()?;
        let second: i32 = second.parse().ok()?;
        if (first + 1).rem_euclid(100) != second {
            return None;
        }
        Some(FiscalYear(2000 + first))
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// Document Family
// =============================================================================

/// The document families that draw fiscal-year-scoped numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFamily {
    /// Purchase order (`PO/24-25/0001`).
    PurchaseOrder,
    /// Gate-inward entry (`GI/24-25/0001`).
    GateInward,
    /// Lot created from a finalized gate-inward weighment batch
    /// (`UC/24-25/0001`).
    Lot,
    /// Issue (allocation event) consuming bales (`IS/24-25/0001`).
    Issue,
}

impl DocumentFamily {
    /// The number prefix for this family.
    pub const fn prefix(&self) -> &'static str {
        match self {
            DocumentFamily::PurchaseOrder => "PO",
            DocumentFamily::GateInward => "GI",
            DocumentFamily::Lot => "UC",
            DocumentFamily::Issue => "IS",
        }
    }

    /// Resolves a prefix back to its family.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "PO" => Some(DocumentFamily::PurchaseOrder),
            "GI" => Some(DocumentFamily::GateInward),
            "UC" => Some(DocumentFamily::Lot),
            "IS" => Some(DocumentFamily::Issue),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

// =============================================================================
// Formatting & Parsing
// =============================================================================

/// The `"UC/24-25"` portion of a document number.
pub fn number_prefix(family: DocumentFamily, fy: FiscalYear) -> String {
    format!("{}/{}", family.prefix(), fy.label())
}

/// Formats a full document number, e.g. `format_number(Lot, fy, 7)` ->
/// `"UC/24-25/0007"`.
pub fn format_number(family: DocumentFamily, fy: FiscalYear, seq: u32) -> String {
    format!("{}/{:04}", number_prefix(family, fy), seq)
}

/// Parses the trailing numeric segment of a document number (the text after
/// the last `/`). Returns `None` for a malformed number; callers treat that
/// as "no usable sequence" rather than an error.
pub fn parse_sequence(number: &str) -> Option<u32> {
    let tail = number.rsplit('/').next()?;
    if tail.is_empty() {
        return None;
    }
    tail.parse().ok()
}

/// Parses a full document number into its parts. Requires exactly
/// `family/label/sequence` with a known family and a well-formed label.
pub fn parse_number(number: &str) -> Option<(DocumentFamily, FiscalYear, u32)> {
    let mut parts = number.split('/');
    let family = DocumentFamily::from_prefix(parts.next()?)?;
    let fy = FiscalYear::parse_label(parts.next()?)?;
    let seq: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((family, fy, seq))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fiscal_boundary() {
        // March 31 belongs to the fiscal year that started the previous April
        assert_eq!(FiscalYear::from_date(date(2025, 3, 31)).label(), "24-25");
        // April 1 starts a new fiscal year
        assert_eq!(FiscalYear::from_date(date(2025, 4, 1)).label(), "25-26");
        assert_eq!(FiscalYear::from_date(date(2024, 12, 15)).label(), "24-25");
        assert_eq!(FiscalYear::from_date(date(2025, 1, 1)).label(), "24-25");
    }

    #[test]
    fn test_label_century_wrap() {
        assert_eq!(FiscalYear::starting(2099).label(), "99-00");
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(FiscalYear::parse_label("24-25"), Some(FiscalYear::starting(2024)));
        assert_eq!(FiscalYear::parse_label("24-26"), None);
        assert_eq!(FiscalYear::parse_label("2425"), None);
        assert_eq!(FiscalYear::parse_label("4-5"), None);
    }

    #[test]
    fn test_format_number() {
        let fy = FiscalYear::starting(2024);
        assert_eq!(format_number(DocumentFamily::Lot, fy, 1), "UC/24-25/0001");
        assert_eq!(format_number(DocumentFamily::PurchaseOrder, fy, 123), "PO/24-25/0123");
        assert_eq!(format_number(DocumentFamily::GateInward, fy, 12345), "GI/24-25/12345");
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence("UC/24-25/0007"), Some(7));
        assert_eq!(parse_sequence("UC/24-25/9999"), Some(9999));
        // Malformed tails fall back to "no sequence", never an error
        assert_eq!(parse_sequence("UC/24-25/"), None);
        assert_eq!(parse_sequence("UC/24-25/7A"), None);
        assert_eq!(parse_sequence("scribbled-number"), None);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(
            parse_number("IS/24-25/0042"),
            Some((DocumentFamily::Issue, FiscalYear::starting(2024), 42))
        );
        assert_eq!(parse_number("XX/24-25/0042"), None);
        assert_eq!(parse_number("IS/24-25/0042/extra"), None);
        assert_eq!(parse_number("IS/24-25"), None);
    }

    #[test]
    fn test_prefix_roundtrip() {
        for family in [
            DocumentFamily::PurchaseOrder,
            DocumentFamily::GateInward,
            DocumentFamily::Lot,
            DocumentFamily::Issue,
        ] {
            assert_eq!(DocumentFamily::from_prefix(family.prefix()), Some(family));
        }
    }
}
