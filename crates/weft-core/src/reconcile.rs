//! # Detail-Set Reconciliation
//!
//! Every header-plus-lines document (waste packing, invoice, sales order)
//! declares its own aggregate; the lines must prove it. The helpers here
//! recompute the aggregate from the detail rows and reject the operation when
//! it diverges from the declared value beyond a fixed tolerance.
//!
//! ```text
//! header: total = 100.00 kg          header: total = 100.00 kg
//! lines:   40.00 + 60.00             lines:   40.00 + 61.00
//!          └── Ok(100.00 kg)                  └── WeightMismatch
//!                                                 computed=101.00, expected=100.00
//! ```
//!
//! Callers run these checks inside the owning transaction (or before opening
//! one); a failure means the whole operation rolls back.

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, AMOUNT_TOLERANCE};
use crate::weight::{Weight, WEIGHT_TOLERANCE};

/// Sums `extract(row)` over all rows and checks the result against the
/// declared header weight within [`WEIGHT_TOLERANCE`] (0.01 kg).
///
/// Returns the computed aggregate on success so callers can persist the
/// proven value rather than the declared one.
pub fn reconcile_weight<R>(
    declared: Weight,
    rows: &[R],
    extract: impl Fn(&R) -> Weight,
) -> CoreResult<Weight> {
    reconcile_weight_with(declared, rows, extract, WEIGHT_TOLERANCE)
}

/// [`reconcile_weight`] with an explicit tolerance.
pub fn reconcile_weight_with<R>(
    declared: Weight,
    rows: &[R],
    extract: impl Fn(&R) -> Weight,
    tolerance: Weight,
) -> CoreResult<Weight> {
    let computed: Weight = rows.iter().map(extract).sum();
    if !computed.within(declared, tolerance) {
        return Err(CoreError::WeightMismatch { declared, computed });
    }
    Ok(computed)
}

/// Sums `extract(row)` over all rows and checks the result against the
/// declared header amount within [`AMOUNT_TOLERANCE`] (one paisa).
pub fn reconcile_amount<R>(
    declared: Money,
    rows: &[R],
    extract: impl Fn(&R) -> Money,
) -> CoreResult<Money> {
    let computed: Money = rows.iter().map(extract).sum();
    if !computed.within(declared, AMOUNT_TOLERANCE) {
        return Err(CoreError::AmountMismatch { declared, computed });
    }
    Ok(computed)
}

/// Structural count check applied before the weight check, e.g. "number of
/// detail rows must equal the declared number of bales".
pub fn reconcile_count(what: &str, declared: i64, actual: usize) -> CoreResult<()> {
    if declared != actual as i64 {
        return Err(CoreError::CountMismatch {
            what: what.to_string(),
            declared,
            actual: actual as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Line {
        nett: Weight,
    }

    fn lines(kgs: &[i64]) -> Vec<Line> {
        kgs.iter().map(|&kg| Line { nett: Weight::from_kg(kg) }).collect()
    }

    #[test]
    fn test_reconcile_weight_exact() {
        let rows = lines(&[40, 60]);
        let computed = reconcile_weight(Weight::from_kg(100), &rows, |r| r.nett).unwrap();
        assert_eq!(computed, Weight::from_kg(100));
    }

    #[test]
    fn test_reconcile_weight_within_tolerance() {
        // Declared 100.00 kg, lines sum to 100.01 kg: inside the 0.01 kg band
        let rows = vec![
            Line { nett: Weight::from_grams(40_000) },
            Line { nett: Weight::from_grams(60_010) },
        ];
        assert!(reconcile_weight(Weight::from_kg(100), &rows, |r| r.nett).is_ok());
    }

    #[test]
    fn test_reconcile_weight_mismatch_reports_both_values() {
        let rows = lines(&[40, 61]);
        let err = reconcile_weight(Weight::from_kg(100), &rows, |r| r.nett).unwrap_err();
        match &err {
            CoreError::WeightMismatch { declared, computed } => {
                assert_eq!(*declared, Weight::from_kg(100));
                assert_eq!(*computed, Weight::from_kg(101));
            }
            other => panic!("expected WeightMismatch, got {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "detail weight mismatch: computed=101.00 kg, expected=100.00 kg"
        );
    }

    #[test]
    fn test_reconcile_weight_empty_rows() {
        let rows: Vec<Line> = Vec::new();
        // An empty detail set only reconciles against a zero header
        assert!(reconcile_weight(Weight::zero(), &rows, |r| r.nett).is_ok());
        assert!(reconcile_weight(Weight::from_kg(1), &rows, |r| r.nett).is_err());
    }

    #[test]
    fn test_reconcile_amount() {
        struct Row {
            amount: Money,
        }
        let rows = vec![
            Row { amount: Money::from_rupees(400) },
            Row { amount: Money::from_rupees(600) },
        ];
        assert!(reconcile_amount(Money::from_rupees(1_000), &rows, |r| r.amount).is_ok());

        let err =
            reconcile_amount(Money::from_rupees(1_001), &rows, |r| r.amount).unwrap_err();
        assert!(matches!(err, CoreError::AmountMismatch { .. }));
    }

    #[test]
    fn test_reconcile_count() {
        assert!(reconcile_count("waste packing lines", 2, 2).is_ok());

        let err = reconcile_count("waste packing lines", 12, 11).unwrap_err();
        assert_eq!(err.to_string(), "waste packing lines: declared 12, got 11");
    }
}
