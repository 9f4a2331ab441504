//! # Validation Module
//!
//! Input validation for the allocation core. Runs before any transaction is
//! opened: a request that fails here never touches the database.
//!
//! ```text
//! caller payload
//!      │
//!      ▼
//! weft_core::validation  ← shape and field rules (this module)
//!      │
//!      ▼
//! weft_db repository     ← transaction, cross-row invariants
//!      │
//!      ▼
//! SQLite constraints     ← NOT NULL / UNIQUE / FK backstop
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::types::{IssueCreateRequest, LotCreateRequest, WeightmentRow};
use crate::MAX_BALES_PER_LOT;

/// Maximum length of a business document number.
const MAX_DOCUMENT_NO_LEN: usize = 30;

/// Maximum length of a grouping identifier (mixing group, party, etc.).
const MAX_IDENT_LEN: usize = 50;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a business document number (lot no, issue no, invoice no...).
///
/// ## Rules
/// - Must not be empty
/// - At most 30 characters
/// - Only alphanumerics, `/`, `-` and `_` (the fiscal-year number grammar)
pub fn validate_document_no(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_DOCUMENT_NO_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_DOCUMENT_NO_LEN,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || c == '/' || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, '/', '-' and '_'".to_string(),
        });
    }

    Ok(())
}

/// Validates a required identifier field (mixing group, party name).
pub fn validate_ident(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_IDENT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_IDENT_LEN,
        });
    }

    Ok(())
}

/// Validates a weight that must be strictly positive (an issue line, a
/// packed bale).
pub fn validate_positive_weight(field: &str, grams: i64) -> ValidationResult<()> {
    if grams <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Batch Validators
// =============================================================================

/// Validates a gate-inward weighment batch.
///
/// ## Rules
/// - At least one row, at most [`MAX_BALES_PER_LOT`] (the two-digit bale
///   suffix bounds a lot at 99 bales)
/// - Every gross strictly positive, tare non-negative and below gross
pub fn validate_weightment_rows(rows: &[WeightmentRow]) -> ValidationResult<()> {
    if rows.is_empty() {
        return Err(ValidationError::Required {
            field: "rows".to_string(),
        });
    }

    if rows.len() > MAX_BALES_PER_LOT {
        return Err(ValidationError::OutOfRange {
            field: "rows".to_string(),
            min: 1,
            max: MAX_BALES_PER_LOT as i64,
        });
    }

    for (idx, row) in rows.iter().enumerate() {
        let line = idx + 1;
        if row.gross_grams <= 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("row {line} gross"),
            });
        }
        if row.tare_grams < 0 {
            return Err(ValidationError::OutOfRange {
                field: format!("row {line} tare"),
                min: 0,
                max: row.gross_grams,
            });
        }
        if row.tare_grams >= row.gross_grams {
            return Err(ValidationError::TareExceedsGross {
                line,
                gross: row.gross(),
                tare: row.tare(),
            });
        }
        if row.value_paise < 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("row {line} value"),
            });
        }
    }

    Ok(())
}

/// Validates a lot-finalization request (shape only; the declared-count
/// reconciliation happens with the other cross-row checks).
pub fn validate_lot_request(req: &LotCreateRequest) -> ValidationResult<()> {
    validate_document_no("inwardNo", &req.inward_no)?;

    if req.declared_bales <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "declaredBales".to_string(),
        });
    }

    if req.rate_paise < 0 {
        return Err(ValidationError::MustBePositive {
            field: "ratePaise".to_string(),
        });
    }

    validate_weightment_rows(&req.rows)
}

/// Validates an issue-creation request before the allocation transaction.
pub fn validate_issue_request(req: &IssueCreateRequest) -> ValidationResult<()> {
    if let Some(issue_no) = &req.issue_number {
        validate_document_no("issueNumber", issue_no)?;
    }

    validate_ident("mixingGroupId", &req.mixing_group_id)?;
    validate_ident("toMixingGroupId", &req.to_mixing_group_id)?;

    if req.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    for (idx, item) in req.items.iter().enumerate() {
        let line = idx + 1;
        if item.weightment_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: format!("item {line} weightmentId"),
            });
        }
        validate_positive_weight(&format!("item {line} issueWeight"), item.issue_weight_grams)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IssueItemRequest;
    use chrono::NaiveDate;

    fn row(gross: i64, tare: i64) -> WeightmentRow {
        WeightmentRow {
            gross_grams: gross,
            tare_grams: tare,
            value_paise: 0,
        }
    }

    #[test]
    fn test_validate_document_no() {
        assert!(validate_document_no("lotNo", "UC/24-25/0007").is_ok());
        assert!(validate_document_no("lotNo", "GI-00113").is_ok());

        assert!(validate_document_no("lotNo", "").is_err());
        assert!(validate_document_no("lotNo", "   ").is_err());
        assert!(validate_document_no("lotNo", "UC 24").is_err());
        assert!(validate_document_no("lotNo", &"X".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_weightment_rows() {
        assert!(validate_weightment_rows(&[row(102_500, 2_500)]).is_ok());

        assert!(validate_weightment_rows(&[]).is_err());
        assert!(validate_weightment_rows(&vec![row(1_000, 0); 100]).is_err());
        assert!(validate_weightment_rows(&[row(0, 0)]).is_err());
        assert!(validate_weightment_rows(&[row(1_000, -1)]).is_err());
        // Tare at or above gross would produce a non-positive nett
        assert!(validate_weightment_rows(&[row(1_000, 1_000)]).is_err());
    }

    #[test]
    fn test_validate_issue_request() {
        let mut req = IssueCreateRequest {
            issue_number: None,
            issue_date: NaiveDate::from_ymd_opt(2024, 11, 2).unwrap(),
            mixing_group_id: "MG-1".to_string(),
            to_mixing_group_id: "MG-4".to_string(),
            items: vec![IssueItemRequest {
                weightment_id: "w-1".to_string(),
                issue_weight_grams: 40_000,
            }],
        };
        assert!(validate_issue_request(&req).is_ok());

        req.items.clear();
        assert!(validate_issue_request(&req).is_err());

        req.items.push(IssueItemRequest {
            weightment_id: "w-1".to_string(),
            issue_weight_grams: 0,
        });
        assert!(validate_issue_request(&req).is_err());

        req.items[0].issue_weight_grams = 40_000;
        req.mixing_group_id = "".to_string();
        assert!(validate_issue_request(&req).is_err());
    }
}
