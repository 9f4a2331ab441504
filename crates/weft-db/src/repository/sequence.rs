//! # Document Sequence Repository
//!
//! Fiscal-year-scoped document numbers backed by an explicit counter table.
//!
//! ## Why a Counter Table
//! ```text
//! read-max-then-format (the classic approach):
//!
//!   desk A: SELECT MAX(lot_no) ... -> 0007      desk B: SELECT MAX(lot_no) ... -> 0007
//!   desk A: INSERT "UC/24-25/0008"              desk B: INSERT "UC/24-25/0008"  💥 duplicate
//!
//! counter table (this module):
//!
//!   one statement per mint:
//!     INSERT .. ON CONFLICT(family, fiscal_year)
//!       DO UPDATE SET last_seq = last_seq + 1
//!     RETURNING last_seq
//!
//!   the increment and the read are atomic; run it inside the transaction
//!   that inserts the owning row and the number can never be lost or doubled.
//! ```
//!
//! Counters are gap-tolerant: a rolled-back transaction burns its sequence,
//! which is acceptable - numbers must be unique and increasing, not dense.

use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, warn};

use crate::error::DbResult;
use weft_core::fiscal::{self, DocumentFamily, FiscalYear};

/// Repository for fiscal-year document counters.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

/// Mints the next document number for a family, scoped to the fiscal year of
/// `reference_date`.
///
/// Takes any executor so callers can run it inside their own transaction;
/// the counter bump is a single atomic statement either way.
pub async fn next_document_number<'e, E>(
    executor: E,
    family: DocumentFamily,
    reference_date: NaiveDate,
) -> DbResult<String>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let fy = FiscalYear::from_date(reference_date);

    let seq: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO document_counters (family, fiscal_year, last_seq)
        VALUES (?1, ?2, 1)
        ON CONFLICT(family, fiscal_year) DO UPDATE SET last_seq = last_seq + 1
        RETURNING last_seq
        "#,
    )
    .bind(family.prefix())
    .bind(fy.start_year())
    .fetch_one(executor)
    .await?;

    let number = fiscal::format_number(family, fy, seq as u32);
    debug!(family = %family, fiscal_year = %fy, number = %number, "Minted document number");
    Ok(number)
}

impl SequenceRepository {
    /// Creates a new SequenceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// Mints the next number for `family` in its own statement.
    ///
    /// Repositories that insert the owning row mint inside their transaction
    /// via [`next_document_number`] instead; this entry point serves callers
    /// (purchase-order intake, gate-inward capture) that insert their rows
    /// elsewhere.
    pub async fn next(
        &self,
        family: DocumentFamily,
        reference_date: NaiveDate,
    ) -> DbResult<String> {
        next_document_number(&self.pool, family, reference_date).await
    }

    /// Folds an existing document number into the counter, raising it so the
    /// next mint lands strictly above.
    ///
    /// Used when pre-numbered documents enter the system (legacy import,
    /// manually numbered registers). A malformed number is tolerated: it is
    /// logged and skipped, never fatal - the counter simply stays where it
    /// was.
    pub async fn adopt_existing(&self, number: &str) -> DbResult<()> {
        let Some((family, fy, seq)) = fiscal::parse_number(number) else {
            warn!(number = %number, "Ignoring malformed document number");
            return Ok(());
        };

        sqlx::query(
            r#"
            INSERT INTO document_counters (family, fiscal_year, last_seq)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(family, fiscal_year)
                DO UPDATE SET last_seq = MAX(last_seq, excluded.last_seq)
            "#,
        )
        .bind(family.prefix())
        .bind(fy.start_year())
        .bind(seq as i64)
        .execute(&self.pool)
        .await?;

        debug!(number = %number, "Adopted existing document number");
        Ok(())
    }

    /// The highest sequence issued for `(family, fy)`, if any. Diagnostic.
    pub async fn current(
        &self,
        family: DocumentFamily,
        fy: FiscalYear,
    ) -> DbResult<Option<i64>> {
        let seq: Option<i64> = sqlx::query_scalar(
            "SELECT last_seq FROM document_counters WHERE family = ?1 AND fiscal_year = ?2",
        )
        .bind(family.prefix())
        .bind(fy.start_year())
        .fetch_optional(&self.pool)
        .await?;

        Ok(seq)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
