//! # Weightment Repository
//!
//! The per-lot collection of weighed bales and their `issued` flag - the
//! WeightmentStore.
//!
//! ## Replace Semantics
//! ```text
//! replace_all("UC/24-25/0007", rows)
//!      │
//!      ▼
//! ┌──────────────────── ONE TRANSACTION ────────────────────┐
//! │ 1. lot exists?                 no  → NotFound           │
//! │ 2. any bale issued?            yes → IssuedBalesPresent │
//! │    (whole operation fails, nothing deleted)             │
//! │ 3. DELETE every bale of the lot                         │
//! │ 4. bulk INSERT the new rows as UC/24-25/0007-01..NN     │
//! │    with nett = gross - tare                             │
//! │ 5. refresh the lot header aggregates                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Once any bale of a lot is issued the set is frozen; the only mutation an
//! issued bale ever sees is the `issued` flip itself, inside an allocation
//! transaction (see `repository::issue`).

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use weft_core::types::{Weightment, WeightmentRow};
use weft_core::validation::validate_weightment_rows;

const WEIGHTMENT_COLUMNS: &str = "id, lot_no, bale_no, serial, gross_grams, tare_grams, \
     net_grams, value_paise, issued, created_at";

/// Repository for weightment (bale) operations.
#[derive(Debug, Clone)]
pub struct WeightmentRepository {
    pool: SqlitePool,
}

/// Bulk-inserts a weighed batch for a lot, deriving bale numbers
/// `{lot_no}-01..NN` and nett weights. Shared by lot finalization and
/// `replace_all`; always runs inside the caller's transaction.
pub(crate) async fn insert_rows(
    conn: &mut SqliteConnection,
    lot_no: &str,
    rows: &[WeightmentRow],
) -> DbResult<Vec<Weightment>> {
    let now = Utc::now();
    let mut inserted = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        let serial = (idx + 1) as i64;
        let weightment = Weightment {
            id: Uuid::new_v4().to_string(),
            lot_no: lot_no.to_string(),
            bale_no: format!("{}-{:02}", lot_no, serial),
            serial,
            gross_grams: row.gross_grams,
            tare_grams: row.tare_grams,
            net_grams: row.nett().grams(),
            value_paise: row.value_paise,
            issued: false,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO weightments (
                id, lot_no, bale_no, serial,
                gross_grams, tare_grams, net_grams, value_paise,
                issued, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&weightment.id)
        .bind(&weightment.lot_no)
        .bind(&weightment.bale_no)
        .bind(weightment.serial)
        .bind(weightment.gross_grams)
        .bind(weightment.tare_grams)
        .bind(weightment.net_grams)
        .bind(weightment.value_paise)
        .bind(weightment.issued)
        .bind(weightment.created_at)
        .execute(&mut *conn)
        .await?;

        inserted.push(weightment);
    }

    Ok(inserted)
}

impl WeightmentRepository {
    /// Creates a new WeightmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WeightmentRepository { pool }
    }

    /// Replaces the whole weighed set of a lot.
    ///
    /// Legal only while no bale of the lot has been issued; if any is, the
    /// operation fails with [`DbError::IssuedBalesPresent`] and nothing is
    /// deleted. The lot header aggregates (declared bales, gross/tare/nett
    /// sums) are refreshed from the new rows in the same transaction.
    pub async fn replace_all(
        &self,
        lot_no: &str,
        rows: &[WeightmentRow],
    ) -> DbResult<Vec<Weightment>> {
        validate_weightment_rows(rows).map_err(weft_core::CoreError::from)?;

        debug!(lot_no = %lot_no, rows = rows.len(), "Replacing weightment set");

        let mut tx = self.pool.begin().await?;

        let lot_exists: Option<String> =
            sqlx::query_scalar("SELECT lot_no FROM lots WHERE lot_no = ?1")
                .bind(lot_no)
                .fetch_optional(&mut *tx)
                .await?;
        if lot_exists.is_none() {
            return Err(DbError::not_found("Lot", lot_no));
        }

        let issued: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM weightments WHERE lot_no = ?1 AND issued = 1",
        )
        .bind(lot_no)
        .fetch_one(&mut *tx)
        .await?;
        if issued > 0 {
            return Err(DbError::IssuedBalesPresent {
                lot_no: lot_no.to_string(),
                issued,
            });
        }

        sqlx::query("DELETE FROM weightments WHERE lot_no = ?1")
            .bind(lot_no)
            .execute(&mut *tx)
            .await?;

        let inserted = insert_rows(&mut *tx, lot_no, rows).await?;

        let gross: i64 = inserted.iter().map(|w| w.gross_grams).sum();
        let tare: i64 = inserted.iter().map(|w| w.tare_grams).sum();
        let nett: i64 = inserted.iter().map(|w| w.net_grams).sum();
        sqlx::query(
            r#"
            UPDATE lots SET
                declared_bales = ?2,
                gross_grams = ?3,
                tare_grams = ?4,
                net_grams = ?5
            WHERE lot_no = ?1
            "#,
        )
        .bind(lot_no)
        .bind(inserted.len() as i64)
        .bind(gross)
        .bind(tare)
        .bind(nett)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(lot_no = %lot_no, bales = inserted.len(), "Weightment set replaced");
        Ok(inserted)
    }

    /// All unissued bales of a lot, ordered by bale number.
    ///
    /// The two-digit serial keeps lexicographic bale-number order equal to
    /// weighing order.
    pub async fn list_available(&self, lot_no: &str) -> DbResult<Vec<Weightment>> {
        let rows = sqlx::query_as::<_, Weightment>(&format!(
            "SELECT {WEIGHTMENT_COLUMNS} FROM weightments \
             WHERE lot_no = ?1 AND issued = 0 ORDER BY bale_no",
        ))
        .bind(lot_no)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// All bales of a lot regardless of status (administrative view).
    pub async fn list_all(&self, lot_no: &str) -> DbResult<Vec<Weightment>> {
        let rows = sqlx::query_as::<_, Weightment>(&format!(
            "SELECT {WEIGHTMENT_COLUMNS} FROM weightments \
             WHERE lot_no = ?1 ORDER BY bale_no",
        ))
        .bind(lot_no)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Gets a weightment by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Weightment>> {
        let row = sqlx::query_as::<_, Weightment>(&format!(
            "SELECT {WEIGHTMENT_COLUMNS} FROM weightments WHERE id = ?1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use weft_core::types::LotCreateRequest;

    fn row(gross: i64, tare: i64) -> WeightmentRow {
        WeightmentRow {
            gross_grams: gross,
            tare_grams: tare,
            value_paise: 0,
        }
    }

    async fn db_with_lot(rows: Vec<WeightmentRow>) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let lot = db
            .lots()
            .create(LotCreateRequest {
                inward_no: "GI/24-25/0003".to_string(),
                lot_date: NaiveDate::from_ymd_opt(2024, 7, 10).unwrap(),
                variety: Some("MCU-5".to_string()),
                declared_bales: rows.len() as i64,
                rate_paise: 5_200,
                rows,
            })
            .await
            .unwrap();
        (db, lot.lot_no)
    }

    #[tokio::test]
    async fn test_replace_all_twice_leaves_only_second_set() {
        let (db, lot_no) = db_with_lot(vec![row(100_000, 2_000), row(101_000, 2_000)]).await;
        let repo = db.weightments();

        repo.replace_all(&lot_no, &[row(90_000, 1_500), row(91_000, 1_500), row(92_000, 1_500)])
            .await
            .unwrap();

        let all = repo.list_all(&lot_no).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].bale_no, format!("{lot_no}-01"));
        assert_eq!(all[2].bale_no, format!("{lot_no}-03"));
        assert_eq!(all[0].net_grams, 88_500);

        // Header aggregates follow the new set
        let lot = db.lots().get(&lot_no).await.unwrap().unwrap();
        assert_eq!(lot.declared_bales, 3);
        assert_eq!(lot.net_grams, 88_500 + 89_500 + 90_500);
    }

    #[tokio::test]
    async fn test_replace_all_blocked_by_issued_bale() {
        let (db, lot_no) = db_with_lot(vec![row(100_000, 2_000), row(101_000, 2_000)]).await;
        let repo = db.weightments();

        sqlx::query("UPDATE weightments SET issued = 1 WHERE bale_no = ?1")
            .bind(format!("{lot_no}-02"))
            .execute(db.pool())
            .await
            .unwrap();

        let err = repo.replace_all(&lot_no, &[row(90_000, 1_500)]).await.unwrap_err();
        assert!(matches!(err, DbError::IssuedBalesPresent { issued: 1, .. }));

        // Nothing was deleted
        let all = repo.list_all(&lot_no).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].net_grams, 98_000);
    }

    #[tokio::test]
    async fn test_replace_all_unknown_lot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .weightments()
            .replace_all("UC/24-25/9999", &[row(90_000, 1_500)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_available_excludes_issued() {
        let (db, lot_no) =
            db_with_lot(vec![row(100_000, 2_000), row(101_000, 2_000), row(102_000, 2_000)]).await;

        sqlx::query("UPDATE weightments SET issued = 1 WHERE bale_no = ?1")
            .bind(format!("{lot_no}-01"))
            .execute(db.pool())
            .await
            .unwrap();

        let available = db.weightments().list_available(&lot_no).await.unwrap();
        assert_eq!(available.len(), 2);
        assert_eq!(available[0].bale_no, format!("{lot_no}-02"));

        let all = db.weightments().list_all(&lot_no).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
