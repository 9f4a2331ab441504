//! # Lot Repository
//!
//! Finalization of gate-inward weighment batches into lots.
//!
//! ## Lot Lifecycle
//! ```text
//! 1. FINALIZE INWARD BATCH
//!    └── create() → mints UC/YY-YY/NNNN, inserts header + bale rows
//!                   (one transaction; count reconciled before any write)
//!
//! 2. (OPTIONAL) RE-CAPTURE WEIGHTS
//!    └── weightments().replace_all() → legal only before any issuance
//!
//! 3. ISSUANCE BEGINS
//!    └── lot is frozen; bales flip to issued one by one
//!
//! 4. (OPTIONAL) DELETE
//!    └── delete() → only while no bale is issued; explicit
//!        children-then-parent statements, no schema cascade
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::sequence::next_document_number;
use crate::repository::weightment::insert_rows;
use weft_core::fiscal::DocumentFamily;
use weft_core::reconcile::reconcile_count;
use weft_core::types::{Lot, LotCreateRequest};
use weft_core::validation::validate_lot_request;
use weft_core::CoreError;

const LOT_COLUMNS: &str = "id, lot_no, inward_no, variety, declared_bales, gross_grams, \
     tare_grams, net_grams, rate_paise, created_at";

/// Repository for lot operations.
#[derive(Debug, Clone)]
pub struct LotRepository {
    pool: SqlitePool,
}

impl LotRepository {
    /// Creates a new LotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LotRepository { pool }
    }

    /// Finalizes a gate-inward weighment batch into a lot.
    ///
    /// One transaction: mints the lot number from the `UC` counter, inserts
    /// the header with aggregates summed from the rows, bulk-inserts the
    /// bale rows. The declared bale count must equal the number of weighed
    /// rows; a mismatch rejects the batch before anything is written.
    pub async fn create(&self, req: LotCreateRequest) -> DbResult<Lot> {
        validate_lot_request(&req).map_err(CoreError::from)?;
        reconcile_count("declared bales", req.declared_bales, req.rows.len())?;

        let mut tx = self.pool.begin().await?;

        let lot_no = next_document_number(&mut *tx, DocumentFamily::Lot, req.lot_date).await?;

        let lot = Lot {
            id: Uuid::new_v4().to_string(),
            lot_no: lot_no.clone(),
            inward_no: req.inward_no.clone(),
            variety: req.variety.clone(),
            declared_bales: req.declared_bales,
            gross_grams: req.rows.iter().map(|r| r.gross_grams).sum(),
            tare_grams: req.rows.iter().map(|r| r.tare_grams).sum(),
            net_grams: req.rows.iter().map(|r| r.nett().grams()).sum(),
            rate_paise: req.rate_paise,
            created_at: Utc::now(),
        };

        debug!(lot_no = %lot.lot_no, inward_no = %lot.inward_no, "Inserting lot");

        sqlx::query(
            r#"
            INSERT INTO lots (
                id, lot_no, inward_no, variety, declared_bales,
                gross_grams, tare_grams, net_grams, rate_paise, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&lot.id)
        .bind(&lot.lot_no)
        .bind(&lot.inward_no)
        .bind(&lot.variety)
        .bind(lot.declared_bales)
        .bind(lot.gross_grams)
        .bind(lot.tare_grams)
        .bind(lot.net_grams)
        .bind(lot.rate_paise)
        .bind(lot.created_at)
        .execute(&mut *tx)
        .await?;

        insert_rows(&mut *tx, &lot_no, &req.rows).await?;

        tx.commit().await?;

        info!(lot_no = %lot.lot_no, bales = req.rows.len(), "Lot created");
        Ok(lot)
    }

    /// Gets a lot by its lot number.
    pub async fn get(&self, lot_no: &str) -> DbResult<Option<Lot>> {
        let lot = sqlx::query_as::<_, Lot>(&format!(
            "SELECT {LOT_COLUMNS} FROM lots WHERE lot_no = ?1",
        ))
        .bind(lot_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lot)
    }

    /// Lists all lots, newest numbers first.
    pub async fn list(&self) -> DbResult<Vec<Lot>> {
        let lots = sqlx::query_as::<_, Lot>(&format!(
            "SELECT {LOT_COLUMNS} FROM lots ORDER BY lot_no DESC",
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(lots)
    }

    /// Deletes a lot and its bales.
    ///
    /// Legal only while no bale of the lot has been issued. Children are
    /// deleted before the parent in explicit statements inside one
    /// transaction.
    pub async fn delete(&self, lot_no: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM lots WHERE lot_no = ?1")
            .bind(lot_no)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
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
        sqlx::query("DELETE FROM lots WHERE lot_no = ?1")
            .bind(lot_no)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(lot_no = %lot_no, "Lot deleted");
        Ok(())
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
    use weft_core::types::WeightmentRow;

    fn row(gross: i64, tare: i64) -> WeightmentRow {
        WeightmentRow {
            gross_grams: gross,
            tare_grams: tare,
            value_paise: 52_000,
        }
    }

    fn request(rows: Vec<WeightmentRow>) -> LotCreateRequest {
        LotCreateRequest {
            inward_no: "GI/24-25/0003".to_string(),
            lot_date: NaiveDate::from_ymd_opt(2024, 7, 10).unwrap(),
            variety: Some("MCU-5".to_string()),
            declared_bales: rows.len() as i64,
            rate_paise: 5_200,
            rows,
        }
    }

    #[tokio::test]
    async fn test_create_mints_number_and_bales() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let lot = db
            .lots()
            .create(request(vec![row(102_500, 2_500), row(101_000, 2_000)]))
            .await
            .unwrap();

        assert_eq!(lot.lot_no, "UC/24-25/0001");
        assert_eq!(lot.gross_grams, 203_500);
        assert_eq!(lot.net_grams, 199_000);

        let bales = db.weightments().list_all(&lot.lot_no).await.unwrap();
        assert_eq!(bales.len(), 2);
        assert_eq!(bales[0].bale_no, "UC/24-25/0001-01");
        assert!(!bales[0].issued);

        // The next lot continues the sequence
        let second = db.lots().create(request(vec![row(100_000, 2_000)])).await.unwrap();
        assert_eq!(second.lot_no, "UC/24-25/0002");
    }

    #[tokio::test]
    async fn test_create_rejects_declared_count_mismatch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut req = request(vec![row(102_500, 2_500), row(101_000, 2_000)]);
        req.declared_bales = 3;

        let err = db.lots().create(req).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::CountMismatch { declared: 3, actual: 2, .. })
        ));

        // Nothing was written, the number was not consumed
        assert!(db.lots().list().await.unwrap().is_empty());
        let next = db.lots().create(request(vec![row(100_000, 2_000)])).await.unwrap();
        assert_eq!(next.lot_no, "UC/24-25/0001");
    }

    #[tokio::test]
    async fn test_delete_before_issuance() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let lot = db.lots().create(request(vec![row(102_500, 2_500)])).await.unwrap();

        db.lots().delete(&lot.lot_no).await.unwrap();

        assert!(db.lots().get(&lot.lot_no).await.unwrap().is_none());
        assert!(db.weightments().list_all(&lot.lot_no).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_blocked_once_issued() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let lot = db
            .lots()
            .create(request(vec![row(102_500, 2_500), row(101_000, 2_000)]))
            .await
            .unwrap();

        sqlx::query("UPDATE weightments SET issued = 1 WHERE bale_no = ?1")
            .bind(format!("{}-01", lot.lot_no))
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.lots().delete(&lot.lot_no).await.unwrap_err();
        assert!(matches!(err, DbError::IssuedBalesPresent { .. }));
        assert!(db.lots().get(&lot.lot_no).await.unwrap().is_some());
        assert_eq!(db.weightments().list_all(&lot.lot_no).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_unknown_lot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.lots().delete("UC/24-25/0404").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
