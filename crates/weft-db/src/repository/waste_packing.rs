//! # Waste Packing Repository
//!
//! Waste packed into bales for sale: a header-plus-lines detail set.
//!
//! Two reconciliations guard every write: the detail-row count must equal
//! the declared number of bales (checked first), and the line weights must
//! sum to the declared total within 0.01 kg. Creation checks before any
//! write; full-replace updates re-check inside the transaction and roll
//! everything back - header update included - on a mismatch.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use weft_core::reconcile::{reconcile_count, reconcile_weight};
use weft_core::types::{
    WastePacking, WastePackingCreateRequest, WastePackingDetail, WastePackingDetailsUpdate,
    WastePackingLine, WastePackingWithDetails,
};
use weft_core::validation::{validate_document_no, validate_ident, validate_positive_weight};
use weft_core::{CoreError, Weight};

const PACKING_COLUMNS: &str =
    "id, packing_no, packing_date, waste_type, no_of_bales, total_grams, created_at";

/// Repository for waste-packing operations.
#[derive(Debug, Clone)]
pub struct WastePackingRepository {
    pool: SqlitePool,
}

fn validate_lines(lines: &[WastePackingLine]) -> Result<(), CoreError> {
    for (idx, line) in lines.iter().enumerate() {
        validate_positive_weight(&format!("line {} weight", idx + 1), line.weight_grams)?;
    }
    Ok(())
}

fn reconcile(
    no_of_bales: i64,
    total_grams: i64,
    lines: &[WastePackingLine],
) -> Result<(), CoreError> {
    reconcile_count("waste packing lines", no_of_bales, lines.len())?;
    reconcile_weight(Weight::from_grams(total_grams), lines, |l| {
        Weight::from_grams(l.weight_grams)
    })?;
    Ok(())
}

impl WastePackingRepository {
    /// Creates a new WastePackingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WastePackingRepository { pool }
    }

    /// Creates a waste packing with its lines.
    ///
    /// Count and weight reconciliation run before anything is written; the
    /// header and lines are then inserted in one transaction.
    pub async fn create(
        &self,
        req: WastePackingCreateRequest,
    ) -> DbResult<WastePackingWithDetails> {
        validate_document_no("packingNo", &req.packing_no).map_err(CoreError::from)?;
        validate_ident("wasteType", &req.waste_type).map_err(CoreError::from)?;
        validate_lines(&req.details)?;
        reconcile(req.no_of_bales, req.total_weight_grams, &req.details)?;

        let packing = WastePacking {
            id: Uuid::new_v4().to_string(),
            packing_no: req.packing_no.clone(),
            packing_date: req.packing_date,
            waste_type: req.waste_type.clone(),
            no_of_bales: req.no_of_bales,
            total_grams: req.total_weight_grams,
            created_at: Utc::now(),
        };

        debug!(packing_no = %packing.packing_no, lines = req.details.len(), "Inserting waste packing");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO waste_packings (
                id, packing_no, packing_date, waste_type,
                no_of_bales, total_grams, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&packing.id)
        .bind(&packing.packing_no)
        .bind(packing.packing_date)
        .bind(&packing.waste_type)
        .bind(packing.no_of_bales)
        .bind(packing.total_grams)
        .bind(packing.created_at)
        .execute(&mut *tx)
        .await?;

        let details = insert_details(&mut tx, &packing.id, &req.details).await?;

        tx.commit().await?;

        info!(packing_no = %packing.packing_no, "Waste packing created");
        Ok(WastePackingWithDetails { packing, details })
    }

    /// Gets a waste packing with its lines, ordered by line number.
    pub async fn get_with_details(&self, packing_no: &str) -> DbResult<WastePackingWithDetails> {
        let packing = sqlx::query_as::<_, WastePacking>(&format!(
            "SELECT {PACKING_COLUMNS} FROM waste_packings WHERE packing_no = ?1",
        ))
        .bind(packing_no)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("WastePacking", packing_no))?;

        let details = sqlx::query_as::<_, WastePackingDetail>(
            "SELECT id, packing_id, line_no, weight_grams FROM waste_packing_details \
             WHERE packing_id = ?1 ORDER BY line_no",
        )
        .bind(&packing.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(WastePackingWithDetails { packing, details })
    }

    /// Fully replaces a packing's detail set, moving the header aggregates
    /// with it.
    ///
    /// Header update, child delete, bulk insert and re-reconciliation all
    /// run inside one transaction; a mismatch rolls back everything and the
    /// previously committed rows stay visible.
    pub async fn replace_details(
        &self,
        packing_no: &str,
        update: WastePackingDetailsUpdate,
    ) -> DbResult<WastePackingWithDetails> {
        validate_lines(&update.details)?;

        let mut tx = self.pool.begin().await?;

        let packing_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM waste_packings WHERE packing_no = ?1")
                .bind(packing_no)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(packing_id) = packing_id else {
            return Err(DbError::not_found("WastePacking", packing_no));
        };

        sqlx::query(
            "UPDATE waste_packings SET no_of_bales = ?2, total_grams = ?3 WHERE id = ?1",
        )
        .bind(&packing_id)
        .bind(update.no_of_bales)
        .bind(update.total_weight_grams)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM waste_packing_details WHERE packing_id = ?1")
            .bind(&packing_id)
            .execute(&mut *tx)
            .await?;

        insert_details(&mut tx, &packing_id, &update.details).await?;

        // Re-check against the freshly written state; dropping the
        // transaction on error reverts header and lines together.
        reconcile(update.no_of_bales, update.total_weight_grams, &update.details)?;

        tx.commit().await?;

        info!(packing_no = %packing_no, "Waste packing details replaced");
        self.get_with_details(packing_no).await
    }
}

async fn insert_details(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    packing_id: &str,
    lines: &[WastePackingLine],
) -> DbResult<Vec<WastePackingDetail>> {
    let mut details = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let detail = WastePackingDetail {
            id: Uuid::new_v4().to_string(),
            packing_id: packing_id.to_string(),
            line_no: (idx + 1) as i64,
            weight_grams: line.weight_grams,
        };

        sqlx::query(
            "INSERT INTO waste_packing_details (id, packing_id, line_no, weight_grams) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&detail.id)
        .bind(&detail.packing_id)
        .bind(detail.line_no)
        .bind(detail.weight_grams)
        .execute(&mut **tx)
        .await?;

        details.push(detail);
    }

    Ok(details)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;

    fn line(grams: i64) -> WastePackingLine {
        WastePackingLine { weight_grams: grams }
    }

    fn request(no_of_bales: i64, total: i64, details: Vec<WastePackingLine>) -> WastePackingCreateRequest {
        WastePackingCreateRequest {
            packing_no: "WP-0009".to_string(),
            packing_date: NaiveDate::from_ymd_opt(2024, 12, 5).unwrap(),
            waste_type: "comber noil".to_string(),
            no_of_bales,
            total_weight_grams: total,
            details,
        }
    }

    #[tokio::test]
    async fn test_create_reconciled() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let created = db
            .waste_packings()
            .create(request(2, 100_000, vec![line(40_000), line(60_000)]))
            .await
            .unwrap();

        assert_eq!(created.packing.no_of_bales, 2);
        assert_eq!(created.details.len(), 2);
        assert_eq!(created.details[1].line_no, 2);
    }

    #[tokio::test]
    async fn test_create_rejects_count_mismatch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db
            .waste_packings()
            .create(request(3, 100_000, vec![line(40_000), line(60_000)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::CountMismatch { declared: 3, actual: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_weight_mismatch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        // 40 + 61 against a declared 100
        let err = db
            .waste_packings()
            .create(request(2, 100_000, vec![line(40_000), line(61_000)]))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "detail weight mismatch: computed=101.00 kg, expected=100.00 kg"
        );

        // Rejected before any write
        assert!(db.waste_packings().get_with_details("WP-0009").await.is_err());
    }

    #[tokio::test]
    async fn test_replace_details() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.waste_packings();

        repo.create(request(2, 100_000, vec![line(40_000), line(60_000)]))
            .await
            .unwrap();

        let replaced = repo
            .replace_details(
                "WP-0009",
                WastePackingDetailsUpdate {
                    no_of_bales: 3,
                    total_weight_grams: 150_000,
                    details: vec![line(50_000), line(50_000), line(50_000)],
                },
            )
            .await
            .unwrap();

        assert_eq!(replaced.packing.no_of_bales, 3);
        assert_eq!(replaced.packing.total_grams, 150_000);
        assert_eq!(replaced.details.len(), 3);
    }

    #[tokio::test]
    async fn test_replace_mismatch_leaves_prior_rows() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.waste_packings();

        repo.create(request(2, 100_000, vec![line(40_000), line(60_000)]))
            .await
            .unwrap();

        let err = repo
            .replace_details(
                "WP-0009",
                WastePackingDetailsUpdate {
                    no_of_bales: 2,
                    total_weight_grams: 120_000,
                    details: vec![line(40_000), line(60_000)],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::WeightMismatch { .. })));

        // Header and lines both rolled back to the committed state
        let current = repo.get_with_details("WP-0009").await.unwrap();
        assert_eq!(current.packing.total_grams, 100_000);
        assert_eq!(current.packing.no_of_bales, 2);
        assert_eq!(current.details.len(), 2);
        assert_eq!(current.details[0].weight_grams, 40_000);
    }
}
