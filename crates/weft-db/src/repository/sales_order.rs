//! # Sales Order Repository
//!
//! Sales orders over waste varieties; the third consumer of the detail-set
//! pattern. Line nett weights reconcile against the declared order total.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use weft_core::reconcile::reconcile_weight;
use weft_core::types::{
    SalesOrder, SalesOrderCreateRequest, SalesOrderDetail, SalesOrderDetailsUpdate,
    SalesOrderLine, SalesOrderWithDetails,
};
use weft_core::validation::{validate_document_no, validate_ident, validate_positive_weight};
use weft_core::{CoreError, Weight};

const ORDER_COLUMNS: &str =
    "id, order_no, order_date, party, broker, total_net_grams, created_at";

/// Repository for sales-order operations.
#[derive(Debug, Clone)]
pub struct SalesOrderRepository {
    pool: SqlitePool,
}

fn validate_lines(lines: &[SalesOrderLine]) -> Result<(), CoreError> {
    for (idx, line) in lines.iter().enumerate() {
        let n = idx + 1;
        validate_ident(&format!("line {n} variety"), &line.variety)?;
        validate_positive_weight(&format!("line {n} nett"), line.net_grams)?;
    }
    Ok(())
}

fn reconcile(total_net_grams: i64, lines: &[SalesOrderLine]) -> Result<(), CoreError> {
    reconcile_weight(Weight::from_grams(total_net_grams), lines, |l| {
        Weight::from_grams(l.net_grams)
    })?;
    Ok(())
}

impl SalesOrderRepository {
    /// Creates a new SalesOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SalesOrderRepository { pool }
    }

    /// Creates a sales order with its lines, reconciled before any write.
    pub async fn create(&self, req: SalesOrderCreateRequest) -> DbResult<SalesOrderWithDetails> {
        validate_document_no("orderNo", &req.order_no).map_err(CoreError::from)?;
        validate_ident("party", &req.party).map_err(CoreError::from)?;
        validate_lines(&req.details)?;
        reconcile(req.total_net_grams, &req.details)?;

        let order = SalesOrder {
            id: Uuid::new_v4().to_string(),
            order_no: req.order_no.clone(),
            order_date: req.order_date,
            party: req.party.clone(),
            broker: req.broker.clone(),
            total_net_grams: req.total_net_grams,
            created_at: Utc::now(),
        };

        debug!(order_no = %order.order_no, lines = req.details.len(), "Inserting sales order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales_orders (
                id, order_no, order_date, party, broker, total_net_grams, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_no)
        .bind(order.order_date)
        .bind(&order.party)
        .bind(&order.broker)
        .bind(order.total_net_grams)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        let details = insert_details(&mut tx, &order.id, &req.details).await?;

        tx.commit().await?;

        info!(order_no = %order.order_no, "Sales order created");
        Ok(SalesOrderWithDetails { order, details })
    }

    /// Gets a sales order with its lines, ordered by line number.
    pub async fn get_with_details(&self, order_no: &str) -> DbResult<SalesOrderWithDetails> {
        let order = sqlx::query_as::<_, SalesOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM sales_orders WHERE order_no = ?1",
        ))
        .bind(order_no)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("SalesOrder", order_no))?;

        let details = sqlx::query_as::<_, SalesOrderDetail>(
            "SELECT id, order_id, line_no, variety, net_grams, rate_paise \
             FROM sales_order_details WHERE order_id = ?1 ORDER BY line_no",
        )
        .bind(&order.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(SalesOrderWithDetails { order, details })
    }

    /// Fully replaces an order's detail set along with the header total.
    pub async fn replace_details(
        &self,
        order_no: &str,
        update: SalesOrderDetailsUpdate,
    ) -> DbResult<SalesOrderWithDetails> {
        validate_lines(&update.details)?;

        let mut tx = self.pool.begin().await?;

        let order_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM sales_orders WHERE order_no = ?1")
                .bind(order_no)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(order_id) = order_id else {
            return Err(DbError::not_found("SalesOrder", order_no));
        };

        sqlx::query("UPDATE sales_orders SET total_net_grams = ?2 WHERE id = ?1")
            .bind(&order_id)
            .bind(update.total_net_grams)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM sales_order_details WHERE order_id = ?1")
            .bind(&order_id)
            .execute(&mut *tx)
            .await?;

        insert_details(&mut tx, &order_id, &update.details).await?;

        reconcile(update.total_net_grams, &update.details)?;

        tx.commit().await?;

        info!(order_no = %order_no, "Sales order details replaced");
        self.get_with_details(order_no).await
    }
}

async fn insert_details(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    order_id: &str,
    lines: &[SalesOrderLine],
) -> DbResult<Vec<SalesOrderDetail>> {
    let mut details = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let detail = SalesOrderDetail {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            line_no: (idx + 1) as i64,
            variety: line.variety.clone(),
            net_grams: line.net_grams,
            rate_paise: line.rate_paise,
        };

        sqlx::query(
            "INSERT INTO sales_order_details \
             (id, order_id, line_no, variety, net_grams, rate_paise) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&detail.id)
        .bind(&detail.order_id)
        .bind(detail.line_no)
        .bind(&detail.variety)
        .bind(detail.net_grams)
        .bind(detail.rate_paise)
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

    fn line(variety: &str, net_grams: i64) -> SalesOrderLine {
        SalesOrderLine {
            variety: variety.to_string(),
            net_grams,
            rate_paise: 3_500,
        }
    }

    fn request(lines: Vec<SalesOrderLine>) -> SalesOrderCreateRequest {
        SalesOrderCreateRequest {
            order_no: "SO-24-0042".to_string(),
            order_date: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            party: "Sharda Traders".to_string(),
            broker: Some("R K Agencies".to_string()),
            total_net_grams: lines.iter().map(|l| l.net_grams).sum(),
            details: lines,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.sales_orders()
            .create(request(vec![line("comber noil", 500_000), line("flat strip", 250_000)]))
            .await
            .unwrap();

        let fetched = db.sales_orders().get_with_details("SO-24-0042").await.unwrap();
        assert_eq!(fetched.order.total_net_grams, 750_000);
        assert_eq!(fetched.details.len(), 2);
        assert_eq!(fetched.details[0].variety, "comber noil");
    }

    #[tokio::test]
    async fn test_create_rejects_total_mismatch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut req = request(vec![line("comber noil", 500_000)]);
        req.total_net_grams = 499_000;

        let err = db.sales_orders().create(req).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::WeightMismatch { .. })));
    }

    #[tokio::test]
    async fn test_replace_details() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales_orders();

        repo.create(request(vec![line("comber noil", 500_000)])).await.unwrap();

        let replaced = repo
            .replace_details(
                "SO-24-0042",
                SalesOrderDetailsUpdate {
                    total_net_grams: 300_000,
                    details: vec![line("sweep waste", 300_000)],
                },
            )
            .await
            .unwrap();
        assert_eq!(replaced.details.len(), 1);
        assert_eq!(replaced.details[0].variety, "sweep waste");

        // Duplicate order numbers are rejected by the unique index
        let err = repo.create(request(vec![line("comber noil", 500_000)])).await.unwrap_err();
        assert!(err.is_conflict());
    }
}
