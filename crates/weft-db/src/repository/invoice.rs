//! # Invoice Repository
//!
//! Waste-sale invoices. Same detail-set discipline as waste packing, with
//! two aggregates to prove: line nett weights against the declared total
//! nett, and line amounts against the declared total amount (one-paisa
//! tolerance).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use weft_core::reconcile::{reconcile_amount, reconcile_weight};
use weft_core::types::{
    Invoice, InvoiceCreateRequest, InvoiceDetail, InvoiceDetailsUpdate, InvoiceLine,
    InvoiceWithDetails,
};
use weft_core::validation::{validate_document_no, validate_ident, validate_positive_weight};
use weft_core::{CoreError, Money, Weight};

const INVOICE_COLUMNS: &str =
    "id, invoice_no, invoice_date, party, total_net_grams, total_amount_paise, created_at";

/// Repository for invoice operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

fn validate_lines(lines: &[InvoiceLine]) -> Result<(), CoreError> {
    for (idx, line) in lines.iter().enumerate() {
        let n = idx + 1;
        validate_ident(&format!("line {n} description"), &line.description)?;
        validate_positive_weight(&format!("line {n} nett"), line.net_grams)?;
    }
    Ok(())
}

fn reconcile(
    total_net_grams: i64,
    total_amount_paise: i64,
    lines: &[InvoiceLine],
) -> Result<(), CoreError> {
    reconcile_weight(Weight::from_grams(total_net_grams), lines, |l| {
        Weight::from_grams(l.net_grams)
    })?;
    reconcile_amount(Money::from_paise(total_amount_paise), lines, |l| {
        Money::from_paise(l.amount_paise)
    })?;
    Ok(())
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Creates an invoice with its lines; both aggregates reconciled before
    /// anything is written.
    pub async fn create(&self, req: InvoiceCreateRequest) -> DbResult<InvoiceWithDetails> {
        validate_document_no("invoiceNo", &req.invoice_no).map_err(CoreError::from)?;
        validate_ident("party", &req.party).map_err(CoreError::from)?;
        validate_lines(&req.details)?;
        reconcile(req.total_net_grams, req.total_amount_paise, &req.details)?;

        let invoice = Invoice {
            id: Uuid::new_v4().to_string(),
            invoice_no: req.invoice_no.clone(),
            invoice_date: req.invoice_date,
            party: req.party.clone(),
            total_net_grams: req.total_net_grams,
            total_amount_paise: req.total_amount_paise,
            created_at: Utc::now(),
        };

        debug!(invoice_no = %invoice.invoice_no, lines = req.details.len(), "Inserting invoice");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_no, invoice_date, party,
                total_net_grams, total_amount_paise, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_no)
        .bind(invoice.invoice_date)
        .bind(&invoice.party)
        .bind(invoice.total_net_grams)
        .bind(invoice.total_amount_paise)
        .bind(invoice.created_at)
        .execute(&mut *tx)
        .await?;

        let details = insert_details(&mut tx, &invoice.id, &req.details).await?;

        tx.commit().await?;

        info!(invoice_no = %invoice.invoice_no, "Invoice created");
        Ok(InvoiceWithDetails { invoice, details })
    }

    /// Gets an invoice with its lines, ordered by line number.
    pub async fn get_with_details(&self, invoice_no: &str) -> DbResult<InvoiceWithDetails> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_no = ?1",
        ))
        .bind(invoice_no)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Invoice", invoice_no))?;

        let details = sqlx::query_as::<_, InvoiceDetail>(
            "SELECT id, invoice_id, line_no, description, net_grams, rate_paise, amount_paise \
             FROM invoice_details WHERE invoice_id = ?1 ORDER BY line_no",
        )
        .bind(&invoice.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(InvoiceWithDetails { invoice, details })
    }

    /// Fully replaces an invoice's detail set along with the header totals;
    /// one transaction, rolled back whole on any reconciliation failure.
    pub async fn replace_details(
        &self,
        invoice_no: &str,
        update: InvoiceDetailsUpdate,
    ) -> DbResult<InvoiceWithDetails> {
        validate_lines(&update.details)?;

        let mut tx = self.pool.begin().await?;

        let invoice_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM invoices WHERE invoice_no = ?1")
                .bind(invoice_no)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(invoice_id) = invoice_id else {
            return Err(DbError::not_found("Invoice", invoice_no));
        };

        sqlx::query(
            "UPDATE invoices SET total_net_grams = ?2, total_amount_paise = ?3 WHERE id = ?1",
        )
        .bind(&invoice_id)
        .bind(update.total_net_grams)
        .bind(update.total_amount_paise)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM invoice_details WHERE invoice_id = ?1")
            .bind(&invoice_id)
            .execute(&mut *tx)
            .await?;

        insert_details(&mut tx, &invoice_id, &update.details).await?;

        reconcile(update.total_net_grams, update.total_amount_paise, &update.details)?;

        tx.commit().await?;

        info!(invoice_no = %invoice_no, "Invoice details replaced");
        self.get_with_details(invoice_no).await
    }
}

async fn insert_details(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    invoice_id: &str,
    lines: &[InvoiceLine],
) -> DbResult<Vec<InvoiceDetail>> {
    let mut details = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let detail = InvoiceDetail {
            id: Uuid::new_v4().to_string(),
            invoice_id: invoice_id.to_string(),
            line_no: (idx + 1) as i64,
            description: line.description.clone(),
            net_grams: line.net_grams,
            rate_paise: line.rate_paise,
            amount_paise: line.amount_paise,
        };

        sqlx::query(
            "INSERT INTO invoice_details \
             (id, invoice_id, line_no, description, net_grams, rate_paise, amount_paise) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&detail.id)
        .bind(&detail.invoice_id)
        .bind(detail.line_no)
        .bind(&detail.description)
        .bind(detail.net_grams)
        .bind(detail.rate_paise)
        .bind(detail.amount_paise)
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

    fn line(description: &str, net_grams: i64, rate_paise: i64) -> InvoiceLine {
        // Line amounts as the billing desk computes them: rate x nett kg
        let amount = Money::from_paise(rate_paise).for_weight(Weight::from_grams(net_grams));
        InvoiceLine {
            description: description.to_string(),
            net_grams,
            rate_paise,
            amount_paise: amount.paise(),
        }
    }

    fn request(lines: Vec<InvoiceLine>) -> InvoiceCreateRequest {
        let total_net = lines.iter().map(|l| l.net_grams).sum();
        let total_amount = lines.iter().map(|l| l.amount_paise).sum();
        InvoiceCreateRequest {
            invoice_no: "INV-24-0118".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
            party: "Sharda Traders".to_string(),
            total_net_grams: total_net,
            total_amount_paise: total_amount,
            details: lines,
        }
    }

    #[tokio::test]
    async fn test_create_reconciles_weight_and_amount() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let created = db
            .invoices()
            .create(request(vec![
                line("comber noil", 250_000, 3_500),
                line("flat strip", 100_000, 2_200),
            ]))
            .await
            .unwrap();

        assert_eq!(created.invoice.total_net_grams, 350_000);
        assert_eq!(created.details.len(), 2);
        assert_eq!(created.details[0].line_no, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_amount_mismatch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut req = request(vec![line("comber noil", 250_000, 3_500)]);
        req.total_amount_paise += 50;

        let err = db.invoices().create(req).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::AmountMismatch { .. })));
        assert!(db.invoices().get_with_details("INV-24-0118").await.is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_weight_mismatch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut req = request(vec![line("comber noil", 250_000, 3_500)]);
        req.total_net_grams -= 5_000;

        let err = db.invoices().create(req).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::WeightMismatch { .. })));
    }

    #[tokio::test]
    async fn test_replace_details_atomic() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();

        repo.create(request(vec![line("comber noil", 250_000, 3_500)])).await.unwrap();

        // A bad replacement rolls back header and lines together
        let bad = InvoiceDetailsUpdate {
            total_net_grams: 999_000,
            total_amount_paise: 1,
            details: vec![line("flat strip", 100_000, 2_200)],
        };
        assert!(repo.replace_details("INV-24-0118", bad).await.is_err());

        let current = repo.get_with_details("INV-24-0118").await.unwrap();
        assert_eq!(current.invoice.total_net_grams, 250_000);
        assert_eq!(current.details[0].description, "comber noil");

        // A reconciled replacement lands
        let new_lines = vec![line("flat strip", 100_000, 2_200), line("sweep waste", 50_000, 900)];
        let good = InvoiceDetailsUpdate {
            total_net_grams: new_lines.iter().map(|l| l.net_grams).sum(),
            total_amount_paise: new_lines.iter().map(|l| l.amount_paise).sum(),
            details: new_lines,
        };
        let replaced = repo.replace_details("INV-24-0118", good).await.unwrap();
        assert_eq!(replaced.details.len(), 2);
        assert_eq!(replaced.invoice.total_net_grams, 150_000);
    }
}
