//! # Issue Repository
//!
//! The allocation transaction: consuming weighed bales toward a mixing.
//!
//! ## Allocation Flow
//! ```text
//! create(request)
//!      │ validate (pure, before any I/O)
//!      ▼
//! ┌──────────────────── ONE TRANSACTION ─────────────────────┐
//! │ 1. mint issue number (unless the request carries one)    │
//! │ 2. INSERT issue header, issue_qty = items.len()          │
//! │ 3. for each item, in input order:                        │
//! │    a. load the weightment          missing → NotFound    │
//! │    b. already issued?              yes → AlreadyIssued   │
//! │    c. INSERT issue_item                                  │
//! │    d. UPDATE .. SET issued = 1                           │
//! │       WHERE id = ? AND issued = 0                        │
//! │       0 rows → AlreadyIssued (lost the race)             │
//! │ 4. COMMIT                                                │
//! └──────────────────────────────────────────────────────────┘
//!      │ any error above rolls the whole batch back:
//!      ▼ partial allocation is never observable
//! ```
//!
//! Two transactions racing for the same bale serialize on the row write; the
//! loser re-reads `issued = 1` (or hits the guarded update with zero rows)
//! and fails cleanly. The UNIQUE constraint on `issue_items.weightment_id`
//! backstops the same guarantee at the schema level.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::sequence::next_document_number;
use weft_core::fiscal::DocumentFamily;
use weft_core::types::{Issue, IssueCreateRequest, IssueItem, IssueWithItems, Weightment};
use weft_core::validation::validate_issue_request;
use weft_core::CoreError;

const ISSUE_COLUMNS: &str =
    "id, issue_no, issue_date, mixing_group_id, to_mixing_group_id, issue_qty, created_at";

/// Repository for issue (allocation) operations.
#[derive(Debug, Clone)]
pub struct IssueRepository {
    pool: SqlitePool,
}

impl IssueRepository {
    /// Creates a new IssueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        IssueRepository { pool }
    }

    /// Creates an issue, allocating every referenced weightment exactly
    /// once, all inside one transaction.
    ///
    /// The whole batch is rejected - and nothing committed - if any
    /// referenced weightment is missing or already issued. On success every
    /// referenced bale is permanently unavailable for re-allocation.
    pub async fn create(&self, req: IssueCreateRequest) -> DbResult<IssueWithItems> {
        validate_issue_request(&req).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let issue_no = match &req.issue_number {
            Some(no) => no.clone(),
            None => next_document_number(&mut *tx, DocumentFamily::Issue, req.issue_date).await?,
        };

        let now = Utc::now();
        let issue = Issue {
            id: Uuid::new_v4().to_string(),
            issue_no: issue_no.clone(),
            issue_date: req.issue_date,
            mixing_group_id: req.mixing_group_id.clone(),
            to_mixing_group_id: req.to_mixing_group_id.clone(),
            issue_qty: req.items.len() as i64,
            created_at: now,
        };

        debug!(issue_no = %issue.issue_no, items = req.items.len(), "Inserting issue header");

        sqlx::query(
            r#"
            INSERT INTO issues (
                id, issue_no, issue_date,
                mixing_group_id, to_mixing_group_id,
                issue_qty, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&issue.id)
        .bind(&issue.issue_no)
        .bind(issue.issue_date)
        .bind(&issue.mixing_group_id)
        .bind(&issue.to_mixing_group_id)
        .bind(issue.issue_qty)
        .bind(issue.created_at)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(req.items.len());

        for item in &req.items {
            // Load within the transaction: the latest committed state,
            // invisible to concurrent allocations until we commit.
            let weightment = sqlx::query_as::<_, Weightment>(
                "SELECT id, lot_no, bale_no, serial, gross_grams, tare_grams, net_grams, \
                 value_paise, issued, created_at FROM weightments WHERE id = ?1",
            )
            .bind(&item.weightment_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Weightment", &item.weightment_id))?;

            if weightment.issued {
                return Err(DbError::AlreadyIssued {
                    bale_no: weightment.bale_no,
                });
            }

            let issue_item = IssueItem {
                id: Uuid::new_v4().to_string(),
                issue_id: issue.id.clone(),
                weightment_id: weightment.id.clone(),
                issue_grams: item.issue_weight_grams,
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO issue_items (id, issue_id, weightment_id, issue_grams, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&issue_item.id)
            .bind(&issue_item.issue_id)
            .bind(&issue_item.weightment_id)
            .bind(issue_item.issue_grams)
            .bind(issue_item.created_at)
            .execute(&mut *tx)
            .await?;

            // Guarded flip: zero rows affected means another transaction
            // consumed the bale between our read and this write.
            let flipped = sqlx::query(
                "UPDATE weightments SET issued = 1 WHERE id = ?1 AND issued = 0",
            )
            .bind(&weightment.id)
            .execute(&mut *tx)
            .await?;

            if flipped.rows_affected() == 0 {
                return Err(DbError::AlreadyIssued {
                    bale_no: weightment.bale_no,
                });
            }

            items.push(issue_item);
        }

        tx.commit().await?;

        info!(issue_no = %issue.issue_no, qty = issue.issue_qty, "Issue created");
        Ok(IssueWithItems { issue, items })
    }

    /// Gets an issue with its lines, in allocation order.
    pub async fn get_with_items(&self, issue_no: &str) -> DbResult<IssueWithItems> {
        let issue = sqlx::query_as::<_, Issue>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE issue_no = ?1",
        ))
        .bind(issue_no)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Issue", issue_no))?;

        // rowid reflects insertion order, which is the allocation order
        let items = sqlx::query_as::<_, IssueItem>(
            "SELECT id, issue_id, weightment_id, issue_grams, created_at \
             FROM issue_items WHERE issue_id = ?1 ORDER BY rowid",
        )
        .bind(&issue.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(IssueWithItems { issue, items })
    }

    /// Lists issue headers, newest numbers first.
    pub async fn list(&self) -> DbResult<Vec<Issue>> {
        let issues = sqlx::query_as::<_, Issue>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM issues ORDER BY issue_no DESC",
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(issues)
    }

    /// Deletes an issue.
    ///
    /// Forbidden once the issue has any line: allocation is a physical
    /// consumption event, and deleting the document would strand the
    /// referenced bales in the issued state with nothing explaining why.
    pub async fn delete(&self, issue_no: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let issue_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM issues WHERE issue_no = ?1")
                .bind(issue_no)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(issue_id) = issue_id else {
            return Err(DbError::not_found("Issue", issue_no));
        };

        let items: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM issue_items WHERE issue_id = ?1")
                .bind(&issue_id)
                .fetch_one(&mut *tx)
                .await?;
        if items > 0 {
            return Err(DbError::IssueHasItems {
                issue_no: issue_no.to_string(),
                items,
            });
        }

        sqlx::query("DELETE FROM issues WHERE id = ?1")
            .bind(&issue_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(issue_no = %issue_no, "Issue deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
