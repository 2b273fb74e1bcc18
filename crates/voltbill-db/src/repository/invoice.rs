//! # Invoice Repository
//!
//! Database operations for monthly invoices.
//!
//! ## Key Operations
//! - CRUD keyed by UUID and by invoice number
//! - Period and customer listings
//! - Payment lifecycle (`mark_paid`, unpaid and overdue lists)
//! - The aggregations behind the statistics screens: revenue and
//!   consumption per month and per year, and per-customer totals with
//!   outstanding debt
//!
//! Revenue aggregates **paid** invoices only; consumption aggregates every
//! invoice of the period, paid or not, with the same `max(0, end - start)`
//! clamp the billing math uses.

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use voltbill_core::Invoice;

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

/// Columns selected for every invoice query, in `Invoice` field order.
const INVOICE_COLUMNS: &str = "id, invoice_no, customer_id, month, year, start_reading, \
     end_reading, amount_dong, is_paid, paid_at, created_at, updated_at";

// =============================================================================
// Statistics Row Types
// =============================================================================

/// Revenue collected in one month of a year.
///
/// Serializable: report exporters consume these rows directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MonthlyRevenue {
    /// Month 1-12.
    pub month: u32,

    /// Total of paid invoice amounts, in đồng.
    pub total_dong: i64,

    /// Number of paid invoices.
    pub invoice_count: i64,
}

/// Electricity delivered in one month of a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MonthlyConsumption {
    /// Month 1-12.
    pub month: u32,

    /// Total consumption in kWh across all invoices of the month.
    pub total_kwh: i64,
}

/// Per-customer rollup across all of a customer's invoices.
///
/// `unpaid_dong` is the customer's outstanding debt - the view the
/// debt-collection screens sort by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CustomerTotal {
    /// Customer this rollup belongs to (UUID).
    pub customer_id: String,

    /// Number of invoices issued to the customer.
    pub invoice_count: i64,

    /// Total consumption in kWh, with the same clamp billing uses.
    pub total_kwh: i64,

    /// Total billed amount in đồng, paid or not.
    pub billed_dong: i64,

    /// Total of unpaid invoice amounts in đồng.
    pub unpaid_dong: i64,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    /// Gets an invoice by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1");

        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }

    /// Gets an invoice by its business number (e.g., "HD202305-0001").
    pub async fn get_by_invoice_no(&self, invoice_no: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_no = ?1");

        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_no)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }

    /// Inserts a new invoice.
    ///
    /// ## Returns
    /// * `Ok(Invoice)` - Inserted invoice
    /// * `Err(DbError::UniqueViolation)` - Duplicate invoice number, or the
    ///   customer already has an invoice for this period
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown customer
    pub async fn insert(&self, invoice: &Invoice) -> DbResult<Invoice> {
        debug!(invoice_no = %invoice.invoice_no, "Inserting invoice");

        sqlx::query(
            "INSERT INTO invoices (
                id, invoice_no, customer_id, month, year,
                start_reading, end_reading, amount_dong,
                is_paid, paid_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_no)
        .bind(&invoice.customer_id)
        .bind(invoice.month)
        .bind(invoice.year)
        .bind(invoice.start_reading)
        .bind(invoice.end_reading)
        .bind(invoice.amount_dong)
        .bind(invoice.is_paid)
        .bind(invoice.paid_at)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(invoice.clone())
    }

    /// Updates an invoice's readings and amount.
    ///
    /// Payment state is managed through [`mark_paid`](Self::mark_paid), not
    /// here.
    pub async fn update(&self, invoice: &Invoice) -> DbResult<()> {
        debug!(id = %invoice.id, "Updating invoice");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE invoices SET
                month = ?2,
                year = ?3,
                start_reading = ?4,
                end_reading = ?5,
                amount_dong = ?6,
                updated_at = ?7
             WHERE id = ?1",
        )
        .bind(&invoice.id)
        .bind(invoice.month)
        .bind(invoice.year)
        .bind(invoice.start_reading)
        .bind(invoice.end_reading)
        .bind(invoice.amount_dong)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", &invoice.id));
        }

        Ok(())
    }

    /// Deletes an invoice.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting invoice");

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Lists all invoices of a customer, newest period first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS}
             FROM invoices
             WHERE customer_id = ?1
             ORDER BY year DESC, month DESC"
        );

        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// Lists all invoices of a billing period.
    pub async fn list_for_period(&self, month: u32, year: i32) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS}
             FROM invoices
             WHERE month = ?1 AND year = ?2
             ORDER BY invoice_no"
        );

        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(month)
            .bind(year)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// Lists all unpaid invoices, oldest period first.
    pub async fn list_unpaid(&self) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS}
             FROM invoices
             WHERE is_paid = 0
             ORDER BY year, month, invoice_no"
        );

        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// Lists unpaid invoices issued more than `days` days ago.
    ///
    /// This is the debt-collection view: invoices that have sat unpaid past
    /// the grace period.
    pub async fn list_overdue(&self, days: i64) -> DbResult<Vec<Invoice>> {
        let cutoff = Utc::now() - Duration::days(days);

        let sql = format!(
            "SELECT {INVOICE_COLUMNS}
             FROM invoices
             WHERE is_paid = 0 AND created_at <= ?1
             ORDER BY created_at"
        );

        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    // =========================================================================
    // Payment Lifecycle
    // =========================================================================

    /// Marks an invoice as paid.
    ///
    /// Idempotent: the first call stamps `paid_at`, later calls keep the
    /// original payment date.
    pub async fn mark_paid(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Marking invoice paid");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE invoices SET
                is_paid = 1,
                paid_at = COALESCE(paid_at, ?2),
                updated_at = ?2
             WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Revenue collected for one billing period, in đồng.
    pub async fn period_revenue(&self, month: u32, year: i32) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_dong), 0)
             FROM invoices
             WHERE is_paid = 1 AND month = ?1 AND year = ?2",
        )
        .bind(month)
        .bind(year)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Revenue collected per month of a year.
    ///
    /// Months with no paid invoices are absent from the result.
    pub async fn revenue_by_month(&self, year: i32) -> DbResult<Vec<MonthlyRevenue>> {
        let rows = sqlx::query_as::<_, MonthlyRevenue>(
            "SELECT month,
                    COALESCE(SUM(amount_dong), 0) AS total_dong,
                    COUNT(*) AS invoice_count
             FROM invoices
             WHERE is_paid = 1 AND year = ?1
             GROUP BY month
             ORDER BY month",
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Consumption delivered in one billing period, in kWh.
    ///
    /// Uses the same clamp as billing: a period with end below start counts
    /// as zero, not negative.
    pub async fn period_consumption(&self, month: u32, year: i32) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(MAX(end_reading - start_reading, 0)), 0)
             FROM invoices
             WHERE month = ?1 AND year = ?2",
        )
        .bind(month)
        .bind(year)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Consumption per month of a year.
    pub async fn consumption_by_month(&self, year: i32) -> DbResult<Vec<MonthlyConsumption>> {
        let rows = sqlx::query_as::<_, MonthlyConsumption>(
            "SELECT month,
                    COALESCE(SUM(MAX(end_reading - start_reading, 0)), 0) AS total_kwh
             FROM invoices
             WHERE year = ?1
             GROUP BY month
             ORDER BY month",
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Per-customer totals across all invoices, heaviest debtors first.
    ///
    /// Customers with no invoices are absent from the result.
    pub async fn customer_totals(&self) -> DbResult<Vec<CustomerTotal>> {
        let rows = sqlx::query_as::<_, CustomerTotal>(
            "SELECT customer_id,
                    COUNT(*) AS invoice_count,
                    COALESCE(SUM(MAX(end_reading - start_reading, 0)), 0) AS total_kwh,
                    COALESCE(SUM(amount_dong), 0) AS billed_dong,
                    COALESCE(SUM(CASE WHEN is_paid = 0 THEN amount_dong END), 0) AS unpaid_dong
             FROM invoices
             GROUP BY customer_id
             ORDER BY unpaid_dong DESC, customer_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// The rollup for a single customer.
    ///
    /// ## Returns
    /// * `Ok(Some(CustomerTotal))` - the customer has invoices
    /// * `Ok(None)` - no invoices on file
    pub async fn total_for_customer(&self, customer_id: &str) -> DbResult<Option<CustomerTotal>> {
        let row = sqlx::query_as::<_, CustomerTotal>(
            "SELECT customer_id,
                    COUNT(*) AS invoice_count,
                    COALESCE(SUM(MAX(end_reading - start_reading, 0)), 0) AS total_kwh,
                    COALESCE(SUM(amount_dong), 0) AS billed_dong,
                    COALESCE(SUM(CASE WHEN is_paid = 0 THEN amount_dong END), 0) AS unpaid_dong
             FROM invoices
             WHERE customer_id = ?1
             GROUP BY customer_id",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Counts all invoices (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new invoice ID.
pub fn generate_invoice_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::generate_customer_id;
    use voltbill_core::Customer;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_customer(db: &Database) -> Customer {
        seed_customer_with_code(db, "KH0001").await
    }

    async fn seed_customer_with_code(db: &Database, code: &str) -> Customer {
        let now = Utc::now();
        let customer = Customer {
            id: generate_customer_id(),
            code: code.to_string(),
            full_name: "Nguyen Van An".to_string(),
            address: "12 Tran Hung Dao, Ha Noi".to_string(),
            phone: "0912345678".to_string(),
            meter_serial: format!("CT-{code}"),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.customers().insert(&customer).await.unwrap()
    }

    fn invoice(customer_id: &str, month: u32, year: i32, start: i64, end: i64) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: generate_invoice_id(),
            invoice_no: format!("HD{year}{month:02}-{}", &Uuid::new_v4().to_string()[..8]),
            customer_id: customer_id.to_string(),
            month,
            year,
            start_reading: start,
            end_reading: end,
            amount_dong: None,
            is_paid: false,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let customer = seed_customer(&db).await;
        let repo = db.invoices();

        let inv = repo
            .insert(&invoice(&customer.id, 5, 2023, 1200, 1350))
            .await
            .unwrap();

        let by_id = repo.get_by_id(&inv.id).await.unwrap().unwrap();
        assert_eq!(by_id.consumption_kwh(), 150);

        let by_no = repo.get_by_invoice_no(&inv.invoice_no).await.unwrap().unwrap();
        assert_eq!(by_no.id, inv.id);
    }

    #[tokio::test]
    async fn test_one_invoice_per_customer_per_period() {
        let db = test_db().await;
        let customer = seed_customer(&db).await;
        let repo = db.invoices();

        repo.insert(&invoice(&customer.id, 5, 2023, 0, 100)).await.unwrap();
        let err = repo
            .insert(&invoice(&customer.id, 5, 2023, 100, 200))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected() {
        let db = test_db().await;
        let repo = db.invoices();

        let err = repo
            .insert(&invoice("no-such-customer", 5, 2023, 0, 100))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_mark_paid_is_idempotent() {
        let db = test_db().await;
        let customer = seed_customer(&db).await;
        let repo = db.invoices();

        let inv = repo.insert(&invoice(&customer.id, 5, 2023, 0, 100)).await.unwrap();
        assert_eq!(repo.list_unpaid().await.unwrap().len(), 1);

        repo.mark_paid(&inv.id).await.unwrap();
        let paid = repo.get_by_id(&inv.id).await.unwrap().unwrap();
        assert!(paid.is_paid);
        let first_paid_at = paid.paid_at.unwrap();

        repo.mark_paid(&inv.id).await.unwrap();
        let again = repo.get_by_id(&inv.id).await.unwrap().unwrap();
        assert_eq!(again.paid_at.unwrap(), first_paid_at);

        assert!(repo.list_unpaid().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overdue_respects_grace_period() {
        let db = test_db().await;
        let customer = seed_customer(&db).await;
        let repo = db.invoices();

        let mut old = invoice(&customer.id, 3, 2023, 0, 100);
        old.created_at = Utc::now() - Duration::days(60);
        repo.insert(&old).await.unwrap();

        repo.insert(&invoice(&customer.id, 5, 2023, 100, 200)).await.unwrap();

        let overdue = repo.list_overdue(30).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, old.id);

        // Everything is overdue with a zero-day grace period
        assert_eq!(repo.list_overdue(0).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_revenue_counts_paid_only() {
        let db = test_db().await;
        let customer = seed_customer(&db).await;
        let repo = db.invoices();

        let mut may = invoice(&customer.id, 5, 2023, 0, 100);
        may.amount_dong = Some(229_075);
        let may = repo.insert(&may).await.unwrap();
        repo.mark_paid(&may.id).await.unwrap();

        let mut june = invoice(&customer.id, 6, 2023, 100, 250);
        june.amount_dong = Some(352_935);
        repo.insert(&june).await.unwrap();

        // June is unpaid, so only May shows up
        assert_eq!(repo.period_revenue(5, 2023).await.unwrap(), 229_075);
        assert_eq!(repo.period_revenue(6, 2023).await.unwrap(), 0);

        let by_month = repo.revenue_by_month(2023).await.unwrap();
        assert_eq!(
            by_month,
            vec![MonthlyRevenue {
                month: 5,
                total_dong: 229_075,
                invoice_count: 1,
            }]
        );
    }

    #[tokio::test]
    async fn test_consumption_clamps_negative_periods() {
        let db = test_db().await;
        let customer = seed_customer(&db).await;
        let repo = db.invoices();

        repo.insert(&invoice(&customer.id, 5, 2023, 0, 150)).await.unwrap();

        // Meter swapped: end below start, counts as zero
        let mut swapped = invoice(&customer.id, 6, 2023, 500, 100);
        swapped.invoice_no = "HD202306-SWAP".to_string();
        repo.insert(&swapped).await.unwrap();

        assert_eq!(repo.period_consumption(5, 2023).await.unwrap(), 150);
        assert_eq!(repo.period_consumption(6, 2023).await.unwrap(), 0);

        let by_month = repo.consumption_by_month(2023).await.unwrap();
        assert_eq!(
            by_month,
            vec![
                MonthlyConsumption { month: 5, total_kwh: 150 },
                MonthlyConsumption { month: 6, total_kwh: 0 },
            ]
        );
    }

    #[tokio::test]
    async fn test_customer_totals_roll_up_debt() {
        let db = test_db().await;
        let an = seed_customer_with_code(&db, "KH0001").await;
        let binh = seed_customer_with_code(&db, "KH0002").await;
        let repo = db.invoices();

        // An: 100 kWh paid, 150 kWh unpaid
        let mut paid = invoice(&an.id, 4, 2023, 0, 100);
        paid.amount_dong = Some(229_075);
        let paid = repo.insert(&paid).await.unwrap();
        repo.mark_paid(&paid.id).await.unwrap();

        let mut owed = invoice(&an.id, 5, 2023, 100, 250);
        owed.amount_dong = Some(352_935);
        repo.insert(&owed).await.unwrap();

        // Binh: one small unpaid invoice
        let mut small = invoice(&binh.id, 5, 2023, 0, 30);
        small.amount_dong = Some(65_505);
        repo.insert(&small).await.unwrap();

        let totals = repo.customer_totals().await.unwrap();
        assert_eq!(
            totals,
            vec![
                CustomerTotal {
                    customer_id: an.id.clone(),
                    invoice_count: 2,
                    total_kwh: 250,
                    billed_dong: 229_075 + 352_935,
                    unpaid_dong: 352_935,
                },
                CustomerTotal {
                    customer_id: binh.id.clone(),
                    invoice_count: 1,
                    total_kwh: 30,
                    billed_dong: 65_505,
                    unpaid_dong: 65_505,
                },
            ]
        );

        let an_total = repo.total_for_customer(&an.id).await.unwrap().unwrap();
        assert_eq!(an_total.unpaid_dong, 352_935);

        // No invoices on file yet
        assert!(repo.total_for_customer("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listings() {
        let db = test_db().await;
        let customer = seed_customer(&db).await;
        let repo = db.invoices();

        repo.insert(&invoice(&customer.id, 4, 2023, 0, 50)).await.unwrap();
        repo.insert(&invoice(&customer.id, 5, 2023, 50, 120)).await.unwrap();

        let for_customer = repo.list_for_customer(&customer.id).await.unwrap();
        assert_eq!(for_customer.len(), 2);
        // Newest period first
        assert_eq!(for_customer[0].month, 5);

        let for_period = repo.list_for_period(4, 2023).await.unwrap();
        assert_eq!(for_period.len(), 1);
        assert_eq!(for_period[0].consumption_kwh(), 50);
    }
}
