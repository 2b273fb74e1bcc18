//! # Customer Repository
//!
//! Database operations for customers.
//!
//! ## Key Operations
//! - CRUD with soft delete
//! - Substring search over code, name, address, and meter serial
//!
//! Search is a `LIKE` scan: a local billing office manages thousands of
//! customers, not millions, and the scan stays well under a millisecond at
//! that scale.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use voltbill_core::Customer;

/// Repository for customer database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = CustomerRepository::new(pool);
///
/// let results = repo.search("an", 20).await?;
/// let customer = repo.get_by_code("KH0042").await?;
/// ```
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

/// Columns selected for every customer query, in `Customer` field order.
const CUSTOMER_COLUMNS: &str =
    "id, code, full_name, address, phone, meter_serial, is_active, created_at, updated_at";

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Searches active customers by substring.
    ///
    /// Matches against code, full name, address, and meter serial. An empty
    /// query lists active customers ordered by code.
    ///
    /// ## Arguments
    /// * `query` - Search term (can be partial, case-insensitive for ASCII)
    /// * `limit` - Maximum results to return
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching customers");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("%{}%", query);

        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS}
             FROM customers
             WHERE is_active = 1
               AND (code LIKE ?1 OR full_name LIKE ?1 OR address LIKE ?1 OR meter_serial LIKE ?1)
             ORDER BY code
             LIMIT ?2"
        );

        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = customers.len(), "Search returned customers");
        Ok(customers)
    }

    /// Lists active customers ordered by code.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Customer>> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS}
             FROM customers
             WHERE is_active = 1
             ORDER BY code
             LIMIT ?1"
        );

        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Gets a customer by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Customer))` - Customer found
    /// * `Ok(None)` - Customer not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Gets a customer by its business code (e.g., "KH0042").
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE code = ?1");

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Inserts a new customer.
    ///
    /// ## Returns
    /// * `Ok(Customer)` - Inserted customer
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    pub async fn insert(&self, customer: &Customer) -> DbResult<Customer> {
        debug!(code = %customer.code, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers (
                id, code, full_name, address, phone, meter_serial,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&customer.id)
        .bind(&customer.code)
        .bind(&customer.full_name)
        .bind(&customer.address)
        .bind(&customer.phone)
        .bind(&customer.meter_serial)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer.clone())
    }

    /// Updates an existing customer.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Customer doesn't exist
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Updating customer");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE customers SET
                code = ?2,
                full_name = ?3,
                address = ?4,
                phone = ?5,
                meter_serial = ?6,
                is_active = ?7,
                updated_at = ?8
             WHERE id = ?1",
        )
        .bind(&customer.id)
        .bind(&customer.code)
        .bind(&customer.full_name)
        .bind(&customer.address)
        .bind(&customer.phone)
        .bind(&customer.meter_serial)
        .bind(customer.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Soft-deletes a customer by setting is_active = false.
    ///
    /// Historical invoices keep referencing the row, so customers are never
    /// hard-deleted.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting customer");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE customers SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Counts active customers (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new customer ID.
pub fn generate_customer_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn customer(code: &str, name: &str) -> Customer {
        let now = Utc::now();
        Customer {
            id: generate_customer_id(),
            code: code.to_string(),
            full_name: name.to_string(),
            address: "12 Tran Hung Dao, Ha Noi".to_string(),
            phone: "0912345678".to_string(),
            meter_serial: format!("CT-{code}"),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.customers();

        let inserted = repo.insert(&customer("KH0001", "Nguyen Van An")).await.unwrap();

        let by_id = repo.get_by_id(&inserted.id).await.unwrap().unwrap();
        assert_eq!(by_id.code, "KH0001");

        let by_code = repo.get_by_code("KH0001").await.unwrap().unwrap();
        assert_eq!(by_code.id, inserted.id);

        assert!(repo.get_by_code("KH9999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = test_db().await;
        let repo = db.customers();

        repo.insert(&customer("KH0001", "Nguyen Van An")).await.unwrap();
        let err = repo.insert(&customer("KH0001", "Tran Thi Binh")).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_search_matches_name_and_meter() {
        let db = test_db().await;
        let repo = db.customers();

        repo.insert(&customer("KH0001", "Nguyen Van An")).await.unwrap();
        repo.insert(&customer("KH0002", "Tran Thi Binh")).await.unwrap();

        let hits = repo.search("Binh", 20).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "KH0002");

        // Meter serial carries the code, so this matches one row
        let hits = repo.search("CT-KH0001", 20).await.unwrap();
        assert_eq!(hits.len(), 1);

        // Empty query lists everyone
        let hits = repo.search("", 20).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_search() {
        let db = test_db().await;
        let repo = db.customers();

        let c = repo.insert(&customer("KH0001", "Nguyen Van An")).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);

        repo.soft_delete(&c.id).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.search("An", 20).await.unwrap().is_empty());
        // Still reachable by id for historical invoices
        assert!(repo.get_by_id(&c.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update() {
        let db = test_db().await;
        let repo = db.customers();

        let mut c = repo.insert(&customer("KH0001", "Nguyen Van An")).await.unwrap();
        c.address = "45 Le Loi, Da Nang".to_string();
        repo.update(&c).await.unwrap();

        let reloaded = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(reloaded.address, "45 Le Loi, Da Nang");

        c.id = "missing".to_string();
        assert!(matches!(
            repo.update(&c).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
