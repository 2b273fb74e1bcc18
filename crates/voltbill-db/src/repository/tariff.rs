//! # Tariff Schedule Repository
//!
//! Storage for tariff schedules - the pricing tables the billing engine
//! computes against.
//!
//! ## Storage Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  tariff_schedules                                                   │
//! │                                                                     │
//! │  code      valid_from   vat_bps  bands (JSON)            is_active  │
//! │  ────────  ───────────  ───────  ──────────────────────  ─────────  │
//! │  BG2023    2023-05-04   1000     [{"ceiling":50,...},    1          │
//! │                                   ...,                              │
//! │                                   {"ceiling":null,...}]             │
//! │  BG2019    2019-03-20   1000     [...]                   0          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exactly one schedule is active at a time; [`TariffRepository::set_active`]
//! swaps the flag transactionally. Band lists persist as JSON with a `null`
//! ceiling marking the unbounded top band.
//!
//! A record is turned back into a validated
//! [`TariffSchedule`](voltbill_core::TariffSchedule) with
//! [`TariffRecord::schedule`]; malformed stored data surfaces the core's
//! construction error instead of silently producing wrong bills.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use voltbill_core::{PriceBand, TariffSchedule, VatRate};

// =============================================================================
// Tariff Record
// =============================================================================

/// A stored tariff schedule: pricing data plus catalog metadata.
///
/// The record is the persistence shape; the computation core only ever sees
/// the validated [`TariffSchedule`] produced by [`schedule`](Self::schedule).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TariffRecord {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Schedule code - business identifier, e.g. "BG2023".
    pub code: String,

    /// First day the schedule applies.
    pub valid_from: DateTime<Utc>,

    /// VAT rate in basis points (1000 = 10%).
    pub vat_bps: u32,

    /// JSON array of price bands; `null` ceiling = unbounded top band.
    pub bands: String,

    /// Whether this is the currently applied schedule.
    pub is_active: bool,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl TariffRecord {
    /// Builds a record from an already-validated schedule.
    ///
    /// Going through [`TariffSchedule`] first means a record written by this
    /// constructor always parses back cleanly.
    pub fn from_schedule(
        code: impl Into<String>,
        valid_from: DateTime<Utc>,
        schedule: &TariffSchedule,
    ) -> DbResult<Self> {
        let bands = serde_json::to_string(schedule.bands())
            .map_err(|e| DbError::Internal(e.to_string()))?;

        let now = Utc::now();
        Ok(TariffRecord {
            id: generate_schedule_id(),
            code: code.into(),
            valid_from,
            vat_bps: schedule.vat().bps(),
            bands,
            is_active: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs the validated schedule from the stored band data.
    ///
    /// ## Errors
    /// * [`DbError::BandDataCorrupt`] - the band column is not valid JSON
    /// * [`DbError::InvalidSchedule`] - bands parse but violate the schedule
    ///   invariants (carries the typed core error)
    pub fn schedule(&self) -> DbResult<TariffSchedule> {
        let bands: Vec<PriceBand> =
            serde_json::from_str(&self.bands).map_err(|e| DbError::BandDataCorrupt {
                code: self.code.clone(),
                reason: e.to_string(),
            })?;

        TariffSchedule::new(bands, VatRate::from_bps(self.vat_bps)).map_err(|source| {
            DbError::InvalidSchedule {
                code: self.code.clone(),
                source,
            }
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for tariff schedule storage.
#[derive(Debug, Clone)]
pub struct TariffRepository {
    pool: SqlitePool,
}

/// Columns selected for every schedule query, in `TariffRecord` field order.
const TARIFF_COLUMNS: &str =
    "id, code, valid_from, vat_bps, bands, is_active, created_at, updated_at";

impl TariffRepository {
    /// Creates a new TariffRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TariffRepository { pool }
    }

    /// Gets a schedule record by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<TariffRecord>> {
        let sql = format!("SELECT {TARIFF_COLUMNS} FROM tariff_schedules WHERE id = ?1");

        let record = sqlx::query_as::<_, TariffRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Gets a schedule record by its business code (e.g., "BG2023").
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<TariffRecord>> {
        let sql = format!("SELECT {TARIFF_COLUMNS} FROM tariff_schedules WHERE code = ?1");

        let record = sqlx::query_as::<_, TariffRecord>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Lists all schedule records, newest first.
    pub async fn list(&self) -> DbResult<Vec<TariffRecord>> {
        let sql = format!(
            "SELECT {TARIFF_COLUMNS}
             FROM tariff_schedules
             ORDER BY valid_from DESC"
        );

        let records = sqlx::query_as::<_, TariffRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Inserts a new schedule record.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    pub async fn insert(&self, record: &TariffRecord) -> DbResult<TariffRecord> {
        debug!(code = %record.code, "Inserting tariff schedule");

        sqlx::query(
            "INSERT INTO tariff_schedules (
                id, code, valid_from, vat_bps, bands,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&record.id)
        .bind(&record.code)
        .bind(record.valid_from)
        .bind(record.vat_bps)
        .bind(&record.bands)
        .bind(record.is_active)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(record.clone())
    }

    /// The currently applied schedule record, if any.
    pub async fn active(&self) -> DbResult<Option<TariffRecord>> {
        let sql = format!(
            "SELECT {TARIFF_COLUMNS}
             FROM tariff_schedules
             WHERE is_active = 1
             LIMIT 1"
        );

        let record = sqlx::query_as::<_, TariffRecord>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Loads the currently applied schedule, validated and ready to compute.
    ///
    /// Convenience over [`active`](Self::active) for billing call sites.
    pub async fn load_active_schedule(&self) -> DbResult<Option<TariffSchedule>> {
        match self.active().await? {
            Some(record) => Ok(Some(record.schedule()?)),
            None => Ok(None),
        }
    }

    /// Makes `id` the single active schedule.
    ///
    /// Runs in a transaction: the previous active flag is cleared and the
    /// new one set atomically, so there is never zero or two active
    /// schedules visible to readers.
    pub async fn set_active(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let now = Utc::now();

        sqlx::query(
            "UPDATE tariff_schedules SET is_active = 0, updated_at = ?1 WHERE is_active = 1",
        )
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            "UPDATE tariff_schedules SET is_active = 1, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Rolls back on drop; the previous active schedule stays active
            return Err(DbError::not_found("TariffSchedule", id));
        }

        tx.commit().await?;

        info!(id = %id, "Tariff schedule activated");
        Ok(())
    }

    /// Counts stored schedules (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tariff_schedules")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new schedule ID.
pub fn generate_schedule_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use voltbill_core::{CoreError, Money};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn residential() -> TariffSchedule {
        TariffSchedule::new(
            vec![
                PriceBand::bounded(50, Money::from_dong(1985)),
                PriceBand::bounded(100, Money::from_dong(2051)),
                PriceBand::bounded(200, Money::from_dong(2381)),
                PriceBand::bounded(300, Money::from_dong(2999)),
                PriceBand::bounded(400, Money::from_dong(3351)),
                PriceBand::unbounded(Money::from_dong(3461)),
            ],
            VatRate::from_bps(1000),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_schedule_roundtrip() {
        let db = test_db().await;
        let repo = db.tariffs();

        let schedule = residential();
        let record = TariffRecord::from_schedule("BG2023", Utc::now(), &schedule).unwrap();
        repo.insert(&record).await.unwrap();

        let loaded = repo.get_by_code("BG2023").await.unwrap().unwrap();
        assert_eq!(loaded.schedule().unwrap(), schedule);

        // The reloaded schedule still computes correctly
        assert_eq!(loaded.schedule().unwrap().compute(30).unwrap().dong(), 65_505);
    }

    #[tokio::test]
    async fn test_set_active_swaps_atomically() {
        let db = test_db().await;
        let repo = db.tariffs();

        let a = TariffRecord::from_schedule("BG2019", Utc::now(), &residential()).unwrap();
        let b = TariffRecord::from_schedule("BG2023", Utc::now(), &residential()).unwrap();
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        assert!(repo.active().await.unwrap().is_none());

        repo.set_active(&a.id).await.unwrap();
        assert_eq!(repo.active().await.unwrap().unwrap().code, "BG2019");

        repo.set_active(&b.id).await.unwrap();
        let active = repo.active().await.unwrap().unwrap();
        assert_eq!(active.code, "BG2023");

        // Exactly one active row
        let active_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tariff_schedules WHERE is_active = 1")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(active_count, 1);
    }

    #[tokio::test]
    async fn test_set_active_unknown_id_keeps_current() {
        let db = test_db().await;
        let repo = db.tariffs();

        let a = TariffRecord::from_schedule("BG2023", Utc::now(), &residential()).unwrap();
        repo.insert(&a).await.unwrap();
        repo.set_active(&a.id).await.unwrap();

        let err = repo.set_active("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        // The failed swap rolled back; BG2023 is still active
        assert_eq!(repo.active().await.unwrap().unwrap().code, "BG2023");
    }

    #[tokio::test]
    async fn test_load_active_schedule() {
        let db = test_db().await;
        let repo = db.tariffs();

        assert!(repo.load_active_schedule().await.unwrap().is_none());

        let record = TariffRecord::from_schedule("BG2023", Utc::now(), &residential()).unwrap();
        repo.insert(&record).await.unwrap();
        repo.set_active(&record.id).await.unwrap();

        let schedule = repo.load_active_schedule().await.unwrap().unwrap();
        assert_eq!(schedule.compute(150).unwrap().dong(), 352_935);
    }

    #[tokio::test]
    async fn test_corrupt_band_json_is_reported() {
        let record = TariffRecord {
            id: generate_schedule_id(),
            code: "BAD".to_string(),
            valid_from: Utc::now(),
            vat_bps: 1000,
            bands: "not json".to_string(),
            is_active: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(matches!(
            record.schedule().unwrap_err(),
            DbError::BandDataCorrupt { .. }
        ));
    }

    #[tokio::test]
    async fn test_invalid_stored_schedule_carries_core_error() {
        // Parses as JSON but the top band is bounded
        let record = TariffRecord {
            id: generate_schedule_id(),
            code: "BAD".to_string(),
            valid_from: Utc::now(),
            vat_bps: 1000,
            bands: r#"[{"ceiling":50,"unit_price":1985}]"#.to_string(),
            is_active: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        match record.schedule().unwrap_err() {
            DbError::InvalidSchedule { code, source } => {
                assert_eq!(code, "BAD");
                assert!(matches!(source, CoreError::MissingUnboundedBand));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
