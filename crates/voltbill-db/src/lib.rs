//! # voltbill-db: Database Layer for Voltbill
//!
//! This crate provides database access for the Voltbill billing system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Voltbill Data Flow                            │
//! │                                                                     │
//! │  Application layer (menus, desktop, exports)                        │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                   voltbill-db (THIS CRATE)                  │   │
//! │  │                                                             │   │
//! │  │  ┌──────────────┐  ┌────────────────┐  ┌───────────────┐   │   │
//! │  │  │   Database   │  │  Repositories  │  │  Migrations   │   │   │
//! │  │  │  (pool.rs)   │  │ customer.rs    │  │  (embedded)   │   │   │
//! │  │  │              │◄─│ invoice.rs     │  │ 001_init.sql  │   │   │
//! │  │  │  SqlitePool  │  │ tariff.rs      │  │               │   │   │
//! │  │  └──────────────┘  └────────────────┘  └───────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database (single local file, WAL mode)                      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (customer, invoice, tariff)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use voltbill_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/voltbill.db")).await?;
//!
//! // Bill an invoice against the active schedule
//! let schedule = db.tariffs().load_active_schedule().await?.expect("no active schedule");
//! let mut invoice = db.invoices().get_by_invoice_no("HD202305-0001").await?.unwrap();
//! invoice.amount_dong = Some(invoice.amount_for(&schedule)?.dong());
//! db.invoices().update(&invoice).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::invoice::{
    CustomerTotal, InvoiceRepository, MonthlyConsumption, MonthlyRevenue,
};
pub use repository::tariff::{TariffRecord, TariffRepository};
