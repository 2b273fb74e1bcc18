//! # Repository Implementations
//!
//! One repository per aggregate:
//!
//! - [`customer`] - customer records (CRUD, search, soft delete)
//! - [`invoice`] - monthly invoices (CRUD, payment lifecycle, statistics)
//! - [`tariff`] - tariff schedule storage (records, active-schedule swap)
//!
//! Repositories are cheap handles over the shared [`SqlitePool`](sqlx::SqlitePool);
//! clone them freely.

pub mod customer;
pub mod invoice;
pub mod tariff;
