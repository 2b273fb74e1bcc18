//! # Domain Types
//!
//! Core domain types used throughout Voltbill.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐      │
//! │  │   Customer     │   │    Invoice     │   │    VatRate     │      │
//! │  │  ────────────  │   │  ────────────  │   │  ────────────  │      │
//! │  │  id (UUID)     │   │  id (UUID)     │   │  bps (u32)     │      │
//! │  │  code          │   │  invoice_no    │   │  1000 = 10%    │      │
//! │  │  full_name     │   │  customer_id   │   └────────────────┘      │
//! │  │  meter_serial  │   │  readings      │                           │
//! │  └────────────────┘   │  amount_dong   │   ┌────────────────┐      │
//! │                       └────────────────┘   │ BillingPeriod  │      │
//! │                                            │  month / year  │      │
//! │                                            └────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (customer code, invoice number) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreResult;
use crate::money::Money;
use crate::tariff::TariffSchedule;

// =============================================================================
// VAT Rate
// =============================================================================

/// VAT rate represented in basis points (bps).
///
/// 1 basis point = 0.01% = 1/10000, so 1000 bps = 10%, the standard
/// Vietnamese VAT rate for electricity. A valid rate is below 10000 bps;
/// [`TariffSchedule::new`](crate::tariff::TariffSchedule::new) enforces this
/// when a schedule is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRate(u32);

impl VatRate {
    /// Creates a VAT rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        VatRate(bps)
    }

    /// Creates a VAT rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        VatRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero VAT rate.
    #[inline]
    pub const fn zero() -> Self {
        VatRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for VatRate {
    fn default() -> Self {
        VatRate::zero()
    }
}

// =============================================================================
// Billing Period
// =============================================================================

/// A billing period: one calendar month of consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingPeriod {
    /// Month 1-12.
    pub month: u32,

    /// Calendar year, e.g. 2023.
    pub year: i32,
}

impl BillingPeriod {
    /// Creates a billing period. Range checks live in
    /// [`validation::validate_billing_period`](crate::validation::validate_billing_period).
    pub const fn new(month: u32, year: i32) -> Self {
        BillingPeriod { month, year }
    }
}

/// Displays as `MM/YYYY`, the format printed on invoices.
impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer with a metered electricity connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Customer code - business identifier, e.g. "KH0042".
    pub code: String,

    /// Full name of the account holder.
    pub full_name: String,

    /// Service address.
    pub address: String,

    /// Contact phone number.
    pub phone: String,

    /// Serial number of the installed meter.
    pub meter_serial: String,

    /// Whether the customer is active (soft delete).
    pub is_active: bool,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Invoice
// =============================================================================

/// A monthly electricity invoice derived from two meter readings.
///
/// The payable amount is **not** computed on construction; it is produced by
/// [`Invoice::amount_for`] against a tariff schedule and stored back by the
/// caller. `amount_dong` is `None` until that happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Invoice number - business identifier, e.g. "HD202305-0042".
    pub invoice_no: String,

    /// Customer this invoice belongs to (UUID).
    pub customer_id: String,

    /// Billing month 1-12.
    pub month: u32,

    /// Billing year.
    pub year: i32,

    /// Meter reading at the start of the period, in kWh.
    pub start_reading: i64,

    /// Meter reading at the end of the period, in kWh.
    pub end_reading: i64,

    /// Payable amount in đồng, VAT included. `None` until billed.
    pub amount_dong: Option<i64>,

    /// Whether the invoice has been paid.
    pub is_paid: bool,

    /// When the invoice was paid.
    pub paid_at: Option<DateTime<Utc>>,

    /// When the invoice was created.
    pub created_at: DateTime<Utc>,

    /// When the invoice was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Consumption for the period, clamped: `max(0, end - start)`.
    ///
    /// A rolled-over or swapped meter can report an end reading below the
    /// start reading; the clamp bills such periods as zero consumption
    /// instead of producing a negative quantity.
    ///
    /// ## Example
    /// ```rust
    /// # use voltbill_core::types::Invoice;
    /// # use chrono::Utc;
    /// # let mut invoice = Invoice {
    /// #     id: String::new(), invoice_no: String::new(), customer_id: String::new(),
    /// #     month: 5, year: 2023, start_reading: 1200, end_reading: 1350,
    /// #     amount_dong: None, is_paid: false, paid_at: None,
    /// #     created_at: Utc::now(), updated_at: Utc::now(),
    /// # };
    /// assert_eq!(invoice.consumption_kwh(), 150);
    ///
    /// invoice.end_reading = 1100; // meter swapped mid-period
    /// assert_eq!(invoice.consumption_kwh(), 0);
    /// ```
    #[inline]
    pub fn consumption_kwh(&self) -> i64 {
        (self.end_reading - self.start_reading).max(0)
    }

    /// The billing period of this invoice.
    #[inline]
    pub fn period(&self) -> BillingPeriod {
        BillingPeriod::new(self.month, self.year)
    }

    /// Computes the payable amount (VAT included) against a tariff schedule.
    ///
    /// Pure: does not mutate the invoice. The caller stores the result in
    /// `amount_dong` when persisting.
    pub fn amount_for(&self, schedule: &TariffSchedule) -> CoreResult<Money> {
        schedule.compute(self.consumption_kwh())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
