//! # voltbill-core: Pure Business Logic for Voltbill
//!
//! This crate is the heart of Voltbill, an electricity billing system. It
//! contains all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Voltbill Architecture                          │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │        Presentation (terminal app, desktop, PDF export)     │   │
//! │  └────────────────────────────┬────────────────────────────────┘   │
//! │                               │                                     │
//! │  ┌────────────────────────────▼────────────────────────────────┐   │
//! │  │              ★ voltbill-core (THIS CRATE) ★                 │   │
//! │  │                                                             │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────────────┐   │   │
//! │  │  │  money  │ │ tariff  │ │  types  │ │   validation    │   │   │
//! │  │  │  Money  │ │ Bands   │ │ Invoice │ │     rules       │   │   │
//! │  │  │ VatMath │ │ Compute │ │Customer │ │    checks       │   │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └─────────────────┘   │   │
//! │  │                                                             │   │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS         │   │
//! │  └────────────────────────────┬────────────────────────────────┘   │
//! │                               │                                     │
//! │  ┌────────────────────────────▼────────────────────────────────┐   │
//! │  │                voltbill-db (Database Layer)                 │   │
//! │  │          SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`tariff`] - Progressive block tariff engine (bands, VAT, breakdown)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (Customer, Invoice, BillingPeriod, VatRate)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every computation is deterministic
//! 2. **No I/O**: database, network, file system access is forbidden here
//! 3. **Integer Money**: all monetary values are whole đồng (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//! 5. **No Hardcoded Prices**: default tariff tables live in seed data and
//!    configuration, never in this crate
//!
//! ## Example Usage
//!
//! ```rust
//! use voltbill_core::money::Money;
//! use voltbill_core::tariff::{PriceBand, TariffSchedule};
//! use voltbill_core::types::VatRate;
//!
//! // Build a validated schedule from stored pricing data
//! let schedule = TariffSchedule::new(
//!     vec![
//!         PriceBand::bounded(50, Money::from_dong(1985)),
//!         PriceBand::bounded(100, Money::from_dong(2051)),
//!         PriceBand::unbounded(Money::from_dong(2381)),
//!     ],
//!     VatRate::from_bps(1000), // 10% VAT
//! )?;
//!
//! // 30 kWh entirely inside the first band: 30 × 1985 × 1.10
//! assert_eq!(schedule.compute(30)?.dong(), 65_505);
//! # Ok::<(), voltbill_core::error::CoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod tariff;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use voltbill_core::Money` instead of
// `use voltbill_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use tariff::{BandUsage, BillBreakdown, Ceiling, PriceBand, TariffSchedule};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Earliest billing year accepted by validation.
///
/// The original ledgers this system manages start in the 2000s; anything
/// earlier is a data-entry mistake.
pub const MIN_BILLING_YEAR: i32 = 2000;

/// Latest billing year accepted by validation.
pub const MAX_BILLING_YEAR: i32 = 2100;
