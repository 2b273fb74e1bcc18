//! # Error Types
//!
//! Domain-specific error types for voltbill-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  voltbill-core errors (this file)                                   │
//! │  ├── CoreError        - Tariff and billing domain errors            │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  voltbill-db errors (separate crate)                                │
//! │  └── DbError          - Database operation failures                 │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → DbError → caller               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Schedule construction errors carry the index of the offending band, so a
//! caller can point at the exact row of a bad pricing table instead of
//! re-parsing an error message.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Tariff and billing domain errors.
///
/// Construction-time variants (`EmptySchedule` through `InvalidVatRate`) are
/// raised exactly once, when a [`TariffSchedule`](crate::tariff::TariffSchedule)
/// is built from configuration. `NegativeConsumption` is the only call-time
/// variant; it is raised per `compute` call.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A tariff schedule must contain at least one price band.
    #[error("tariff schedule has no price bands")]
    EmptySchedule,

    /// The last band of a schedule must have an unbounded ceiling, otherwise
    /// consumption above the top finite ceiling has no defined price.
    #[error("tariff schedule has no unbounded top band")]
    MissingUnboundedBand,

    /// An unbounded band appeared before the end of the schedule.
    #[error("band {band} is unbounded but is not the last band")]
    UnboundedBandNotLast { band: usize },

    /// A band ceiling is not strictly greater than the previous ceiling.
    #[error("band {band} ceiling {ceiling} kWh does not exceed the previous ceiling {previous} kWh")]
    CeilingNotIncreasing {
        band: usize,
        ceiling: i64,
        previous: i64,
    },

    /// A band carries a negative unit price.
    #[error("band {band} has negative unit price {price} dong/kWh")]
    NegativeUnitPrice { band: usize, price: i64 },

    /// VAT rate outside `[0, 10000)` basis points.
    #[error("VAT rate {bps} bps is outside [0, 10000)")]
    InvalidVatRate { bps: u32 },

    /// Consumption passed to `compute` was negative. Callers derive
    /// consumption as `max(0, end_reading - start_reading)` and are expected
    /// to clamp upstream.
    #[error("consumption must be non-negative, got {kwh} kWh")]
    NegativeConsumption { kwh: i64 },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before domain logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be non-negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., bad characters in a customer code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// End meter reading is below the start reading for the period.
    #[error("end reading {end} is below start reading {start}")]
    ReadingsOutOfOrder { start: i64, end: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::CeilingNotIncreasing {
            band: 2,
            ceiling: 100,
            previous: 200,
        };
        assert_eq!(
            err.to_string(),
            "band 2 ceiling 100 kWh does not exceed the previous ceiling 200 kWh"
        );

        let err = CoreError::NegativeConsumption { kwh: -5 };
        assert_eq!(err.to_string(), "consumption must be non-negative, got -5 kWh");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::ReadingsOutOfOrder { start: 120, end: 80 };
        assert_eq!(err.to_string(), "end reading 80 is below start reading 120");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
