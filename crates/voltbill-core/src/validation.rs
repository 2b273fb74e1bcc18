//! # Validation Module
//!
//! Input validation for customer and invoice data, run before CRUD
//! operations reach the database.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: THIS MODULE - field format and range checks               │
//! │  Layer 2: TariffSchedule::new - pricing table invariants            │
//! │  Layer 3: SQLite - NOT NULL / UNIQUE / foreign key constraints      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use voltbill_core::validation::{validate_customer_code, validate_meter_readings};
//!
//! validate_customer_code("KH0042").unwrap();
//! validate_meter_readings(1200, 1350).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_BILLING_YEAR, MIN_BILLING_YEAR};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer code.
///
/// ## Rules
/// - Must not be empty
/// - At most 20 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use voltbill_core::validation::validate_customer_code;
///
/// assert!(validate_customer_code("KH0042").is_ok());
/// assert!(validate_customer_code("").is_err());
/// assert!(validate_customer_code("KH 42").is_err());
/// ```
pub fn validate_customer_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 20,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a customer name.
///
/// ## Rules
/// - Must not be empty
/// - At most 100 characters
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "full_name".to_string(),
        });
    }

    if name.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "full_name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a phone number.
///
/// ## Rules
/// - Must not be empty
/// - 8 to 15 digits, optionally prefixed with `+`
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, optionally prefixed with +".to_string(),
        });
    }

    if !(8..=15).contains(&digits.len()) {
        return Err(ValidationError::OutOfRange {
            field: "phone".to_string(),
            min: 8,
            max: 15,
        });
    }

    Ok(())
}

/// Validates a meter serial number.
///
/// ## Rules
/// - Must not be empty
/// - At most 30 characters, alphanumeric plus hyphens
pub fn validate_meter_serial(serial: &str) -> ValidationResult<()> {
    let serial = serial.trim();

    if serial.is_empty() {
        return Err(ValidationError::Required {
            field: "meter_serial".to_string(),
        });
    }

    if serial.len() > 30 {
        return Err(ValidationError::TooLong {
            field: "meter_serial".to_string(),
            max: 30,
        });
    }

    if !serial.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "meter_serial".to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all/default results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a billing period.
///
/// ## Rules
/// - Month in 1-12
/// - Year in [`MIN_BILLING_YEAR`]..=[`MAX_BILLING_YEAR`]
///
/// ## Example
/// ```rust
/// use voltbill_core::validation::validate_billing_period;
///
/// assert!(validate_billing_period(5, 2023).is_ok());
/// assert!(validate_billing_period(13, 2023).is_err());
/// assert!(validate_billing_period(1, 1999).is_err());
/// ```
pub fn validate_billing_period(month: u32, year: i32) -> ValidationResult<()> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::OutOfRange {
            field: "month".to_string(),
            min: 1,
            max: 12,
        });
    }

    if !(MIN_BILLING_YEAR..=MAX_BILLING_YEAR).contains(&year) {
        return Err(ValidationError::OutOfRange {
            field: "year".to_string(),
            min: MIN_BILLING_YEAR as i64,
            max: MAX_BILLING_YEAR as i64,
        });
    }

    Ok(())
}

/// Validates a pair of meter readings.
///
/// ## Rules
/// - Both readings non-negative
/// - End reading not below the start reading
///
/// The invoice math clamps an out-of-order pair to zero consumption; this
/// validator exists so data entry can reject the pair outright instead of
/// silently billing zero. The caller decides which policy applies.
pub fn validate_meter_readings(start: i64, end: i64) -> ValidationResult<()> {
    if start < 0 {
        return Err(ValidationError::Negative {
            field: "start_reading".to_string(),
        });
    }

    if end < 0 {
        return Err(ValidationError::Negative {
            field: "end_reading".to_string(),
        });
    }

    if end < start {
        return Err(ValidationError::ReadingsOutOfOrder { start, end });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_code() {
        assert!(validate_customer_code("KH0042").is_ok());
        assert!(validate_customer_code("KH-0042_A").is_ok());
        assert!(validate_customer_code("").is_err());
        assert!(validate_customer_code("   ").is_err());
        assert!(validate_customer_code("KH 42").is_err());
        assert!(validate_customer_code(&"K".repeat(21)).is_err());
    }

    #[test]
    fn test_customer_name() {
        assert!(validate_customer_name("Nguyễn Văn An").is_ok());
        assert!(validate_customer_name("").is_err());
        assert!(validate_customer_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_phone() {
        assert!(validate_phone("0912345678").is_ok());
        assert!(validate_phone("+84912345678").is_ok());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("091-234-5678").is_err());
    }

    #[test]
    fn test_meter_serial() {
        assert!(validate_meter_serial("CT-2023-0042").is_ok());
        assert!(validate_meter_serial("").is_err());
        assert!(validate_meter_serial("CT 42").is_err());
    }

    #[test]
    fn test_search_query_is_trimmed() {
        assert_eq!(validate_search_query("  an  ").unwrap(), "an");
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }

    #[test]
    fn test_billing_period() {
        assert!(validate_billing_period(1, 2023).is_ok());
        assert!(validate_billing_period(12, 2023).is_ok());
        assert!(validate_billing_period(0, 2023).is_err());
        assert!(validate_billing_period(13, 2023).is_err());
        assert!(validate_billing_period(5, 1999).is_err());
    }

    #[test]
    fn test_meter_readings() {
        assert!(validate_meter_readings(1200, 1350).is_ok());
        assert!(validate_meter_readings(0, 0).is_ok());
        assert!(validate_meter_readings(-1, 10).is_err());
        assert!(validate_meter_readings(10, -1).is_err());
        assert!(matches!(
            validate_meter_readings(120, 80),
            Err(ValidationError::ReadingsOutOfOrder { start: 120, end: 80 })
        ));
    }
}
