//! # Validation Module
//!
//! Parsing and validation of operator input on purchase lines.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Edit Boundary                                      │
//! │                                                                         │
//! │  Operator types "1,5" in the quantity cell                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  parse_quantity("1,5") ── syntax only ──► Quantity(1500)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  validate_quantity(qty, fractional_units) ── business rules            │
//! │           │                                                             │
//! │           ├── Err → EditorError::ValidationRejected, value unchanged   │
//! │           └── Ok  → LineItem updated, derived fields recomputed        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use taller_core::validation::{parse_price, validate_price};
//!
//! let price = parse_price("12,50").unwrap();
//! assert_eq!(price.cents(), 1250);
//! assert!(validate_price(price).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Quantity, TaxRate};
use crate::{MAX_ITEM_QUANTITY, MAX_PRODUCT_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest integer part accepted from a decimal input.
const MAX_INTEGER_DIGITS: usize = 15;

// =============================================================================
// Decimal Parsing
// =============================================================================

/// Parses a decimal string into an integer scaled by `10^scale`.
///
/// Accepts `.` or `,` as the decimal separator and an optional sign.
fn parse_fixed(raw: &str, field: &str, scale: u32) -> ValidationResult<i128> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let (negative, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut parts = unsigned.splitn(2, |c| c == '.' || c == ',');
    let int_part = parts.next().unwrap_or_default();
    let frac_part = parts.next().unwrap_or_default();

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid("must be a number"));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid("must be a number"));
    }
    if int_part.len() > MAX_INTEGER_DIGITS {
        return Err(invalid("is too large"));
    }
    if frac_part.len() > scale as usize {
        return Err(invalid(&format!("at most {} decimal places", scale)));
    }

    let int_value: i128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| invalid("must be a number"))?
    };
    let padded = format!("{:0<width$}", frac_part, width = scale as usize);
    let frac_value: i128 = if padded.is_empty() {
        0
    } else {
        padded.parse().map_err(|_| invalid("must be a number"))?
    };

    let value = int_value * 10_i128.pow(scale) + frac_value;
    Ok(if negative { -value } else { value })
}

/// Parses a quantity ("2", "1.5", "0,25"). Up to three decimals.
///
/// Only the syntax is checked here; see [`validate_quantity`].
pub fn parse_quantity(raw: &str) -> ValidationResult<Quantity> {
    let milli = parse_fixed(raw, "quantity", 3)?;
    Ok(Quantity::from_milli(milli as i64))
}

/// Parses a unit price in major units ("12.50" → 1250 cents).
///
/// ## Example
/// ```rust
/// use taller_core::validation::parse_price;
///
/// assert_eq!(parse_price("100").unwrap().cents(), 10_000);
/// assert!(parse_price("abc").is_err());
/// assert!(parse_price("1.999").is_err());
/// ```
pub fn parse_price(raw: &str) -> ValidationResult<Money> {
    let cents = parse_fixed(raw, "unit price", 2)?;
    Ok(Money::from_cents(cents as i64))
}

/// Parses a tax rate given as a percentage ("21", "10.5").
///
/// Range is enforced while parsing since a `TaxRate` cannot hold a
/// negative value.
pub fn parse_tax_rate(raw: &str) -> ValidationResult<TaxRate> {
    let bps = parse_fixed(raw, "tax rate", 2)?;
    if bps < 0 {
        return Err(ValidationError::Negative {
            field: "tax rate".to_string(),
        });
    }
    if bps > 10_000 {
        return Err(tax_rate_out_of_range());
    }
    Ok(TaxRate::from_bps(bps as u32))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY units
/// - Must be whole unless the product is bought in fractions
pub fn validate_quantity(qty: Quantity, fractional_units: bool) -> ValidationResult<()> {
    if !qty.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > Quantity::units(MAX_ITEM_QUANTITY) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    if !fractional_units && !qty.is_whole() {
        return Err(ValidationError::FractionalQuantity {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (warranty parts, samples)
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: "unit price".to_string(),
        });
    }

    Ok(())
}

/// Validates a tax rate: 0 to 10000 bps (0% to 100%).
pub fn validate_tax_rate(rate: TaxRate) -> ValidationResult<()> {
    if rate.bps() > 10_000 {
        return Err(tax_rate_out_of_range());
    }

    Ok(())
}

fn tax_rate_out_of_range() -> ValidationError {
    ValidationError::OutOfRange {
        field: "tax rate".to_string(),
        min: 0,
        max: 100,
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name (used for quick-add drafts).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most MAX_PRODUCT_NAME_LEN characters
///
/// ## Example
/// ```rust
/// use taller_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Brake pads (front)").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
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
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("2").unwrap(), Quantity::units(2));
        assert_eq!(parse_quantity("1.5").unwrap(), Quantity::from_milli(1_500));
        assert_eq!(parse_quantity("0,25").unwrap(), Quantity::from_milli(250));
        assert_eq!(parse_quantity(" 3 ").unwrap(), Quantity::units(3));
        assert_eq!(parse_quantity(".5").unwrap(), Quantity::from_milli(500));
        assert_eq!(parse_quantity("-1").unwrap(), Quantity::units(-1));

        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("abc").is_err());
        assert!(parse_quantity("1.2345").is_err());
        assert!(parse_quantity("1.2.3").is_err());
        assert!(parse_quantity(".").is_err());
        assert!(parse_quantity("1e3").is_err());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("100").unwrap().cents(), 10_000);
        assert_eq!(parse_price("12.5").unwrap().cents(), 1_250);
        assert_eq!(parse_price("0").unwrap().cents(), 0);
        assert_eq!(parse_price("-3").unwrap().cents(), -300);

        assert!(matches!(
            parse_price("1.999"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(parse_price("9999999999999999").is_err());
    }

    #[test]
    fn test_parse_tax_rate() {
        assert_eq!(parse_tax_rate("21").unwrap(), TaxRate::from_bps(2100));
        assert_eq!(parse_tax_rate("10,5").unwrap(), TaxRate::from_bps(1050));
        assert_eq!(parse_tax_rate("0").unwrap(), TaxRate::zero());

        assert!(matches!(
            parse_tax_rate("-1"),
            Err(ValidationError::Negative { .. })
        ));
        assert!(matches!(
            parse_tax_rate("100.01"),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(Quantity::units(1), false).is_ok());
        assert!(validate_quantity(Quantity::units(MAX_ITEM_QUANTITY), false).is_ok());
        assert!(validate_quantity(Quantity::from_milli(1_500), true).is_ok());

        assert!(matches!(
            validate_quantity(Quantity::units(0), false),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity(Quantity::units(-1), true).is_err());
        assert!(matches!(
            validate_quantity(Quantity::units(MAX_ITEM_QUANTITY + 1), false),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_quantity(Quantity::from_milli(1_500), false),
            Err(ValidationError::FractionalQuantity { .. })
        ));
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Money::zero()).is_ok());
        assert!(validate_price(Money::from_cents(1099)).is_ok());
        assert!(validate_price(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_tax_rate() {
        assert!(validate_tax_rate(TaxRate::zero()).is_ok());
        assert!(validate_tax_rate(TaxRate::from_bps(10_000)).is_ok());
        assert!(validate_tax_rate(TaxRate::from_bps(10_001)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Oil filter").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(MAX_PRODUCT_NAME_LEN + 1)).is_err());
    }
}
