use bigdecimal::BigDecimal;
use std::fmt;

use crate::db::models::CheckoutShape;

pub const TITLE_MAX_LEN: usize = 140;
pub const DELIVERY_NOTES_MAX_LEN: usize = 1000;
pub const GATEWAY_REFERENCE_MAX_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_positive_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }

    Ok(())
}

/// Checks that a checkout's declared shape is coherent with the agreed price:
/// a booking token must be a real partial payment, and a balance settlement
/// cannot owe more than the price itself.
pub fn validate_checkout_shape(amount: &BigDecimal, shape: &CheckoutShape) -> ValidationResult {
    validate_positive_amount("amount", amount)?;

    match shape {
        CheckoutShape::FullPayment => Ok(()),
        CheckoutShape::BookingToken { booking_amount } => {
            validate_positive_amount("booking_amount", booking_amount)?;
            if booking_amount >= amount {
                return Err(ValidationError::new(
                    "booking_amount",
                    "must be less than the agreed price",
                ));
            }
            Ok(())
        }
        CheckoutShape::BalanceSettlement { outstanding } => {
            validate_positive_amount("outstanding", outstanding)?;
            if outstanding > amount {
                return Err(ValidationError::new(
                    "outstanding",
                    "cannot exceed the agreed price",
                ));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_max_len() {
        assert!(validate_max_len("field", "abc", 3).is_ok());
        assert!(validate_max_len("field", "abcd", 3).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  hello\tworld  "), "hello world");
        assert_eq!(sanitize_string("single"), "single");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ab\u{0000}cd\u{0007}"), "abcd");
    }

    #[test]
    fn validates_positive_amount() {
        let positive = BigDecimal::from_str("1.23").expect("valid decimal");
        let zero = BigDecimal::from(0);
        let negative = BigDecimal::from(-1);

        assert!(validate_positive_amount("amount", &positive).is_ok());
        assert!(validate_positive_amount("amount", &zero).is_err());
        assert!(validate_positive_amount("amount", &negative).is_err());
    }

    #[test]
    fn validates_booking_token_range() {
        let amount = BigDecimal::from(500000);

        let ok = CheckoutShape::BookingToken {
            booking_amount: BigDecimal::from(50000),
        };
        assert!(validate_checkout_shape(&amount, &ok).is_ok());

        let zero = CheckoutShape::BookingToken {
            booking_amount: BigDecimal::from(0),
        };
        assert!(validate_checkout_shape(&amount, &zero).is_err());

        let whole_price = CheckoutShape::BookingToken {
            booking_amount: BigDecimal::from(500000),
        };
        assert!(validate_checkout_shape(&amount, &whole_price).is_err());
    }

    #[test]
    fn validates_balance_settlement_range() {
        let amount = BigDecimal::from(500000);

        let ok = CheckoutShape::BalanceSettlement {
            outstanding: BigDecimal::from(450000),
        };
        assert!(validate_checkout_shape(&amount, &ok).is_ok());

        let too_much = CheckoutShape::BalanceSettlement {
            outstanding: BigDecimal::from(500001),
        };
        assert!(validate_checkout_shape(&amount, &too_much).is_err());
    }

    #[test]
    fn validates_full_payment_amount() {
        assert!(validate_checkout_shape(&BigDecimal::from(0), &CheckoutShape::FullPayment).is_err());
        assert!(validate_checkout_shape(&BigDecimal::from(1), &CheckoutShape::FullPayment).is_ok());
    }
}
