// Error handling utilities for consistent error messages and exit codes

use std::process;

use chrono::NaiveDate;

use crate::utils::parse_date_expr_from;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing records, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate a monetary amount (finite, non-negative)
pub fn validate_amount(value: &str, field_name: &str) -> Result<f64, String> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim_start_matches('$');
    cleaned
        .parse::<f64>()
        .map_err(|_| format!("Invalid {}: '{}'. Expected a number such as 1500 or 1,250.50.", field_name, value))
        .and_then(|amount| {
            if !amount.is_finite() {
                Err(format!("Invalid {}: '{}'.", field_name, value))
            } else if amount < 0.0 {
                Err(format!("Invalid {}: {}. Amounts cannot be negative.", field_name, value))
            } else {
                Ok(amount)
            }
        })
}

/// Validate a date expression against `today`
pub fn validate_date(value: &str, field_name: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    parse_date_expr_from(value, today).map_err(|e| format!("Invalid {}: {}", field_name, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("Ana", "Name").is_ok());
        assert_eq!(validate_non_empty("   ", "Name"), Err("Name cannot be empty".to_string()));
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount("1500", "value"), Ok(1500.0));
        assert_eq!(validate_amount("1,250.50", "value"), Ok(1250.5));
        assert_eq!(validate_amount("$99", "value"), Ok(99.0));
        assert!(validate_amount("-5", "value").unwrap_err().contains("cannot be negative"));
        assert!(validate_amount("lots", "value").is_err());
        assert!(validate_amount("inf", "value").is_err());
    }

    #[test]
    fn test_validate_date() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        assert_eq!(
            validate_date("+1w", "follow-up date", today),
            Ok(NaiveDate::from_ymd_opt(2026, 5, 8).unwrap())
        );
        assert!(validate_date("someday", "follow-up date", today)
            .unwrap_err()
            .starts_with("Invalid follow-up date"));
    }
}
