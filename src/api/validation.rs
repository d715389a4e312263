use rust_decimal::Decimal;
use std::str::FromStr;

use super::ApiError;
use super::error::FieldErrors;

/// Collects per-field messages so a single 400 can report every problem.
#[derive(Debug, Default)]
pub struct FieldValidator {
    errors: FieldErrors,
}

impl FieldValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

pub fn check_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("This field may not be blank.".to_string());
    }

    match email.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err("Enter a valid email address.".to_string()),
    }
}

pub fn check_password(password: &str, min_length: usize) -> Result<(), String> {
    if password.is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    if password.chars().count() < min_length {
        return Err(format!(
            "Ensure this field has at least {min_length} characters."
        ));
    }
    Ok(())
}

pub fn check_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        Err("This field may not be blank.".to_string())
    } else {
        Ok(())
    }
}

pub fn check_time_minutes(time_minutes: i32) -> Result<(), String> {
    if time_minutes < 0 {
        Err("Ensure this value is greater than or equal to 0.".to_string())
    } else {
        Ok(())
    }
}

/// Parse a price from either a JSON string or number into a decimal with at
/// most 5 digits total and 2 decimal places.
pub fn parse_price(value: &serde_json::Value) -> Result<Decimal, String> {
    let parsed = match value {
        serde_json::Value::String(s) => Decimal::from_str(s.trim()),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()),
        _ => return Err("A valid number is required.".to_string()),
    };

    let Ok(price) = parsed else {
        return Err("A valid number is required.".to_string());
    };

    if price.is_sign_negative() {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }
    if price.scale() > 2 {
        return Err("Ensure that there are no more than 2 decimal places.".to_string());
    }
    if price >= Decimal::new(1000, 0) {
        return Err("Ensure that there are no more than 5 digits in total.".to_string());
    }

    Ok(price)
}

/// `assigned_only` coercion: only the literal string `"1"` is true, anything
/// else (including `"true"`, `"01"`, empty) is false.
#[must_use]
pub fn assigned_only_flag(raw: Option<&str>) -> bool {
    raw == Some("1")
}
