use anyhow::Result;
use chrono::NaiveDate;

/// Custom error types for input validation
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Client name is invalid: {reason}")]
    InvalidClientName { reason: String },

    #[error("Department name is invalid: {reason}")]
    InvalidDepartmentName { reason: String },

    #[error("Date range is invalid: {reason}")]
    InvalidDateRange { reason: String },

    #[error("Input string is invalid: {reason}")]
    InvalidString { reason: String },

    #[error("Numeric value is invalid: {field} - {reason}")]
    InvalidNumeric { field: String, reason: String },

    #[error("Invoice has no line items")]
    EmptyInvoice,
}

/// Client names: 1-200 characters, no control bytes.
pub fn validate_client_name(name: &str) -> Result<String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::InvalidClientName {
            reason: "Client name cannot be empty or whitespace only".to_string(),
        }
        .into());
    }

    if trimmed.len() > 200 {
        return Err(ValidationError::InvalidClientName {
            reason: format!("Client name too long (max 200 characters, got {})", trimmed.len()),
        }
        .into());
    }

    if trimmed.contains('\0') {
        return Err(ValidationError::InvalidClientName {
            reason: "Client name contains null bytes".to_string(),
        }
        .into());
    }

    Ok(trimmed.to_string())
}

pub fn validate_department_name(name: &str) -> Result<String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::InvalidDepartmentName {
            reason: "Department name cannot be empty".to_string(),
        }
        .into());
    }

    if trimmed.len() > 200 {
        return Err(ValidationError::InvalidDepartmentName {
            reason: format!("Department name too long (max 200 characters, got {})", trimmed.len()),
        }
        .into());
    }

    Ok(trimmed.to_string())
}

/// Billing rates: positive, capped at 10000.
pub fn validate_rate(rate: f64) -> Result<f64> {
    if !rate.is_finite() {
        return Err(ValidationError::InvalidNumeric {
            field: "rate".to_string(),
            reason: "Rate must be a finite number".to_string(),
        }
        .into());
    }

    if rate <= 0.0 {
        return Err(ValidationError::InvalidNumeric {
            field: "rate".to_string(),
            reason: format!("Rate must be positive (got {})", rate),
        }
        .into());
    }

    if rate > 10000.0 {
        return Err(ValidationError::InvalidNumeric {
            field: "rate".to_string(),
            reason: format!("Rate too high (max 10000, got {})", rate),
        }
        .into());
    }

    Ok(rate)
}

/// Entry-level rates may be zero (zero means "no override").
pub fn validate_entry_rate(rate: f64) -> Result<f64> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(ValidationError::InvalidNumeric {
            field: "rate".to_string(),
            reason: format!("Rate must be zero or positive (got {})", rate),
        }
        .into());
    }

    if rate > 10000.0 {
        return Err(ValidationError::InvalidNumeric {
            field: "rate".to_string(),
            reason: format!("Rate too high (max 10000, got {})", rate),
        }
        .into());
    }

    Ok(rate)
}

/// Payment terms: 0-365 days.
pub fn validate_payment_terms(terms: i64) -> Result<i64> {
    if !(0..=365).contains(&terms) {
        return Err(ValidationError::InvalidNumeric {
            field: "payment_terms".to_string(),
            reason: format!("Payment terms must be between 0 and 365 days (got {})", terms),
        }
        .into());
    }

    Ok(terms)
}

/// Hours per day slot: 0 through 24 inclusive. Zero is meaningful: it
/// deletes the slot's entry.
pub fn validate_hours(hours: f64) -> Result<f64> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(ValidationError::InvalidNumeric {
            field: "hours".to_string(),
            reason: format!("Hours cannot be negative (got {})", hours),
        }
        .into());
    }

    if hours > 24.0 {
        return Err(ValidationError::InvalidNumeric {
            field: "hours".to_string(),
            reason: format!("Hours cannot exceed 24 per day (got {})", hours),
        }
        .into());
    }

    Ok(hours)
}

/// Day-of-week slots are 1 (Monday) through 7 (Sunday).
pub fn validate_day_of_week(day: u8) -> Result<u8> {
    if !(1..=7).contains(&day) {
        return Err(ValidationError::InvalidNumeric {
            field: "day_of_week".to_string(),
            reason: format!("Day of week must be 1-7, Monday=1 (got {})", day),
        }
        .into());
    }

    Ok(day)
}

/// Inclusive date ranges must not be inverted.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    if start > end {
        return Err(ValidationError::InvalidDateRange {
            reason: format!("Start date ({}) must be before or equal to end date ({})", start, end),
        }
        .into());
    }

    Ok((start, end))
}

pub fn validate_notes(notes: &str) -> Result<String> {
    let trimmed = notes.trim();

    if trimmed.len() > 2000 {
        return Err(ValidationError::InvalidString {
            reason: format!("Notes too long (max 2000 characters, got {})", trimmed.len()),
        }
        .into());
    }

    if trimmed.contains('\0') {
        return Err(ValidationError::InvalidString {
            reason: "Notes contain null bytes".to_string(),
        }
        .into());
    }

    Ok(trimmed.to_string())
}

pub fn validate_id(field: &str, id: i64) -> Result<i64> {
    if id <= 0 {
        return Err(ValidationError::InvalidNumeric {
            field: field.to_string(),
            reason: format!("{} must be positive (got {})", field, id),
        }
        .into());
    }

    Ok(id)
}
