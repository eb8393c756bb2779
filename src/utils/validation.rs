use crate::utils::error::{ReimburseError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ReimburseError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ReimburseError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// Request inputs: finite and not below zero.
pub fn validate_input_amount(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ReimburseError::InvalidInput {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    if value < 0.0 {
        return Err(ReimburseError::InvalidInput {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "must be non-negative".to_string(),
        });
    }
    Ok(())
}

/// Configured amounts (overrides, offsets): same rule, reported as config errors.
pub fn validate_non_negative_amount(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ReimburseError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be a finite, non-negative amount".to_string(),
        });
    }
    Ok(())
}

pub fn validate_finite(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ReimburseError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be finite".to_string(),
        });
    }
    Ok(())
}
