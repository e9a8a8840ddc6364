//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Limits mirror the column expectations in the schema; SQLite TEXT has
//! no built-in length enforcement.

use validator::ValidateEmail;

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Usernames
pub const MAX_USERNAME_LEN: usize = 50;

/// Product titles
pub const MAX_TITLE_LEN: usize = 100;

/// Product descriptions
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Notes, order remarks
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, city, state, zip, tag
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Images and tags per product
pub const MAX_PRODUCT_IMAGES: usize = 10;
pub const MAX_PRODUCT_TAGS: usize = 10;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate email syntax and length.
pub fn validate_email(value: &str) -> Result<(), AppError> {
    if value.len() > MAX_EMAIL_LEN {
        return Err(AppError::validation(format!(
            "email is too long ({} chars, max {MAX_EMAIL_LEN})",
            value.len()
        )));
    }
    if !value.validate_email() {
        return Err(AppError::validation("email is not a valid address"));
    }
    Ok(())
}

/// Validate password length bounds (content is free-form).
pub fn validate_password(value: &str) -> Result<(), AppError> {
    if value.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if value.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a non-negative money/metric amount.
pub fn validate_non_negative(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation(format!("{field} must be non-negative")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_blank_and_oversized() {
        assert!(validate_required_text("  ", "title", 10).is_err());
        assert!(validate_required_text("abcdefghijk", "title", 10).is_err());
        assert!(validate_required_text("ok", "title", 10).is_ok());
    }

    #[test]
    fn email_syntax_is_checked() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn password_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("pw123456").is_ok());
    }

    #[test]
    fn non_negative_rejects_nan_and_negatives() {
        assert!(validate_non_negative(-1.0, "price").is_err());
        assert!(validate_non_negative(f64::NAN, "price").is_err());
        assert!(validate_non_negative(0.0, "price").is_ok());
    }
}
