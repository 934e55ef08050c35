use crate::error::{ApiError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static LOGIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?1?\d{9,15}$").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").unwrap());

fn invalid(message: &str) -> ApiError {
    ApiError::Validation(message.to_string())
}

/// Display-name fields: 2 to 50 characters.
pub fn validate_name(field: &str, value: &str) -> Result<()> {
    let length = value.chars().count();
    if !(2..=50).contains(&length) {
        return Err(invalid(&format!("{field} must be between 2 and 50 characters")));
    }
    Ok(())
}

pub fn validate_login(login: &str) -> Result<()> {
    let length = login.chars().count();
    if !(3..=50).contains(&length) {
        return Err(invalid("Login must be between 3 and 50 characters"));
    }
    if !LOGIN_RE.is_match(login) {
        return Err(invalid("Login can only contain letters, numbers and underscores"));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<()> {
    if !PHONE_RE.is_match(phone) {
        return Err(invalid("Invalid phone number format"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if !EMAIL_RE.is_match(email) {
        return Err(invalid("Invalid email format"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid("Password must contain at least one uppercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(invalid("Password must contain at least one lowercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid("Password must contain at least one number"));
    }
    if password.chars().count() < 8 {
        return Err(invalid("Password must be at least 8 characters long"));
    }
    Ok(())
}
