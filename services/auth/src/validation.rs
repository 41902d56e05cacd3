//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 128;
pub const FULL_NAME_MAX_LEN: usize = 100;

/// Validate an already trimmed username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    let len = username.chars().count();

    if len < USERNAME_MIN_LEN {
        return Err(format!(
            "Username must be at least {USERNAME_MIN_LEN} characters long"
        ));
    }

    if len > USERNAME_MAX_LEN {
        return Err(format!(
            "Username must be at most {USERNAME_MAX_LEN} characters long"
        ));
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate an already trimmed full name
pub fn validate_full_name(full_name: &str) -> Result<(), String> {
    if full_name.chars().count() > FULL_NAME_MAX_LEN {
        return Err(format!(
            "Full name must be at most {FULL_NAME_MAX_LEN} characters long"
        ));
    }

    Ok(())
}

/// Validate a new password; `label` names the field in the message
pub fn validate_password(password: &str, label: &str) -> Result<(), String> {
    let len = password.chars().count();

    if len < PASSWORD_MIN_LEN {
        return Err(format!(
            "{label} must be at least {PASSWORD_MIN_LEN} characters long"
        ));
    }

    if len > PASSWORD_MAX_LEN {
        return Err(format!(
            "{label} must be at most {PASSWORD_MAX_LEN} characters long"
        ));
    }

    Ok(())
}
