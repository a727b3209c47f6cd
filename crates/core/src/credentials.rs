//! Password-complexity and profile field validation.
//!
//! Hashing lives in the API crate; this module only decides whether a
//! plaintext secret or profile field is acceptable.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum password length accepted by registration and user creation.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that satisfy the "special character" rule.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MAX_NAME_LENGTH: usize = 50;

/// International phone format: `+`, a non-zero digit, then 1 to 14 digits.
const PHONE_PATTERN: &str = r"^\+[1-9]\d{1,14}$";

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_PATTERN).expect("valid regex"));

/// Enforce the password policy: at least 8 characters with an upper-case
/// letter, a lower-case letter, a digit and a special character.
///
/// Rules are checked in that order and the first failure is reported.
pub fn validate_password_complexity(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number".to_string());
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err("Password must contain at least one special character".to_string());
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.trim().chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        ));
    }
    Ok(())
}

/// First and last names are required and capped at 50 characters.
pub fn validate_person_name(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("{field} must not exceed {MAX_NAME_LENGTH} characters"));
    }
    Ok(())
}

pub fn validate_phone_number(phone: &str) -> Result<(), String> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err("Phone number must be in international format".to_string())
    }
}
