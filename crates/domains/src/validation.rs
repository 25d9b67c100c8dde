//! Input rules shared by the services.
//!
//! Lengths are counted in Unicode scalar values, so a Korean nickname of five
//! syllables is five characters long.

use crate::error::{DomainError, Result};

pub const NICKNAME_MIN: usize = 2;
pub const NICKNAME_MAX: usize = 10;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;
pub const BOARD_NAME_MAX: usize = 50;
pub const CLONE_NAME_MAX: usize = 30;
pub const DESCRIPTION_MAX: usize = 2000;

/// Accepts 2..=10 characters, rejects `None` and blank input.
/// Returns the nickname as given (inner spaces are kept).
pub fn nickname(raw: Option<&str>) -> Result<String> {
    let value = raw.unwrap_or_default();
    if value.trim().is_empty() {
        return Err(DomainError::Validation("nickname must not be blank".into()));
    }
    let len = value.chars().count();
    if !(NICKNAME_MIN..=NICKNAME_MAX).contains(&len) {
        return Err(DomainError::Validation(format!(
            "nickname must be between {NICKNAME_MIN} and {NICKNAME_MAX} characters"
        )));
    }
    Ok(value.to_string())
}

/// Minimal structural check: `local@domain.tld`, no whitespace.
/// Returns the lower-cased address.
pub fn email(raw: &str) -> Result<String> {
    let value = raw.trim();
    let invalid = || DomainError::Validation(format!("'{value}' is not a valid email address"));

    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(value.to_lowercase())
}

pub fn password(raw: &str) -> Result<()> {
    let len = raw.chars().count();
    if len < PASSWORD_MIN {
        return Err(DomainError::Validation(format!(
            "password must be at least {PASSWORD_MIN} characters"
        )));
    }
    if len > PASSWORD_MAX {
        return Err(DomainError::Validation(format!(
            "password must be at most {PASSWORD_MAX} characters"
        )));
    }
    Ok(())
}

/// Trimmed, non-empty, at most `max` characters.
pub fn name(field: &str, raw: &str, max: usize) -> Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be blank")));
    }
    if value.chars().count() > max {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

/// Blank descriptions are stored as `None`.
pub fn description(raw: Option<&str>) -> Result<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.chars().count() > DESCRIPTION_MAX => Err(DomainError::Validation(
            format!("description must be at most {DESCRIPTION_MAX} characters"),
        )),
        Some(value) => Ok(Some(value.to_string())),
    }
}
