//! Registration input rules.

use std::sync::LazyLock;

use regex::Regex;

use crate::AuthError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

const MIN_PASSWORD_LEN: usize = 8;
const MIN_NAME_LEN: usize = 2;

/// Canonical form used for storage and lookup: trimmed, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Checks registration fields, first failure wins.
///
/// The error messages are shown to the user as-is.
pub fn validate_registration(
    email: &str,
    password: &str,
    name: &str,
) -> Result<(), AuthError> {
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(AuthError::Validation("Valid email is required".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(
            "Password must be at least 8 characters long".into(),
        ));
    }
    if name.trim().chars().count() < MIN_NAME_LEN {
        return Err(AuthError::Validation(
            "Name must be at least 2 characters long".into(),
        ));
    }
    Ok(())
}
