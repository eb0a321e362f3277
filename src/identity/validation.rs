//! Form checks run before anything reaches the identity collection.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, AppResult};

use super::provider::SignupRequest;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 3;

pub fn is_valid_email(email: &str) -> bool { EMAIL_RE.is_match(email) }

pub fn validate_login(email: &str, password: &str) -> AppResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::user("email_required", "Email is required"));
    }
    if !is_valid_email(email) {
        return Err(AppError::user("invalid_email", "Please enter a valid email"));
    }
    if password.is_empty() {
        return Err(AppError::user("password_required", "Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::user("weak_password", "Password must be at least 6 characters"));
    }
    Ok(())
}

/// The signup screen's fields as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub accept_terms: bool,
}

/// Check a signup form and produce the request to send.
pub fn validate_signup(form: &SignupForm) -> AppResult<SignupRequest> {
    let name = form.name.trim();
    let email = form.email.trim();
    let (password, confirm) = (form.password.as_str(), form.confirm.as_str());
    if name.chars().count() < MIN_NAME_LEN {
        return Err(AppError::user("invalid_name", "Full name must be at least 3 characters"));
    }
    if !is_valid_email(email) {
        return Err(AppError::user("invalid_email", "Please enter a valid email address"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::user("weak_password", "Password must be at least 6 characters"));
    }
    if password != confirm {
        return Err(AppError::user("password_mismatch", "Passwords do not match"));
    }
    if !form.accept_terms {
        return Err(AppError::user("terms_required", "You must accept the terms and conditions"));
    }
    Ok(SignupRequest { name: name.to_string(), email: email.to_string(), password: password.to_string() })
}

pub fn validate_password_change(new_password: &str, confirm: &str) -> AppResult<()> {
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::user("weak_password", "Password must be at least 6 characters"));
    }
    if new_password != confirm {
        return Err(AppError::user("password_mismatch", "Passwords do not match"));
    }
    Ok(())
}
