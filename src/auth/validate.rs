//! Credential checks applied before any request is sent

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_CALORIE_GOAL: u32 = 1000;
pub const MAX_CALORIE_GOAL: u32 = 5000;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Validate login credentials
pub fn validate_login(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(Error::validation("Email is required"));
    }
    if !is_valid_email(email) {
        return Err(Error::validation("Please enter a valid email address"));
    }
    if password.is_empty() {
        return Err(Error::validation("Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Validate a registration form, including the confirmation and calorie goal
pub fn validate_registration(
    email: &str,
    password: &str,
    confirm_password: &str,
    daily_calorie_goal: u32,
) -> Result<()> {
    validate_login(email, password)?;

    if password != confirm_password {
        return Err(Error::validation("Passwords do not match"));
    }
    if !(MIN_CALORIE_GOAL..=MAX_CALORIE_GOAL).contains(&daily_calorie_goal) {
        return Err(Error::validation(format!(
            "Calorie goal must be between {} and {}",
            MIN_CALORIE_GOAL, MAX_CALORIE_GOAL
        )));
    }
    Ok(())
}
