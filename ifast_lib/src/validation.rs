use std::sync::OnceLock;

use ifast_api::types::UserRegistrationRequest;
use regex::Regex;

use crate::error::IfastError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_NOTES_LENGTH: usize = 1000;

fn email_regex() -> Option<&'static Regex> {
    static EMAIL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[A-Z0-9a-z._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,64}$").ok())
        .as_ref()
}

/// Strip ASCII control characters (0x00-0x1F except space 0x20), trim whitespace,
/// and enforce a character-length limit on what remains.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, IfastError> {
    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string();
    if sanitized.is_empty() {
        return Err(IfastError::InvalidInput(
            "input is empty after sanitization".to_string(),
        ));
    }
    if sanitized.chars().count() > max_len {
        return Err(IfastError::InvalidInput(format!(
            "input exceeds maximum length of {} characters",
            max_len
        )));
    }
    Ok(sanitized)
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_some_and(|re| re.is_match(email))
}

pub fn validate_email(input: &str) -> Result<String, IfastError> {
    let email = sanitize_text(input, MAX_EMAIL_LENGTH)?;
    if !is_valid_email(&email) {
        return Err(IfastError::InvalidInput(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    Ok(email)
}

/// Passwords are checked as typed, without trimming.
pub fn validate_password(password: &str) -> Result<(), IfastError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(IfastError::InvalidInput(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(IfastError::InvalidInput(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_username(input: &str) -> Result<String, IfastError> {
    let username = sanitize_text(input, MAX_USERNAME_LENGTH).map_err(|_| {
        IfastError::InvalidInput(format!(
            "Username must be between {} and {} characters long",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        ))
    })?;
    if username.chars().count() < MIN_USERNAME_LENGTH {
        return Err(IfastError::InvalidInput(format!(
            "Username must be at least {} characters long",
            MIN_USERNAME_LENGTH
        )));
    }
    Ok(username)
}

/// First or last name. `field` names the input in error messages.
pub fn validate_name(field: &str, input: &str) -> Result<String, IfastError> {
    sanitize_text(input, MAX_NAME_LENGTH).map_err(|_| {
        IfastError::InvalidInput(format!(
            "{} must be between 1 and {} characters long",
            field, MAX_NAME_LENGTH
        ))
    })
}

/// Record notes. Blank input means "no notes".
pub fn validate_notes(input: &str) -> Result<Option<String>, IfastError> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    sanitize_text(input, MAX_NOTES_LENGTH).map(Some)
}

/// Validates every signup field and assembles the registration payload.
pub fn validate_registration(
    first_name: &str,
    last_name: &str,
    email: &str,
    username: &str,
    password: &str,
) -> Result<UserRegistrationRequest, IfastError> {
    validate_password(password)?;
    Ok(UserRegistrationRequest {
        username: validate_username(username)?,
        email: validate_email(email)?,
        password: password.to_string(),
        first_name: validate_name("First name", first_name)?,
        last_name: validate_name("Last name", last_name)?,
    })
}
