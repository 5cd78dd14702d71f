use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FieldError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.(com|net|org|edu|gov|mil|in|co|io|tech)$"
    )
    .unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^[0-9]{10}$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-z0-9_]{3,20}$").unwrap();
}

const PASSWORD_SPECIALS: [char; 3] = ['@', '*', '.'];

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

/// Password policy: 8-16 characters drawn from letters, digits and the
/// special set, with at least one uppercase letter, one digit and one
/// special character.
fn password_problem(password: &str) -> Option<String> {
    let len_ok = (8..=16).contains(&password.chars().count());
    let charset_ok = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(&c));
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(&c));

    if len_ok && charset_ok && has_upper && has_digit && has_special {
        None
    } else {
        Some(
            "Password must be 8-16 characters with 1 uppercase, 1 digit, \
             and 1 special character (@ * .)"
                .into(),
        )
    }
}

/// Collect every offending field so the client can show all problems at once.
pub fn validate_signup(email: &str, phone: &str, password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !is_valid_email(email) {
        errors.push(FieldError {
            field: "email",
            message: "Invalid email format.".into(),
        });
    }
    if !is_valid_phone(phone) {
        errors.push(FieldError {
            field: "phone",
            message: "Phone number must be 10 digits.".into(),
        });
    }
    if let Some(message) = password_problem(password) {
        errors.push(FieldError {
            field: "password",
            message,
        });
    }
    errors
}
