//! Local validation for the sign-in and registration forms.
//!
//! Failures here never reach the backend; they are shown next to the field
//! that caused them.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

pub const MIN_PASSWORD_LEN: usize = 8;

/// Per-field validation messages. Empty means the form may be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
  pub full_name: Option<String>,
  pub email:     Option<String>,
  pub password:  Option<String>,
}

impl FieldErrors {
  pub fn is_empty(&self) -> bool {
    self.full_name.is_none() && self.email.is_none() && self.password.is_none()
  }
}

pub fn is_valid_email(email: &str) -> bool { EMAIL.is_match(email) }

pub fn check_email(email: &str) -> Option<String> {
  if email.is_empty() {
    Some("Email is required".into())
  } else if !is_valid_email(email) {
    Some("Please enter a valid email address".into())
  } else {
    None
  }
}

/// The first password rule `password` breaks, if any.
pub fn check_password(password: &str) -> Option<String> {
  if password.is_empty() {
    return Some("Password is required".into());
  }
  let message = if password.chars().count() < MIN_PASSWORD_LEN {
    "Password must be at least 8 characters"
  } else if !password.chars().any(|c| c.is_ascii_uppercase()) {
    "Password must contain at least one uppercase letter"
  } else if !password.chars().any(|c| c.is_ascii_digit()) {
    "Password must contain at least one number"
  } else if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
    "Password must contain at least one symbol"
  } else {
    return None;
  };
  Some(message.into())
}

pub fn validate_sign_in(email: &str, password: &str) -> FieldErrors {
  FieldErrors {
    full_name: None,
    email:     check_email(email),
    password:  check_password(password),
  }
}

pub fn validate_sign_up(
  full_name: &str,
  email: &str,
  password: &str,
) -> FieldErrors {
  FieldErrors {
    full_name: full_name
      .trim()
      .is_empty()
      .then(|| "Full name is required".to_string()),
    ..validate_sign_in(email, password)
  }
}
