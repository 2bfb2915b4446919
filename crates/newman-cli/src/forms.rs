//! Sign-in and registration form state.

use newman_core::validate::{FieldErrors, validate_sign_in, validate_sign_up};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  FullName,
  Email,
  Password,
}

impl Field {
  pub fn label(self) -> &'static str {
    match self {
      Self::FullName => "Full name",
      Self::Email => "Email",
      Self::Password => "Password",
    }
  }
}

const SIGN_IN_FIELDS: &[Field] = &[Field::Email, Field::Password];
const REGISTER_FIELDS: &[Field] = &[Field::FullName, Field::Email, Field::Password];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthForm {
  pub full_name: String,
  pub email:     String,
  pub password:  String,
  pub errors:    FieldErrors,
  /// Form-wide message above the fields.
  pub notice:    Option<String>,
  fields:        &'static [Field],
  focus:         usize,
}

impl AuthForm {
  pub fn sign_in() -> Self { Self::with_fields(SIGN_IN_FIELDS) }

  pub fn register() -> Self { Self::with_fields(REGISTER_FIELDS) }

  fn with_fields(fields: &'static [Field]) -> Self {
    Self {
      full_name: String::new(),
      email: String::new(),
      password: String::new(),
      errors: FieldErrors::default(),
      notice: None,
      fields,
      focus: 0,
    }
  }

  pub fn fields(&self) -> &'static [Field] { self.fields }

  pub fn focus(&self) -> Field { self.fields[self.focus] }

  pub fn focus_next(&mut self) { self.focus = (self.focus + 1) % self.fields.len(); }

  pub fn focus_prev(&mut self) {
    self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
  }

  pub fn value(&self, field: Field) -> &str {
    match field {
      Field::FullName => &self.full_name,
      Field::Email => &self.email,
      Field::Password => &self.password,
    }
  }

  pub fn error(&self, field: Field) -> Option<&str> {
    match field {
      Field::FullName => self.errors.full_name.as_deref(),
      Field::Email => self.errors.email.as_deref(),
      Field::Password => self.errors.password.as_deref(),
    }
  }

  /// Type into the focused field. Editing a field clears its error.
  pub fn push(&mut self, c: char) {
    self.focused_mut().push(c);
    self.clear_error();
  }

  pub fn pop(&mut self) {
    self.focused_mut().pop();
    self.clear_error();
  }

  fn focused_mut(&mut self) -> &mut String {
    match self.focus() {
      Field::FullName => &mut self.full_name,
      Field::Email => &mut self.email,
      Field::Password => &mut self.password,
    }
  }

  fn clear_error(&mut self) {
    match self.focus() {
      Field::FullName => self.errors.full_name = None,
      Field::Email => self.errors.email = None,
      Field::Password => self.errors.password = None,
    }
  }

  /// Run the local checks. Returns whether the form may be submitted.
  pub fn validate(&mut self) -> bool {
    self.errors = if self.fields.contains(&Field::FullName) {
      validate_sign_up(&self.full_name, &self.email, &self.password)
    } else {
      validate_sign_in(&self.email, &self.password)
    };
    self.errors.is_empty()
  }
}
