//! The error object shared by every layer of the console.
//!
//! Backend crates keep their own error enums and convert into this one, so a
//! transport failure and a service-reported failure reach the screens in the
//! same shape.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// Missing or malformed input, caught before any request is made.
  #[error("{0}")]
  Validation(String),

  /// A structured failure reported by the backend service.
  #[error("{message}")]
  Backend {
    status:  Option<u16>,
    code:    Option<String>,
    message: String,
  },

  /// The request never produced a service answer (connection, timeout,
  /// undecodable response).
  #[error("transport error: {0}")]
  Transport(String),

  #[error("not signed in")]
  NotSignedIn,

  /// The owning view cancelled the request before it resolved.
  #[error("request cancelled")]
  Cancelled,

  #[error("serialization error: {0}")]
  Serialization(String),
}

impl Error {
  pub fn backend(message: impl Into<String>) -> Self {
    Self::Backend {
      status:  None,
      code:    None,
      message: message.into(),
    }
  }

  pub fn is_cancelled(&self) -> bool { matches!(self, Self::Cancelled) }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self { Self::Serialization(e.to_string()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
