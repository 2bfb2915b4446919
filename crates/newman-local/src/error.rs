//! Error type for `newman-local`.

use newman_core::record::Collection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("password hashing failed: {0}")]
  Hash(String),

  #[error("User already registered")]
  EmailTaken,

  #[error("Invalid login credentials")]
  InvalidCredentials,

  /// A draft did not serialise to a JSON object.
  #[error("{0} record is not an object")]
  NotAnObject(Collection),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for newman_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::EmailTaken => Self::Backend {
        status:  Some(422),
        code:    Some("user_already_exists".into()),
        message: e.to_string(),
      },
      Error::InvalidCredentials => Self::Backend {
        status:  Some(400),
        code:    Some("invalid_credentials".into()),
        message: e.to_string(),
      },
      Error::Json(_) | Error::NotAnObject(_) => Self::Serialization(e.to_string()),
      other => Self::backend(other.to_string()),
    }
  }
}
