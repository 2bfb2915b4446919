//! Error type for `newman-supabase`.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The request never produced a response: DNS, TLS, timeout, reset.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The service answered with a failure status.
  #[error("{message}")]
  Api {
    status:  u16,
    code:    Option<String>,
    message: String,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid Content-Range header: {0:?}")]
  ContentRange(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for newman_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Http(e) if e.is_decode() => Self::Serialization(e.to_string()),
      Error::Http(e) => Self::Transport(e.to_string()),
      Error::Api {
        status,
        code,
        message,
      } => Self::Backend {
        status: Some(status),
        code,
        message,
      },
      Error::Json(e) => Self::Serialization(e.to_string()),
      other @ Error::ContentRange(_) => Self::backend(other.to_string()),
    }
  }
}

/// Union of the error bodies GoTrue and PostgREST send.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
  /// PostgREST: SQLSTATE string. GoTrue: the numeric HTTP status.
  code:              Option<Value>,
  error_code:        Option<String>,
  error:             Option<String>,
  error_description: Option<String>,
  msg:               Option<String>,
  message:           Option<String>,
}

/// Build an [`Error::Api`] from a failure response body.
pub fn api_error(status: u16, body: &str) -> Error {
  let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

  let code = parsed
    .error_code
    .or_else(|| match parsed.code {
      Some(Value::String(code)) => Some(code),
      _ => None,
    })
    .or(parsed.error.clone());

  let message = parsed
    .message
    .or(parsed.msg)
    .or(parsed.error_description)
    .or(parsed.error)
    .unwrap_or_else(|| match body.trim() {
      "" => format!("request failed with status {status}"),
      text => text.to_owned(),
    });

  Error::Api {
    status,
    code,
    message,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parts(e: Error) -> (u16, Option<String>, String) {
    match e {
      Error::Api {
        status,
        code,
        message,
      } => (status, code, message),
      other => panic!("expected an api error, got {other:?}"),
    }
  }

  #[test]
  fn gotrue_credentials_error() {
    let body = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
    assert_eq!(
      parts(api_error(400, body)),
      (
        400,
        Some("invalid_credentials".into()),
        "Invalid login credentials".into()
      )
    );
  }

  #[test]
  fn legacy_gotrue_grant_error() {
    let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
    let (_, code, message) = parts(api_error(400, body));
    assert_eq!(code.as_deref(), Some("invalid_grant"));
    assert_eq!(message, "Invalid login credentials");
  }

  #[test]
  fn postgrest_constraint_error() {
    let body = r#"{"code":"23505","details":null,"hint":null,"message":"duplicate key value violates unique constraint \"profiles_pkey\""}"#;
    let (status, code, message) = parts(api_error(409, body));
    assert_eq!(status, 409);
    assert_eq!(code.as_deref(), Some("23505"));
    assert!(message.starts_with("duplicate key"));
  }

  #[test]
  fn non_json_body_is_kept_as_the_message() {
    let (_, code, message) = parts(api_error(502, "Bad Gateway"));
    assert_eq!(code, None);
    assert_eq!(message, "Bad Gateway");
    assert_eq!(
      parts(api_error(500, "")).2,
      "request failed with status 500"
    );
  }

  #[test]
  fn api_errors_stay_backend_errors() {
    let shared: newman_core::Error = api_error(401, r#"{"message":"JWT expired"}"#).into();
    assert_eq!(
      shared,
      newman_core::Error::Backend {
        status:  Some(401),
        code:    None,
        message: "JWT expired".into(),
      }
    );
  }
}
