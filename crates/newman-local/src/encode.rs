//! Conversions between domain values and what is stored in SQLite columns.
//!
//! Timestamps are RFC 3339 with a fixed microsecond precision so that string
//! order is time order. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use newman_core::{
  identity::{Account, Session},
  record::Collection,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A draft ready for the `records` table, with its id and creation
/// timestamp filled in.
#[derive(Debug)]
pub struct Stamped {
  pub id:   String,
  pub body: String,
}

/// Assign the fields the backend owns. An `id` the draft already carries is
/// kept, as is an explicit creation timestamp.
pub fn stamp(collection: Collection, draft: Value, now: DateTime<Utc>) -> Result<Stamped> {
  let Value::Object(mut fields) = draft else {
    return Err(Error::NotAnObject(collection));
  };

  let id = match fields.get("id").and_then(Value::as_str) {
    Some(id) => decode_uuid(id)?,
    None => Uuid::new_v4(),
  };
  fields.insert("id".into(), Value::String(encode_uuid(id)));
  fields
    .entry(collection.created_field())
    .or_insert_with(|| Value::String(encode_dt(now)));

  Ok(Stamped {
    id:   encode_uuid(id),
    body: Value::Object(fields).to_string(),
  })
}

/// JSON path selecting a top-level field, for `json_extract`.
pub fn field_path(field: &str) -> String { format!("$.{field}") }

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub struct RawAccount {
  pub account_id:    String,
  pub email:         String,
  pub password_hash: String,
}

impl RawAccount {
  pub fn account(&self) -> Result<Account> {
    Ok(Account {
      id:    decode_uuid(&self.account_id)?,
      email: self.email.clone(),
    })
  }
}

pub struct RawSession {
  pub account_id:    String,
  pub email:         String,
  pub access_token:  String,
  pub refresh_token: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      access_token:  self.access_token,
      refresh_token: self.refresh_token,
      expires_at:    None,
      account:       Account {
        id:    decode_uuid(&self.account_id)?,
        email: self.email,
      },
    })
  }
}
