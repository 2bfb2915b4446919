//! Who is signed in: accounts, sessions and their display profiles.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{Collection, Draft, Record};

// ─── Account ─────────────────────────────────────────────────────────────────

/// Backend-issued identity. The console only ever holds a read-only copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub id:    Uuid,
  #[serde(default)]
  pub email: String,
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// A time-bounded credential proving that `account` is authenticated.
///
/// Token material is opaque to the console and is redacted from `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
  pub access_token:  String,
  pub refresh_token: String,
  /// When the access token stops being accepted, if the backend says.
  pub expires_at:    Option<DateTime<Utc>>,
  pub account:       Account,
}

impl Session {
  /// Whether the access token has expired at `now`. Sessions without an
  /// expiry never expire locally.
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    self.expires_at.is_some_and(|at| at <= now)
  }
}

impl fmt::Debug for Session {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Session")
      .field("access_token", &"<redacted>")
      .field("refresh_token", &"<redacted>")
      .field("expires_at", &self.expires_at)
      .field("account", &self.account)
      .finish()
  }
}

// ─── Session-change feed ─────────────────────────────────────────────────────

/// Why the backend's session changed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
  InitialSession,
  SignedIn,
  SignedOut,
  TokenRefreshed,
  UserUpdated,
}

/// One entry of the backend's session-change feed. `session` is the complete
/// new value; `None` means nobody is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
  pub event:   AuthEvent,
  pub session: Option<Session>,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// Display attributes for an account, one-to-one with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  /// Always equal to the owning account's id.
  pub id:         Uuid,
  #[serde(default)]
  pub full_name:  String,
  #[serde(default)]
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

impl Record for Profile {
  const COLLECTION: Collection = Collection::Profiles;
}

/// Input to the one-time profile insert performed at sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
  pub id:        Uuid,
  pub full_name: String,
  pub email:     String,
}

impl Draft for NewProfile {
  const COLLECTION: Collection = Collection::Profiles;
}
