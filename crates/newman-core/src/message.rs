//! Broadcast messages.
//!
//! A message is created once by the composer, listed and viewed by its
//! author, and deleted explicitly. It is never edited in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::record::{Collection, Draft, Record};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub id:             Uuid,
  pub title:          String,
  pub body:           String,
  /// Targeted store codes, in selection order. Codes are plain strings and
  /// are not checked against the store collection. Empty means no explicit
  /// target was recorded.
  #[serde(default, deserialize_with = "null_as_empty")]
  pub list_of_stores: Vec<String>,
  /// The authoring account.
  pub user_id:        Uuid,
  pub date_created:   DateTime<Utc>,
}

impl Record for Message {
  const COLLECTION: Collection = Collection::Messages;
}

/// Input to the composer's insert. `id` and `date_created` are assigned by
/// the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMessage {
  pub title:          String,
  pub body:           String,
  pub list_of_stores: Vec<String>,
  pub user_id:        Uuid,
}

impl Draft for NewMessage {
  const COLLECTION: Collection = Collection::Messages;
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
