//! Physical retail locations, used to populate the targeting list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{Collection, Draft, Record};

/// A store reference record. The console never writes these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
  pub id:         Uuid,
  /// Short unique human identifier, e.g. `ST001`.
  pub code:       String,
  pub name:       String,
  pub area:       Option<String>,
  pub status:     Option<String>,
  pub postcode:   Option<String>,
  pub created_at: DateTime<Utc>,
}

impl Record for Store {
  const COLLECTION: Collection = Collection::Stores;
}

/// Seed input for backends that own their reference data (the local
/// backend's demo mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewStore {
  pub code:     String,
  pub name:     String,
  pub area:     Option<String>,
  pub status:   Option<String>,
  pub postcode: Option<String>,
}

impl NewStore {
  pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      code:     code.into(),
      name:     name.into(),
      area:     None,
      status:   None,
      postcode: None,
    }
  }
}

impl Draft for NewStore {
  const COLLECTION: Collection = Collection::Stores;
}
