//! Collections and the typed records that live in them.

use serde::{Serialize, de::DeserializeOwned};

/// The backend collections the console reads and writes.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  strum::Display,
  strum::AsRefStr,
  strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
  /// Keyed by account id.
  Profiles,
  /// Read-only reference data.
  Stores,
  /// Account-scoped broadcast messages.
  Messages,
}

impl Collection {
  /// Name of the backend-assigned creation timestamp field.
  pub fn created_field(self) -> &'static str {
    match self {
      Self::Profiles | Self::Stores => "created_at",
      Self::Messages => "date_created",
    }
  }
}

/// A row read back from a collection.
pub trait Record: DeserializeOwned + Send + 'static {
  const COLLECTION: Collection;
}

/// A row to be inserted. The backend fills in `id` and the creation
/// timestamp when the draft leaves them out.
pub trait Draft: Serialize + Send + Sync + 'static {
  const COLLECTION: Collection;
}
