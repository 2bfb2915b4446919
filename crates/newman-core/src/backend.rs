//! The `Backend` trait: everything the console needs from the remote service.
//!
//! Implemented by `newman-supabase` (the hosted service) and `newman-local`
//! (a SQLite file). `newman-console` depends on this abstraction only.

use std::future::Future;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  identity::{Account, Session, SessionChange},
  query::{Filter, Page, Select},
  record::{Collection, Draft, Record},
};

/// A live subscription to the backend's session-change feed. Dropping the
/// receiver unsubscribes.
pub type SessionChanges = broadcast::Receiver<SessionChange>;

/// Capacity of the session-change channel every backend allocates.
pub const SESSION_FEED_CAPACITY: usize = 16;

/// Abstraction over the remote service that owns accounts, sessions and the
/// `profiles`, `stores` and `messages` collections.
///
/// All methods return `Send` futures so the trait can be driven from tasks
/// spawned on a multi-threaded tokio runtime.
pub trait Backend: Send + Sync + 'static {
  /// Backend-specific failure. Converting it yields the shared error object,
  /// keeping service-reported and transport failures distinct.
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// The session the backend currently holds, if any.
  fn get_session(
    &self,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  /// Subscribe to session changes. Events arrive in emission order.
  fn session_changes(&self) -> SessionChanges;

  /// Create an account. Returns the new account when the backend reveals
  /// it; emits `SIGNED_IN` when a session is issued straight away.
  fn sign_up<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  /// Authenticate with a password. Emits `SIGNED_IN` on success.
  fn sign_in_with_password<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// End the current session. Emits `SIGNED_OUT`, also when nobody was
  /// signed in.
  fn sign_out(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Collections ───────────────────────────────────────────────────────

  /// Insert `records` into `D::COLLECTION`.
  fn insert<D: Draft>(
    &self,
    records: Vec<D>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The first record matching `filter`, or `None`.
  fn select_one<R: Record>(
    &self,
    filter: Filter,
  ) -> impl Future<Output = Result<Option<R>, Self::Error>> + Send + '_;

  /// A filtered, ordered window of records. A range starting past the last
  /// match yields an empty page rather than an error.
  fn select_page<R: Record>(
    &self,
    select: Select,
  ) -> impl Future<Output = Result<Page<R>, Self::Error>> + Send + '_;

  /// Delete the record with `id`. Deleting a missing record is not an error.
  fn delete_one(
    &self,
    collection: Collection,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
