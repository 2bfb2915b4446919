//! [`SupabaseBackend`]: the hosted implementation of [`Backend`].

use std::{
  sync::{Arc, Mutex},
  time::Duration,
};

use chrono::Utc;
use newman_core::{
  backend::{Backend, SESSION_FEED_CAPACITY, SessionChanges},
  identity::{Account, AuthEvent, Session, SessionChange},
  query::{Filter, Page, Select},
  record::{Collection, Draft, Record},
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{Error, Result, SupabaseConfig, http::Http};

/// How long before expiry the access token is renewed.
const REFRESH_MARGIN_SECS: i64 = 60;

// ─── Shared state ────────────────────────────────────────────────────────────

struct Inner {
  http:    Http,
  session: Mutex<Option<Session>>,
  feed:    broadcast::Sender<SessionChange>,
  /// Cancels the renewal task of the current session.
  renewal: Mutex<CancellationToken>,
}

impl Inner {
  fn current(&self) -> Option<Session> {
    self.session.lock().ok().and_then(|s| s.clone())
  }

  fn access_token(&self) -> Option<String> {
    self
      .session
      .lock()
      .ok()
      .and_then(|s| s.as_ref().map(|s| s.access_token.clone()))
  }

  /// Replace the held session and announce it.
  fn store(&self, event: AuthEvent, session: Option<Session>) {
    if let Ok(mut slot) = self.session.lock() {
      *slot = session.clone();
    }
    debug!(%event, "session change");
    let _ = self.feed.send(SessionChange { event, session });
  }
}

// ─── Backend ─────────────────────────────────────────────────────────────────

/// A console backend talking to a hosted Supabase project.
///
/// Nothing is persisted locally: a new process starts signed out.
pub struct SupabaseBackend {
  inner:    Arc<Inner>,
  shutdown: CancellationToken,
}

impl SupabaseBackend {
  pub fn new(config: SupabaseConfig) -> Result<Self> {
    let (feed, _) = broadcast::channel(SESSION_FEED_CAPACITY);
    let shutdown = CancellationToken::new();
    Ok(Self {
      inner: Arc::new(Inner {
        http: Http::new(config)?,
        session: Mutex::new(None),
        feed,
        renewal: Mutex::new(shutdown.child_token()),
      }),
      shutdown,
    })
  }

  /// Adopt `session` (or none), announce it, and restart renewal for it.
  fn apply(&self, event: AuthEvent, session: Option<Session>) {
    let renewal = self.shutdown.child_token();
    if let Ok(mut slot) = self.inner.renewal.lock() {
      let previous = std::mem::replace(&mut *slot, renewal.clone());
      previous.cancel();
    }

    self.inner.store(event, session.clone());

    if let Some(session) = session
      && session.expires_at.is_some()
    {
      tokio::spawn(keep_fresh(Arc::clone(&self.inner), session, renewal));
    }
  }
}

impl Drop for SupabaseBackend {
  fn drop(&mut self) { self.shutdown.cancel(); }
}

/// Renew `session` shortly before each expiry until cancelled. A failed
/// renewal signs the console out.
async fn keep_fresh(inner: Arc<Inner>, mut session: Session, cancel: CancellationToken) {
  while let Some(expires_at) = session.expires_at {
    let renew_at = expires_at - chrono::Duration::seconds(REFRESH_MARGIN_SECS);
    let wait = (renew_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);

    tokio::select! {
      () = cancel.cancelled() => return,
      () = tokio::time::sleep(wait) => {}
    }

    let renewed = tokio::select! {
      () = cancel.cancelled() => return,
      renewed = inner.http.refresh_grant(&session.refresh_token) => renewed,
    };

    match renewed {
      Ok(next) => {
        info!("access token renewed");
        inner.store(AuthEvent::TokenRefreshed, Some(next.clone()));
        session = next;
      }
      Err(e) => {
        warn!(error = %e, "session renewal failed, signing out");
        inner.store(AuthEvent::SignedOut, None);
        return;
      }
    }
  }
}

// ─── Backend impl ────────────────────────────────────────────────────────────

impl Backend for SupabaseBackend {
  type Error = Error;

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn get_session(&self) -> Result<Option<Session>> { Ok(self.inner.current()) }

  fn session_changes(&self) -> SessionChanges { self.inner.feed.subscribe() }

  async fn sign_up<'a>(&'a self, email: &'a str, password: &'a str) -> Result<Option<Account>> {
    let outcome = self.inner.http.sign_up(email, password).await?;
    if let Some(session) = outcome.session {
      self.apply(AuthEvent::SignedIn, Some(session));
    }
    Ok(Some(outcome.account))
  }

  async fn sign_in_with_password<'a>(&'a self, email: &'a str, password: &'a str) -> Result<()> {
    let session = self.inner.http.password_grant(email, password).await?;
    self.apply(AuthEvent::SignedIn, Some(session));
    Ok(())
  }

  /// Revoke the session server-side, then forget it locally. The local
  /// session is dropped even when revocation fails.
  async fn sign_out(&self) -> Result<()> {
    let revoked = match self.inner.access_token() {
      Some(token) => self.inner.http.logout(&token).await,
      None => Ok(()),
    };
    self.apply(AuthEvent::SignedOut, None);
    revoked
  }

  // ── Collections ───────────────────────────────────────────────────────────

  async fn insert<D: Draft>(&self, records: Vec<D>) -> Result<()> {
    let token = self.inner.access_token();
    self.inner.http.insert(token.as_deref(), &records).await
  }

  async fn select_one<R: Record>(&self, filter: Filter) -> Result<Option<R>> {
    let token = self.inner.access_token();
    self.inner.http.select_first(token.as_deref(), filter).await
  }

  async fn select_page<R: Record>(&self, select: Select) -> Result<Page<R>> {
    let token = self.inner.access_token();
    self.inner.http.select(token.as_deref(), &select).await
  }

  async fn delete_one(&self, collection: Collection, id: Uuid) -> Result<()> {
    let token = self.inner.access_token();
    self.inner.http.delete(token.as_deref(), collection, id).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn backend() -> SupabaseBackend {
    SupabaseBackend::new(SupabaseConfig::new("http://127.0.0.1:9", "anon")).unwrap()
  }

  fn session(expires_in: Option<i64>) -> Session {
    Session {
      access_token:  "access".into(),
      refresh_token: "refresh".into(),
      expires_at:    expires_in.map(|s| Utc::now() + chrono::Duration::seconds(s)),
      account:       Account {
        id:    Uuid::new_v4(),
        email: "ops@example.com".into(),
      },
    }
  }

  #[tokio::test]
  async fn starts_signed_out() {
    assert_eq!(backend().get_session().await.unwrap(), None);
  }

  #[tokio::test]
  async fn applied_sessions_are_held_and_announced() {
    let b = backend();
    let mut changes = b.session_changes();
    let s = session(None);

    b.apply(AuthEvent::SignedIn, Some(s.clone()));

    assert_eq!(b.get_session().await.unwrap(), Some(s.clone()));
    let change = changes.recv().await.unwrap();
    assert_eq!(change.event, AuthEvent::SignedIn);
    assert_eq!(change.session, Some(s));
  }

  #[tokio::test]
  async fn failed_renewal_signs_out() {
    let b = backend();
    let mut changes = b.session_changes();

    // Already inside the margin, so renewal is attempted at once and fails
    // against the closed port.
    b.apply(AuthEvent::SignedIn, Some(session(Some(30))));
    assert_eq!(changes.recv().await.unwrap().event, AuthEvent::SignedIn);

    let change = tokio::time::timeout(Duration::from_secs(10), changes.recv())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(change.event, AuthEvent::SignedOut);
    assert_eq!(b.get_session().await.unwrap(), None);
  }

  #[tokio::test]
  async fn replacing_the_session_stops_the_old_renewal() {
    let b = backend();
    let mut changes = b.session_changes();

    b.apply(AuthEvent::SignedIn, Some(session(Some(3600))));
    let first = b.inner.renewal.lock().unwrap().clone();
    b.apply(AuthEvent::SignedOut, None);

    assert!(first.is_cancelled());
    assert!(!b.inner.renewal.lock().unwrap().is_cancelled());
    assert_eq!(changes.recv().await.unwrap().event, AuthEvent::SignedIn);
    assert_eq!(changes.recv().await.unwrap().event, AuthEvent::SignedOut);
    assert!(changes.try_recv().is_err());
  }

  #[tokio::test]
  async fn dropping_the_backend_cancels_renewal() {
    let b = backend();
    b.apply(AuthEvent::SignedIn, Some(session(Some(3600))));
    let token = b.inner.renewal.lock().unwrap().clone();

    drop(b);

    assert!(token.is_cancelled());
  }
}
