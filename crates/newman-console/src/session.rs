//! The Session Manager: the single source of truth for who is signed in.
//!
//! One [`SessionManager`] is built at process start and shared by reference
//! with every screen. Its state is written only by [`SessionManager::initialize`]
//! and by the listener task it starts, which applies the backend's
//! session-change feed in order. Sign-in and sign-out never write it
//! directly; their effect arrives through the feed.

use std::sync::{
  Arc, Mutex,
  atomic::{AtomicBool, Ordering},
};

use newman_core::{
  Error,
  backend::{Backend, SessionChanges},
  identity::{Account, NewProfile, Profile, Session},
  query::Filter,
};
use tokio::{
  sync::{broadcast::error::RecvError, watch},
  task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// ─── State ───────────────────────────────────────────────────────────────────

/// Snapshot of the authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
  pub account: Option<Account>,
  pub profile: Option<Profile>,
  pub session: Option<Session>,
  /// True until the first session lookup has resolved, successfully or not.
  pub loading: bool,
}

impl Default for AuthState {
  fn default() -> Self {
    Self {
      account: None,
      profile: None,
      session: None,
      loading: true,
    }
  }
}

impl AuthState {
  pub fn is_signed_in(&self) -> bool { self.account.is_some() }

  /// Name for the top bar.
  pub fn display_name(&self) -> &str {
    self
      .profile
      .as_ref()
      .map(|p| p.full_name.as_str())
      .filter(|name| !name.is_empty())
      .unwrap_or("User")
  }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

pub struct SessionManager<B: Backend> {
  backend:  Arc<B>,
  state:    Arc<watch::Sender<AuthState>>,
  shutdown: CancellationToken,
  listener: Mutex<Option<JoinHandle<()>>>,
  started:  AtomicBool,
}

impl<B: Backend> SessionManager<B> {
  /// Create a manager in the loading state. Nothing is requested until
  /// [`initialize`](Self::initialize) runs.
  pub fn new(backend: Arc<B>) -> Self {
    let (state, _) = watch::channel(AuthState::default());
    Self {
      backend,
      state: Arc::new(state),
      shutdown: CancellationToken::new(),
      listener: Mutex::new(None),
      started: AtomicBool::new(false),
    }
  }

  pub fn backend(&self) -> &Arc<B> { &self.backend }

  /// The current state.
  pub fn state(&self) -> AuthState { self.state.borrow().clone() }

  /// A receiver that observes every state change.
  pub fn watch(&self) -> watch::Receiver<AuthState> { self.state.subscribe() }

  pub fn account(&self) -> Option<Account> { self.state.borrow().account.clone() }

  /// Restore the backend's current session and start following its
  /// session-change feed. Runs once; later calls are ignored.
  ///
  /// `loading` is cleared however the lookup ends.
  pub async fn initialize(&self) {
    if self.started.swap(true, Ordering::SeqCst) {
      warn!("session manager already initialised");
      return;
    }

    // Subscribe before asking, so no change between the two is lost.
    let changes = self.backend.session_changes();

    match self.backend.get_session().await.map_err(Into::<Error>::into) {
      Ok(session) => {
        let next = resolve(self.backend.as_ref(), session).await;
        self.state.send_replace(next);
      }
      Err(e) => {
        error!(error = %e, "error getting session");
        self.state.send_modify(|s| s.loading = false);
      }
    }

    let task = tokio::spawn(follow(
      Arc::clone(&self.backend),
      Arc::clone(&self.state),
      changes,
      self.shutdown.clone(),
    ));
    if let Ok(mut slot) = self.listener.lock() {
      *slot = Some(task);
    }
  }

  /// Create an account and its profile record.
  ///
  /// An account-creation failure returns before the profile insert. A
  /// profile-insert failure is returned too, but the account stays created.
  pub async fn sign_up(
    &self,
    email: &str,
    password: &str,
    full_name: &str,
  ) -> Result<(), Error> {
    let account = self
      .backend
      .sign_up(email, password)
      .await
      .map_err(Into::<Error>::into)
      .inspect_err(|e| warn!(error = %e, "sign-up rejected"))?;

    let Some(account) = account else {
      return Ok(());
    };

    let profile = NewProfile {
      id:        account.id,
      full_name: full_name.to_owned(),
      email:     email.to_owned(),
    };
    self
      .backend
      .insert(vec![profile])
      .await
      .map_err(Into::<Error>::into)
      .inspect_err(|e| {
        error!(account = %account.id, error = %e, "error creating profile");
      })?;

    info!(account = %account.id, "account created");
    Ok(())
  }

  /// Authenticate with a password. The resulting session arrives through
  /// the session-change feed.
  pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), Error> {
    self
      .backend
      .sign_in_with_password(email, password)
      .await
      .map_err(Into::<Error>::into)
      .inspect_err(|e| warn!(error = %e, "sign-in rejected"))?;
    info!("signed in");
    Ok(())
  }

  /// End the session. Best effort: failures are logged, never returned.
  pub async fn sign_out(&self) {
    match self.backend.sign_out().await.map_err(Into::<Error>::into) {
      Ok(()) => info!("signed out"),
      Err(e) => error!(error = %e, "error signing out"),
    }
  }

  /// Stop following the session-change feed and wait for the listener to
  /// finish.
  pub async fn shutdown(&self) {
    self.shutdown.cancel();
    let task = self.listener.lock().ok().and_then(|mut slot| slot.take());
    if let Some(task) = task
      && let Err(e) = task.await
    {
      warn!(error = %e, "session listener ended abnormally");
    }
  }
}

impl<B: Backend> Drop for SessionManager<B> {
  fn drop(&mut self) { self.shutdown.cancel(); }
}

// ─── Feed handling ───────────────────────────────────────────────────────────

/// Apply session changes in arrival order until shut down or the feed closes.
async fn follow<B: Backend>(
  backend: Arc<B>,
  state: Arc<watch::Sender<AuthState>>,
  mut changes: SessionChanges,
  shutdown: CancellationToken,
) {
  loop {
    let received = tokio::select! {
      () = shutdown.cancelled() => break,
      received = changes.recv() => received,
    };

    let session = match received {
      Ok(change) => {
        debug!(event = %change.event, "session change");
        change.session
      }
      Err(RecvError::Lagged(skipped)) => {
        warn!(skipped, "session feed lagged, re-reading session");
        match backend.get_session().await.map_err(Into::<Error>::into) {
          Ok(session) => session,
          Err(e) => {
            error!(error = %e, "error getting session");
            continue;
          }
        }
      }
      Err(RecvError::Closed) => break,
    };

    let next = resolve(backend.as_ref(), session).await;
    state.send_replace(next);
  }
  debug!("session listener stopped");
}

/// The full state implied by `session`: no session means no profile.
async fn resolve<B: Backend>(backend: &B, session: Option<Session>) -> AuthState {
  let account = session.as_ref().map(|s| s.account.clone());
  let profile = match &account {
    Some(account) => fetch_profile(backend, account.id).await,
    None => None,
  };
  AuthState {
    account,
    profile,
    session,
    loading: false,
  }
}

/// Point lookup of a profile. Failures degrade to `None` and are only logged.
async fn fetch_profile<B: Backend>(backend: &B, id: Uuid) -> Option<Profile> {
  match backend
    .select_one::<Profile>(Filter::eq("id", id.to_string()))
    .await
    .map_err(Into::<Error>::into)
  {
    Ok(Some(profile)) => Some(profile),
    Ok(None) => {
      warn!(account = %id, "no profile for account");
      None
    }
    Err(e) => {
      error!(account = %id, error = %e, "error fetching profile");
      None
    }
  }
}
