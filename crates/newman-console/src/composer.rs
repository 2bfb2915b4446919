//! Message Composer: subject, body and store targeting for a new message.

use std::sync::Arc;

use newman_core::{
  Error,
  backend::Backend,
  message::NewMessage,
  query::{Order, Select},
  store::Store,
  targeting::{TargetKind, Targeting},
};
use tokio::sync::watch;
use tracing::{error, info};

use crate::{scope::Scope, session::AuthState};

pub const MISSING_FIELDS: &str = "Please fill in both subject and message body";

pub const DISCARD_PROMPT: &str =
  "Are you sure you want to cancel? All changes will be lost.";

/// A confirmed intent to throw the draft away. Created only by
/// [`Composer::cancel`] when there is something to lose.
#[derive(Debug, PartialEq, Eq)]
pub struct DiscardRequest {
  _confirmed: (),
}

impl DiscardRequest {
  pub fn prompt(&self) -> &'static str { DISCARD_PROMPT }
}

/// What leaving the composer takes.
#[derive(Debug, PartialEq, Eq)]
pub enum CancelOutcome {
  /// Nothing was entered; leave straight away.
  Leave,
  /// Ask first, then pass the request to [`Composer::discard`].
  Confirm(DiscardRequest),
}

pub struct Composer<B: Backend> {
  backend:       Arc<B>,
  auth:          watch::Receiver<AuthState>,
  pub subject:   String,
  pub body:      String,
  targeting:     Targeting,
  stores:        Vec<Store>,
  stores_loaded: bool,
  submitting:    bool,
  scope:         Scope,
}

impl<B: Backend> Composer<B> {
  pub fn new(backend: Arc<B>, auth: watch::Receiver<AuthState>) -> Self {
    Self {
      backend,
      auth,
      subject: String::new(),
      body: String::new(),
      targeting: Targeting::default(),
      stores: Vec::new(),
      stores_loaded: false,
      submitting: false,
      scope: Scope::new(),
    }
  }

  /// The store reference list, ordered by name.
  pub fn stores(&self) -> &[Store] { &self.stores }

  pub fn targeting(&self) -> &Targeting { &self.targeting }

  /// Direct access for typing into the manual input.
  pub fn targeting_mut(&mut self) -> &mut Targeting { &mut self.targeting }

  pub fn selected_stores(&self) -> &[String] { self.targeting.selected() }

  pub fn is_submitting(&self) -> bool { self.submitting }

  pub fn scope(&self) -> Scope { self.scope.clone() }

  /// Like [`scope`](Self::scope), but rearmed first so it can abandon the
  /// next request even after an earlier one was cancelled.
  pub fn cancel_handle(&mut self) -> Scope {
    self.scope.rearm();
    self.scope.clone()
  }

  /// Fetch the store reference list. Runs once per composer; a failure
  /// leaves the list empty and may be retried.
  pub async fn load_stores(&mut self) -> Result<(), Error> {
    if self.stores_loaded {
      return Ok(());
    }
    self.scope.rearm();
    let select = Select::all().order(Order::asc("name"));
    let page = self
      .scope
      .run(self.backend.select_page::<Store>(select))
      .await
      .inspect_err(|e| {
        if !e.is_cancelled() {
          error!(error = %e, "error fetching stores");
        }
      })?;
    self.stores = page.rows;
    self.stores_loaded = true;
    Ok(())
  }

  // ── Targeting ─────────────────────────────────────────────────────────────

  /// Switch strategy. Whatever the previous strategy had selected or typed
  /// is dropped; [`TargetKind::All`] selects every known store at once.
  pub fn select_mode(&mut self, kind: TargetKind) {
    self.targeting = Targeting::switch_to(kind, &self.stores);
  }

  /// Checklist toggle; ignored outside list mode.
  pub fn toggle_store(&mut self, code: &str) -> bool { self.targeting.toggle(code) }

  /// Chip dismissal: drop `code` from the selection in any mode.
  pub fn remove_store(&mut self, code: &str) -> bool { self.targeting.remove(code) }

  /// Apply the typed manual codes.
  pub fn confirm_manual(&mut self) -> bool { self.targeting.confirm_manual() }

  // ── Submit / cancel ───────────────────────────────────────────────────────

  /// Whether leaving would lose anything.
  pub fn is_dirty(&self) -> bool {
    !self.subject.is_empty()
      || !self.body.is_empty()
      || !self.selected_stores().is_empty()
  }

  /// The message a submit would insert, or why it cannot be sent.
  pub fn draft(&self) -> Result<NewMessage, Error> {
    let account = self.auth.borrow().account.clone().ok_or(Error::NotSignedIn)?;
    if self.subject.trim().is_empty() || self.body.trim().is_empty() {
      return Err(Error::Validation(MISSING_FIELDS.into()));
    }
    Ok(NewMessage {
      title:          self.subject.clone(),
      body:           self.body.clone(),
      list_of_stores: self.selected_stores().to_vec(),
      user_id:        account.id,
    })
  }

  /// Validate and insert the message. On failure the form keeps its
  /// contents so the operator can retry.
  pub async fn submit(&mut self) -> Result<(), Error> {
    let draft = self.draft()?;
    let stores = draft.list_of_stores.len();

    self.scope.rearm();
    self.submitting = true;
    let result = self.scope.run(self.backend.insert(vec![draft])).await;
    self.submitting = false;

    match result {
      Ok(()) => {
        info!(stores, "message created");
        Ok(())
      }
      Err(e) => {
        if !e.is_cancelled() {
          error!(error = %e, "error creating message");
        }
        Err(e)
      }
    }
  }

  /// Ask to leave the composer.
  pub fn cancel(&self) -> CancelOutcome {
    if self.is_dirty() {
      CancelOutcome::Confirm(DiscardRequest { _confirmed: () })
    } else {
      CancelOutcome::Leave
    }
  }

  /// Throw the draft away after the operator confirmed.
  pub fn discard(&mut self, _request: DiscardRequest) {
    self.subject.clear();
    self.body.clear();
    self.targeting = Targeting::default();
  }
}

impl<B: Backend> Drop for Composer<B> {
  fn drop(&mut self) { self.scope.cancel(); }
}
