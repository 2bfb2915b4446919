//! Application state machine and event dispatcher.

use std::{sync::Arc, time::Duration};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use newman_console::{
  AuthState, Scope, SessionManager,
  composer::{CancelOutcome, Composer, DiscardRequest},
  guard::{Gate, Route, gate},
  messages::{DeleteRequest, MessageList},
};
use newman_core::{Error, backend::Backend, message::Message, store::Store, targeting::TargetKind};
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::forms::AuthForm;

pub const SIGN_IN_FAILED: &str = "Invalid email or password";
pub const ACCOUNT_CREATED: &str = "Account created. Please sign in.";

/// How long to wait for the session feed after signing in or out.
const SETTLE: Duration = Duration::from_secs(2);

// ─── Dialog ───────────────────────────────────────────────────────────────────

/// A yes/no confirmation covering the current screen.
#[derive(Debug)]
pub enum Dialog {
  Delete(DeleteRequest),
  Discard(DiscardRequest),
}

impl Dialog {
  pub fn prompt(&self) -> &'static str {
    match self {
      Self::Delete(request) => request.prompt(),
      Self::Discard(request) => request.prompt(),
    }
  }
}

// ─── Composer focus ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComposerFocus {
  #[default]
  Subject,
  Body,
  Targeting,
  Chips,
}

impl ComposerFocus {
  fn next(self) -> Self {
    match self {
      Self::Subject => Self::Body,
      Self::Body => Self::Targeting,
      Self::Targeting => Self::Chips,
      Self::Chips => Self::Subject,
    }
  }

  fn prev(self) -> Self {
    match self {
      Self::Subject => Self::Chips,
      Self::Body => Self::Subject,
      Self::Targeting => Self::Body,
      Self::Chips => Self::Targeting,
    }
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<B: Backend> {
  pub session: Arc<SessionManager<B>>,
  auth:        watch::Receiver<AuthState>,
  /// Account the open views were built for.
  account:     Option<Uuid>,

  /// Requested route; what actually shows is decided by [`gate`].
  pub route: Route,

  pub sign_in:  AuthForm,
  pub register: AuthForm,

  /// Message list, alive while on [`Route::Messages`].
  pub list:        Option<MessageList<B>>,
  pub list_cursor: usize,

  /// Composer, alive while on [`Route::CreateMessage`].
  pub composer:       Option<Composer<B>>,
  pub composer_focus: ComposerFocus,
  /// Fuzzy filter over the store checklist.
  pub store_filter:   String,
  /// Cursor within the *filtered* checklist.
  pub store_cursor:   usize,
  pub chip_cursor:    usize,

  pub dialog: Option<Dialog>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,
}

impl<B: Backend> App<B> {
  pub fn new(session: Arc<SessionManager<B>>) -> Self {
    let auth = session.watch();
    Self {
      session,
      auth,
      account: None,
      route: Route::Root,
      sign_in: AuthForm::sign_in(),
      register: AuthForm::register(),
      list: None,
      list_cursor: 0,
      composer: None,
      composer_focus: ComposerFocus::default(),
      store_filter: String::new(),
      store_cursor: 0,
      chip_cursor: 0,
      dialog: None,
      status_msg: String::new(),
    }
  }

  pub fn auth(&self) -> AuthState { self.auth.borrow().clone() }

  /// What the current route resolves to right now.
  pub fn gate(&self) -> Gate { gate(self.route, &self.auth.borrow()) }

  // ── Routing ───────────────────────────────────────────────────────────────

  /// Bring the screen in line with the session: follow redirects, leave
  /// the auth screens once signed in, and rebuild views when the account
  /// changes.
  pub async fn sync(&mut self) {
    let state = self.auth.borrow_and_update().clone();

    let account = state.account.as_ref().map(|a| a.id);
    if account != self.account {
      debug!(?account, "account changed");
      self.account = account;
      self.list = None;
      self.composer = None;
      self.dialog = None;
    }

    // At most Root → Messages → SignIn.
    for _ in 0..3 {
      let next = match gate(self.route, &state) {
        Gate::Redirect(route) => route,
        Gate::Render(Route::SignIn | Route::Register) if state.is_signed_in() => Route::Messages,
        Gate::Render(Route::Messages) if self.list.is_none() => Route::Messages,
        Gate::Render(Route::CreateMessage) if self.composer.is_none() => Route::CreateMessage,
        _ => break,
      };
      self.navigate(next).await;
    }
  }

  /// Switch to `route`, dropping the views of the route being left and
  /// loading the new one if it may render.
  pub async fn navigate(&mut self, route: Route) {
    debug!(path = route.path(), "navigate");
    self.route = route;
    self.dialog = None;
    if route != Route::Messages {
      self.list = None;
    }
    if route != Route::CreateMessage {
      self.composer = None;
    }

    let renders = gate(route, &self.auth.borrow()) == Gate::Render(route);
    if !renders {
      return;
    }
    match route {
      Route::Messages => self.open_messages().await,
      Route::CreateMessage => self.open_composer().await,
      _ => {}
    }
  }

  async fn open_messages(&mut self) {
    let list = self
      .list
      .get_or_insert_with(|| MessageList::new(Arc::clone(self.session.backend()), self.auth.clone()));
    self.list_cursor = 0;
    let outcome = list.fetch(1).await;
    self.report(outcome, "Error loading messages");
  }

  async fn open_composer(&mut self) {
    let composer = self
      .composer
      .get_or_insert_with(|| Composer::new(Arc::clone(self.session.backend()), self.auth.clone()));
    self.composer_focus = ComposerFocus::default();
    self.store_filter.clear();
    self.store_cursor = 0;
    self.chip_cursor = 0;
    let outcome = composer.load_stores().await;
    self.report(outcome, "Error loading stores");
  }

  /// A handle that abandons the request the current screen is waiting on.
  pub fn cancel_handle(&mut self) -> Option<Scope> {
    match self.route {
      Route::Messages => self.list.as_mut().map(MessageList::cancel_handle),
      Route::CreateMessage => self.composer.as_mut().map(Composer::cancel_handle),
      _ => None,
    }
  }

  /// Put a failure in the status bar. Returns whether `outcome` succeeded.
  fn report(&mut self, outcome: Result<(), Error>, context: &str) -> bool {
    match outcome {
      Ok(()) => true,
      Err(e) if e.is_cancelled() => {
        self.status_msg = "Request cancelled".into();
        false
      }
      Err(e) => {
        self.status_msg = format!("{context}: {e}");
        false
      }
    }
  }

  // ── Views ─────────────────────────────────────────────────────────────────

  /// The message under the list cursor.
  pub fn cursor_message(&self) -> Option<&Message> {
    self.list.as_ref()?.messages().get(self.list_cursor)
  }

  /// Stores matching the checklist filter, by code or name.
  pub fn filtered_stores(&self) -> Vec<&Store> {
    let Some(composer) = &self.composer else {
      return Vec::new();
    };
    if self.store_filter.is_empty() {
      return composer.stores().iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    composer
      .stores()
      .iter()
      .filter(|s| {
        matcher.fuzzy_match(&s.code, &self.store_filter).is_some()
          || matcher.fuzzy_match(&s.name, &self.store_filter).is_some()
      })
      .collect()
  }

  fn clamp_list_cursor(&mut self) {
    let len = self.list.as_ref().map_or(0, |l| l.messages().len());
    self.list_cursor = self.list_cursor.min(len.saturating_sub(1));
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }
    self.status_msg.clear();

    if self.dialog.is_some() {
      self.handle_dialog_key(key).await;
      return Ok(true);
    }

    match self.gate() {
      Gate::Loading | Gate::Redirect(_) => Ok(key.code != KeyCode::Char('q')),
      Gate::Render(Route::SignIn | Route::Register) => self.handle_form_key(key).await,
      Gate::Render(Route::Messages) => {
        if self.list.as_ref().is_some_and(|l| l.viewing().is_some()) {
          Ok(self.handle_detail_key(key))
        } else {
          self.handle_list_key(key).await
        }
      }
      Gate::Render(Route::CreateMessage) => self.handle_composer_key(key).await,
      Gate::Render(Route::Root) => Ok(true),
    }
  }

  // ── Sign-in / register ────────────────────────────────────────────────────

  fn form_mut(&mut self) -> &mut AuthForm {
    if self.route == Route::Register {
      &mut self.register
    } else {
      &mut self.sign_in
    }
  }

  async fn handle_form_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    let registering = self.route == Route::Register;
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Esc if registering => self.navigate(Route::SignIn).await,
      KeyCode::Esc => return Ok(false),
      KeyCode::Char('r') if ctrl && !registering => {
        self.register = AuthForm::register();
        self.navigate(Route::Register).await;
      }
      KeyCode::Char('l') if ctrl && registering => self.navigate(Route::SignIn).await,
      KeyCode::Tab | KeyCode::Down => self.form_mut().focus_next(),
      KeyCode::BackTab | KeyCode::Up => self.form_mut().focus_prev(),
      KeyCode::Enter if registering => self.submit_register().await,
      KeyCode::Enter => self.submit_sign_in().await,
      KeyCode::Backspace => self.form_mut().pop(),
      KeyCode::Char(c) if !ctrl => self.form_mut().push(c),
      _ => {}
    }
    Ok(true)
  }

  async fn submit_sign_in(&mut self) {
    self.sign_in.notice = None;
    if !self.sign_in.validate() {
      return;
    }
    let email = self.sign_in.email.clone();
    let password = self.sign_in.password.clone();
    match self.session.sign_in(&email, &password).await {
      Ok(()) => {
        self.sign_in.password.clear();
        self.settle(true).await;
      }
      Err(e) => {
        debug!(error = %e, "sign-in failed");
        self.sign_in.notice = Some(SIGN_IN_FAILED.into());
      }
    }
  }

  async fn submit_register(&mut self) {
    self.register.notice = None;
    if !self.register.validate() {
      return;
    }
    let full_name = self.register.full_name.clone();
    let email = self.register.email.clone();
    let password = self.register.password.clone();
    if let Err(e) = self.session.sign_up(&email, &password, &full_name).await {
      self.register.notice = Some(e.to_string());
      return;
    }

    self.register = AuthForm::register();
    let has_session = matches!(self.session.backend().get_session().await, Ok(Some(_)));
    if has_session {
      self.settle(true).await;
    } else {
      self.sign_in = AuthForm::sign_in();
      self.sign_in.email = email;
      self.sign_in.notice = Some(ACCOUNT_CREATED.into());
      self.navigate(Route::SignIn).await;
    }
  }

  async fn sign_out(&mut self) {
    self.session.sign_out().await;
    self.settle(false).await;
    self.sign_in = AuthForm::sign_in();
    self.navigate(Route::SignIn).await;
    self.status_msg = "Signed out".into();
  }

  /// Wait for the session feed to report `signed_in`.
  async fn settle(&mut self, signed_in: bool) {
    let reached = tokio::time::timeout(SETTLE, self.auth.wait_for(|s| s.is_signed_in() == signed_in))
      .await
      .is_ok();
    if !reached {
      debug!(signed_in, "session feed did not settle");
    }
  }

  // ── Message list ──────────────────────────────────────────────────────────

  async fn handle_list_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    let Some(list) = self.list.as_mut() else {
      return Ok(true);
    };
    let len = list.messages().len();

    let outcome = match key.code {
      KeyCode::Char('q') => return Ok(false),

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        if self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
        Ok(())
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
        Ok(())
      }
      KeyCode::Enter => {
        if let Some(message) = list.messages().get(self.list_cursor).cloned() {
          list.view(message);
        }
        Ok(())
      }

      // Paging
      KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown => {
        self.list_cursor = 0;
        list.next_page().await
      }
      KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => {
        self.list_cursor = 0;
        list.previous_page().await
      }
      KeyCode::Char(c @ '1'..='9') => {
        self.list_cursor = 0;
        list.go_to(u64::from(c as u8 - b'0')).await
      }
      KeyCode::Char('r') => list.refresh().await,

      // Actions
      KeyCode::Char('d') | KeyCode::Delete => {
        if let Some(message) = list.messages().get(self.list_cursor) {
          self.dialog = Some(Dialog::Delete(list.request_delete(message.id)));
        }
        Ok(())
      }
      KeyCode::Char('n') => {
        self.navigate(Route::CreateMessage).await;
        Ok(())
      }
      KeyCode::Char('o') => {
        self.sign_out().await;
        Ok(())
      }
      _ => Ok(()),
    };

    self.clamp_list_cursor();
    self.report(outcome, "Error loading messages");
    Ok(true)
  }

  fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
    let Some(list) = self.list.as_mut() else {
      return true;
    };
    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Esc | KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => list.close_view(),
      KeyCode::Char('d') | KeyCode::Delete => {
        if let Some(message) = list.viewing() {
          self.dialog = Some(Dialog::Delete(list.request_delete(message.id)));
        }
      }
      _ => {}
    }
    true
  }

  // ── Dialog ────────────────────────────────────────────────────────────────

  async fn handle_dialog_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('y') | KeyCode::Enter => match self.dialog.take() {
        Some(Dialog::Delete(request)) => self.confirm_delete(request).await,
        Some(Dialog::Discard(request)) => {
          if let Some(composer) = self.composer.as_mut() {
            composer.discard(request);
          }
          self.navigate(Route::Messages).await;
        }
        None => {}
      },
      KeyCode::Char('n') | KeyCode::Esc => self.dialog = None,
      _ => {}
    }
  }

  async fn confirm_delete(&mut self, request: DeleteRequest) {
    let Some(list) = self.list.as_mut() else {
      return;
    };
    let outcome = list.delete(request).await;
    if self.report(outcome, "Error deleting message") {
      self.status_msg = "Message deleted".into();
    }
    self.clamp_list_cursor();
  }

  // ── Composer ──────────────────────────────────────────────────────────────

  async fn handle_composer_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Char('s') if ctrl => {
        self.submit_message().await;
        return Ok(true);
      }
      KeyCode::Tab => {
        self.composer_focus = self.composer_focus.next();
        return Ok(true);
      }
      KeyCode::BackTab => {
        self.composer_focus = self.composer_focus.prev();
        return Ok(true);
      }
      _ => {}
    }

    let Some(composer) = self.composer.as_mut() else {
      return Ok(true);
    };
    match (self.composer_focus, key.code) {
      (ComposerFocus::Targeting, KeyCode::Esc) if composer.targeting().is_editing_manual() => {
        composer.targeting_mut().close_manual();
      }
      (ComposerFocus::Targeting, KeyCode::Esc) if composer.targeting().is_list_open() => {
        composer.targeting_mut().close_list();
        self.store_filter.clear();
        self.store_cursor = 0;
      }
      (_, KeyCode::Esc) => match composer.cancel() {
        CancelOutcome::Leave => self.navigate(Route::Messages).await,
        CancelOutcome::Confirm(request) => self.dialog = Some(Dialog::Discard(request)),
      },

      (ComposerFocus::Subject, KeyCode::Char(c)) if !ctrl => composer.subject.push(c),
      (ComposerFocus::Subject, KeyCode::Backspace) => {
        composer.subject.pop();
      }
      (ComposerFocus::Subject, KeyCode::Enter) => self.composer_focus = ComposerFocus::Body,

      (ComposerFocus::Body, KeyCode::Char(c)) if !ctrl => composer.body.push(c),
      (ComposerFocus::Body, KeyCode::Enter) => composer.body.push('\n'),
      (ComposerFocus::Body, KeyCode::Backspace) => {
        composer.body.pop();
      }

      (ComposerFocus::Targeting, _) => self.handle_targeting_key(key),
      (ComposerFocus::Chips, _) => self.handle_chip_key(key),
      _ => {}
    }
    Ok(true)
  }

  fn handle_targeting_key(&mut self, key: KeyEvent) {
    let filtered = self.filtered_stores().len();
    let under_cursor = self
      .filtered_stores()
      .get(self.store_cursor)
      .map(|s| s.code.clone());
    let Some(composer) = self.composer.as_mut() else {
      return;
    };

    if composer.targeting().is_editing_manual() {
      match key.code {
        KeyCode::Enter => {
          if !composer.confirm_manual() {
            composer.targeting_mut().close_manual();
          }
        }
        KeyCode::Backspace => {
          if let Some(input) = composer.targeting_mut().manual_input_mut() {
            input.pop();
          }
        }
        KeyCode::Char(c) => {
          if let Some(input) = composer.targeting_mut().manual_input_mut() {
            input.push(c);
          }
        }
        _ => {}
      }
    } else if composer.targeting().is_list_open() {
      match key.code {
        KeyCode::Char(' ') => {
          if let Some(code) = under_cursor {
            composer.toggle_store(&code);
          }
        }
        KeyCode::Enter => {
          composer.targeting_mut().close_list();
          self.store_filter.clear();
          self.store_cursor = 0;
        }
        KeyCode::Down => {
          if self.store_cursor + 1 < filtered {
            self.store_cursor += 1;
          }
        }
        KeyCode::Up => self.store_cursor = self.store_cursor.saturating_sub(1),
        KeyCode::Backspace => {
          self.store_filter.pop();
          self.store_cursor = 0;
        }
        KeyCode::Char(c) => {
          self.store_filter.push(c);
          self.store_cursor = 0;
        }
        _ => {}
      }
    } else {
      let kind = match key.code {
        KeyCode::Char('1' | 'm') => TargetKind::Manual,
        KeyCode::Char('2' | 'l') => TargetKind::List,
        KeyCode::Char('3' | 'a') => TargetKind::All,
        _ => return,
      };
      composer.select_mode(kind);
      self.store_filter.clear();
      self.store_cursor = 0;
      self.chip_cursor = 0;
    }
  }

  fn handle_chip_key(&mut self, key: KeyEvent) {
    let Some(composer) = self.composer.as_mut() else {
      return;
    };
    let count = composer.selected_stores().len();
    match key.code {
      KeyCode::Left | KeyCode::Char('h') => self.chip_cursor = self.chip_cursor.saturating_sub(1),
      KeyCode::Right | KeyCode::Char('l') => {
        if self.chip_cursor + 1 < count {
          self.chip_cursor += 1;
        }
      }
      KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => {
        if let Some(code) = composer.selected_stores().get(self.chip_cursor).cloned() {
          composer.remove_store(&code);
        }
        let count = composer.selected_stores().len();
        self.chip_cursor = self.chip_cursor.min(count.saturating_sub(1));
      }
      _ => {}
    }
  }

  async fn submit_message(&mut self) {
    let Some(composer) = self.composer.as_mut() else {
      return;
    };
    match composer.submit().await {
      Ok(()) => {
        self.status_msg = "Message created".into();
        self.navigate(Route::Messages).await;
      }
      Err(Error::Validation(message)) => self.status_msg = message,
      Err(Error::NotSignedIn) => {
        self.status_msg = "You must be signed in to create a message".into();
      }
      Err(e) => {
        self.report(Err(e), "Error creating message");
      }
    }
  }
}
