//! Scripted in-memory backend with failure injection and call counting.

use std::{
  collections::{HashMap, HashSet},
  sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use newman_core::{
  Error,
  backend::{Backend, SESSION_FEED_CAPACITY, SessionChanges},
  identity::{Account, AuthEvent, Session, SessionChange},
  message::NewMessage,
  query::{Direction, Filter, Page, Select},
  record::{Collection, Draft, Record},
  store::NewStore,
};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A backend call, for failure injection and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
  GetSession,
  SignUp,
  SignIn,
  SignOut,
  Insert(Collection),
  SelectOne(Collection),
  SelectPage(Collection),
  Delete(Collection),
}

#[derive(Debug, Clone, Copy)]
enum Failure {
  Rejected,
  Transport,
}

#[derive(Debug, thiserror::Error)]
pub enum FakeError {
  #[error("{0}")]
  Rejected(String),
  #[error("connection reset by peer")]
  Transport,
}

impl From<FakeError> for Error {
  fn from(e: FakeError) -> Self {
    match e {
      FakeError::Rejected(message) => Error::Backend {
        status: Some(400),
        code: None,
        message,
      },
      FakeError::Transport => Error::Transport("connection reset by peer".into()),
    }
  }
}

#[derive(Default)]
struct State {
  accounts:      Vec<(Account, String)>,
  session:       Option<Session>,
  rows:          HashMap<Collection, Vec<Value>>,
  failing:       HashMap<Op, Failure>,
  stalled:       HashSet<Op>,
  calls:         Vec<Op>,
  ticks:         i64,
  defer_session: bool,
  no_count:      bool,
}

pub struct FakeBackend {
  state: Mutex<State>,
  feed:  broadcast::Sender<SessionChange>,
}

impl FakeBackend {
  pub fn new() -> Self {
    let (feed, _) = broadcast::channel(SESSION_FEED_CAPACITY);
    Self {
      state: Mutex::new(State::default()),
      feed,
    }
  }

  fn lock(&self) -> MutexGuard<'_, State> { self.state.lock().unwrap() }

  // ── Scripting ─────────────────────────────────────────────────────────────

  /// Sign-up creates the account but issues no session.
  pub fn defer_sessions(&self) { self.lock().defer_session = true; }

  /// Page selects never report a total.
  pub fn withhold_counts(&self) { self.lock().no_count = true; }

  pub fn fail(&self, op: Op) { self.lock().failing.insert(op, Failure::Rejected); }

  pub fn fail_transport(&self, op: Op) {
    self.lock().failing.insert(op, Failure::Transport);
  }

  pub fn heal(&self, op: Op) { self.lock().failing.remove(&op); }

  /// Calls to `op` never resolve.
  pub fn stall(&self, op: Op) { self.lock().stalled.insert(op); }

  pub fn calls(&self, op: Op) -> usize {
    self.lock().calls.iter().filter(|c| **c == op).count()
  }

  pub fn add_account(&self, email: &str, password: &str) -> Account {
    let account = Account {
      id:    Uuid::new_v4(),
      email: email.into(),
    };
    self.lock().accounts.push((account.clone(), password.into()));
    account
  }

  pub fn session_for(account: &Account) -> Session {
    Session {
      access_token:  format!("access-{}", account.id),
      refresh_token: format!("refresh-{}", account.id),
      expires_at:    None,
      account:       account.clone(),
    }
  }

  /// Make `account` signed in without emitting anything, as if restored.
  pub fn restore(&self, account: &Account) {
    self.lock().session = Some(Self::session_for(account));
  }

  /// Push a change onto the feed, updating the held session to match.
  pub fn emit(&self, event: AuthEvent, session: Option<Session>) {
    self.lock().session = session.clone();
    let _ = self.feed.send(SessionChange { event, session });
  }

  pub fn rows(&self, collection: Collection) -> Vec<Value> {
    self.lock().rows.get(&collection).cloned().unwrap_or_default()
  }

  pub fn seed_stores(&self, stores: &[(&str, &str)]) {
    for (code, name) in stores {
      self.put(NewStore::new(*code, *name)).unwrap();
    }
  }

  /// Insert `n` messages for `user_id`, oldest first. Returns their ids in
  /// insertion order.
  pub fn seed_messages(&self, user_id: Uuid, n: usize) -> Vec<Uuid> {
    (0..n)
      .map(|i| {
        self
          .put(NewMessage {
            title: format!("Message {i}"),
            body: format!("Body {i}"),
            list_of_stores: vec!["ST001".into()],
            user_id,
          })
          .unwrap()
      })
      .collect()
  }

  fn put<D: Draft>(&self, draft: D) -> Result<Uuid, FakeError> {
    let mut value =
      serde_json::to_value(&draft).map_err(|e| FakeError::Rejected(e.to_string()))?;
    let mut state = self.lock();
    state.ticks += 1;
    let created = base_time() + Duration::seconds(state.ticks);
    let Value::Object(fields) = &mut value else {
      return Err(FakeError::Rejected("record is not an object".into()));
    };
    let id = match fields.get("id").and_then(Value::as_str) {
      Some(id) => Uuid::parse_str(id).map_err(|e| FakeError::Rejected(e.to_string()))?,
      None => Uuid::new_v4(),
    };
    fields.insert("id".into(), Value::String(id.to_string()));
    fields
      .entry(D::COLLECTION.created_field())
      .or_insert_with(|| Value::String(created.to_rfc3339()));
    state.rows.entry(D::COLLECTION).or_default().push(value);
    Ok(id)
  }

  async fn enter(&self, op: Op) -> Result<(), FakeError> {
    let (stalled, failure) = {
      let mut state = self.lock();
      state.calls.push(op);
      (state.stalled.contains(&op), state.failing.get(&op).copied())
    };
    if stalled {
      std::future::pending::<()>().await;
    }
    match failure {
      Some(Failure::Rejected) => Err(FakeError::Rejected(format!("{op:?} rejected"))),
      Some(Failure::Transport) => Err(FakeError::Transport),
      None => Ok(()),
    }
  }
}

fn base_time() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() }

fn matches(row: &Value, filter: &Option<Filter>) -> bool {
  filter
    .as_ref()
    .is_none_or(|f| row.get(&f.field) == Some(&f.value))
}

fn sort_key(row: &Value, field: &str) -> String {
  match row.get(field) {
    Some(Value::String(s)) => s.clone(),
    Some(other) => other.to_string(),
    None => String::new(),
  }
}

impl Backend for FakeBackend {
  type Error = FakeError;

  async fn get_session(&self) -> Result<Option<Session>, FakeError> {
    self.enter(Op::GetSession).await?;
    Ok(self.lock().session.clone())
  }

  fn session_changes(&self) -> SessionChanges { self.feed.subscribe() }

  async fn sign_up<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> Result<Option<Account>, FakeError> {
    self.enter(Op::SignUp).await?;
    if self.lock().accounts.iter().any(|(a, _)| a.email == email) {
      return Err(FakeError::Rejected("User already registered".into()));
    }
    let account = self.add_account(email, password);
    if !self.lock().defer_session {
      self.emit(AuthEvent::SignedIn, Some(Self::session_for(&account)));
    }
    Ok(Some(account))
  }

  async fn sign_in_with_password<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> Result<(), FakeError> {
    self.enter(Op::SignIn).await?;
    let account = self
      .lock()
      .accounts
      .iter()
      .find(|(a, p)| a.email == email && p == password)
      .map(|(a, _)| a.clone())
      .ok_or_else(|| FakeError::Rejected("Invalid login credentials".into()))?;
    self.emit(AuthEvent::SignedIn, Some(Self::session_for(&account)));
    Ok(())
  }

  async fn sign_out(&self) -> Result<(), FakeError> {
    self.enter(Op::SignOut).await?;
    self.emit(AuthEvent::SignedOut, None);
    Ok(())
  }

  async fn insert<D: Draft>(&self, records: Vec<D>) -> Result<(), FakeError> {
    self.enter(Op::Insert(D::COLLECTION)).await?;
    for record in records {
      self.put(record)?;
    }
    Ok(())
  }

  async fn select_one<R: Record>(&self, filter: Filter) -> Result<Option<R>, FakeError> {
    self.enter(Op::SelectOne(R::COLLECTION)).await?;
    let filter = Some(filter);
    let row = self
      .rows(R::COLLECTION)
      .into_iter()
      .find(|row| matches(row, &filter));
    row
      .map(serde_json::from_value)
      .transpose()
      .map_err(|e| FakeError::Rejected(e.to_string()))
  }

  async fn select_page<R: Record>(&self, select: Select) -> Result<Page<R>, FakeError> {
    self.enter(Op::SelectPage(R::COLLECTION)).await?;
    let mut rows: Vec<Value> = self
      .rows(R::COLLECTION)
      .into_iter()
      .filter(|row| matches(row, &select.filter))
      .collect();
    if let Some(order) = &select.order {
      rows.sort_by_key(|row| sort_key(row, &order.field));
      if order.direction == Direction::Descending {
        rows.reverse();
      }
    }
    let total = rows.len() as u64;
    if let Some(range) = select.range {
      rows = rows
        .into_iter()
        .skip(range.from as usize)
        .take(range.len() as usize)
        .collect();
    }
    let rows = rows
      .into_iter()
      .map(serde_json::from_value)
      .collect::<Result<Vec<R>, _>>()
      .map_err(|e| FakeError::Rejected(e.to_string()))?;
    Ok(Page {
      rows,
      total: (select.count && !self.lock().no_count).then_some(total),
    })
  }

  async fn delete_one(&self, collection: Collection, id: Uuid) -> Result<(), FakeError> {
    self.enter(Op::Delete(collection)).await?;
    let id = Value::String(id.to_string());
    if let Some(rows) = self.lock().rows.get_mut(&collection) {
      rows.retain(|row| row.get("id") != Some(&id));
    }
    Ok(())
  }
}
