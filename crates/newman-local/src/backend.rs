//! [`LocalBackend`]: the SQLite implementation of [`Backend`].

use std::path::Path;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use chrono::Utc;
use newman_core::{
  backend::{Backend, SESSION_FEED_CAPACITY, SessionChanges},
  identity::{Account, AuthEvent, Session, SessionChange},
  query::{Direction, Filter, Page, Select},
  record::{Collection, Draft, Record},
  store::NewStore,
};
use rand_core::OsRng;
use rusqlite::{ErrorCode, OptionalExtension as _};
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawAccount, RawSession, Stamped, encode_dt, encode_uuid, field_path, stamp},
  schema::SCHEMA,
};

/// Records matching the collection and the optional equality filter.
/// `?2` is a JSON path or NULL, `?3` the JSON-encoded value.
const MATCHING: &str = "collection = ?1
  AND (?2 IS NULL OR json_extract(body, ?2) = json_extract(?3, '$'))";

// ─── Backend ─────────────────────────────────────────────────────────────────

/// A console backend stored in a single SQLite file.
///
/// The signed-in session is stored too, so it survives a restart. Sign-up
/// never issues a session; the new account signs in explicitly.
///
/// Cloning is cheap; clones share the connection and the session feed.
#[derive(Clone)]
pub struct LocalBackend {
  conn: tokio_rusqlite::Connection,
  feed: broadcast::Sender<SessionChange>,
}

impl LocalBackend {
  /// Open (or create) a database at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_owned();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let backend = Self::with_connection(conn).await?;
    info!(path = %path.display(), "local database opened");
    Ok(backend)
  }

  /// Open an in-memory database, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_connection(conn).await
  }

  async fn with_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    let (feed, _) = broadcast::channel(SESSION_FEED_CAPACITY);
    Ok(Self { conn, feed })
  }

  /// Insert `stores` when the store collection is empty. Returns how many
  /// were inserted.
  pub async fn seed_stores(&self, stores: Vec<NewStore>) -> Result<usize> {
    if self.count(Collection::Stores).await? > 0 {
      return Ok(0);
    }
    let n = stores.len();
    self.insert_drafts(stores).await?;
    info!(stores = n, "store collection seeded");
    Ok(n)
  }

  async fn count(&self, collection: Collection) -> Result<u64> {
    let name = collection.to_string();
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM records WHERE collection = ?1",
          rusqlite::params![name],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(n.max(0) as u64)
  }

  async fn insert_drafts<D: Draft>(&self, drafts: Vec<D>) -> Result<()> {
    let now = Utc::now();
    let rows = drafts
      .iter()
      .map(|d| stamp(D::COLLECTION, serde_json::to_value(d)?, now))
      .collect::<Result<Vec<Stamped>>>()?;
    let name = D::COLLECTION.to_string();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO records (collection, record_id, body) VALUES (?1, ?2, ?3)",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![name, row.id, row.body])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn account_by_email(&self, email: &str) -> Result<Option<RawAccount>> {
    let email = email.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT account_id, email, password_hash FROM accounts WHERE email = ?1",
              rusqlite::params![email],
              |r| {
                Ok(RawAccount {
                  account_id:    r.get(0)?,
                  email:         r.get(1)?,
                  password_hash: r.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(raw)
  }

  /// Replace the stored session with a fresh one for `account`.
  async fn issue_session(&self, account: Account) -> Result<Session> {
    let session = Session {
      access_token: Uuid::new_v4().simple().to_string(),
      refresh_token: Uuid::new_v4().simple().to_string(),
      expires_at: None,
      account,
    };

    let account_id = encode_uuid(session.account.id);
    let access = session.access_token.clone();
    let refresh = session.refresh_token.clone();
    let issued_at = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO sessions
             (slot, account_id, access_token, refresh_token, issued_at)
           VALUES (1, ?1, ?2, ?3, ?4)",
          rusqlite::params![account_id, access, refresh, issued_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(session)
  }

  fn emit(&self, event: AuthEvent, session: Option<Session>) {
    debug!(%event, "session change");
    // Nobody listening is fine.
    let _ = self.feed.send(SessionChange { event, session });
  }
}

async fn hash_password(password: String) -> Result<String> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|hash| hash.to_string())
      .map_err(|e| Error::Hash(e.to_string()))
  })
  .await
  .map_err(|e| Error::Hash(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
  tokio::task::spawn_blocking(move || {
    let parsed = PasswordHash::new(&hash).map_err(|e| Error::Hash(e.to_string()))?;
    Ok(
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok(),
    )
  })
  .await
  .map_err(|e| Error::Hash(e.to_string()))?
}

fn direction_sql(direction: Direction) -> &'static str {
  match direction {
    Direction::Ascending => "ASC",
    Direction::Descending => "DESC",
  }
}

/// `(path, json value)` parameters for [`MATCHING`].
fn filter_params(filter: Option<&Filter>) -> (Option<String>, Option<String>) {
  match filter {
    Some(f) => (Some(field_path(&f.field)), Some(f.value.to_string())),
    None => (None, None),
  }
}

// ─── Backend impl ────────────────────────────────────────────────────────────

impl Backend for LocalBackend {
  type Error = Error;

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn get_session(&self) -> Result<Option<Session>> {
    let raw = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "SELECT s.account_id, a.email, s.access_token, s.refresh_token
               FROM sessions s JOIN accounts a ON a.account_id = s.account_id
               WHERE s.slot = 1",
              [],
              |r| {
                Ok(RawSession {
                  account_id:    r.get(0)?,
                  email:         r.get(1)?,
                  access_token:  r.get(2)?,
                  refresh_token: r.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSession::into_session).transpose()
  }

  fn session_changes(&self) -> SessionChanges { self.feed.subscribe() }

  async fn sign_up<'a>(&'a self, email: &'a str, password: &'a str) -> Result<Option<Account>> {
    let account = Account {
      id:    Uuid::new_v4(),
      email: email.to_owned(),
    };
    let hash = hash_password(password.to_owned()).await?;

    let account_id = encode_uuid(account.id);
    let email = account.email.clone();
    let created_at = encode_dt(Utc::now());
    let created = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO accounts (account_id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![account_id, email, hash, created_at],
        ) {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !created {
      return Err(Error::EmailTaken);
    }
    info!(account = %account.id, "account registered");
    Ok(Some(account))
  }

  async fn sign_in_with_password<'a>(&'a self, email: &'a str, password: &'a str) -> Result<()> {
    let raw = self
      .account_by_email(email)
      .await?
      .ok_or(Error::InvalidCredentials)?;
    if !verify_password(password.to_owned(), raw.password_hash.clone()).await? {
      return Err(Error::InvalidCredentials);
    }

    let session = self.issue_session(raw.account()?).await?;
    self.emit(AuthEvent::SignedIn, Some(session));
    Ok(())
  }

  async fn sign_out(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute("DELETE FROM sessions", [])?;
        Ok(())
      })
      .await?;
    self.emit(AuthEvent::SignedOut, None);
    Ok(())
  }

  // ── Collections ───────────────────────────────────────────────────────────

  async fn insert<D: Draft>(&self, records: Vec<D>) -> Result<()> {
    self.insert_drafts(records).await
  }

  async fn select_one<R: Record>(&self, filter: Filter) -> Result<Option<R>> {
    let name = R::COLLECTION.to_string();
    let (path, value) = filter_params(Some(&filter));

    let body: Option<String> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT body FROM records WHERE {MATCHING} ORDER BY seq LIMIT 1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![name, path, value], |r| r.get(0))
            .optional()?,
        )
      })
      .await?;

    Ok(body.map(|b| serde_json::from_str(&b)).transpose()?)
  }

  async fn select_page<R: Record>(&self, select: Select) -> Result<Page<R>> {
    let name = R::COLLECTION.to_string();
    let (path, value) = filter_params(select.filter.as_ref());
    let (order_path, direction) = match &select.order {
      Some(order) => (Some(field_path(&order.field)), direction_sql(order.direction)),
      None => (None, "ASC"),
    };
    let (limit, offset) = match select.range {
      Some(range) if range.is_empty() => (0, 0),
      Some(range) => (range.len() as i64, range.from as i64),
      None => (-1, 0),
    };
    let count = select.count;

    let (bodies, total): (Vec<String>, Option<i64>) = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT body FROM records
           WHERE {MATCHING}
           ORDER BY json_extract(body, ?4) {direction}, seq {direction}
           LIMIT ?5 OFFSET ?6"
        );
        let mut stmt = conn.prepare(&sql)?;
        let bodies = stmt
          .query_map(
            rusqlite::params![name, path, value, order_path, limit, offset],
            |r| r.get(0),
          )?
          .collect::<rusqlite::Result<Vec<String>>>()?;

        let total = if count {
          let sql = format!("SELECT COUNT(*) FROM records WHERE {MATCHING}");
          Some(conn.query_row(&sql, rusqlite::params![name, path, value], |r| r.get(0))?)
        } else {
          None
        };
        Ok((bodies, total))
      })
      .await?;

    let rows = bodies
      .iter()
      .map(|b| serde_json::from_str(b))
      .collect::<Result<Vec<R>, _>>()?;
    Ok(Page {
      rows,
      total: total.map(|n| n.max(0) as u64),
    })
  }

  async fn delete_one(&self, collection: Collection, id: Uuid) -> Result<()> {
    let name = collection.to_string();
    let id = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM records WHERE collection = ?1 AND record_id = ?2",
          rusqlite::params![name, id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
