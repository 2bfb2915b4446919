//! Message List Controller: the signed-in account's messages, a page at a
//! time, newest first.

use std::sync::Arc;

use newman_core::{
  Error,
  backend::Backend,
  message::Message,
  page::{PAGE_SIZE, Pagination, page_range, total_pages},
  query::{Filter, Order, Select},
  record::{Collection, Record},
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{scope::Scope, session::AuthState};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this message?";

/// A confirmed intent to delete one message.
///
/// Only [`MessageList::request_delete`] creates one, and only
/// [`MessageList::delete`] consumes it, so a delete cannot be issued without
/// going through the confirmation step.
#[derive(Debug, PartialEq, Eq)]
pub struct DeleteRequest {
  id: Uuid,
}

impl DeleteRequest {
  pub fn id(&self) -> Uuid { self.id }

  pub fn prompt(&self) -> &'static str { DELETE_PROMPT }
}

pub struct MessageList<B: Backend> {
  backend:    Arc<B>,
  auth:       watch::Receiver<AuthState>,
  pagination: Pagination,
  messages:   Vec<Message>,
  loading:    bool,
  viewing:    Option<Message>,
  scope:      Scope,
}

impl<B: Backend> MessageList<B> {
  pub fn new(backend: Arc<B>, auth: watch::Receiver<AuthState>) -> Self {
    Self {
      backend,
      auth,
      pagination: Pagination::default(),
      messages: Vec::new(),
      loading: false,
      viewing: None,
      scope: Scope::new(),
    }
  }

  pub fn messages(&self) -> &[Message] { &self.messages }

  pub fn pagination(&self) -> Pagination { self.pagination }

  pub fn is_loading(&self) -> bool { self.loading }

  /// The message open in the detail view.
  pub fn viewing(&self) -> Option<&Message> { self.viewing.as_ref() }

  /// A handle that abandons whatever request is pending.
  pub fn scope(&self) -> Scope { self.scope.clone() }

  /// Like [`scope`](Self::scope), but rearmed first so it can abandon the
  /// next request even after an earlier one was cancelled.
  pub fn cancel_handle(&mut self) -> Scope {
    self.scope.rearm();
    self.scope.clone()
  }

  /// Whether the page controls are worth drawing.
  pub fn shows_pagination(&self) -> bool {
    !self.messages.is_empty() && self.pagination.total_pages > 1
  }

  // ── Loading ───────────────────────────────────────────────────────────────

  /// Load `page` (1-based) of the signed-in account's messages. Does nothing
  /// when nobody is signed in. On failure the current page is kept.
  pub async fn fetch(&mut self, page: u64) -> Result<(), Error> {
    let Some(account) = self.auth.borrow().account.clone() else {
      return Ok(());
    };
    let page = page.max(1);

    let select = Select::all()
      .filter(Filter::eq("user_id", account.id.to_string()))
      .order(Order::desc(Message::COLLECTION.created_field()))
      .range(page_range(page))
      .with_count();

    self.scope.rearm();
    self.loading = true;
    let result = self
      .scope
      .run(self.backend.select_page::<Message>(select))
      .await;
    self.loading = false;

    match result {
      Ok(found) => {
        let total = match found.total {
          Some(total) => total,
          None => {
            // A full page may have more after it.
            let rows = found.rows.len() as u64;
            let seen = page.saturating_sub(1) * PAGE_SIZE + rows + u64::from(rows == PAGE_SIZE);
            warn!(page, seen, "backend returned no message count, paging may be short");
            seen
          }
        };
        self.messages = found.rows;
        self.pagination = Pagination::new(page, total_pages(total));
        Ok(())
      }
      Err(e) => {
        if !e.is_cancelled() {
          error!(page, error = %e, "error fetching messages");
        }
        Err(e)
      }
    }
  }

  /// Reload the current page.
  pub async fn refresh(&mut self) -> Result<(), Error> {
    self.fetch(self.pagination.current).await
  }

  /// Move to `page`, clamped to the known page count.
  pub async fn go_to(&mut self, page: u64) -> Result<(), Error> {
    let page = page.clamp(1, self.pagination.total_pages);
    self.fetch(page).await
  }

  /// Next page; nothing happens on the last one.
  pub async fn next_page(&mut self) -> Result<(), Error> {
    match self.pagination.next() {
      Some(page) => self.fetch(page).await,
      None => Ok(()),
    }
  }

  /// Previous page; nothing happens on the first one.
  pub async fn previous_page(&mut self) -> Result<(), Error> {
    match self.pagination.previous() {
      Some(page) => self.fetch(page).await,
      None => Ok(()),
    }
  }

  // ── Viewing ───────────────────────────────────────────────────────────────

  /// Open `message` in the detail view. No request is made.
  pub fn view(&mut self, message: Message) { self.viewing = Some(message); }

  pub fn close_view(&mut self) { self.viewing = None; }

  // ── Deleting ──────────────────────────────────────────────────────────────

  /// Start deleting `id`. The caller must show [`DeleteRequest::prompt`]
  /// and pass the request to [`delete`](Self::delete) only if the operator
  /// agrees.
  pub fn request_delete(&self, id: Uuid) -> DeleteRequest { DeleteRequest { id } }

  /// Delete the confirmed message, then reload the current page. The page
  /// is not stepped back if it ends up empty.
  ///
  /// A failed delete leaves the list untouched. A failed reload after a
  /// successful delete is only logged.
  pub async fn delete(&mut self, request: DeleteRequest) -> Result<(), Error> {
    let id = request.id;
    self.scope.rearm();
    self
      .scope
      .run(self.backend.delete_one(Collection::Messages, id))
      .await
      .inspect_err(|e| {
        if !e.is_cancelled() {
          error!(message = %id, error = %e, "error deleting message");
        }
      })?;
    info!(message = %id, "message deleted");

    if self.viewing.as_ref().is_some_and(|m| m.id == id) {
      self.viewing = None;
    }
    if let Err(e) = self.refresh().await {
      warn!(error = %e, "list not refreshed after delete");
    }
    Ok(())
  }
}

impl<B: Backend> Drop for MessageList<B> {
  fn drop(&mut self) { self.scope.cancel(); }
}
