//! Cancellable request scope owned by each view controller.

use std::future::Future;

use newman_core::Error;
use tokio_util::sync::CancellationToken;

/// Races backend requests against a cancellation token.
///
/// Clones share the token, so a view can hand a clone to whoever may need to
/// abandon its pending request. Once cancelled, a scope stays cancelled until
/// the owner calls [`Scope::rearm`].
#[derive(Debug, Clone, Default)]
pub struct Scope {
  token: CancellationToken,
}

impl Scope {
  pub fn new() -> Self { Self::default() }

  pub fn cancel(&self) { self.token.cancel(); }

  pub fn is_cancelled(&self) -> bool { self.token.is_cancelled() }

  /// Replace a cancelled token with a fresh one. Outstanding clones keep the
  /// old, cancelled token.
  pub fn rearm(&mut self) {
    if self.token.is_cancelled() {
      self.token = CancellationToken::new();
    }
  }

  /// Await `request`, resolving to [`Error::Cancelled`] if the scope is
  /// cancelled first.
  pub async fn run<F, T, E>(&self, request: F) -> Result<T, Error>
  where
    F: Future<Output = Result<T, E>>,
    E: Into<Error>,
  {
    tokio::select! {
      biased;
      () = self.token.cancelled() => Err(Error::Cancelled),
      out = request => out.map_err(Into::into),
    }
  }
}
