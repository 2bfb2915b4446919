mod composer;
mod fake;
mod session;

use std::{sync::Arc, time::Duration};

use newman_core::identity::{Account, NewProfile};
use tokio::sync::watch;

use self::fake::FakeBackend;
use crate::session::{AuthState, SessionManager};

const PASSWORD: &str = "Secr3t!pass";

/// Wait until the watched state satisfies `pred`, failing the test after a
/// second.
async fn settle(
  rx: &mut watch::Receiver<AuthState>,
  pred: impl FnMut(&AuthState) -> bool,
) -> AuthState {
  tokio::time::timeout(Duration::from_secs(1), rx.wait_for(pred))
    .await
    .expect("state did not settle in time")
    .expect("session manager dropped")
    .clone()
}

/// A backend holding one account with a profile, already signed in, and an
/// initialised manager observing it.
async fn signed_in() -> (Arc<FakeBackend>, SessionManager<FakeBackend>, Account) {
  let backend = Arc::new(FakeBackend::new());
  let account = backend.add_account("ops@example.com", PASSWORD);
  insert_profile(&backend, &account, "Olive Ops").await;
  backend.restore(&account);

  let manager = SessionManager::new(Arc::clone(&backend));
  manager.initialize().await;
  (backend, manager, account)
}

async fn insert_profile(backend: &FakeBackend, account: &Account, name: &str) {
  use newman_core::backend::Backend;
  backend
    .insert(vec![NewProfile {
      id:        account.id,
      full_name: name.into(),
      email:     account.email.clone(),
    }])
    .await
    .unwrap();
}
