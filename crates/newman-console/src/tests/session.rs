use std::sync::Arc;

use newman_core::{Error, identity::AuthEvent, record::Collection};

use super::{
  PASSWORD,
  fake::{FakeBackend, Op},
  insert_profile, settle, signed_in,
};
use crate::session::SessionManager;

#[tokio::test]
async fn initialize_restores_the_existing_session_and_profile() {
  let (_backend, manager, account) = signed_in().await;

  let state = manager.state();
  assert!(!state.loading);
  assert_eq!(state.account, Some(account.clone()));
  assert_eq!(state.profile.as_ref().map(|p| p.id), Some(account.id));
  assert_eq!(state.display_name(), "Olive Ops");
}

#[tokio::test]
async fn initialize_without_a_session_leaves_everyone_signed_out() {
  let backend = Arc::new(FakeBackend::new());
  let manager = SessionManager::new(Arc::clone(&backend));
  assert!(manager.state().loading);

  manager.initialize().await;

  let state = manager.state();
  assert!(!state.loading);
  assert_eq!(state.account, None);
  assert_eq!(state.profile, None);
  assert_eq!(state.display_name(), "User");
}

#[tokio::test]
async fn failed_session_lookup_still_clears_loading() {
  let backend = Arc::new(FakeBackend::new());
  backend.fail_transport(Op::GetSession);
  let manager = SessionManager::new(Arc::clone(&backend));

  manager.initialize().await;

  let state = manager.state();
  assert!(!state.loading);
  assert_eq!(state.account, None);
}

#[tokio::test]
async fn initialize_runs_once() {
  let (backend, manager, _) = signed_in().await;
  manager.initialize().await;
  assert_eq!(backend.calls(Op::GetSession), 1);
}

#[tokio::test]
async fn failed_profile_lookup_keeps_the_account() {
  let backend = Arc::new(FakeBackend::new());
  let account = backend.add_account("ops@example.com", PASSWORD);
  backend.restore(&account);
  backend.fail(Op::SelectOne(Collection::Profiles));
  let manager = SessionManager::new(Arc::clone(&backend));

  manager.initialize().await;

  let state = manager.state();
  assert_eq!(state.account, Some(account));
  assert_eq!(state.profile, None);
  assert_eq!(state.display_name(), "User");
}

#[tokio::test]
async fn sign_up_creates_a_profile_keyed_by_the_account_id() {
  let backend = Arc::new(FakeBackend::new());
  backend.defer_sessions();
  let manager = SessionManager::new(Arc::clone(&backend));
  manager.initialize().await;

  manager
    .sign_up("new@example.com", PASSWORD, "Nina New")
    .await
    .unwrap();

  let profiles = backend.rows(Collection::Profiles);
  assert_eq!(profiles.len(), 1);
  assert_eq!(profiles[0]["full_name"], "Nina New");
  assert_eq!(profiles[0]["email"], "new@example.com");

  // No session was issued, so signing in is still required.
  assert_eq!(manager.state().account, None);
  manager.sign_in("new@example.com", PASSWORD).await.unwrap();

  let mut rx = manager.watch();
  let state = settle(&mut rx, |s| s.account.is_some()).await;
  let account_id = state.account.as_ref().map(|a| a.id.to_string());
  assert_eq!(profiles[0]["id"].as_str().map(str::to_owned), account_id);
  assert_eq!(state.display_name(), "Nina New");
}

#[tokio::test]
async fn rejected_sign_up_skips_the_profile_insert() {
  let backend = Arc::new(FakeBackend::new());
  backend.fail(Op::SignUp);
  let manager = SessionManager::new(Arc::clone(&backend));

  let err = manager
    .sign_up("new@example.com", PASSWORD, "Nina New")
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Backend { .. }));
  assert_eq!(backend.calls(Op::Insert(Collection::Profiles)), 0);
}

#[tokio::test]
async fn failed_profile_insert_is_reported_but_the_account_remains() {
  let backend = Arc::new(FakeBackend::new());
  backend.defer_sessions();
  backend.fail(Op::Insert(Collection::Profiles));
  let manager = SessionManager::new(Arc::clone(&backend));

  let err = manager
    .sign_up("new@example.com", PASSWORD, "Nina New")
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Backend { .. }));
  assert!(backend.rows(Collection::Profiles).is_empty());
  manager.sign_in("new@example.com", PASSWORD).await.unwrap();
}

#[tokio::test]
async fn bad_credentials_leave_the_account_unset() {
  let backend = Arc::new(FakeBackend::new());
  backend.add_account("ops@example.com", PASSWORD);
  let manager = SessionManager::new(Arc::clone(&backend));
  manager.initialize().await;

  let err = manager
    .sign_in("ops@example.com", "wrong-password")
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Backend { .. }));
  assert_eq!(manager.state().account, None);
}

#[tokio::test]
async fn sign_in_arrives_through_the_feed() {
  let backend = Arc::new(FakeBackend::new());
  let account = backend.add_account("ops@example.com", PASSWORD);
  insert_profile(&backend, &account, "Olive Ops").await;
  let manager = SessionManager::new(Arc::clone(&backend));
  manager.initialize().await;

  manager.sign_in("ops@example.com", PASSWORD).await.unwrap();

  let mut rx = manager.watch();
  let state = settle(&mut rx, |s| s.account.is_some()).await;
  assert_eq!(state.account, Some(account));
  assert_eq!(state.display_name(), "Olive Ops");
}

#[tokio::test]
async fn sign_out_is_idempotent() {
  let (_backend, manager, _) = signed_in().await;
  let mut rx = manager.watch();

  manager.sign_out().await;
  let state = settle(&mut rx, |s| s.account.is_none()).await;
  assert_eq!(state.profile, None);
  assert_eq!(state.session, None);

  manager.sign_out().await;
  assert_eq!(manager.state().account, None);
}

#[tokio::test]
async fn failed_sign_out_is_swallowed() {
  let (backend, manager, account) = signed_in().await;
  backend.fail_transport(Op::SignOut);

  manager.sign_out().await;

  assert_eq!(manager.state().account, Some(account));
}

#[tokio::test]
async fn the_last_change_wins() {
  let (backend, manager, _) = signed_in().await;
  let first = backend.add_account("first@example.com", PASSWORD);
  let second = backend.add_account("second@example.com", PASSWORD);
  let mut rx = manager.watch();

  backend.emit(AuthEvent::SignedIn, Some(FakeBackend::session_for(&first)));
  backend.emit(AuthEvent::SignedIn, Some(FakeBackend::session_for(&second)));

  let state = settle(&mut rx, |s| {
    s.account.as_ref().map(|a| a.id) == Some(second.id)
  })
  .await;
  assert_eq!(state.account, Some(second));
}

#[tokio::test]
async fn token_refresh_replaces_the_session() {
  let (backend, manager, account) = signed_in().await;
  let mut rx = manager.watch();

  let mut refreshed = FakeBackend::session_for(&account);
  refreshed.access_token = "access-refreshed".into();
  backend.emit(AuthEvent::TokenRefreshed, Some(refreshed));

  let state = settle(&mut rx, |s| {
    s.session
      .as_ref()
      .is_some_and(|s| s.access_token == "access-refreshed")
  })
  .await;
  assert_eq!(state.account, Some(account));
}

#[tokio::test]
async fn shutdown_stops_following_the_feed() {
  let (backend, manager, account) = signed_in().await;

  manager.shutdown().await;
  backend.emit(AuthEvent::SignedOut, None);
  tokio::task::yield_now().await;

  assert_eq!(manager.state().account, Some(account));
}

#[tokio::test]
async fn profile_of_another_account_is_never_shown() {
  let (backend, manager, _) = signed_in().await;
  let other = backend.add_account("other@example.com", PASSWORD);
  let mut rx = manager.watch();

  backend.emit(AuthEvent::SignedIn, Some(FakeBackend::session_for(&other)));

  let state = settle(&mut rx, |s| {
    s.account.as_ref().map(|a| a.id) == Some(other.id)
  })
  .await;
  assert_eq!(state.profile, None);
}
