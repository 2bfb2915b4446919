use std::sync::Arc;

use newman_core::{Error, record::Collection, targeting::TargetKind};

use super::{
  fake::{FakeBackend, Op},
  signed_in,
};
use crate::{
  composer::{CancelOutcome, Composer, MISSING_FIELDS},
  session::SessionManager,
};

const INSERT: Op = Op::Insert(Collection::Messages);

async fn composer() -> (Arc<FakeBackend>, Composer<FakeBackend>) {
  let (backend, manager, _) = signed_in().await;
  backend.seed_stores(&[
    ("ST003", "Leeds"),
    ("ST001", "Bristol"),
    ("ST002", "Cardiff"),
  ]);
  let mut composer = Composer::new(Arc::clone(&backend), manager.watch());
  composer.load_stores().await.unwrap();
  (backend, composer)
}

fn written(composer: &mut Composer<FakeBackend>) {
  composer.subject = "Price change".into();
  composer.body = "New prices from Monday.".into();
}

#[tokio::test]
async fn stores_load_once_in_name_order() {
  let (backend, mut composer) = composer().await;
  composer.load_stores().await.unwrap();

  let names: Vec<&str> = composer.stores().iter().map(|s| s.name.as_str()).collect();
  assert_eq!(names, ["Bristol", "Cardiff", "Leeds"]);
  assert_eq!(backend.calls(Op::SelectPage(Collection::Stores)), 1);
}

#[tokio::test]
async fn empty_subject_never_reaches_the_backend() {
  let (backend, mut composer) = composer().await;
  composer.body = "Body only".into();

  let err = composer.submit().await.unwrap_err();

  assert_eq!(err, Error::Validation(MISSING_FIELDS.into()));
  assert_eq!(backend.calls(INSERT), 0);
}

#[tokio::test]
async fn whitespace_body_counts_as_empty() {
  let (backend, mut composer) = composer().await;
  composer.subject = "Subject".into();
  composer.body = "  \n ".into();

  assert!(matches!(composer.submit().await, Err(Error::Validation(_))));
  assert_eq!(backend.calls(INSERT), 0);
}

#[tokio::test]
async fn submitting_signed_out_is_refused() {
  let backend = Arc::new(FakeBackend::new());
  let manager = SessionManager::new(Arc::clone(&backend));
  manager.initialize().await;
  let mut composer = Composer::new(Arc::clone(&backend), manager.watch());
  written(&mut composer);

  assert_eq!(composer.submit().await, Err(Error::NotSignedIn));
  assert_eq!(backend.calls(INSERT), 0);
}

#[tokio::test]
async fn submit_records_the_checked_stores_in_order() {
  let (backend, mut composer) = composer().await;
  written(&mut composer);
  composer.select_mode(TargetKind::List);
  assert!(composer.toggle_store("ST002"));
  assert!(composer.toggle_store("ST001"));

  composer.submit().await.unwrap();

  let rows = backend.rows(Collection::Messages);
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["title"], "Price change");
  assert_eq!(rows[0]["list_of_stores"], serde_json::json!(["ST002", "ST001"]));
  assert!(!composer.is_submitting());
}

#[tokio::test]
async fn no_target_submits_an_empty_store_list() {
  let (backend, mut composer) = composer().await;
  written(&mut composer);

  composer.submit().await.unwrap();

  let rows = backend.rows(Collection::Messages);
  assert_eq!(rows[0]["list_of_stores"], serde_json::json!([]));
}

#[tokio::test]
async fn switching_from_list_to_manual_clears_the_selection() {
  let (_backend, mut composer) = composer().await;
  composer.select_mode(TargetKind::List);
  composer.toggle_store("ST001");
  composer.toggle_store("ST003");

  composer.select_mode(TargetKind::Manual);

  assert!(composer.selected_stores().is_empty());
  assert!(composer.targeting().is_editing_manual());
}

#[tokio::test]
async fn all_selects_every_store() {
  let (_backend, mut composer) = composer().await;

  composer.select_mode(TargetKind::All);

  assert_eq!(composer.selected_stores(), ["ST001", "ST002", "ST003"]);
}

#[tokio::test]
async fn manual_codes_are_taken_as_typed() {
  let (backend, mut composer) = composer().await;
  written(&mut composer);
  composer.select_mode(TargetKind::Manual);
  if let Some(input) = composer.targeting_mut().manual_input_mut() {
    input.push_str("ST001, ST001 ,,X9 ");
  }

  assert!(composer.confirm_manual());
  assert_eq!(composer.selected_stores(), ["ST001", "ST001", "X9"]);
  assert!(!composer.targeting().is_editing_manual());

  composer.submit().await.unwrap();
  let rows = backend.rows(Collection::Messages);
  assert_eq!(rows[0]["list_of_stores"], serde_json::json!(["ST001", "ST001", "X9"]));
}

#[tokio::test]
async fn blank_manual_input_is_ignored() {
  let (_backend, mut composer) = composer().await;
  composer.select_mode(TargetKind::Manual);

  assert!(!composer.confirm_manual());
  assert!(composer.targeting().is_editing_manual());
  assert!(composer.selected_stores().is_empty());
}

#[tokio::test]
async fn removing_a_chip_drops_every_copy() {
  let (_backend, mut composer) = composer().await;
  composer.select_mode(TargetKind::Manual);
  if let Some(input) = composer.targeting_mut().manual_input_mut() {
    input.push_str("A,B,A");
  }
  composer.confirm_manual();

  assert!(composer.remove_store("A"));
  assert_eq!(composer.selected_stores(), ["B"]);
  assert!(!composer.remove_store("A"));
}

#[tokio::test]
async fn failed_insert_keeps_the_form() {
  let (backend, mut composer) = composer().await;
  written(&mut composer);
  composer.select_mode(TargetKind::All);
  backend.fail(INSERT);

  assert!(matches!(composer.submit().await, Err(Error::Backend { .. })));

  assert_eq!(composer.subject, "Price change");
  assert_eq!(composer.selected_stores().len(), 3);
  assert!(!composer.is_submitting());
}

#[tokio::test]
async fn leaving_a_clean_form_needs_no_confirmation() {
  let (_backend, composer) = composer().await;
  assert_eq!(composer.cancel(), CancelOutcome::Leave);
}

#[tokio::test]
async fn leaving_a_dirty_form_asks_first() {
  let (_backend, mut composer) = composer().await;
  composer.select_mode(TargetKind::All);

  let CancelOutcome::Confirm(request) = composer.cancel() else {
    panic!("expected a confirmation");
  };
  assert_eq!(
    request.prompt(),
    "Are you sure you want to cancel? All changes will be lost."
  );

  composer.discard(request);
  assert!(!composer.is_dirty());
  assert_eq!(composer.cancel(), CancelOutcome::Leave);
}

#[tokio::test]
async fn cancelling_abandons_a_pending_submit() {
  let (backend, mut composer) = composer().await;
  written(&mut composer);
  backend.stall(INSERT);
  let scope = composer.scope();

  let (submitted, ()) = tokio::join!(composer.submit(), async { scope.cancel() });

  assert_eq!(submitted, Err(Error::Cancelled));
  assert!(backend.rows(Collection::Messages).is_empty());
  assert!(composer.is_dirty());
}
