//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use scholar_core::{
  patch::{FieldUpdate, StudentPatch, merge, merge_at},
  store::{StoreError as _, StudentQuery, StudentStore},
  student::{Gender, NewStudent},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn ann() -> NewStudent {
  let mut input = NewStudent::new("Ann", "Lee", "a@x.com");
  input.date_of_birth = NaiveDate::from_ymd_opt(2000, 1, 1);
  input.gender = Some(Gender::Female);
  input
}

fn core_err(err: &crate::Error) -> &scholar_core::Error {
  err.as_core().expect("domain error")
}

// ─── Create / get ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get() {
  let s = store().await;

  let created = s.create(ann()).await.unwrap();
  assert_eq!(created.first_name, "Ann");
  assert_eq!(created.audit.created_at(), created.audit.updated_at());

  let fetched = s.get(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn create_validates_input() {
  let s = store().await;
  let mut input = ann();
  input.email = "nope".into();

  let err = s.create(input).await.unwrap_err();
  assert!(matches!(core_err(&err), scholar_core::Error::Validation { .. }));
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
  let s = store().await;
  s.create(ann()).await.unwrap();

  let mut twin = NewStudent::new("Bo", "Kim", "A@X.COM");
  twin.gender = Some(Gender::Male);
  let err = s.create(twin).await.unwrap_err();
  assert!(matches!(core_err(&err), scholar_core::Error::DuplicateEmail(_)));
}

#[tokio::test]
async fn empty_emails_may_repeat() {
  let s = store().await;
  s.create(NewStudent::new("Ann", "Lee", "")).await.unwrap();
  s.create(NewStudent::new("Bo", "Kim", "")).await.unwrap();

  let all = s.list(&StudentQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
  assert!(s.find_by_email("").await.unwrap().is_none());
}

#[tokio::test]
async fn find_by_email_ignores_case() {
  let s = store().await;
  let created = s.create(ann()).await.unwrap();

  let found = s.find_by_email("A@x.Com").await.unwrap().unwrap();
  assert_eq!(found.id, created.id);
  assert!(s.find_by_email("b@x.com").await.unwrap().is_none());
}

// ─── Save ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn merge_then_save_round_trip() {
  let s = store().await;
  let original = s.create(ann()).await.unwrap();

  let patch = StudentPatch {
    last_name: FieldUpdate::Set("Kim".into()),
    gender: FieldUpdate::Set(None),
    ..Default::default()
  };
  let merged = merge(&original, patch).unwrap();
  let saved = s.save(&merged, original.audit.updated_at()).await.unwrap();

  assert_eq!(saved.last_name, "Kim");
  assert_eq!(saved.gender, None);
  assert_eq!(saved.email, "a@x.com");
  assert_eq!(saved.audit.created_at(), original.audit.created_at());
  assert!(saved.audit.updated_at() >= original.audit.updated_at());

  assert_eq!(s.get(original.id).await.unwrap().unwrap(), saved);
}

#[tokio::test]
async fn every_save_advances_updated_at() {
  let s = store().await;
  let original = s.create(ann()).await.unwrap();

  // Stamped with the very instant it replaces; the store still moves it on.
  let same_instant =
    merge_at(&original, StudentPatch::default(), original.audit.updated_at()).unwrap();
  let saved = s.save(&same_instant, original.audit.updated_at()).await.unwrap();

  assert!(saved.audit.updated_at() > original.audit.updated_at());
  assert_eq!(saved.audit.created_at(), original.audit.created_at());
}

#[tokio::test]
async fn save_with_outdated_version_is_stale() {
  let s = store().await;
  let original = s.create(ann()).await.unwrap();
  let stale_version = original.audit.updated_at();

  let first = merge(&original, StudentPatch {
    first_name: FieldUpdate::Set("Anna".into()),
    ..Default::default()
  })
  .unwrap();
  s.save(&first, stale_version).await.unwrap();

  let second = merge(&original, StudentPatch {
    first_name: FieldUpdate::Set("Annie".into()),
    ..Default::default()
  })
  .unwrap();
  let err = s.save(&second, stale_version).await.unwrap_err();
  assert!(matches!(core_err(&err), scholar_core::Error::StaleWrite(id) if *id == original.id));

  assert_eq!(s.get(original.id).await.unwrap().unwrap().first_name, "Anna");
}

#[tokio::test]
async fn save_missing_student_is_not_found() {
  let s = store().await;
  let ghost = s.create(ann()).await.unwrap();
  s.delete(ghost.id).await.unwrap();

  let err = s.save(&ghost, ghost.audit.updated_at()).await.unwrap_err();
  assert!(matches!(core_err(&err), scholar_core::Error::StudentNotFound(_)));
}

#[tokio::test]
async fn save_onto_taken_email_is_duplicate() {
  let s = store().await;
  s.create(ann()).await.unwrap();
  let bo = s.create(NewStudent::new("Bo", "Kim", "bo@y.org")).await.unwrap();

  let merged = merge(&bo, StudentPatch {
    email: FieldUpdate::Set("a@x.com".into()),
    ..Default::default()
  })
  .unwrap();
  let err = s.save(&merged, bo.audit.updated_at()).await.unwrap_err();
  assert!(matches!(core_err(&err), scholar_core::Error::DuplicateEmail(_)));
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_reports_whether_a_row_went() {
  let s = store().await;
  let created = s.create(ann()).await.unwrap();

  assert!(s.delete(created.id).await.unwrap());
  assert!(!s.delete(created.id).await.unwrap());
  assert!(s.get(created.id).await.unwrap().is_none());
}

// ─── List ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_filters_by_text_and_gender() {
  let s = store().await;
  s.create(ann()).await.unwrap();
  let mut bo = NewStudent::new("Bo", "Kim", "bo@y.org");
  bo.gender = Some(Gender::Male);
  s.create(bo).await.unwrap();
  s.create(NewStudent::new("Cy", "Kimura", "cy@z.net")).await.unwrap();

  let kims = s
    .list(&StudentQuery { text: Some("kim".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(kims.len(), 2);

  let men = s
    .list(&StudentQuery { gender: Some(Gender::Male), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(men.len(), 1);
  assert_eq!(men[0].first_name, "Bo");
}

#[tokio::test]
async fn list_text_wildcards_match_literally() {
  let s = store().await;
  s.create(NewStudent::new("Ann", "Lee", "a@x.com")).await.unwrap();

  let hits = s
    .list(&StudentQuery { text: Some("%".into()), ..Default::default() })
    .await
    .unwrap();
  assert!(hits.is_empty());
}

#[tokio::test]
async fn list_pages_in_creation_order() {
  let s = store().await;
  let mut ids = Vec::new();
  for (i, name) in ["Ann", "Bo", "Cy"].into_iter().enumerate() {
    let created = s
      .create(NewStudent::new(name, "Lee", format!("s{i}@x.com")))
      .await
      .unwrap();
    ids.push(created.id);
  }

  let page = s
    .list(&StudentQuery { limit: Some(2), offset: Some(1), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(page.len(), 2);
  assert!(page.iter().all(|p| ids.contains(&p.id)));

  let all = s.list(&StudentQuery::default()).await.unwrap();
  let order: Vec<_> = all.iter().map(|p| p.first_name.as_str()).collect();
  assert_eq!(order, ["Ann", "Bo", "Cy"]);
}

#[tokio::test]
async fn out_of_range_paging_saturates() {
  let s = store().await;
  s.create(ann()).await.unwrap();

  let past_end = s
    .list(&StudentQuery { offset: Some(usize::MAX), ..Default::default() })
    .await
    .unwrap();
  assert!(past_end.is_empty());

  let huge_limit = s
    .list(&StudentQuery { limit: Some(usize::MAX), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(huge_limit.len(), 1);
}
