//! JSON REST API for the Kalinga case-management backend.
//!
//! Exposes an axum [`Router`] backed by any [`kalinga_core::store::CaseStore`]
//! and any [`kalinga_core::notify::Mailer`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.

pub mod applications;
pub mod documents;
pub mod error;
pub mod lifecycle;
pub mod mailer;
pub mod notifications;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use kalinga_core::{
  lifecycle::MailRequest, notify::Mailer, store::CaseStore,
};
use serde::Deserialize;

pub use error::ApiError;
pub use mailer::LogMailer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `KALINGA_*` environment.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: CaseStore, M: Mailer> {
  pub store:  Arc<S>,
  pub mailer: Arc<M>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised router for `state`.
pub fn router<S, M>(state: AppState<S, M>) -> Router
where
  S: CaseStore + Clone + Send + Sync + 'static,
  M: Mailer + Clone + Send + Sync + 'static,
{
  Router::new()
    // Applications
    .route(
      "/applications",
      post(applications::submit::<S, M>).get(applications::list::<S, M>),
    )
    .route("/applications/{code_id}", get(applications::get_one::<S, M>))
    // Staff lifecycle
    .route(
      "/applications/{code_id}/review",
      post(lifecycle::review::<S, M>),
    )
    .route(
      "/applications/{code_id}/remarks",
      post(lifecycle::issue_remarks::<S, M>)
        .get(lifecycle::list_remarks::<S, M>),
    )
    .route(
      "/applications/{code_id}/remarks/resolution",
      post(lifecycle::resolve_remarks::<S, M>),
    )
    .route(
      "/applications/{code_id}/termination",
      post(lifecycle::terminate::<S, M>)
        .delete(lifecycle::reinstate::<S, M>),
    )
    .route(
      "/applications/{code_id}/renewal",
      post(lifecycle::start_renewal::<S, M>),
    )
    .route(
      "/applications/{code_id}/renewal/resolution",
      post(lifecycle::resolve_renewal::<S, M>),
    )
    // Documents
    .route(
      "/applications/{code_id}/documents",
      get(documents::checklist::<S, M>),
    )
    .route(
      "/applications/{code_id}/documents/{kind}",
      put(documents::upload::<S, M>).delete(documents::remove::<S, M>),
    )
    .route(
      "/applications/{code_id}/documents/{kind}/followup",
      post(documents::upload_followup::<S, M>),
    )
    .route(
      "/applications/{code_id}/documents/{kind}/status",
      post(documents::review::<S, M>),
    )
    // Notifications
    .route(
      "/applications/{code_id}/notifications",
      get(notifications::applicant_feed::<S, M>),
    )
    .route(
      "/applications/{code_id}/notifications/read",
      put(notifications::mark_read::<S, M>),
    )
    .route("/staff/notifications", get(notifications::staff_feed::<S, M>))
    .with_state(state)
}

// ─── Mail dispatch ───────────────────────────────────────────────────────────

/// Send the transition's email, if any, after the store has committed.
/// Best-effort: a failed send is logged and never fails the request.
pub(crate) async fn dispatch_mail<M: Mailer>(
  mailer: &M,
  mail: Option<MailRequest>,
) {
  let Some(mail) = mail else { return };
  if !mailer.send(&mail.to, &mail.first_name, &mail.event).await {
    tracing::warn!(to = %mail.to, "status email failed to send");
  }
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use kalinga_store_sqlite::SqliteCaseStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn make_state() -> AppState<SqliteCaseStore, LogMailer> {
    let store = SqliteCaseStore::open_in_memory().await.unwrap();
    AppState { store: Arc::new(store), mailer: Arc::new(LogMailer) }
  }

  fn sample_application(email: &str, civil_status: &str) -> Value {
    json!({
      "email": email,
      "profile": {
        "first_name": "Maria",
        "middle_name": "Santos",
        "last_name": "Reyes",
        "suffix": null,
        "age": 34,
        "gender": "Female",
        "date_of_birth": "1991-03-14",
        "place_of_birth": "Santa Maria",
        "barangay": "San Vicente",
        "education": "College",
        "civil_status": civil_status,
        "occupation": "Vendor",
        "income": "12000",
        "employment_status": "Self-employed",
        "contact_number": "09171234567",
        "classification": null,
        "needs": null
      },
      "children": [],
      "emergency": {
        "name": "Jose Reyes",
        "relationship": "Brother",
        "address": "123 Mabini St",
        "contact_number": "09179876543"
      }
    })
  }

  async fn request(
    state: AppState<SqliteCaseStore, LogMailer>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let req = builder.body(body).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn submit(
    state: &AppState<SqliteCaseStore, LogMailer>,
    email: &str,
    civil_status: &str,
  ) -> String {
    let resp = request(
      state.clone(),
      "POST",
      "/applications",
      Some(sample_application(email, civil_status)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    body["applicant"]["code_id"].as_str().unwrap().to_string()
  }

  async fn put_document(
    state: &AppState<SqliteCaseStore, LogMailer>,
    code_id: &str,
    kind: &str,
  ) -> Value {
    let resp = request(
      state.clone(),
      "PUT",
      &format!("/applications/{code_id}/documents/{kind}"),
      Some(json!({
        "file_name": format!("{kind}.pdf"),
        "display_name": kind,
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
  }

  // ── Submission ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn submit_returns_201_with_a_code_id() {
    let state = make_state().await;
    let resp = request(
      state,
      "POST",
      "/applications",
      Some(sample_application("maria@example.com", "single")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = body_json(resp).await;
    assert_eq!(body["applicant"]["status"], "Pending");
    assert_eq!(body["resubmission"], false);
    let code_id = body["applicant"]["code_id"].as_str().unwrap();
    kalinga_core::applicant::CodeId::parse(code_id).unwrap();
  }

  #[tokio::test]
  async fn duplicate_email_returns_409() {
    let state = make_state().await;
    submit(&state, "maria@example.com", "single").await;

    let resp = request(
      state,
      "POST",
      "/applications",
      Some(sample_application("maria@example.com", "single")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn malformed_email_returns_400() {
    let state = make_state().await;
    let resp = request(
      state,
      "POST",
      "/applications",
      Some(sample_application("not-an-email", "single")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn unknown_applicant_returns_404() {
    let state = make_state().await;
    let resp =
      request(state, "GET", "/applications/2024_01_000000", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn invalid_code_id_in_path_returns_400() {
    let state = make_state().await;
    let resp = request(state, "GET", "/applications/not-a-code", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Documents ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn invalid_document_kind_returns_400() {
    let state = make_state().await;
    let code_id = submit(&state, "maria@example.com", "single").await;

    let resp = request(
      state,
      "PUT",
      &format!("/applications/{code_id}/documents/passport"),
      Some(json!({ "file_name": "p.pdf", "display_name": "Passport" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn full_upload_flow_verifies_a_married_applicant() {
    let state = make_state().await;
    let code_id = submit(&state, "maria@example.com", "married").await;

    for kind in ["psa", "itr", "med_cert"] {
      let body = put_document(&state, &code_id, kind).await;
      assert_eq!(body["verified"], false);
    }
    let body = put_document(&state, &code_id, "marriage").await;
    assert_eq!(body["verified"], true);

    let resp = request(
      state,
      "GET",
      &format!("/applications/{code_id}"),
      None,
    )
    .await;
    let file = body_json(resp).await;
    assert_eq!(file["applicant"]["status"], "Verified");
    assert_eq!(file["documents"].as_array().unwrap().len(), 4);
  }

  #[tokio::test]
  async fn checklist_names_the_required_kinds() {
    let state = make_state().await;
    // Civil status matching is case-insensitive at the intake boundary.
    let code_id = submit(&state, "maria@example.com", "Widowed").await;

    let resp = request(
      state,
      "GET",
      &format!("/applications/{code_id}/documents"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(
      body["required"],
      json!(["psa", "itr", "med_cert", "marriage", "death_cert"])
    );
  }

  // ── Review ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn accept_with_unapproved_documents_reports_incomplete() {
    let state = make_state().await;
    let code_id = submit(&state, "maria@example.com", "single").await;
    put_document(&state, &code_id, "psa").await;

    let resp = request(
      state,
      "POST",
      &format!("/applications/{code_id}/review"),
      Some(json!({ "action": "accept" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["applicant"]["status"], "Incomplete");
    assert_eq!(body["verdict"]["result"], "incomplete");
  }

  #[tokio::test]
  async fn decline_without_remarks_returns_400() {
    let state = make_state().await;
    let code_id = submit(&state, "maria@example.com", "single").await;

    let resp = request(
      state,
      "POST",
      &format!("/applications/{code_id}/review"),
      Some(json!({ "action": "decline", "remarks": "" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Lifecycle ──────────────────────────────────────────────────────────────

  /// Submit with no extra requirements and upload the base set so the
  /// applicant auto-verifies.
  async fn verified_applicant(
    state: &AppState<SqliteCaseStore, LogMailer>,
  ) -> String {
    let code_id = submit(state, "maria@example.com", "other").await;
    for kind in ["psa", "itr", "med_cert"] {
      put_document(state, &code_id, kind).await;
    }
    code_id
  }

  #[tokio::test]
  async fn terminate_and_reinstate_round_trip() {
    let state = make_state().await;
    let code_id = verified_applicant(&state).await;

    let resp = request(
      state.clone(),
      "POST",
      &format!("/applications/{code_id}/termination"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "Terminated");

    let resp = request(
      state,
      "DELETE",
      &format!("/applications/{code_id}/termination"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "Verified");
  }

  #[tokio::test]
  async fn terminating_a_pending_applicant_returns_409() {
    let state = make_state().await;
    let code_id = submit(&state, "maria@example.com", "single").await;

    let resp = request(
      state,
      "POST",
      &format!("/applications/{code_id}/termination"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn remarks_flow_over_http() {
    let state = make_state().await;
    let code_id = verified_applicant(&state).await;

    let resp = request(
      state.clone(),
      "POST",
      &format!("/applications/{code_id}/remarks"),
      Some(json!({
        "remarks": "Reported to be cohabiting",
        "author": "Barangay San Vicente"
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "Pending Remarks");

    let resp = request(
      state,
      "POST",
      &format!("/applications/{code_id}/remarks/resolution"),
      Some(json!({ "resolution": "accept" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "Verified");
  }

  // ── Notifications ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn staff_feed_lists_program_office_notifications() {
    let state = make_state().await;
    submit(&state, "maria@example.com", "single").await;

    let resp = request(
      state,
      "GET",
      "/staff/notifications?audience=program_office",
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let feed = body_json(resp).await;
    assert_eq!(feed.as_array().unwrap().len(), 1);
    assert_eq!(feed[0]["kind"], "new_application");
  }

  #[tokio::test]
  async fn barangay_feed_requires_the_barangay_parameter() {
    let state = make_state().await;
    let resp = request(
      state,
      "GET",
      "/staff/notifications?audience=barangay",
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn applicant_feed_and_mark_read() {
    let state = make_state().await;
    let code_id = verified_applicant(&state).await;

    let resp = request(
      state.clone(),
      "GET",
      &format!("/applications/{code_id}/notifications"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let feed = body_json(resp).await;
    assert!(!feed.as_array().unwrap().is_empty());

    let resp = request(
      state.clone(),
      "PUT",
      &format!("/applications/{code_id}/notifications/read"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["updated"].as_u64().unwrap() >= 1);

    let resp = request(
      state,
      "GET",
      &format!("/applications/{code_id}/notifications"),
      None,
    )
    .await;
    let feed = body_json(resp).await;
    assert!(
      feed
        .as_array()
        .unwrap()
        .iter()
        .all(|n| n["is_read"] == true)
    );
  }
}
