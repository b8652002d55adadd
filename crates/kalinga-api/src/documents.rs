//! Handlers for the per-applicant document endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/applications/:code_id/documents` | Checklist + rows |
//! | `PUT`    | `/applications/:code_id/documents/:kind` | Intake upload |
//! | `POST`   | `/applications/:code_id/documents/:kind/followup` | Post-review upload |
//! | `POST`   | `/applications/:code_id/documents/:kind/status` | Staff review |
//! | `DELETE` | `/applications/:code_id/documents/:kind` | Remove the row |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use kalinga_core::{
  applicant::CodeId,
  document::{Document, DocumentKind, DocumentStatus, DocumentUpload},
  lifecycle::{DocumentReviewOutcome, UploadOutcome},
  notify::Mailer,
  policy,
  store::CaseStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

fn parse_kind(kind: &str) -> Result<DocumentKind, ApiError> {
  DocumentKind::parse(kind).map_err(|e| ApiError::Validation(e.to_string()))
}

fn validate_upload(upload: &DocumentUpload) -> Result<(), ApiError> {
  if upload.file_name.trim().is_empty() || upload.display_name.trim().is_empty()
  {
    return Err(ApiError::Validation(
      "file_name and display_name are required".to_string(),
    ));
  }
  Ok(())
}

// ─── Checklist ───────────────────────────────────────────────────────────────

/// The applicant's required kinds next to whatever is on file.
#[derive(Debug, Serialize)]
pub struct DocumentChecklist {
  pub required:  Vec<DocumentKind>,
  pub documents: Vec<Document>,
}

/// `GET /applications/:code_id/documents`
pub async fn checklist<S, M>(
  State(state): State<AppState<S, M>>,
  Path(code_id): Path<CodeId>,
) -> Result<Json<DocumentChecklist>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let file = state
    .store
    .get_case_file(&code_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("applicant {code_id} not found"))
    })?;

  Ok(Json(DocumentChecklist {
    required:  policy::required_documents(file.profile.civil_status).to_vec(),
    documents: file.documents,
  }))
}

// ─── Uploads ─────────────────────────────────────────────────────────────────

/// `PUT /applications/:code_id/documents/:kind` — intake-flow upload; may
/// verify the applicant when it completes the required set.
pub async fn upload<S, M>(
  State(state): State<AppState<S, M>>,
  Path((code_id, kind)): Path<(CodeId, String)>,
  Json(body): Json<DocumentUpload>,
) -> Result<Json<UploadOutcome>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let kind = parse_kind(&kind)?;
  validate_upload(&body)?;

  let outcome = state
    .store
    .upload_document(&code_id, kind, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(outcome))
}

/// `POST /applications/:code_id/documents/:kind/followup`
pub async fn upload_followup<S, M>(
  State(state): State<AppState<S, M>>,
  Path((code_id, kind)): Path<(CodeId, String)>,
  Json(body): Json<DocumentUpload>,
) -> Result<Json<Document>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let kind = parse_kind(&kind)?;
  validate_upload(&body)?;

  let document = state
    .store
    .upload_followup_document(&code_id, kind, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(document))
}

// ─── Staff review ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub status:           String,
  pub rejection_reason: Option<String>,
}

/// `POST /applications/:code_id/documents/:kind/status` — staff sets the
/// review status of one document; approving the last outstanding one
/// verifies the applicant.
pub async fn review<S, M>(
  State(state): State<AppState<S, M>>,
  Path((code_id, kind)): Path<(CodeId, String)>,
  Json(body): Json<ReviewBody>,
) -> Result<Json<DocumentReviewOutcome>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let kind = parse_kind(&kind)?;
  let status = DocumentStatus::parse(&body.status)
    .map_err(|e| ApiError::Validation(e.to_string()))?;

  let outcome = state
    .store
    .set_document_status(&code_id, kind, status, body.rejection_reason)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(outcome))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /applications/:code_id/documents/:kind`
pub async fn remove<S, M>(
  State(state): State<AppState<S, M>>,
  Path((code_id, kind)): Path<(CodeId, String)>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let kind = parse_kind(&kind)?;

  let deleted = state
    .store
    .delete_document(&code_id, kind)
    .await
    .map_err(ApiError::from_store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!(
      "no {} document on file for {code_id}",
      kind.as_str()
    )));
  }
  Ok(StatusCode::NO_CONTENT)
}
