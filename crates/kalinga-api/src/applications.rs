//! Handlers for `/applications` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/applications` | Submit or re-submit the full intake |
//! | `GET`  | `/applications` | Optional `?status=` filter |
//! | `GET`  | `/applications/:code_id` | Full case file; 404 if unknown |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use kalinga_core::{
  applicant::{Applicant, ApplicantStatus, CaseFile, CodeId, NewApplication},
  notify::Mailer,
  store::CaseStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

// ─── Submit ──────────────────────────────────────────────────────────────────

/// `POST /applications` — body: the full multi-step intake payload.
/// Returns 201 for a first submission, 200 for a re-submission after a
/// decline.
pub async fn submit<S, M>(
  State(state): State<AppState<S, M>>,
  Json(body): Json<NewApplication>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  if body.email.trim().is_empty() || !body.email.contains('@') {
    return Err(ApiError::Validation(format!(
      "email address is invalid: {:?}",
      body.email
    )));
  }
  if body.profile.first_name.trim().is_empty()
    || body.profile.last_name.trim().is_empty()
  {
    return Err(ApiError::Validation(
      "first_name and last_name are required".to_string(),
    ));
  }

  let outcome = state
    .store
    .submit_application(body)
    .await
    .map_err(ApiError::from_store)?;

  let status = if outcome.resubmission {
    StatusCode::OK
  } else {
    StatusCode::CREATED
  };
  Ok((status, Json(outcome)))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<ApplicantStatus>,
}

/// `GET /applications[?status=<status>]`
pub async fn list<S, M>(
  State(state): State<AppState<S, M>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Applicant>>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let applicants = state
    .store
    .list_applicants(params.status)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(applicants))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /applications/:code_id`
pub async fn get_one<S, M>(
  State(state): State<AppState<S, M>>,
  Path(code_id): Path<CodeId>,
) -> Result<Json<CaseFile>, ApiError>
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
  Ok(Json(file))
}
