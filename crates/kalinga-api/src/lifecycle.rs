//! Handlers for the staff-driven lifecycle endpoints.
//!
//! Each handler runs one store transition and then dispatches the
//! transition's email (if any) best-effort, after the transaction has
//! committed.

use axum::{
  Json,
  extract::{Path, State},
};
use kalinga_core::{
  applicant::{Applicant, CodeId, Remark},
  lifecycle::{RemarksResolution, RenewalDecision, ReviewDecision},
  notify::Mailer,
  store::CaseStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, dispatch_mail, error::ApiError};

// ─── Review ──────────────────────────────────────────────────────────────────

/// `POST /applications/:code_id/review` — body:
/// `{"action":"accept"}` or `{"action":"decline","remarks":"..."}`.
pub async fn review<S, M>(
  State(state): State<AppState<S, M>>,
  Path(code_id): Path<CodeId>,
  Json(decision): Json<ReviewDecision>,
) -> Result<Json<Value>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let outcome = state
    .store
    .review_application(&code_id, decision)
    .await
    .map_err(ApiError::from_store)?;

  dispatch_mail(&*state.mailer, outcome.mail).await;
  Ok(Json(json!({
    "applicant": outcome.applicant,
    "verdict": outcome.verdict,
  })))
}

// ─── Remarks ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RemarksBody {
  pub remarks: String,
  /// Issuing office, e.g. "Barangay San Vicente".
  pub author:  String,
}

/// `POST /applications/:code_id/remarks` — place a verified applicant
/// under investigation.
pub async fn issue_remarks<S, M>(
  State(state): State<AppState<S, M>>,
  Path(code_id): Path<CodeId>,
  Json(body): Json<RemarksBody>,
) -> Result<Json<Applicant>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let outcome = state
    .store
    .issue_remarks(&code_id, body.remarks, body.author)
    .await
    .map_err(ApiError::from_store)?;

  dispatch_mail(&*state.mailer, outcome.mail).await;
  Ok(Json(outcome.applicant))
}

/// `GET /applications/:code_id/remarks`
pub async fn list_remarks<S, M>(
  State(state): State<AppState<S, M>>,
  Path(code_id): Path<CodeId>,
) -> Result<Json<Vec<Remark>>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let remarks = state
    .store
    .list_remarks(&code_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(remarks))
}

#[derive(Debug, Deserialize)]
pub struct ResolutionBody {
  pub resolution: RemarksResolution,
}

/// `POST /applications/:code_id/remarks/resolution` — body:
/// `{"resolution":"accept"}` or `{"resolution":"decline"}`.
pub async fn resolve_remarks<S, M>(
  State(state): State<AppState<S, M>>,
  Path(code_id): Path<CodeId>,
  Json(body): Json<ResolutionBody>,
) -> Result<Json<Applicant>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let outcome = state
    .store
    .resolve_remarks(&code_id, body.resolution)
    .await
    .map_err(ApiError::from_store)?;

  dispatch_mail(&*state.mailer, outcome.mail).await;
  Ok(Json(outcome.applicant))
}

// ─── Termination ─────────────────────────────────────────────────────────────

/// `POST /applications/:code_id/termination`
pub async fn terminate<S, M>(
  State(state): State<AppState<S, M>>,
  Path(code_id): Path<CodeId>,
) -> Result<Json<Applicant>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let outcome = state
    .store
    .terminate(&code_id)
    .await
    .map_err(ApiError::from_store)?;

  dispatch_mail(&*state.mailer, outcome.mail).await;
  Ok(Json(outcome.applicant))
}

/// `DELETE /applications/:code_id/termination` — administrative reversal.
pub async fn reinstate<S, M>(
  State(state): State<AppState<S, M>>,
  Path(code_id): Path<CodeId>,
) -> Result<Json<Applicant>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let outcome = state
    .store
    .reinstate(&code_id)
    .await
    .map_err(ApiError::from_store)?;

  dispatch_mail(&*state.mailer, outcome.mail).await;
  Ok(Json(outcome.applicant))
}

// ─── Renewal ─────────────────────────────────────────────────────────────────

/// `POST /applications/:code_id/renewal`
pub async fn start_renewal<S, M>(
  State(state): State<AppState<S, M>>,
  Path(code_id): Path<CodeId>,
) -> Result<Json<Applicant>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let outcome = state
    .store
    .start_renewal(&code_id)
    .await
    .map_err(ApiError::from_store)?;

  dispatch_mail(&*state.mailer, outcome.mail).await;
  Ok(Json(outcome.applicant))
}

/// `POST /applications/:code_id/renewal/resolution` — body:
/// `{"action":"approve"}` or `{"action":"decline","remarks":"..."}`.
pub async fn resolve_renewal<S, M>(
  State(state): State<AppState<S, M>>,
  Path(code_id): Path<CodeId>,
  Json(decision): Json<RenewalDecision>,
) -> Result<Json<Applicant>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let outcome = state
    .store
    .resolve_renewal(&code_id, decision)
    .await
    .map_err(ApiError::from_store)?;

  dispatch_mail(&*state.mailer, outcome.mail).await;
  Ok(Json(outcome.applicant))
}
