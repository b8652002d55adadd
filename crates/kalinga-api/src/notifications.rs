//! Handlers for the notification feeds.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use kalinga_core::{
  applicant::CodeId,
  notify::{Audience, Mailer, Notification, NotificationKind, PROGRAM_OFFICE_TARGET},
  store::CaseStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, error::ApiError};

// ─── Applicant feed ──────────────────────────────────────────────────────────

/// `GET /applications/:code_id/notifications`
pub async fn applicant_feed<S, M>(
  State(state): State<AppState<S, M>>,
  Path(code_id): Path<CodeId>,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  require_applicant(&state, &code_id).await?;
  let feed = state
    .store
    .notifications_for(Audience::Applicant, code_id.as_str())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(feed))
}

#[derive(Debug, Deserialize)]
pub struct MarkReadParams {
  pub kind: Option<NotificationKind>,
}

/// `PUT /applications/:code_id/notifications/read[?kind=<kind>]`
pub async fn mark_read<S, M>(
  State(state): State<AppState<S, M>>,
  Path(code_id): Path<CodeId>,
  Query(params): Query<MarkReadParams>,
) -> Result<Json<Value>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  require_applicant(&state, &code_id).await?;
  let updated = state
    .store
    .mark_notifications_read(
      Audience::Applicant,
      code_id.as_str(),
      params.kind,
    )
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "updated": updated })))
}

// ─── Staff feeds ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StaffFeedParams {
  pub audience: Audience,
  pub barangay: Option<String>,
}

/// `GET /staff/notifications?audience=program_office` or
/// `?audience=barangay&barangay=<name>`.
pub async fn staff_feed<S, M>(
  State(state): State<AppState<S, M>>,
  Query(params): Query<StaffFeedParams>,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  let target = match params.audience {
    Audience::ProgramOffice => PROGRAM_OFFICE_TARGET.to_string(),
    Audience::Barangay => params.barangay.ok_or_else(|| {
      ApiError::Validation(
        "barangay parameter is required for the barangay feed".to_string(),
      )
    })?,
    Audience::Applicant => {
      return Err(ApiError::Validation(
        "use /applications/:code_id/notifications for applicant feeds"
          .to_string(),
      ));
    }
  };

  let feed = state
    .store
    .notifications_for(params.audience, &target)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(feed))
}

async fn require_applicant<S, M>(
  state: &AppState<S, M>,
  code_id: &CodeId,
) -> Result<(), ApiError>
where
  S: CaseStore,
  M: Mailer,
{
  state
    .store
    .get_applicant(code_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("applicant {code_id} not found"))
    })?;
  Ok(())
}
