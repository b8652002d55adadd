//! Notification records and the best-effort mail interface.
//!
//! Notifications are rows the store writes inside the same transaction as
//! the transition that caused them, with a duplicate guard against unread
//! rows of the same shape. Email is a separate channel dispatched after
//! commit; a failed send is logged and never fails the parent operation.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Audience ────────────────────────────────────────────────────────────────

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
  /// The applicant themselves; target is their code id.
  Applicant,
  /// The admin of a barangay; target is the barangay name.
  Barangay,
  /// The municipal program office; fixed target.
  ProgramOffice,
}

impl Audience {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Applicant => "applicant",
      Self::Barangay => "barangay",
      Self::ProgramOffice => "program_office",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "applicant" => Ok(Self::Applicant),
      "barangay" => Ok(Self::Barangay),
      "program_office" => Ok(Self::ProgramOffice),
      other => Err(Error::InvalidStatus(other.to_string())),
    }
  }
}

/// Target string for program-office notifications.
pub const PROGRAM_OFFICE_TARGET: &str = "program_office";

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Notification discriminant; stored as the `kind` column and used by the
/// duplicate guard together with target and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  NewApplication,
  Resubmission,
  ApplicationAccepted,
  ApplicationDeclined,
  ApplicationIncomplete,
  ApplicationRemarks,
  RemarksCleared,
  ApplicationTerminated,
  AccountReinstated,
  RenewalStarted,
  RenewalAccepted,
  RenewalDeclined,
  DocumentReviewed,
  FollowUpDocument,
  NewSoloParent,
}

impl NotificationKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::NewApplication => "new_application",
      Self::Resubmission => "resubmission",
      Self::ApplicationAccepted => "application_accepted",
      Self::ApplicationDeclined => "application_declined",
      Self::ApplicationIncomplete => "application_incomplete",
      Self::ApplicationRemarks => "application_remarks",
      Self::RemarksCleared => "remarks_cleared",
      Self::ApplicationTerminated => "application_terminated",
      Self::AccountReinstated => "account_reinstated",
      Self::RenewalStarted => "renewal_started",
      Self::RenewalAccepted => "renewal_accepted",
      Self::RenewalDeclined => "renewal_declined",
      Self::DocumentReviewed => "document_reviewed",
      Self::FollowUpDocument => "follow_up_document",
      Self::NewSoloParent => "new_solo_parent",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "new_application" => Ok(Self::NewApplication),
      "resubmission" => Ok(Self::Resubmission),
      "application_accepted" => Ok(Self::ApplicationAccepted),
      "application_declined" => Ok(Self::ApplicationDeclined),
      "application_incomplete" => Ok(Self::ApplicationIncomplete),
      "application_remarks" => Ok(Self::ApplicationRemarks),
      "remarks_cleared" => Ok(Self::RemarksCleared),
      "application_terminated" => Ok(Self::ApplicationTerminated),
      "account_reinstated" => Ok(Self::AccountReinstated),
      "renewal_started" => Ok(Self::RenewalStarted),
      "renewal_accepted" => Ok(Self::RenewalAccepted),
      "renewal_declined" => Ok(Self::RenewalDeclined),
      "document_reviewed" => Ok(Self::DocumentReviewed),
      "follow_up_document" => Ok(Self::FollowUpDocument),
      "new_solo_parent" => Ok(Self::NewSoloParent),
      other => Err(Error::InvalidStatus(other.to_string())),
    }
  }
}

// ─── Notification ────────────────────────────────────────────────────────────

/// One append-only notification row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub target:          String,
  pub audience:        Audience,
  pub kind:            NotificationKind,
  pub message:         String,
  pub is_read:         bool,
  pub created_at:      DateTime<Utc>,
}

// ─── Mail ────────────────────────────────────────────────────────────────────

/// The mail templates the program sends. Bodies are rendered by the
/// [`Mailer`] implementation; the core only names the event and carries
/// the variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MailEvent {
  ApplicationApproved,
  ApplicationDeclined { remarks: String },
  /// Status under investigation; the applicant has a 7-day grace window
  /// to comply before termination.
  RevokeWarning,
  Terminated,
  Reinstated,
  RenewalApproved,
  RenewalDeclined { remarks: String },
}

impl MailEvent {
  pub fn subject(&self) -> &'static str {
    match self {
      Self::ApplicationApproved => "Solo Parent Application Approved",
      Self::ApplicationDeclined { .. } => {
        "Update on Your Solo Parent Application"
      }
      Self::RevokeWarning => "Solo Parent Status Under Review",
      Self::Terminated => "Solo Parent Status Terminated",
      Self::Reinstated => "Solo Parent Status Reinstated",
      Self::RenewalApproved => "Solo Parent ID Renewal Approved",
      Self::RenewalDeclined { .. } => "Update on Your Solo Parent ID Renewal",
    }
  }
}

/// Outbound email, best-effort. Implementations return `false` on failure
/// and must not propagate errors; the caller only logs the result.
pub trait Mailer: Send + Sync {
  fn send(
    &self,
    to: &str,
    first_name: &str,
    event: &MailEvent,
  ) -> impl Future<Output = bool> + Send;
}
