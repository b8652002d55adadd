//! Lifecycle actions, the transition guard table, and operation outcomes.
//!
//! Status is written only through [`crate::store::CaseStore`] operations,
//! and every operation checks [`check_transition`] before mutating. The
//! source system this replaces wrote status from ad hoc handlers; pooling
//! the guards here closes that hole.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  applicant::{Applicant, ApplicantStatus},
  document::{Document, DocumentKind},
  notify::MailEvent,
};

// ─── Actions and guards ──────────────────────────────────────────────────────

/// A staff- or system-initiated lifecycle action on an applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
  /// Staff accepts the application (document sync + verify or incomplete).
  Accept,
  /// Staff declines with remarks.
  Decline,
  /// Staff places a verified applicant under investigation.
  IssueRemarks,
  /// Staff clears or upholds issued remarks.
  ResolveRemarks,
  Terminate,
  Reinstate,
  StartRenewal,
  ResolveRenewal,
}

impl LifecycleAction {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Accept => "accept",
      Self::Decline => "decline",
      Self::IssueRemarks => "issue remarks",
      Self::ResolveRemarks => "resolve remarks",
      Self::Terminate => "terminate",
      Self::Reinstate => "reinstate",
      Self::StartRenewal => "start renewal",
      Self::ResolveRenewal => "resolve renewal",
    }
  }
}

/// The from-state guard table. Returns `InvalidTransition` when `action`
/// is not legal from `from`.
pub fn check_transition(
  from: ApplicantStatus,
  action: LifecycleAction,
) -> Result<()> {
  use ApplicantStatus::*;
  use LifecycleAction::*;

  let allowed = match action {
    Accept => matches!(from, Pending | Incomplete),
    Decline => from.is_active(),
    IssueRemarks => matches!(from, Verified),
    ResolveRemarks => matches!(from, PendingRemarks),
    Terminate => matches!(from, Verified),
    Reinstate => matches!(from, Terminated),
    StartRenewal => matches!(from, Verified),
    ResolveRenewal => matches!(from, Renewal),
  };

  if allowed {
    Ok(())
  } else {
    Err(Error::InvalidTransition { from, action: action.as_str() })
  }
}

// ─── Decision inputs ─────────────────────────────────────────────────────────

/// Staff review decision on a pending or incomplete application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ReviewDecision {
  Accept,
  Decline {
    /// Must be non-empty; recorded and echoed to the applicant.
    remarks: String,
  },
}

/// Outcome of the remarks investigation on a `Pending Remarks` applicant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemarksResolution {
  /// Applicant complied; back to Verified.
  Accept,
  /// Applicant failed to comply; terminated.
  Decline,
}

/// Program-office decision on a renewal application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RenewalDecision {
  Approve,
  Decline {
    /// Must mention the decline; the renewal state itself is kept so the
    /// applicant can upload a fresh certificate.
    remarks: String,
  },
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// A best-effort email the caller should dispatch after the transaction
/// commits. Mail never participates in the transaction itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailRequest {
  pub to:         String,
  pub first_name: String,
  pub event:      MailEvent,
}

/// Result of [`crate::store::CaseStore::submit_application`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
  pub applicant:    Applicant,
  /// True when a declined application was overwritten in place,
  /// reusing its code id.
  pub resubmission: bool,
}

/// Result of an intake-flow document upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
  pub document: Document,
  /// True when this upload completed the required set and the applicant
  /// moved Pending → Verified.
  pub verified: bool,
}

/// What a staff review concluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum ReviewVerdict {
  /// All required documents approved; applicant verified.
  Verified,
  /// Required documents absent or not yet approved.
  Incomplete { missing: Vec<DocumentKind> },
  Declined,
}

/// Result of [`crate::store::CaseStore::review_application`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewOutcome {
  pub applicant: Applicant,
  pub verdict:   ReviewVerdict,
  pub mail:      Option<MailRequest>,
}

/// Result of a single-document staff review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReviewOutcome {
  pub document: Document,
  /// True when approving this document completed the required set and the
  /// applicant was verified in the same transaction.
  pub applicant_verified: bool,
}

/// Result of the simple one-status transitions (remarks, terminate,
/// reinstate, renewal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
  pub applicant: Applicant,
  pub mail:      Option<MailRequest>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use ApplicantStatus::*;
  use LifecycleAction::*;

  #[test]
  fn accept_only_from_pending_or_incomplete() {
    assert!(check_transition(Pending, Accept).is_ok());
    assert!(check_transition(Incomplete, Accept).is_ok());
    assert!(check_transition(Verified, Accept).is_err());
    assert!(check_transition(Declined, Accept).is_err());
  }

  #[test]
  fn decline_allowed_from_any_active_state() {
    for from in [Pending, Incomplete, Verified, Renewal, PendingRemarks] {
      assert!(check_transition(from, Decline).is_ok(), "from {from:?}");
    }
    assert!(check_transition(Declined, Decline).is_err());
    assert!(check_transition(Terminated, Decline).is_err());
  }

  #[test]
  fn remarks_flow_guards() {
    assert!(check_transition(Verified, IssueRemarks).is_ok());
    assert!(check_transition(Pending, IssueRemarks).is_err());
    assert!(check_transition(PendingRemarks, ResolveRemarks).is_ok());
    assert!(check_transition(Verified, ResolveRemarks).is_err());
  }

  #[test]
  fn termination_and_renewal_guards() {
    assert!(check_transition(Verified, Terminate).is_ok());
    assert!(check_transition(Terminated, Terminate).is_err());
    assert!(check_transition(Terminated, Reinstate).is_ok());
    assert!(check_transition(Verified, Reinstate).is_err());
    assert!(check_transition(Verified, StartRenewal).is_ok());
    assert!(check_transition(Renewal, StartRenewal).is_err());
    assert!(check_transition(Renewal, ResolveRenewal).is_ok());
    assert!(check_transition(Verified, ResolveRenewal).is_err());
  }
}
