//! The `CaseStore` trait and the error-classification seam.
//!
//! The trait is implemented by storage backends (e.g.
//! `kalinga-store-sqlite`). The HTTP layer depends on this abstraction,
//! not on any concrete backend. Every lifecycle method executes as one
//! atomic unit: read the applicant under a write lock, check the guard
//! table, write the new state and dependent rows, commit.

use std::future::Future;

use crate::{
  applicant::{
    Applicant, ApplicantStatus, CaseFile, CodeId, NewApplication, Remark,
  },
  document::{Document, DocumentKind, DocumentStatus, DocumentUpload},
  lifecycle::{
    DocumentReviewOutcome, RemarksResolution, RenewalDecision, ReviewDecision,
    ReviewOutcome, SubmissionOutcome, TransitionOutcome, UploadOutcome,
  },
  notify::{Audience, Notification, NotificationKind},
};

// ─── Error classification ────────────────────────────────────────────────────

/// Request-level classes a store failure can map onto. The HTTP layer
/// translates these to status codes without knowing the backend's error
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  /// Malformed or rejected input.
  Validation,
  NotFound,
  /// Duplicate registration or an illegal lifecycle transition.
  Conflict,
  /// Lock contention that survived the retry budget.
  Busy,
  /// Any other backend failure.
  Storage,
}

/// Implemented by store error types so callers can classify failures.
pub trait ClassifyError {
  fn class(&self) -> ErrorClass;
}

impl ClassifyError for crate::Error {
  fn class(&self) -> ErrorClass {
    use crate::Error::*;
    match self {
      ApplicantNotFound(_) | DocumentNotFound { .. } => ErrorClass::NotFound,
      EmailAlreadyRegistered { .. } | InvalidTransition { .. } => {
        ErrorClass::Conflict
      }
      EmptyRemarks | InvalidRenewalRemarks | InvalidCodeId(_)
      | InvalidDocumentKind(_) | InvalidStatus(_) => ErrorClass::Validation,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Kalinga case-management backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CaseStore: Send + Sync {
  type Error: std::error::Error + ClassifyError + Send + Sync + 'static;

  // ── Applications ──────────────────────────────────────────────────────

  /// First submission creates the applicant (status Pending) plus all
  /// intake tables in one transaction and assigns a fresh code id.
  /// Re-submission by a Declined applicant overwrites the intake data in
  /// place and reuses the code id. Any other existing registration for
  /// the email is a conflict.
  fn submit_application(
    &self,
    input: NewApplication,
  ) -> impl Future<Output = Result<SubmissionOutcome, Self::Error>> + Send + '_;

  /// Retrieve the applicant envelope. Returns `None` if unknown.
  fn get_applicant<'a>(
    &'a self,
    code_id: &'a CodeId,
  ) -> impl Future<Output = Result<Option<Applicant>, Self::Error>> + Send + 'a;

  /// Materialise the full case file (profile, children, emergency
  /// contact, documents, latest remark). Returns `None` if unknown.
  fn get_case_file<'a>(
    &'a self,
    code_id: &'a CodeId,
  ) -> impl Future<Output = Result<Option<CaseFile>, Self::Error>> + Send + 'a;

  /// List applicants, optionally filtered by status.
  fn list_applicants(
    &self,
    status: Option<ApplicantStatus>,
  ) -> impl Future<Output = Result<Vec<Applicant>, Self::Error>> + Send + '_;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Intake-flow upload: upsert the row as `Submitted` (category
  /// `application` on insert), then re-evaluate completeness; a Pending
  /// applicant whose required set is now fully Submitted becomes
  /// Verified in the same transaction.
  fn upload_document<'a>(
    &'a self,
    code_id: &'a CodeId,
    kind: DocumentKind,
    upload: DocumentUpload,
  ) -> impl Future<Output = Result<UploadOutcome, Self::Error>> + Send + 'a;

  /// Follow-up upload after staff review: upsert the row as `Pending`
  /// (category `followup`) and notify the program office. Never changes
  /// applicant status.
  fn upload_followup_document<'a>(
    &'a self,
    code_id: &'a CodeId,
    kind: DocumentKind,
    upload: DocumentUpload,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + 'a;

  /// All document rows on file for the applicant.
  fn list_documents<'a>(
    &'a self,
    code_id: &'a CodeId,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a;

  /// Remove a document row. Returns `false` when nothing was on file.
  fn delete_document<'a>(
    &'a self,
    code_id: &'a CodeId,
    kind: DocumentKind,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Whether every required kind (per the applicant's civil status) is on
  /// file and `Submitted`. Read-only; the upload path runs the same check
  /// inside its transaction.
  fn is_complete<'a>(
    &'a self,
    code_id: &'a CodeId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Whether every required kind is on file and `Approved` — the stricter
  /// bar the staff path into Verified uses.
  fn is_fully_approved<'a>(
    &'a self,
    code_id: &'a CodeId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Staff review of one document: set its status (with an optional
  /// rejection reason), notify the applicant, and — when the new status
  /// is Approved and the required set is now fully approved — verify the
  /// applicant in the same transaction.
  fn set_document_status<'a>(
    &'a self,
    code_id: &'a CodeId,
    kind: DocumentKind,
    status: DocumentStatus,
    rejection_reason: Option<String>,
  ) -> impl Future<Output = Result<DocumentReviewOutcome, Self::Error>> + Send + 'a;

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Staff accept/decline. Accept verifies only when every required
  /// document is Approved (marking them Approved as part of the sync);
  /// otherwise the applicant becomes Incomplete with the missing kinds
  /// reported. Decline requires non-empty remarks.
  fn review_application<'a>(
    &'a self,
    code_id: &'a CodeId,
    decision: ReviewDecision,
  ) -> impl Future<Output = Result<ReviewOutcome, Self::Error>> + Send + 'a;

  /// Place a Verified applicant under investigation
  /// (Verified → Pending Remarks).
  fn issue_remarks<'a>(
    &'a self,
    code_id: &'a CodeId,
    remarks: String,
    author: String,
  ) -> impl Future<Output = Result<TransitionOutcome, Self::Error>> + Send + 'a;

  /// Clear (→ Verified) or uphold (→ Terminated) issued remarks.
  fn resolve_remarks<'a>(
    &'a self,
    code_id: &'a CodeId,
    resolution: RemarksResolution,
  ) -> impl Future<Output = Result<TransitionOutcome, Self::Error>> + Send + 'a;

  /// Verified → Terminated; notifies the applicant and their barangay.
  fn terminate<'a>(
    &'a self,
    code_id: &'a CodeId,
  ) -> impl Future<Output = Result<TransitionOutcome, Self::Error>> + Send + 'a;

  /// Terminated → Verified (administrative reversal).
  fn reinstate<'a>(
    &'a self,
    code_id: &'a CodeId,
  ) -> impl Future<Output = Result<TransitionOutcome, Self::Error>> + Send + 'a;

  /// Verified → Renewal when the ID expires.
  fn start_renewal<'a>(
    &'a self,
    code_id: &'a CodeId,
  ) -> impl Future<Output = Result<TransitionOutcome, Self::Error>> + Send + 'a;

  /// Approve (→ Verified, barangay certificate Approved) or decline
  /// (status unchanged, barangay certificate deleted) a renewal.
  fn resolve_renewal<'a>(
    &'a self,
    code_id: &'a CodeId,
    decision: RenewalDecision,
  ) -> impl Future<Output = Result<TransitionOutcome, Self::Error>> + Send + 'a;

  /// Remarks recorded against the applicant, newest first.
  fn list_remarks<'a>(
    &'a self,
    code_id: &'a CodeId,
  ) -> impl Future<Output = Result<Vec<Remark>, Self::Error>> + Send + 'a;

  // ── Notifications ─────────────────────────────────────────────────────

  /// Feed for one audience/target pair, newest first.
  fn notifications_for<'a>(
    &'a self,
    audience: Audience,
    target: &'a str,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + 'a;

  /// Mark unread notifications read, optionally restricted to one kind.
  /// Returns the number of rows updated.
  fn mark_notifications_read<'a>(
    &'a self,
    audience: Audience,
    target: &'a str,
    kind: Option<NotificationKind>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}
