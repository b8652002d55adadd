//! Error types for `kalinga-core`.

use thiserror::Error;

use crate::{
  applicant::{ApplicantStatus, CodeId},
  document::DocumentKind,
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("applicant not found: {0}")]
  ApplicantNotFound(CodeId),

  #[error("no {kind} document on file for {code_id}")]
  DocumentNotFound { code_id: CodeId, kind: DocumentKind },

  #[error("email {email} already has an active application ({code_id})")]
  EmailAlreadyRegistered { email: String, code_id: CodeId },

  #[error("cannot {action} an applicant in status {from:?}")]
  InvalidTransition {
    from:   ApplicantStatus,
    action: &'static str,
  },

  #[error("remarks must not be empty")]
  EmptyRemarks,

  #[error("renewal decline remarks must state that the renewal was declined")]
  InvalidRenewalRemarks,

  #[error("invalid code id: {0:?}")]
  InvalidCodeId(String),

  #[error("unknown document kind: {0:?}")]
  InvalidDocumentKind(String),

  #[error("unknown status value: {0:?}")]
  InvalidStatus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
