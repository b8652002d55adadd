//! Document requirement policy and completeness evaluation.
//!
//! Pure functions; the store fetches the document rows and the evaluators
//! decide. Both verification gates live here so the two paths into
//! `Verified` (upload-driven and staff-driven) share one definition of
//! "required" while keeping their different status bars.

use crate::{
  applicant::CivilStatus,
  document::{Document, DocumentKind, DocumentStatus},
};

use DocumentKind::*;

/// The ordered required-document set for a civil status.
///
/// Base set for everyone; CENOMAR proves single status; marriage papers
/// for married/divorced; widowed applicants add the spouse's death
/// certificate.
pub fn required_documents(civil_status: CivilStatus) -> &'static [DocumentKind] {
  match civil_status {
    CivilStatus::Single => &[Psa, Itr, MedCert, Cenomar],
    CivilStatus::Married => &[Psa, Itr, MedCert, Marriage],
    CivilStatus::Divorced => &[Psa, Itr, MedCert, Marriage],
    CivilStatus::Widowed => &[Psa, Itr, MedCert, Marriage, DeathCert],
    CivilStatus::Other => &[Psa, Itr, MedCert],
  }
}

fn status_of(docs: &[Document], kind: DocumentKind) -> Option<DocumentStatus> {
  docs.iter().find(|d| d.kind == kind).map(|d| d.status)
}

/// Every required kind present and `Submitted`. Gates the upload-driven
/// Pending → Verified transition.
pub fn is_complete(docs: &[Document], civil_status: CivilStatus) -> bool {
  required_documents(civil_status)
    .iter()
    .all(|&kind| status_of(docs, kind) == Some(DocumentStatus::Submitted))
}

/// Every required kind present and `Approved`. Gates the staff-driven
/// transition to Verified — a stricter bar than [`is_complete`].
pub fn is_fully_approved(docs: &[Document], civil_status: CivilStatus) -> bool {
  required_documents(civil_status)
    .iter()
    .all(|&kind| status_of(docs, kind) == Some(DocumentStatus::Approved))
}

/// Required kinds that are absent or not yet approved; feeds the
/// "incomplete" notification message.
pub fn missing_kinds(
  docs: &[Document],
  civil_status: CivilStatus,
) -> Vec<DocumentKind> {
  required_documents(civil_status)
    .iter()
    .copied()
    .filter(|&kind| status_of(docs, kind) != Some(DocumentStatus::Approved))
    .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{applicant::CodeId, document::Category};

  fn doc(kind: DocumentKind, status: DocumentStatus) -> Document {
    Document {
      code_id: CodeId::parse("2025_06_000001").unwrap(),
      kind,
      file_name: format!("{}.pdf", kind.as_str()),
      display_name: kind.label().to_string(),
      status,
      category: kind.carries_category().then_some(Category::Application),
      rejection_reason: None,
      uploaded_at: Utc::now(),
    }
  }

  #[test]
  fn required_sets_match_policy_table() {
    assert_eq!(
      required_documents(CivilStatus::Single),
      &[Psa, Itr, MedCert, Cenomar]
    );
    assert_eq!(
      required_documents(CivilStatus::Married),
      &[Psa, Itr, MedCert, Marriage]
    );
    assert_eq!(
      required_documents(CivilStatus::Divorced),
      &[Psa, Itr, MedCert, Marriage]
    );
    assert_eq!(
      required_documents(CivilStatus::Widowed),
      &[Psa, Itr, MedCert, Marriage, DeathCert]
    );
    assert_eq!(required_documents(CivilStatus::Other), &[Psa, Itr, MedCert]);
  }

  #[test]
  fn civil_status_parse_is_case_insensitive() {
    assert_eq!(CivilStatus::parse("Widowed"), CivilStatus::Widowed);
    assert_eq!(CivilStatus::parse("SINGLE"), CivilStatus::Single);
    assert_eq!(CivilStatus::parse(" married "), CivilStatus::Married);
    assert_eq!(CivilStatus::parse("separated"), CivilStatus::Other);
    assert_eq!(CivilStatus::parse(""), CivilStatus::Other);
  }

  #[test]
  fn complete_requires_every_kind_submitted() {
    let docs = vec![
      doc(Psa, DocumentStatus::Submitted),
      doc(Itr, DocumentStatus::Submitted),
      doc(MedCert, DocumentStatus::Submitted),
      doc(Cenomar, DocumentStatus::Submitted),
    ];
    assert!(is_complete(&docs, CivilStatus::Single));
  }

  #[test]
  fn missing_cenomar_keeps_single_incomplete() {
    let docs = vec![
      doc(Psa, DocumentStatus::Submitted),
      doc(Itr, DocumentStatus::Submitted),
      doc(MedCert, DocumentStatus::Submitted),
    ];
    assert!(!is_complete(&docs, CivilStatus::Single));
    // The same set is complete for an applicant with no extra requirement.
    assert!(is_complete(&docs, CivilStatus::Other));
  }

  #[test]
  fn pending_document_is_not_complete() {
    let docs = vec![
      doc(Psa, DocumentStatus::Submitted),
      doc(Itr, DocumentStatus::Pending),
      doc(MedCert, DocumentStatus::Submitted),
    ];
    assert!(!is_complete(&docs, CivilStatus::Other));
  }

  #[test]
  fn fully_approved_ignores_submitted() {
    let docs = vec![
      doc(Psa, DocumentStatus::Approved),
      doc(Itr, DocumentStatus::Approved),
      doc(MedCert, DocumentStatus::Submitted),
    ];
    assert!(!is_fully_approved(&docs, CivilStatus::Other));

    let docs = vec![
      doc(Psa, DocumentStatus::Approved),
      doc(Itr, DocumentStatus::Approved),
      doc(MedCert, DocumentStatus::Approved),
    ];
    assert!(is_fully_approved(&docs, CivilStatus::Other));
  }

  #[test]
  fn missing_kinds_lists_unapproved_required_docs() {
    let docs = vec![
      doc(Psa, DocumentStatus::Approved),
      doc(Marriage, DocumentStatus::Pending),
    ];
    assert_eq!(
      missing_kinds(&docs, CivilStatus::Widowed),
      vec![Itr, MedCert, Marriage, DeathCert]
    );
  }
}
