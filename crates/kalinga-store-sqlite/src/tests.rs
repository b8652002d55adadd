//! Integration tests for `SqliteCaseStore` against an in-memory database.

use chrono::NaiveDate;
use kalinga_core::{
  applicant::{
    Applicant, ApplicantStatus, Child, CivilStatus, CodeId, EmergencyContact,
    IntakeProfile, NewApplication,
  },
  document::{Category, DocumentKind, DocumentStatus, DocumentUpload},
  lifecycle::{RemarksResolution, RenewalDecision, ReviewDecision, ReviewVerdict},
  notify::{Audience, MailEvent, NotificationKind, PROGRAM_OFFICE_TARGET},
  store::CaseStore,
};

use crate::{Error, SqliteCaseStore};

async fn store() -> SqliteCaseStore {
  SqliteCaseStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn application(email: &str, civil: CivilStatus) -> NewApplication {
  NewApplication {
    email:     email.into(),
    profile:   IntakeProfile {
      first_name:        "Maria".into(),
      middle_name:       Some("Santos".into()),
      last_name:         "Reyes".into(),
      suffix:            None,
      age:               34,
      gender:            "Female".into(),
      date_of_birth:     NaiveDate::from_ymd_opt(1991, 3, 14).unwrap(),
      place_of_birth:    "Santa Maria".into(),
      barangay:          "San Vicente".into(),
      education:         Some("College".into()),
      civil_status:      civil,
      occupation:        Some("Vendor".into()),
      income:            Some("12000".into()),
      employment_status: Some("Self-employed".into()),
      contact_number:    "09171234567".into(),
      classification:    None,
      needs:             Some("Livelihood assistance".into()),
    },
    children:  vec![Child {
      name:                   "Ana Reyes".into(),
      age:                    7,
      educational_attainment: Some("Elementary".into()),
      birthdate:              NaiveDate::from_ymd_opt(2018, 1, 5).unwrap(),
    }],
    emergency: EmergencyContact {
      name:           "Jose Reyes".into(),
      relationship:   "Brother".into(),
      address:        "123 Mabini St".into(),
      contact_number: "09179876543".into(),
    },
  }
}

fn upload(name: &str) -> DocumentUpload {
  DocumentUpload {
    file_name:    format!("{name}.pdf"),
    display_name: name.to_string(),
  }
}

async fn submit(
  s: &SqliteCaseStore,
  email: &str,
  civil: CivilStatus,
) -> Applicant {
  s.submit_application(application(email, civil))
    .await
    .unwrap()
    .applicant
}

/// Upload every kind in `kinds` through the intake flow and return whether
/// the last upload verified the applicant.
async fn upload_kinds(
  s: &SqliteCaseStore,
  code_id: &CodeId,
  kinds: &[DocumentKind],
) -> bool {
  let mut verified = false;
  for &kind in kinds {
    let outcome = s
      .upload_document(code_id, kind, upload(kind.as_str()))
      .await
      .unwrap();
    verified = outcome.verified;
  }
  verified
}

// ─── Submission ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_creates_pending_applicant() {
  let s = store().await;

  let outcome = s
    .submit_application(application("maria@example.com", CivilStatus::Single))
    .await
    .unwrap();

  assert!(!outcome.resubmission);
  assert_eq!(outcome.applicant.status, ApplicantStatus::Pending);
  assert_eq!(outcome.applicant.full_name, "Maria Santos Reyes");
  // The code id round-trips through the validator.
  CodeId::parse(outcome.applicant.code_id.as_str()).unwrap();

  let feed = s
    .notifications_for(Audience::ProgramOffice, PROGRAM_OFFICE_TARGET)
    .await
    .unwrap();
  assert_eq!(feed.len(), 1);
  assert_eq!(feed[0].kind, NotificationKind::NewApplication);
}

#[tokio::test]
async fn submit_stores_the_full_intake() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Widowed).await;

  let file = s
    .get_case_file(&applicant.code_id)
    .await
    .unwrap()
    .expect("case file");
  assert_eq!(file.profile.civil_status, CivilStatus::Widowed);
  assert_eq!(file.children.len(), 1);
  assert_eq!(file.emergency.relationship, "Brother");
  assert!(file.documents.is_empty());
  assert!(file.latest_remark.is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
  let s = store().await;
  submit(&s, "maria@example.com", CivilStatus::Single).await;

  let err = s
    .submit_application(application("maria@example.com", CivilStatus::Single))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(kalinga_core::Error::EmailAlreadyRegistered { .. })
  ));
}

#[tokio::test]
async fn declined_resubmission_reuses_code_id() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;

  s.review_application(
    &applicant.code_id,
    ReviewDecision::Decline { remarks: "Incomplete interview".into() },
  )
  .await
  .unwrap();

  let mut resubmitted = application("maria@example.com", CivilStatus::Single);
  resubmitted.profile.occupation = Some("Teacher".into());
  let outcome = s.submit_application(resubmitted).await.unwrap();

  assert!(outcome.resubmission);
  assert_eq!(outcome.applicant.code_id, applicant.code_id);
  assert_eq!(outcome.applicant.status, ApplicantStatus::Pending);

  // No duplicate applicant row was created.
  let all = s.list_applicants(None).await.unwrap();
  assert_eq!(all.len(), 1);

  let file = s
    .get_case_file(&applicant.code_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(file.profile.occupation.as_deref(), Some("Teacher"));
}

// ─── Document upsert ─────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_is_idempotent() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;

  s.upload_document(&applicant.code_id, DocumentKind::Psa, upload("psa-v1"))
    .await
    .unwrap();
  s.upload_document(&applicant.code_id, DocumentKind::Psa, upload("psa-v2"))
    .await
    .unwrap();

  let docs = s.list_documents(&applicant.code_id).await.unwrap();
  assert_eq!(docs.len(), 1);
  assert_eq!(docs[0].file_name, "psa-v2.pdf");
  assert_eq!(docs[0].status, DocumentStatus::Submitted);
  assert_eq!(docs[0].category, Some(Category::Application));
}

#[tokio::test]
async fn concurrent_upserts_converge_on_one_row() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;

  let (a, b) = tokio::join!(
    s.upload_document(&applicant.code_id, DocumentKind::Itr, upload("itr-a")),
    s.upload_document(&applicant.code_id, DocumentKind::Itr, upload("itr-b")),
  );
  a.unwrap();
  b.unwrap();

  let docs = s.list_documents(&applicant.code_id).await.unwrap();
  assert_eq!(docs.len(), 1);
}

#[tokio::test]
async fn barangay_cert_never_carries_a_category() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;

  let doc = s
    .upload_followup_document(
      &applicant.code_id,
      DocumentKind::BarangayCert,
      upload("brgy-cert"),
    )
    .await
    .unwrap();
  assert_eq!(doc.category, None);

  let doc = s
    .upload_document(
      &applicant.code_id,
      DocumentKind::BarangayCert,
      upload("brgy-cert-2"),
    )
    .await
    .unwrap()
    .document;
  assert_eq!(doc.category, None);
}

#[tokio::test]
async fn followup_upload_is_pending_and_notifies_the_office() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;

  let doc = s
    .upload_followup_document(
      &applicant.code_id,
      DocumentKind::Itr,
      upload("itr-fix"),
    )
    .await
    .unwrap();
  assert_eq!(doc.status, DocumentStatus::Pending);
  assert_eq!(doc.category, Some(Category::Followup));

  let feed = s
    .notifications_for(Audience::ProgramOffice, PROGRAM_OFFICE_TARGET)
    .await
    .unwrap();
  assert!(feed.iter().any(|n| {
    n.kind == NotificationKind::FollowUpDocument
      && n.message.contains("Income Tax Return")
  }));
}

#[tokio::test]
async fn upload_for_unknown_applicant_errors() {
  let s = store().await;
  let ghost = CodeId::parse("2024_01_000000").unwrap();

  let err = s
    .upload_document(&ghost, DocumentKind::Psa, upload("psa"))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(kalinga_core::Error::ApplicantNotFound(_))
  ));
}

#[tokio::test]
async fn delete_document_reports_whether_anything_was_on_file() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;

  s.upload_document(&applicant.code_id, DocumentKind::Psa, upload("psa"))
    .await
    .unwrap();

  assert!(
    s.delete_document(&applicant.code_id, DocumentKind::Psa)
      .await
      .unwrap()
  );
  assert!(
    !s.delete_document(&applicant.code_id, DocumentKind::Psa)
      .await
      .unwrap()
  );
}

// ─── Upload-driven verification ──────────────────────────────────────────────

#[tokio::test]
async fn single_without_cenomar_stays_pending() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;

  let verified = upload_kinds(
    &s,
    &applicant.code_id,
    &[DocumentKind::Psa, DocumentKind::Itr, DocumentKind::MedCert],
  )
  .await;

  assert!(!verified);
  let applicant = s
    .get_applicant(&applicant.code_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(applicant.status, ApplicantStatus::Pending);
}

#[tokio::test]
async fn completeness_queries_track_the_two_bars() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Other).await;

  assert!(!s.is_complete(&applicant.code_id).await.unwrap());

  upload_kinds(
    &s,
    &applicant.code_id,
    &[DocumentKind::Psa, DocumentKind::Itr, DocumentKind::MedCert],
  )
  .await;
  assert!(s.is_complete(&applicant.code_id).await.unwrap());
  // Submitted is not Approved.
  assert!(!s.is_fully_approved(&applicant.code_id).await.unwrap());

  for kind in [DocumentKind::Psa, DocumentKind::Itr, DocumentKind::MedCert] {
    s.set_document_status(
      &applicant.code_id,
      kind,
      DocumentStatus::Approved,
      None,
    )
    .await
    .unwrap();
  }
  assert!(s.is_fully_approved(&applicant.code_id).await.unwrap());
}

#[tokio::test]
async fn married_full_submitted_set_verifies() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Married).await;

  let verified = upload_kinds(
    &s,
    &applicant.code_id,
    &[
      DocumentKind::Psa,
      DocumentKind::Itr,
      DocumentKind::MedCert,
      DocumentKind::Marriage,
    ],
  )
  .await;

  assert!(verified);
  let applicant = s
    .get_applicant(&applicant.code_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(applicant.status, ApplicantStatus::Verified);

  // Exactly one new-application notification across the whole flow.
  let office = s
    .notifications_for(Audience::ProgramOffice, PROGRAM_OFFICE_TARGET)
    .await
    .unwrap();
  let new_apps = office
    .iter()
    .filter(|n| n.kind == NotificationKind::NewApplication)
    .count();
  assert_eq!(new_apps, 1);

  // The barangay was told it has a new solo parent.
  let barangay = s
    .notifications_for(Audience::Barangay, "San Vicente")
    .await
    .unwrap();
  assert!(
    barangay
      .iter()
      .any(|n| n.kind == NotificationKind::NewSoloParent)
  );
}

#[tokio::test]
async fn extra_document_does_not_substitute_for_a_required_one() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;

  // Marriage certificate is not in the single set; cenomar still missing.
  let verified = upload_kinds(
    &s,
    &applicant.code_id,
    &[
      DocumentKind::Psa,
      DocumentKind::Itr,
      DocumentKind::MedCert,
      DocumentKind::Marriage,
    ],
  )
  .await;
  assert!(!verified);
}

// ─── Staff review ────────────────────────────────────────────────────────────

#[tokio::test]
async fn accept_with_unapproved_documents_goes_incomplete() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;
  upload_kinds(&s, &applicant.code_id, &[DocumentKind::Psa]).await;

  let outcome = s
    .review_application(&applicant.code_id, ReviewDecision::Accept)
    .await
    .unwrap();

  assert_eq!(outcome.applicant.status, ApplicantStatus::Incomplete);
  let ReviewVerdict::Incomplete { missing } = outcome.verdict else {
    panic!("expected incomplete verdict");
  };
  // PSA is on file but only Submitted; everything is still outstanding.
  assert_eq!(
    missing,
    vec![
      DocumentKind::Psa,
      DocumentKind::Itr,
      DocumentKind::MedCert,
      DocumentKind::Cenomar,
    ]
  );

  let feed = s
    .notifications_for(Audience::Applicant, applicant.code_id.as_str())
    .await
    .unwrap();
  assert!(
    feed
      .iter()
      .any(|n| n.kind == NotificationKind::ApplicationIncomplete)
  );
}

#[tokio::test]
async fn approving_each_document_verifies_from_incomplete() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Other).await;
  upload_kinds(
    &s,
    &applicant.code_id,
    &[DocumentKind::Psa, DocumentKind::Itr, DocumentKind::MedCert],
  )
  .await;
  s.review_application(&applicant.code_id, ReviewDecision::Accept)
    .await
    .unwrap();

  for kind in [DocumentKind::Psa, DocumentKind::Itr] {
    let outcome = s
      .set_document_status(
        &applicant.code_id,
        kind,
        DocumentStatus::Approved,
        None,
      )
      .await
      .unwrap();
    assert!(!outcome.applicant_verified);
  }

  let outcome = s
    .set_document_status(
      &applicant.code_id,
      DocumentKind::MedCert,
      DocumentStatus::Approved,
      None,
    )
    .await
    .unwrap();
  assert!(outcome.applicant_verified);

  let applicant = s
    .get_applicant(&applicant.code_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(applicant.status, ApplicantStatus::Verified);
}

#[tokio::test]
async fn accept_after_resubmission_verifies_on_approved_paperwork() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Other).await;
  upload_kinds(
    &s,
    &applicant.code_id,
    &[DocumentKind::Psa, DocumentKind::Itr, DocumentKind::MedCert],
  )
  .await;
  s.review_application(&applicant.code_id, ReviewDecision::Accept)
    .await
    .unwrap();
  for kind in [DocumentKind::Psa, DocumentKind::Itr, DocumentKind::MedCert] {
    s.set_document_status(
      &applicant.code_id,
      kind,
      DocumentStatus::Approved,
      None,
    )
    .await
    .unwrap();
  }

  // A decline and re-submission leaves the approved paperwork intact, so
  // a fresh Accept verifies immediately.
  s.review_application(
    &applicant.code_id,
    ReviewDecision::Decline { remarks: "Household review failed".into() },
  )
  .await
  .unwrap();
  s.submit_application(application("maria@example.com", CivilStatus::Other))
    .await
    .unwrap();

  let outcome = s
    .review_application(&applicant.code_id, ReviewDecision::Accept)
    .await
    .unwrap();
  assert!(matches!(outcome.verdict, ReviewVerdict::Verified));
  assert_eq!(outcome.applicant.status, ApplicantStatus::Verified);
  assert!(matches!(
    outcome.mail,
    Some(ref m) if m.event == MailEvent::ApplicationApproved
  ));
}

#[tokio::test]
async fn decline_requires_remarks() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;

  let err = s
    .review_application(
      &applicant.code_id,
      ReviewDecision::Decline { remarks: "   ".into() },
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(kalinga_core::Error::EmptyRemarks)));
}

#[tokio::test]
async fn decline_records_remark_and_mail() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;

  let outcome = s
    .review_application(
      &applicant.code_id,
      ReviewDecision::Decline { remarks: "Falsified income".into() },
    )
    .await
    .unwrap();

  assert_eq!(outcome.applicant.status, ApplicantStatus::Declined);
  assert!(matches!(
    outcome.mail,
    Some(ref m) if matches!(m.event, MailEvent::ApplicationDeclined { .. })
  ));

  let remarks = s.list_remarks(&applicant.code_id).await.unwrap();
  assert_eq!(remarks.len(), 1);
  assert_eq!(remarks[0].body, "Falsified income");
}

// ─── Remarks flow ────────────────────────────────────────────────────────────

async fn verified_applicant(s: &SqliteCaseStore) -> Applicant {
  let applicant = submit(s, "maria@example.com", CivilStatus::Other).await;
  upload_kinds(
    s,
    &applicant.code_id,
    &[DocumentKind::Psa, DocumentKind::Itr, DocumentKind::MedCert],
  )
  .await;
  s.get_applicant(&applicant.code_id).await.unwrap().unwrap()
}

#[tokio::test]
async fn issue_remarks_moves_verified_to_pending_remarks() {
  let s = store().await;
  let applicant = verified_applicant(&s).await;
  assert_eq!(applicant.status, ApplicantStatus::Verified);

  let outcome = s
    .issue_remarks(
      &applicant.code_id,
      "Reported to be cohabiting".into(),
      "Barangay San Vicente".into(),
    )
    .await
    .unwrap();

  assert_eq!(outcome.applicant.status, ApplicantStatus::PendingRemarks);
  assert!(matches!(
    outcome.mail,
    Some(ref m) if m.event == MailEvent::RevokeWarning
  ));

  // Applicant sees the compliance notice; the office sees the referral.
  let feed = s
    .notifications_for(Audience::Applicant, applicant.code_id.as_str())
    .await
    .unwrap();
  assert!(
    feed.iter().any(|n| n.kind == NotificationKind::ApplicationRemarks
      && n.message.contains("5 to 7 working days"))
  );
  let office = s
    .notifications_for(Audience::ProgramOffice, PROGRAM_OFFICE_TARGET)
    .await
    .unwrap();
  assert!(
    office
      .iter()
      .any(|n| n.message == "From Barangay San Vicente: Maria has pending remarks.")
  );
}

#[tokio::test]
async fn remarks_cannot_be_issued_twice() {
  let s = store().await;
  let applicant = verified_applicant(&s).await;

  s.issue_remarks(
    &applicant.code_id,
    "Under review".into(),
    "Barangay San Vicente".into(),
  )
  .await
  .unwrap();

  let err = s
    .issue_remarks(
      &applicant.code_id,
      "Under review again".into(),
      "Barangay San Vicente".into(),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(kalinga_core::Error::InvalidTransition { .. })
  ));
}

#[tokio::test]
async fn accepted_remarks_restore_verified() {
  let s = store().await;
  let applicant = verified_applicant(&s).await;
  s.issue_remarks(
    &applicant.code_id,
    "Under review".into(),
    "Barangay San Vicente".into(),
  )
  .await
  .unwrap();

  let outcome = s
    .resolve_remarks(&applicant.code_id, RemarksResolution::Accept)
    .await
    .unwrap();
  assert_eq!(outcome.applicant.status, ApplicantStatus::Verified);
}

#[tokio::test]
async fn declined_remarks_terminate() {
  let s = store().await;
  let applicant = verified_applicant(&s).await;
  s.issue_remarks(
    &applicant.code_id,
    "Under review".into(),
    "Barangay San Vicente".into(),
  )
  .await
  .unwrap();

  let outcome = s
    .resolve_remarks(&applicant.code_id, RemarksResolution::Decline)
    .await
    .unwrap();
  assert_eq!(outcome.applicant.status, ApplicantStatus::Terminated);
}

// ─── Termination and reinstatement ───────────────────────────────────────────

#[tokio::test]
async fn terminate_notifies_applicant_and_barangay() {
  let s = store().await;
  let applicant = verified_applicant(&s).await;

  let outcome = s.terminate(&applicant.code_id).await.unwrap();
  assert_eq!(outcome.applicant.status, ApplicantStatus::Terminated);
  assert!(matches!(
    outcome.mail,
    Some(ref m) if m.event == MailEvent::Terminated
  ));

  let barangay = s
    .notifications_for(Audience::Barangay, "San Vicente")
    .await
    .unwrap();
  assert!(
    barangay
      .iter()
      .any(|n| n.kind == NotificationKind::ApplicationTerminated)
  );

  // Terminating twice is an invalid transition.
  let err = s.terminate(&applicant.code_id).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(kalinga_core::Error::InvalidTransition { .. })
  ));
}

#[tokio::test]
async fn reinstate_restores_verified() {
  let s = store().await;
  let applicant = verified_applicant(&s).await;
  s.terminate(&applicant.code_id).await.unwrap();

  let outcome = s.reinstate(&applicant.code_id).await.unwrap();
  assert_eq!(outcome.applicant.status, ApplicantStatus::Verified);
  assert!(matches!(
    outcome.mail,
    Some(ref m) if m.event == MailEvent::Reinstated
  ));

  let feed = s
    .notifications_for(Audience::Applicant, applicant.code_id.as_str())
    .await
    .unwrap();
  assert!(
    feed
      .iter()
      .any(|n| n.message == "Your account has been reactivated.")
  );
}

// ─── Renewal ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn renewal_approval_verifies_and_approves_the_certificate() {
  let s = store().await;
  let applicant = verified_applicant(&s).await;

  let outcome = s.start_renewal(&applicant.code_id).await.unwrap();
  assert_eq!(outcome.applicant.status, ApplicantStatus::Renewal);

  s.upload_followup_document(
    &applicant.code_id,
    DocumentKind::BarangayCert,
    upload("brgy-cert"),
  )
  .await
  .unwrap();

  let outcome = s
    .resolve_renewal(&applicant.code_id, RenewalDecision::Approve)
    .await
    .unwrap();
  assert_eq!(outcome.applicant.status, ApplicantStatus::Verified);
  assert!(matches!(
    outcome.mail,
    Some(ref m) if m.event == MailEvent::RenewalApproved
  ));

  let docs = s.list_documents(&applicant.code_id).await.unwrap();
  let cert = docs
    .iter()
    .find(|d| d.kind == DocumentKind::BarangayCert)
    .unwrap();
  assert_eq!(cert.status, DocumentStatus::Approved);
}

#[tokio::test]
async fn renewal_decline_keeps_status_and_drops_the_certificate() {
  let s = store().await;
  let applicant = verified_applicant(&s).await;
  s.start_renewal(&applicant.code_id).await.unwrap();
  s.upload_followup_document(
    &applicant.code_id,
    DocumentKind::BarangayCert,
    upload("brgy-cert"),
  )
  .await
  .unwrap();

  let outcome = s
    .resolve_renewal(
      &applicant.code_id,
      RenewalDecision::Decline {
        remarks: "Renewal declined: certificate is unreadable".into(),
      },
    )
    .await
    .unwrap();
  assert_eq!(outcome.applicant.status, ApplicantStatus::Renewal);

  let docs = s.list_documents(&applicant.code_id).await.unwrap();
  assert!(!docs.iter().any(|d| d.kind == DocumentKind::BarangayCert));
}

#[tokio::test]
async fn renewal_decline_remarks_must_mention_the_decline() {
  let s = store().await;
  let applicant = verified_applicant(&s).await;
  s.start_renewal(&applicant.code_id).await.unwrap();

  let err = s
    .resolve_renewal(
      &applicant.code_id,
      RenewalDecision::Decline { remarks: "certificate unreadable".into() },
    )
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(kalinga_core::Error::InvalidRenewalRemarks)
  ));
}

#[tokio::test]
async fn renewal_requires_verified() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;

  let err = s.start_renewal(&applicant.code_id).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(kalinga_core::Error::InvalidTransition { .. })
  ));
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn repeated_notifications_are_deduplicated_while_unread() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;

  // The same follow-up twice produces one unread office notification.
  for _ in 0..2 {
    s.upload_followup_document(
      &applicant.code_id,
      DocumentKind::Itr,
      upload("itr-fix"),
    )
    .await
    .unwrap();
  }
  let office = s
    .notifications_for(Audience::ProgramOffice, PROGRAM_OFFICE_TARGET)
    .await
    .unwrap();
  let followups = office
    .iter()
    .filter(|n| n.kind == NotificationKind::FollowUpDocument)
    .count();
  assert_eq!(followups, 1);
}

#[tokio::test]
async fn mark_notifications_read_clears_the_unread_feed() {
  let s = store().await;
  let applicant = submit(&s, "maria@example.com", CivilStatus::Single).await;
  s.upload_followup_document(
    &applicant.code_id,
    DocumentKind::Itr,
    upload("itr-fix"),
  )
  .await
  .unwrap();

  let updated = s
    .mark_notifications_read(
      Audience::ProgramOffice,
      PROGRAM_OFFICE_TARGET,
      None,
    )
    .await
    .unwrap();
  assert!(updated >= 1);

  let office = s
    .notifications_for(Audience::ProgramOffice, PROGRAM_OFFICE_TARGET)
    .await
    .unwrap();
  assert!(office.iter().all(|n| n.is_read));

  // Once read, the dedup guard no longer suppresses a fresh insert.
  s.upload_followup_document(
    &applicant.code_id,
    DocumentKind::Itr,
    upload("itr-fix"),
  )
  .await
  .unwrap();
  let office = s
    .notifications_for(Audience::ProgramOffice, PROGRAM_OFFICE_TARGET)
    .await
    .unwrap();
  assert!(office.iter().any(|n| !n.is_read));
}
