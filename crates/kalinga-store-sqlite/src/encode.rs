//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`.
//! Status enums keep the exact wire values the program has always used
//! (including the space in `"Pending Remarks"`). UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use kalinga_core::{
  applicant::{
    Applicant, ApplicantStatus, Child, CivilStatus, CodeId, EmergencyContact,
    IntakeProfile, Remark,
  },
  document::{Category, Document, DocumentKind, DocumentStatus},
  notify::{Audience, Notification, NotificationKind},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_code_id(s: &str) -> Result<CodeId> { Ok(CodeId::parse(s)?) }

// ─── Applicant status ────────────────────────────────────────────────────────

pub fn encode_status(s: ApplicantStatus) -> &'static str {
  match s {
    ApplicantStatus::Pending => "Pending",
    ApplicantStatus::Verified => "Verified",
    ApplicantStatus::Declined => "Declined",
    ApplicantStatus::Terminated => "Terminated",
    ApplicantStatus::Renewal => "Renewal",
    ApplicantStatus::Incomplete => "Incomplete",
    ApplicantStatus::PendingRemarks => "Pending Remarks",
  }
}

pub fn decode_status(s: &str) -> Result<ApplicantStatus> {
  match s {
    "Pending" => Ok(ApplicantStatus::Pending),
    "Verified" => Ok(ApplicantStatus::Verified),
    "Declined" => Ok(ApplicantStatus::Declined),
    "Terminated" => Ok(ApplicantStatus::Terminated),
    "Renewal" => Ok(ApplicantStatus::Renewal),
    "Incomplete" => Ok(ApplicantStatus::Incomplete),
    "Pending Remarks" => Ok(ApplicantStatus::PendingRemarks),
    other => Err(Error::DateParse(format!("unknown applicant status: {other:?}"))),
  }
}

// ─── Civil status ────────────────────────────────────────────────────────────

pub fn encode_civil_status(c: CivilStatus) -> &'static str {
  match c {
    CivilStatus::Single => "single",
    CivilStatus::Married => "married",
    CivilStatus::Divorced => "divorced",
    CivilStatus::Widowed => "widowed",
    CivilStatus::Other => "other",
  }
}

pub fn decode_civil_status(s: &str) -> CivilStatus { CivilStatus::parse(s) }

// ─── Documents ───────────────────────────────────────────────────────────────

pub fn decode_kind(s: &str) -> Result<DocumentKind> {
  Ok(DocumentKind::parse(s)?)
}

pub fn decode_document_status(s: &str) -> Result<DocumentStatus> {
  Ok(DocumentStatus::parse(s)?)
}

pub fn decode_category(s: &str) -> Result<Category> {
  Ok(Category::parse(s)?)
}

// ─── Notifications ───────────────────────────────────────────────────────────

pub fn decode_audience(s: &str) -> Result<Audience> {
  Ok(Audience::parse(s)?)
}

pub fn decode_notification_kind(s: &str) -> Result<NotificationKind> {
  Ok(NotificationKind::parse(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `applicants` row.
pub struct RawApplicant {
  pub code_id:    String,
  pub email:      String,
  pub full_name:  String,
  pub status:     String,
  pub created_at: String,
}

impl RawApplicant {
  pub fn into_applicant(self) -> Result<Applicant> {
    Ok(Applicant {
      code_id:    decode_code_id(&self.code_id)?,
      email:      self.email,
      full_name:  self.full_name,
      status:     decode_status(&self.status)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `intake_profiles` row.
pub struct RawProfile {
  pub first_name:        String,
  pub middle_name:       Option<String>,
  pub last_name:         String,
  pub suffix:            Option<String>,
  pub age:               i64,
  pub gender:            String,
  pub date_of_birth:     String,
  pub place_of_birth:    String,
  pub barangay:          String,
  pub education:         Option<String>,
  pub civil_status:      String,
  pub occupation:        Option<String>,
  pub income:            Option<String>,
  pub employment_status: Option<String>,
  pub contact_number:    String,
  pub classification:    Option<String>,
  pub needs:             Option<String>,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<IntakeProfile> {
    Ok(IntakeProfile {
      first_name:        self.first_name,
      middle_name:       self.middle_name,
      last_name:         self.last_name,
      suffix:            self.suffix,
      age:               self.age as u8,
      gender:            self.gender,
      date_of_birth:     decode_date(&self.date_of_birth)?,
      place_of_birth:    self.place_of_birth,
      barangay:          self.barangay,
      education:         self.education,
      civil_status:      decode_civil_status(&self.civil_status),
      occupation:        self.occupation,
      income:            self.income,
      employment_status: self.employment_status,
      contact_number:    self.contact_number,
      classification:    self.classification,
      needs:             self.needs,
    })
  }
}

/// Raw strings read directly from a `children` row.
pub struct RawChild {
  pub name:                   String,
  pub age:                    i64,
  pub educational_attainment: Option<String>,
  pub birthdate:              String,
}

impl RawChild {
  pub fn into_child(self) -> Result<Child> {
    Ok(Child {
      name:                   self.name,
      age:                    self.age as u8,
      educational_attainment: self.educational_attainment,
      birthdate:              decode_date(&self.birthdate)?,
    })
  }
}

/// Raw strings read directly from an `emergency_contacts` row.
pub struct RawEmergency {
  pub name:           String,
  pub relationship:   String,
  pub address:        String,
  pub contact_number: String,
}

impl RawEmergency {
  pub fn into_contact(self) -> EmergencyContact {
    EmergencyContact {
      name:           self.name,
      relationship:   self.relationship,
      address:        self.address,
      contact_number: self.contact_number,
    }
  }
}

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub code_id:          String,
  pub kind:             String,
  pub file_name:        String,
  pub display_name:     String,
  pub status:           String,
  pub category:         Option<String>,
  pub rejection_reason: Option<String>,
  pub uploaded_at:      String,
}

impl RawDocument {
  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      code_id:          decode_code_id(&self.code_id)?,
      kind:             decode_kind(&self.kind)?,
      file_name:        self.file_name,
      display_name:     self.display_name,
      status:           decode_document_status(&self.status)?,
      category:         self
        .category
        .as_deref()
        .map(decode_category)
        .transpose()?,
      rejection_reason: self.rejection_reason,
      uploaded_at:      decode_dt(&self.uploaded_at)?,
    })
  }
}

/// Raw strings read directly from a `remarks` row.
pub struct RawRemark {
  pub remark_id:   String,
  pub code_id:     String,
  pub body:        String,
  pub author:      String,
  pub recorded_at: String,
}

impl RawRemark {
  pub fn into_remark(self) -> Result<Remark> {
    Ok(Remark {
      remark_id:   decode_uuid(&self.remark_id)?,
      code_id:     decode_code_id(&self.code_id)?,
      body:        self.body,
      author:      self.author,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub target:          String,
  pub audience:        String,
  pub kind:            String,
  pub message:         String,
  pub is_read:         bool,
  pub created_at:      String,
}

impl RawNotification {
  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      target:          self.target,
      audience:        decode_audience(&self.audience)?,
      kind:            decode_notification_kind(&self.kind)?,
      message:         self.message,
      is_read:         self.is_read,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}
