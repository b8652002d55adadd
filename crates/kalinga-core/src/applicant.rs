//! Applicant — the registrant tracked through the program lifecycle.
//!
//! An applicant owns a single immutable [`CodeId`] assigned at first
//! submission; everything else about the case (intake profile, children,
//! emergency contact) hangs off that identifier.

use chrono::{DateTime, NaiveDate, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── CodeId ──────────────────────────────────────────────────────────────────

/// Human-readable applicant identifier, `YYYY_MM_NNNNNN`.
///
/// The year/month record when the application was first submitted; the
/// 6-digit suffix is random. Generated once per applicant and reused on
/// re-submission after a decline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CodeId(String);

impl CodeId {
  /// Draw a fresh identifier for `now`.
  pub fn generate(now: DateTime<Utc>) -> Self {
    use chrono::Datelike as _;
    let suffix = OsRng.next_u32() % 1_000_000;
    Self(format!("{}_{:02}_{:06}", now.year(), now.month(), suffix))
  }

  /// Parse and validate the `YYYY_MM_NNNNNN` shape.
  pub fn parse(s: &str) -> Result<Self> {
    let parts: Vec<&str> = s.split('_').collect();
    let valid = parts.len() == 3
      && parts[0].len() == 4
      && parts[1].len() == 2
      && parts[2].len() == 6
      && parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit()))
      && matches!(parts[1].parse::<u8>(), Ok(1..=12));
    if !valid {
      return Err(Error::InvalidCodeId(s.to_string()));
    }
    Ok(Self(s.to_string()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl std::fmt::Display for CodeId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

impl<'de> Deserialize<'de> for CodeId {
  fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let s = String::deserialize(deserializer)?;
    CodeId::parse(&s).map_err(serde::de::Error::custom)
  }
}

// ─── Civil status ────────────────────────────────────────────────────────────

/// Marital status declared at intake; drives the required-document set and
/// never changes through this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CivilStatus {
  Single,
  Married,
  Divorced,
  Widowed,
  /// Unrecognised or unstated; falls back to the base document set.
  Other,
}

impl CivilStatus {
  /// Case-insensitive parse; anything unrecognised maps to [`Self::Other`].
  pub fn parse(s: &str) -> Self {
    match s.trim().to_ascii_lowercase().as_str() {
      "single" => Self::Single,
      "married" => Self::Married,
      "divorced" => Self::Divorced,
      "widowed" => Self::Widowed,
      _ => Self::Other,
    }
  }
}

// Intake forms arrive with whatever casing the client used, and older
// records may carry no civil status at all; both map through `parse`.
impl<'de> Deserialize<'de> for CivilStatus {
  fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.as_deref().map(Self::parse).unwrap_or(Self::Other))
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// The lifecycle state of an applicant. Written only by the transition
/// engine; every entry point shares the guard table in
/// [`crate::lifecycle::check_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicantStatus {
  Pending,
  Verified,
  Declined,
  Terminated,
  Renewal,
  Incomplete,
  #[serde(rename = "Pending Remarks")]
  PendingRemarks,
}

impl ApplicantStatus {
  /// Whether the application is still live — declining is allowed from any
  /// active state; Declined and Terminated are terminal for staff review.
  pub fn is_active(&self) -> bool {
    !matches!(self, Self::Declined | Self::Terminated)
  }
}

// ─── Applicant ───────────────────────────────────────────────────────────────

/// The envelope row for one registrant. Intake detail lives in the joined
/// profile tables; documents live in the document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Applicant {
  pub code_id:    CodeId,
  pub email:      String,
  /// Display name assembled from the intake profile name parts.
  pub full_name:  String,
  pub status:     ApplicantStatus,
  pub created_at: DateTime<Utc>,
}

// ─── Intake ──────────────────────────────────────────────────────────────────

/// Step-one identifying information collected at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeProfile {
  pub first_name:        String,
  pub middle_name:       Option<String>,
  pub last_name:         String,
  pub suffix:            Option<String>,
  pub age:               u8,
  pub gender:            String,
  pub date_of_birth:     NaiveDate,
  pub place_of_birth:    String,
  pub barangay:          String,
  pub education:         Option<String>,
  pub civil_status:      CivilStatus,
  pub occupation:        Option<String>,
  pub income:            Option<String>,
  pub employment_status: Option<String>,
  pub contact_number:    String,
  /// Program classification assigned during intake review.
  pub classification:    Option<String>,
  /// Free-text needs/problems statement.
  pub needs:             Option<String>,
}

impl IntakeProfile {
  /// Assemble the display name the way the intake form shows it, collapsing
  /// runs of whitespace left by absent middle names.
  pub fn full_name(&self) -> String {
    let mut parts: Vec<&str> = vec![&self.first_name];
    if let Some(m) = self.middle_name.as_deref() {
      parts.push(m);
    }
    parts.push(&self.last_name);
    if let Some(s) = self.suffix.as_deref()
      && s != "none"
    {
      parts.push(s);
    }
    parts
      .join(" ")
      .split_whitespace()
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// A dependent child listed on the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Child {
  pub name:                   String,
  pub age:                    u8,
  pub educational_attainment: Option<String>,
  pub birthdate:              NaiveDate,
}

/// Emergency contact person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyContact {
  pub name:           String,
  pub relationship:   String,
  pub address:        String,
  pub contact_number: String,
}

/// Input to [`crate::store::CaseStore::submit_application`]. The store
/// assigns the code id and the Pending status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApplication {
  pub email:     String,
  pub profile:   IntakeProfile,
  #[serde(default)]
  pub children:  Vec<Child>,
  pub emergency: EmergencyContact,
}

// ─── Case file ───────────────────────────────────────────────────────────────

/// The assembled read model for one case — never stored, always joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFile {
  pub applicant:     Applicant,
  pub profile:       IntakeProfile,
  pub children:      Vec<Child>,
  pub emergency:     EmergencyContact,
  pub documents:     Vec<crate::document::Document>,
  /// Most recent staff remark, if any.
  pub latest_remark: Option<Remark>,
}

/// A staff-issued investigation note. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Remark {
  pub remark_id:   uuid::Uuid,
  pub code_id:     CodeId,
  pub body:        String,
  /// Staff identity as free text (barangay admin or program office).
  pub author:      String,
  pub recorded_at: DateTime<Utc>,
}
