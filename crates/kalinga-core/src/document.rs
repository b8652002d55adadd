//! Document types — the supporting-paperwork half of a case.
//!
//! Each applicant holds at most one row per [`DocumentKind`]; uploads
//! replace the existing row in place (no versioning).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, applicant::CodeId};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The closed set of supported document kinds. The string forms double as
/// the wire names and the `kind` column discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
  Psa,
  Itr,
  MedCert,
  Marriage,
  Cenomar,
  DeathCert,
  BarangayCert,
}

impl DocumentKind {
  pub const ALL: [DocumentKind; 7] = [
    Self::Psa,
    Self::Itr,
    Self::MedCert,
    Self::Marriage,
    Self::Cenomar,
    Self::DeathCert,
    Self::BarangayCert,
  ];

  /// The discriminant string stored in the `kind` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Psa => "psa",
      Self::Itr => "itr",
      Self::MedCert => "med_cert",
      Self::Marriage => "marriage",
      Self::Cenomar => "cenomar",
      Self::DeathCert => "death_cert",
      Self::BarangayCert => "barangay_cert",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "psa" => Ok(Self::Psa),
      "itr" => Ok(Self::Itr),
      "med_cert" => Ok(Self::MedCert),
      "marriage" => Ok(Self::Marriage),
      "cenomar" => Ok(Self::Cenomar),
      "death_cert" => Ok(Self::DeathCert),
      "barangay_cert" => Ok(Self::BarangayCert),
      other => Err(Error::InvalidDocumentKind(other.to_string())),
    }
  }

  /// Human-readable label used in notification messages.
  pub fn label(&self) -> &'static str {
    match self {
      Self::Psa => "PSA Birth Certificate",
      Self::Itr => "Income Tax Return",
      Self::MedCert => "Medical Certificate",
      Self::Marriage => "Marriage Certificate",
      Self::Cenomar => "CENOMAR",
      Self::DeathCert => "Death Certificate",
      Self::BarangayCert => "Barangay Certificate",
    }
  }

  /// The barangay certificate predates the category column and never
  /// carries one — a quirk of the original data model, kept as-is.
  pub fn carries_category(&self) -> bool { !matches!(self, Self::BarangayCert) }
}

impl std::fmt::Display for DocumentKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Status and category ─────────────────────────────────────────────────────

/// Review state of a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
  Pending,
  Submitted,
  Approved,
  Rejected,
}

impl DocumentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "Pending",
      Self::Submitted => "Submitted",
      Self::Approved => "Approved",
      Self::Rejected => "Rejected",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "Pending" => Ok(Self::Pending),
      "Submitted" => Ok(Self::Submitted),
      "Approved" => Ok(Self::Approved),
      "Rejected" => Ok(Self::Rejected),
      other => Err(Error::InvalidStatus(other.to_string())),
    }
  }
}

/// Which flow a document arrived through: the initial application, or a
/// follow-up upload after staff review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Application,
  Followup,
}

impl Category {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Application => "application",
      Self::Followup => "followup",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "application" => Ok(Self::Application),
      "followup" => Ok(Self::Followup),
      other => Err(Error::InvalidStatus(other.to_string())),
    }
  }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// One stored document row. At most one per (applicant, kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  pub code_id:          CodeId,
  pub kind:             DocumentKind,
  /// Storage reference (object key or URL); no binary data in the store.
  pub file_name:        String,
  pub display_name:     String,
  pub status:           DocumentStatus,
  /// `None` for barangay certificates (no category column originally).
  pub category:         Option<Category>,
  pub rejection_reason: Option<String>,
  pub uploaded_at:      DateTime<Utc>,
}

/// Input to the upload operations; status and category are chosen by the
/// call site (intake vs follow-up), not by the uploader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentUpload {
  pub file_name:    String,
  pub display_name: String,
}
