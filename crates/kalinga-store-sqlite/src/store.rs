//! [`SqliteCaseStore`] — the SQLite implementation of [`CaseStore`].
//!
//! Every lifecycle operation executes inside one immediate-mode transaction
//! on the connection thread: read the applicant, check the guard table,
//! write the new state and dependent rows, commit. An uncommitted
//! transaction rolls back on drop, so no partial transition is ever
//! observable. Lock contention is retried up to [`MAX_WRITE_ATTEMPTS`]
//! times with a fixed backoff before surfacing [`Error::Busy`].

use std::{path::Path, time::Duration};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, Transaction, TransactionBehavior};
use uuid::Uuid;

use kalinga_core::{
  applicant::{
    Applicant, ApplicantStatus, CaseFile, Child, CivilStatus, CodeId,
    EmergencyContact, IntakeProfile, NewApplication, Remark,
  },
  document::{
    Category, Document, DocumentKind, DocumentStatus, DocumentUpload,
  },
  lifecycle::{
    self, DocumentReviewOutcome, LifecycleAction, MailRequest,
    RemarksResolution, RenewalDecision, ReviewDecision, ReviewOutcome,
    ReviewVerdict, SubmissionOutcome, TransitionOutcome, UploadOutcome,
  },
  notify::{
    Audience, MailEvent, Notification, NotificationKind,
    PROGRAM_OFFICE_TARGET,
  },
  policy,
  store::CaseStore,
};

use crate::{
  Error, Result,
  encode::{
    RawApplicant, RawChild, RawDocument, RawEmergency, RawNotification,
    RawProfile, RawRemark, decode_status, encode_civil_status, encode_date,
    encode_dt, encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

const MAX_WRITE_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Notice shown to an applicant placed under investigation.
const REMARKS_NOTICE: &str = "Your application is currently under \
  investigation. Kindly proceed to your designated SPO to complete the \
  necessary compliance requirements. You are given 5 to 7 working days to \
  comply.";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Kalinga case store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteCaseStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteCaseStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a read-only operation on the connection thread.
  async fn read<T, F>(&self, op: F) -> Result<T>
  where
    F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    match self.conn.call(move |conn| Ok(op(conn))).await {
      Ok(inner) => inner,
      Err(e) => Err(Error::Database(e)),
    }
  }

  /// Run `op` inside an immediate-mode transaction, committing on success.
  /// The whole operation (transaction acquisition included) is retried on
  /// lock contention with a fixed backoff.
  async fn write<T, F>(&self, op: F) -> Result<T>
  where
    F: Fn(&Transaction<'_>) -> Result<T> + Send + Clone + 'static,
    T: Send + 'static,
  {
    let mut attempt = 1;
    loop {
      let op = op.clone();
      let outcome = self
        .conn
        .call(move |conn| {
          let tx = match conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
          {
            Ok(tx) => tx,
            Err(e) => return Ok(Err(Error::Sqlite(e))),
          };
          let result = op(&tx);
          if result.is_ok()
            && let Err(e) = tx.commit()
          {
            return Ok(Err(Error::Sqlite(e)));
          }
          Ok(result)
        })
        .await;

      let result = match outcome {
        Ok(inner) => inner,
        Err(e) => Err(Error::Database(e)),
      };

      match result {
        Err(e) if e.is_busy() => {
          if attempt >= MAX_WRITE_ATTEMPTS {
            return Err(Error::Busy);
          }
          attempt += 1;
          tokio::time::sleep(RETRY_BACKOFF).await;
        }
        other => return other,
      }
    }
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn fetch_applicant(
  conn: &rusqlite::Connection,
  code_id: &str,
) -> Result<Option<Applicant>> {
  let raw = conn
    .query_row(
      "SELECT code_id, email, full_name, status, created_at
       FROM applicants WHERE code_id = ?1",
      rusqlite::params![code_id],
      |row| {
        Ok(RawApplicant {
          code_id:    row.get(0)?,
          email:      row.get(1)?,
          full_name:  row.get(2)?,
          status:     row.get(3)?,
          created_at: row.get(4)?,
        })
      },
    )
    .optional()?;
  raw.map(RawApplicant::into_applicant).transpose()
}

fn require_applicant(
  conn: &rusqlite::Connection,
  code_id: &CodeId,
) -> Result<Applicant> {
  fetch_applicant(conn, code_id.as_str())?.ok_or_else(|| {
    Error::Core(kalinga_core::Error::ApplicantNotFound(code_id.clone()))
  })
}

/// The profile columns the transition engine needs without materialising
/// the whole intake form.
struct ProfileSummary {
  civil_status: CivilStatus,
  barangay:     String,
  first_name:   String,
}

fn require_profile_summary(
  conn: &rusqlite::Connection,
  code_id: &CodeId,
) -> Result<ProfileSummary> {
  conn
    .query_row(
      "SELECT civil_status, barangay, first_name
       FROM intake_profiles WHERE code_id = ?1",
      rusqlite::params![code_id.as_str()],
      |row| {
        Ok((
          row.get::<_, String>(0)?,
          row.get::<_, String>(1)?,
          row.get::<_, String>(2)?,
        ))
      },
    )
    .optional()?
    .map(|(civil, barangay, first_name)| ProfileSummary {
      civil_status: CivilStatus::parse(&civil),
      barangay,
      first_name,
    })
    .ok_or_else(|| {
      Error::Core(kalinga_core::Error::ApplicantNotFound(code_id.clone()))
    })
}

fn fetch_profile(
  conn: &rusqlite::Connection,
  code_id: &str,
) -> Result<Option<IntakeProfile>> {
  let raw = conn
    .query_row(
      "SELECT first_name, middle_name, last_name, suffix, age, gender,
              date_of_birth, place_of_birth, barangay, education,
              civil_status, occupation, income, employment_status,
              contact_number, classification, needs
       FROM intake_profiles WHERE code_id = ?1",
      rusqlite::params![code_id],
      |row| {
        Ok(RawProfile {
          first_name:        row.get(0)?,
          middle_name:       row.get(1)?,
          last_name:         row.get(2)?,
          suffix:            row.get(3)?,
          age:               row.get(4)?,
          gender:            row.get(5)?,
          date_of_birth:     row.get(6)?,
          place_of_birth:    row.get(7)?,
          barangay:          row.get(8)?,
          education:         row.get(9)?,
          civil_status:      row.get(10)?,
          occupation:        row.get(11)?,
          income:            row.get(12)?,
          employment_status: row.get(13)?,
          contact_number:    row.get(14)?,
          classification:    row.get(15)?,
          needs:             row.get(16)?,
        })
      },
    )
    .optional()?;
  raw.map(RawProfile::into_profile).transpose()
}

fn insert_profile(
  conn: &rusqlite::Connection,
  code_id: &str,
  p: &IntakeProfile,
) -> Result<()> {
  conn.execute(
    "INSERT INTO intake_profiles (
       code_id, first_name, middle_name, last_name, suffix, age, gender,
       date_of_birth, place_of_birth, barangay, education, civil_status,
       occupation, income, employment_status, contact_number,
       classification, needs
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
               ?15, ?16, ?17, ?18)",
    rusqlite::params![
      code_id,
      p.first_name,
      p.middle_name,
      p.last_name,
      p.suffix,
      p.age as i64,
      p.gender,
      encode_date(p.date_of_birth),
      p.place_of_birth,
      p.barangay,
      p.education,
      encode_civil_status(p.civil_status),
      p.occupation,
      p.income,
      p.employment_status,
      p.contact_number,
      p.classification,
      p.needs,
    ],
  )?;
  Ok(())
}

fn update_profile(
  conn: &rusqlite::Connection,
  code_id: &str,
  p: &IntakeProfile,
) -> Result<()> {
  conn.execute(
    "UPDATE intake_profiles SET
       first_name = ?2, middle_name = ?3, last_name = ?4, suffix = ?5,
       age = ?6, gender = ?7, date_of_birth = ?8, place_of_birth = ?9,
       barangay = ?10, education = ?11, civil_status = ?12,
       occupation = ?13, income = ?14, employment_status = ?15,
       contact_number = ?16, classification = ?17, needs = ?18
     WHERE code_id = ?1",
    rusqlite::params![
      code_id,
      p.first_name,
      p.middle_name,
      p.last_name,
      p.suffix,
      p.age as i64,
      p.gender,
      encode_date(p.date_of_birth),
      p.place_of_birth,
      p.barangay,
      p.education,
      encode_civil_status(p.civil_status),
      p.occupation,
      p.income,
      p.employment_status,
      p.contact_number,
      p.classification,
      p.needs,
    ],
  )?;
  Ok(())
}

fn fetch_children(
  conn: &rusqlite::Connection,
  code_id: &str,
) -> Result<Vec<Child>> {
  let mut stmt = conn.prepare(
    "SELECT name, age, educational_attainment, birthdate
     FROM children WHERE code_id = ?1 ORDER BY name",
  )?;
  let raws = stmt
    .query_map(rusqlite::params![code_id], |row| {
      Ok(RawChild {
        name:                   row.get(0)?,
        age:                    row.get(1)?,
        educational_attainment: row.get(2)?,
        birthdate:              row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawChild::into_child).collect()
}

/// Children are replaced wholesale on re-submission; there is no per-child
/// identity to reconcile against.
fn replace_children(
  conn: &rusqlite::Connection,
  code_id: &str,
  children: &[Child],
) -> Result<()> {
  conn.execute(
    "DELETE FROM children WHERE code_id = ?1",
    rusqlite::params![code_id],
  )?;
  for child in children {
    conn.execute(
      "INSERT INTO children (child_id, code_id, name, age,
         educational_attainment, birthdate)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        code_id,
        child.name,
        child.age as i64,
        child.educational_attainment,
        encode_date(child.birthdate),
      ],
    )?;
  }
  Ok(())
}

fn fetch_emergency(
  conn: &rusqlite::Connection,
  code_id: &str,
) -> Result<Option<EmergencyContact>> {
  let raw = conn
    .query_row(
      "SELECT name, relationship, address, contact_number
       FROM emergency_contacts WHERE code_id = ?1",
      rusqlite::params![code_id],
      |row| {
        Ok(RawEmergency {
          name:           row.get(0)?,
          relationship:   row.get(1)?,
          address:        row.get(2)?,
          contact_number: row.get(3)?,
        })
      },
    )
    .optional()?;
  Ok(raw.map(RawEmergency::into_contact))
}

fn upsert_emergency(
  conn: &rusqlite::Connection,
  code_id: &str,
  e: &EmergencyContact,
) -> Result<()> {
  conn.execute(
    "INSERT INTO emergency_contacts (code_id, name, relationship, address,
       contact_number)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (code_id) DO UPDATE SET
       name = excluded.name,
       relationship = excluded.relationship,
       address = excluded.address,
       contact_number = excluded.contact_number",
    rusqlite::params![code_id, e.name, e.relationship, e.address, e.contact_number],
  )?;
  Ok(())
}

const DOCUMENT_COLUMNS: &str = "code_id, kind, file_name, display_name, \
  status, category, rejection_reason, uploaded_at";

fn document_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDocument> {
  Ok(RawDocument {
    code_id:          row.get(0)?,
    kind:             row.get(1)?,
    file_name:        row.get(2)?,
    display_name:     row.get(3)?,
    status:           row.get(4)?,
    category:         row.get(5)?,
    rejection_reason: row.get(6)?,
    uploaded_at:      row.get(7)?,
  })
}

fn fetch_documents(
  conn: &rusqlite::Connection,
  code_id: &str,
) -> Result<Vec<Document>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE code_id = ?1 ORDER BY kind",
  ))?;
  let raws = stmt
    .query_map(rusqlite::params![code_id], document_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawDocument::into_document).collect()
}

fn fetch_document(
  conn: &rusqlite::Connection,
  code_id: &str,
  kind: DocumentKind,
) -> Result<Option<Document>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents
         WHERE code_id = ?1 AND kind = ?2",
      ),
      rusqlite::params![code_id, kind.as_str()],
      document_from_row,
    )
    .optional()?;
  raw.map(RawDocument::into_document).transpose()
}

fn require_document(
  conn: &rusqlite::Connection,
  code_id: &CodeId,
  kind: DocumentKind,
) -> Result<Document> {
  fetch_document(conn, code_id.as_str(), kind)?.ok_or_else(|| {
    Error::Core(kalinga_core::Error::DocumentNotFound {
      code_id: code_id.clone(),
      kind,
    })
  })
}

/// Insert-or-update the single row for (applicant, kind). The UNIQUE pair
/// key makes a concurrent double-upload converge on one row. A re-upload
/// keeps any standing rejection reason; only a staff review clears it.
fn upsert_document(
  conn: &rusqlite::Connection,
  code_id: &str,
  kind: DocumentKind,
  upload: &DocumentUpload,
  status: DocumentStatus,
  category: Option<Category>,
) -> Result<Document> {
  conn.execute(
    "INSERT INTO documents (code_id, kind, file_name, display_name, status,
       category, rejection_reason, uploaded_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7)
     ON CONFLICT (code_id, kind) DO UPDATE SET
       file_name = excluded.file_name,
       display_name = excluded.display_name,
       status = excluded.status,
       category = excluded.category,
       uploaded_at = excluded.uploaded_at",
    rusqlite::params![
      code_id,
      kind.as_str(),
      upload.file_name,
      upload.display_name,
      status.as_str(),
      category.map(|c| c.as_str()),
      encode_dt(Utc::now()),
    ],
  )?;
  fetch_document(conn, code_id, kind)?
    .ok_or(Error::Sqlite(rusqlite::Error::QueryReturnedNoRows))
}

fn set_status(
  conn: &rusqlite::Connection,
  code_id: &str,
  status: ApplicantStatus,
) -> Result<()> {
  conn.execute(
    "UPDATE applicants SET status = ?2 WHERE code_id = ?1",
    rusqlite::params![code_id, encode_status(status)],
  )?;
  Ok(())
}

fn insert_remark(
  conn: &rusqlite::Connection,
  code_id: &str,
  body: &str,
  author: &str,
) -> Result<()> {
  conn.execute(
    "INSERT INTO remarks (remark_id, code_id, body, author, recorded_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      code_id,
      body,
      author,
      encode_dt(Utc::now()),
    ],
  )?;
  Ok(())
}

fn fetch_remarks(
  conn: &rusqlite::Connection,
  code_id: &str,
) -> Result<Vec<Remark>> {
  let mut stmt = conn.prepare(
    "SELECT remark_id, code_id, body, author, recorded_at
     FROM remarks WHERE code_id = ?1 ORDER BY recorded_at DESC",
  )?;
  let raws = stmt
    .query_map(rusqlite::params![code_id], |row| {
      Ok(RawRemark {
        remark_id:   row.get(0)?,
        code_id:     row.get(1)?,
        body:        row.get(2)?,
        author:      row.get(3)?,
        recorded_at: row.get(4)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawRemark::into_remark).collect()
}

/// Record a notification unless an unread row with the same target, kind,
/// and message already exists (retried requests must not spam the feed).
/// Best-effort: a failed insert is logged and never aborts the parent
/// transition.
fn notify(
  conn: &rusqlite::Connection,
  audience: Audience,
  target: &str,
  kind: NotificationKind,
  message: &str,
) {
  let result: rusqlite::Result<()> = (|| {
    let exists: bool = conn
      .query_row(
        "SELECT 1 FROM notifications
         WHERE target = ?1 AND audience = ?2 AND kind = ?3 AND message = ?4
           AND is_read = 0",
        rusqlite::params![target, audience.as_str(), kind.as_str(), message],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false);
    if exists {
      return Ok(());
    }
    conn.execute(
      "INSERT INTO notifications (notification_id, target, audience, kind,
         message, is_read, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
      rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        target,
        audience.as_str(),
        kind.as_str(),
        message,
        encode_dt(Utc::now()),
      ],
    )?;
    Ok(())
  })();

  if let Err(e) = result {
    tracing::warn!(
      kind = kind.as_str(),
      recipient = target,
      "failed to record notification: {e}"
    );
  }
}

/// Verify an applicant: flip status, tell them, tell their barangay.
/// Shared by every path that reaches `Verified` with full paperwork.
fn mark_verified(
  conn: &rusqlite::Connection,
  applicant: &Applicant,
  summary: &ProfileSummary,
) -> Result<()> {
  set_status(conn, applicant.code_id.as_str(), ApplicantStatus::Verified)?;
  notify(
    conn,
    Audience::Applicant,
    applicant.code_id.as_str(),
    NotificationKind::ApplicationAccepted,
    "Your application has been accepted.",
  );
  notify(
    conn,
    Audience::Barangay,
    &summary.barangay,
    NotificationKind::NewSoloParent,
    &format!("{} is a new solo parent in your barangay.", applicant.full_name),
  );
  Ok(())
}

// ─── CaseStore impl ──────────────────────────────────────────────────────────

impl CaseStore for SqliteCaseStore {
  type Error = Error;

  // ── Applications ──────────────────────────────────────────────────────────

  async fn submit_application(
    &self,
    input: NewApplication,
  ) -> Result<SubmissionOutcome> {
    self
      .write(move |tx| {
        let existing: Option<(String, String)> = tx
          .query_row(
            "SELECT code_id, status FROM applicants WHERE email = ?1",
            rusqlite::params![input.email],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;

        match existing {
          None => {
            let now = Utc::now();
            let code_id = CodeId::generate(now);
            let full_name = input.profile.full_name();

            tx.execute(
              "INSERT INTO applicants (code_id, email, full_name, status,
                 created_at)
               VALUES (?1, ?2, ?3, ?4, ?5)",
              rusqlite::params![
                code_id.as_str(),
                input.email,
                full_name,
                encode_status(ApplicantStatus::Pending),
                encode_dt(now),
              ],
            )?;
            insert_profile(tx, code_id.as_str(), &input.profile)?;
            replace_children(tx, code_id.as_str(), &input.children)?;
            upsert_emergency(tx, code_id.as_str(), &input.emergency)?;

            notify(
              tx,
              Audience::ProgramOffice,
              PROGRAM_OFFICE_TARGET,
              NotificationKind::NewApplication,
              "New application was created",
            );

            Ok(SubmissionOutcome {
              applicant:    Applicant {
                code_id,
                email: input.email.clone(),
                full_name,
                status: ApplicantStatus::Pending,
                created_at: now,
              },
              resubmission: false,
            })
          }

          Some((code_str, status_str)) => {
            let code_id = CodeId::parse(&code_str).map_err(Error::Core)?;
            let status = decode_status(&status_str)?;
            if status != ApplicantStatus::Declined {
              return Err(Error::Core(
                kalinga_core::Error::EmailAlreadyRegistered {
                  email: input.email.clone(),
                  code_id,
                },
              ));
            }

            // Declined applicant re-submitting: overwrite the intake data
            // in place, keep the code id.
            tx.execute(
              "UPDATE applicants SET full_name = ?2, status = ?3
               WHERE code_id = ?1",
              rusqlite::params![
                code_id.as_str(),
                input.profile.full_name(),
                encode_status(ApplicantStatus::Pending),
              ],
            )?;
            update_profile(tx, code_id.as_str(), &input.profile)?;
            replace_children(tx, code_id.as_str(), &input.children)?;
            upsert_emergency(tx, code_id.as_str(), &input.emergency)?;

            notify(
              tx,
              Audience::ProgramOffice,
              PROGRAM_OFFICE_TARGET,
              NotificationKind::Resubmission,
              "New application was re-submitted",
            );

            let applicant = require_applicant(tx, &code_id)?;
            Ok(SubmissionOutcome { applicant, resubmission: true })
          }
        }
      })
      .await
  }

  async fn get_applicant(&self, code_id: &CodeId) -> Result<Option<Applicant>> {
    let code_id = code_id.clone();
    self
      .read(move |conn| fetch_applicant(conn, code_id.as_str()))
      .await
  }

  async fn get_case_file(&self, code_id: &CodeId) -> Result<Option<CaseFile>> {
    let code_id = code_id.clone();
    self
      .read(move |conn| {
        let Some(applicant) = fetch_applicant(conn, code_id.as_str())? else {
          return Ok(None);
        };
        let Some(profile) = fetch_profile(conn, code_id.as_str())? else {
          return Ok(None);
        };
        let Some(emergency) = fetch_emergency(conn, code_id.as_str())? else {
          return Ok(None);
        };
        let children = fetch_children(conn, code_id.as_str())?;
        let documents = fetch_documents(conn, code_id.as_str())?;
        let latest_remark =
          fetch_remarks(conn, code_id.as_str())?.into_iter().next();

        Ok(Some(CaseFile {
          applicant,
          profile,
          children,
          emergency,
          documents,
          latest_remark,
        }))
      })
      .await
  }

  async fn list_applicants(
    &self,
    status: Option<ApplicantStatus>,
  ) -> Result<Vec<Applicant>> {
    self
      .read(move |conn| {
        let raws = if let Some(status) = status {
          let mut stmt = conn.prepare(
            "SELECT code_id, email, full_name, status, created_at
             FROM applicants WHERE status = ?1 ORDER BY created_at DESC",
          )?;
          stmt
            .query_map(rusqlite::params![encode_status(status)], |row| {
              Ok(RawApplicant {
                code_id:    row.get(0)?,
                email:      row.get(1)?,
                full_name:  row.get(2)?,
                status:     row.get(3)?,
                created_at: row.get(4)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(
            "SELECT code_id, email, full_name, status, created_at
             FROM applicants ORDER BY created_at DESC",
          )?;
          stmt
            .query_map([], |row| {
              Ok(RawApplicant {
                code_id:    row.get(0)?,
                email:      row.get(1)?,
                full_name:  row.get(2)?,
                status:     row.get(3)?,
                created_at: row.get(4)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        raws.into_iter().map(RawApplicant::into_applicant).collect()
      })
      .await
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn upload_document(
    &self,
    code_id: &CodeId,
    kind: DocumentKind,
    upload: DocumentUpload,
  ) -> Result<UploadOutcome> {
    let code_id = code_id.clone();
    self
      .write(move |tx| {
        let applicant = require_applicant(tx, &code_id)?;
        let summary = require_profile_summary(tx, &code_id)?;

        let category =
          kind.carries_category().then_some(Category::Application);
        let document = upsert_document(
          tx,
          code_id.as_str(),
          kind,
          &upload,
          DocumentStatus::Submitted,
          category,
        )?;

        // Completeness re-evaluation is a separate, explicit step after the
        // upsert; only a Pending applicant can auto-verify from here.
        let mut verified = false;
        if applicant.status == ApplicantStatus::Pending {
          let docs = fetch_documents(tx, code_id.as_str())?;
          if policy::is_complete(&docs, summary.civil_status) {
            mark_verified(tx, &applicant, &summary)?;
            verified = true;
          }
        }

        Ok(UploadOutcome { document, verified })
      })
      .await
  }

  async fn upload_followup_document(
    &self,
    code_id: &CodeId,
    kind: DocumentKind,
    upload: DocumentUpload,
  ) -> Result<Document> {
    let code_id = code_id.clone();
    self
      .write(move |tx| {
        let applicant = require_applicant(tx, &code_id)?;

        let category = kind.carries_category().then_some(Category::Followup);
        let document = upsert_document(
          tx,
          code_id.as_str(),
          kind,
          &upload,
          DocumentStatus::Pending,
          category,
        )?;

        let message = if kind == DocumentKind::BarangayCert {
          format!(
            "{} uploaded a {} for their renewal",
            applicant.full_name,
            kind.label()
          )
        } else {
          format!(
            "{} uploaded a follow-up document for their {}",
            applicant.full_name,
            kind.label()
          )
        };
        notify(
          tx,
          Audience::ProgramOffice,
          PROGRAM_OFFICE_TARGET,
          NotificationKind::FollowUpDocument,
          &message,
        );

        Ok(document)
      })
      .await
  }

  async fn list_documents(&self, code_id: &CodeId) -> Result<Vec<Document>> {
    let code_id = code_id.clone();
    self
      .read(move |conn| {
        require_applicant(conn, &code_id)?;
        fetch_documents(conn, code_id.as_str())
      })
      .await
  }

  async fn delete_document(
    &self,
    code_id: &CodeId,
    kind: DocumentKind,
  ) -> Result<bool> {
    let code_id = code_id.clone();
    self
      .write(move |tx| {
        require_applicant(tx, &code_id)?;
        let affected = tx.execute(
          "DELETE FROM documents WHERE code_id = ?1 AND kind = ?2",
          rusqlite::params![code_id.as_str(), kind.as_str()],
        )?;
        Ok(affected > 0)
      })
      .await
  }

  async fn is_complete(&self, code_id: &CodeId) -> Result<bool> {
    let code_id = code_id.clone();
    self
      .read(move |conn| {
        let summary = require_profile_summary(conn, &code_id)?;
        let docs = fetch_documents(conn, code_id.as_str())?;
        Ok(policy::is_complete(&docs, summary.civil_status))
      })
      .await
  }

  async fn is_fully_approved(&self, code_id: &CodeId) -> Result<bool> {
    let code_id = code_id.clone();
    self
      .read(move |conn| {
        let summary = require_profile_summary(conn, &code_id)?;
        let docs = fetch_documents(conn, code_id.as_str())?;
        Ok(policy::is_fully_approved(&docs, summary.civil_status))
      })
      .await
  }

  async fn set_document_status(
    &self,
    code_id: &CodeId,
    kind: DocumentKind,
    status: DocumentStatus,
    rejection_reason: Option<String>,
  ) -> Result<DocumentReviewOutcome> {
    let code_id = code_id.clone();
    self
      .write(move |tx| {
        let applicant = require_applicant(tx, &code_id)?;
        require_document(tx, &code_id, kind)?;

        tx.execute(
          "UPDATE documents SET status = ?3, rejection_reason = ?4
           WHERE code_id = ?1 AND kind = ?2",
          rusqlite::params![
            code_id.as_str(),
            kind.as_str(),
            status.as_str(),
            rejection_reason,
          ],
        )?;

        match status {
          DocumentStatus::Approved => notify(
            tx,
            Audience::Applicant,
            code_id.as_str(),
            NotificationKind::DocumentReviewed,
            &format!("Your {} has been accepted.", kind.label()),
          ),
          DocumentStatus::Rejected => {
            let reason = rejection_reason
              .as_deref()
              .map(|r| format!(" {r}"))
              .unwrap_or_default();
            notify(
              tx,
              Audience::Applicant,
              code_id.as_str(),
              NotificationKind::DocumentReviewed,
              &format!("Your {} was rejected.{reason}", kind.label()),
            );
          }
          _ => {}
        }

        // Approving the last outstanding document completes the staff
        // path into Verified.
        let mut applicant_verified = false;
        if status == DocumentStatus::Approved
          && matches!(
            applicant.status,
            ApplicantStatus::Pending | ApplicantStatus::Incomplete
          )
        {
          let summary = require_profile_summary(tx, &code_id)?;
          let docs = fetch_documents(tx, code_id.as_str())?;
          if policy::is_fully_approved(&docs, summary.civil_status) {
            mark_verified(tx, &applicant, &summary)?;
            applicant_verified = true;
          }
        }

        let document = require_document(tx, &code_id, kind)?;
        Ok(DocumentReviewOutcome { document, applicant_verified })
      })
      .await
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  async fn review_application(
    &self,
    code_id: &CodeId,
    decision: ReviewDecision,
  ) -> Result<ReviewOutcome> {
    let code_id = code_id.clone();
    self
      .write(move |tx| {
        let applicant = require_applicant(tx, &code_id)?;
        let summary = require_profile_summary(tx, &code_id)?;

        match &decision {
          ReviewDecision::Accept => {
            lifecycle::check_transition(
              applicant.status,
              LifecycleAction::Accept,
            )
            .map_err(Error::Core)?;

            let docs = fetch_documents(tx, code_id.as_str())?;
            if policy::is_fully_approved(&docs, summary.civil_status) {
              // Sync every row on file to Approved so extras (e.g. a
              // renewal certificate) match the decision.
              tx.execute(
                "UPDATE documents SET status = ?2 WHERE code_id = ?1",
                rusqlite::params![
                  code_id.as_str(),
                  DocumentStatus::Approved.as_str(),
                ],
              )?;
              mark_verified(tx, &applicant, &summary)?;

              let applicant = require_applicant(tx, &code_id)?;
              let mail = Some(MailRequest {
                to:         applicant.email.clone(),
                first_name: summary.first_name.clone(),
                event:      MailEvent::ApplicationApproved,
              });
              Ok(ReviewOutcome {
                applicant,
                verdict: ReviewVerdict::Verified,
                mail,
              })
            } else {
              let missing = policy::missing_kinds(&docs, summary.civil_status);
              set_status(tx, code_id.as_str(), ApplicantStatus::Incomplete)?;

              let listed = missing
                .iter()
                .map(|k| k.label())
                .collect::<Vec<_>>()
                .join(", ");
              notify(
                tx,
                Audience::Applicant,
                code_id.as_str(),
                NotificationKind::ApplicationIncomplete,
                &format!(
                  "Your application is missing required documents: {listed}."
                ),
              );

              let applicant = require_applicant(tx, &code_id)?;
              Ok(ReviewOutcome {
                applicant,
                verdict: ReviewVerdict::Incomplete { missing },
                mail: None,
              })
            }
          }

          ReviewDecision::Decline { remarks } => {
            let remarks = remarks.trim();
            if remarks.is_empty() {
              return Err(Error::Core(kalinga_core::Error::EmptyRemarks));
            }
            lifecycle::check_transition(
              applicant.status,
              LifecycleAction::Decline,
            )
            .map_err(Error::Core)?;

            insert_remark(tx, code_id.as_str(), remarks, "program_office")?;
            set_status(tx, code_id.as_str(), ApplicantStatus::Declined)?;
            notify(
              tx,
              Audience::Applicant,
              code_id.as_str(),
              NotificationKind::ApplicationDeclined,
              &format!(
                "Your application has been declined. Remarks: {remarks}"
              ),
            );

            let applicant = require_applicant(tx, &code_id)?;
            let mail = Some(MailRequest {
              to:         applicant.email.clone(),
              first_name: summary.first_name.clone(),
              event:      MailEvent::ApplicationDeclined {
                remarks: remarks.to_string(),
              },
            });
            Ok(ReviewOutcome {
              applicant,
              verdict: ReviewVerdict::Declined,
              mail,
            })
          }
        }
      })
      .await
  }

  async fn issue_remarks(
    &self,
    code_id: &CodeId,
    remarks: String,
    author: String,
  ) -> Result<TransitionOutcome> {
    let code_id = code_id.clone();
    self
      .write(move |tx| {
        let applicant = require_applicant(tx, &code_id)?;
        lifecycle::check_transition(
          applicant.status,
          LifecycleAction::IssueRemarks,
        )
        .map_err(Error::Core)?;

        let remarks = remarks.trim();
        if remarks.is_empty() {
          return Err(Error::Core(kalinga_core::Error::EmptyRemarks));
        }
        let summary = require_profile_summary(tx, &code_id)?;

        insert_remark(tx, code_id.as_str(), remarks, &author)?;
        set_status(tx, code_id.as_str(), ApplicantStatus::PendingRemarks)?;
        notify(
          tx,
          Audience::Applicant,
          code_id.as_str(),
          NotificationKind::ApplicationRemarks,
          REMARKS_NOTICE,
        );
        notify(
          tx,
          Audience::ProgramOffice,
          PROGRAM_OFFICE_TARGET,
          NotificationKind::ApplicationRemarks,
          &format!("From {author}: {} has pending remarks.", summary.first_name),
        );

        let applicant = require_applicant(tx, &code_id)?;
        let mail = Some(MailRequest {
          to:         applicant.email.clone(),
          first_name: summary.first_name.clone(),
          event:      MailEvent::RevokeWarning,
        });
        Ok(TransitionOutcome { applicant, mail })
      })
      .await
  }

  async fn resolve_remarks(
    &self,
    code_id: &CodeId,
    resolution: RemarksResolution,
  ) -> Result<TransitionOutcome> {
    let code_id = code_id.clone();
    self
      .write(move |tx| {
        let applicant = require_applicant(tx, &code_id)?;
        lifecycle::check_transition(
          applicant.status,
          LifecycleAction::ResolveRemarks,
        )
        .map_err(Error::Core)?;

        match resolution {
          RemarksResolution::Accept => {
            set_status(tx, code_id.as_str(), ApplicantStatus::Verified)?;
            notify(
              tx,
              Audience::Applicant,
              code_id.as_str(),
              NotificationKind::RemarksCleared,
              "Your account has been verified.",
            );
          }
          RemarksResolution::Decline => {
            set_status(tx, code_id.as_str(), ApplicantStatus::Terminated)?;
            notify(
              tx,
              Audience::Applicant,
              code_id.as_str(),
              NotificationKind::ApplicationTerminated,
              "Your account has been terminated.",
            );
          }
        }

        let applicant = require_applicant(tx, &code_id)?;
        Ok(TransitionOutcome { applicant, mail: None })
      })
      .await
  }

  async fn terminate(&self, code_id: &CodeId) -> Result<TransitionOutcome> {
    let code_id = code_id.clone();
    self
      .write(move |tx| {
        let applicant = require_applicant(tx, &code_id)?;
        lifecycle::check_transition(
          applicant.status,
          LifecycleAction::Terminate,
        )
        .map_err(Error::Core)?;
        let summary = require_profile_summary(tx, &code_id)?;

        set_status(tx, code_id.as_str(), ApplicantStatus::Terminated)?;
        notify(
          tx,
          Audience::Applicant,
          code_id.as_str(),
          NotificationKind::ApplicationTerminated,
          "Your account has been terminated.",
        );
        notify(
          tx,
          Audience::Barangay,
          &summary.barangay,
          NotificationKind::ApplicationTerminated,
          &format!(
            "{} from your barangay was not cleared and is now disqualified \
             as a solo parent after review.",
            applicant.full_name
          ),
        );

        let applicant = require_applicant(tx, &code_id)?;
        let mail = Some(MailRequest {
          to:         applicant.email.clone(),
          first_name: summary.first_name.clone(),
          event:      MailEvent::Terminated,
        });
        Ok(TransitionOutcome { applicant, mail })
      })
      .await
  }

  async fn reinstate(&self, code_id: &CodeId) -> Result<TransitionOutcome> {
    let code_id = code_id.clone();
    self
      .write(move |tx| {
        let applicant = require_applicant(tx, &code_id)?;
        lifecycle::check_transition(
          applicant.status,
          LifecycleAction::Reinstate,
        )
        .map_err(Error::Core)?;
        let summary = require_profile_summary(tx, &code_id)?;

        set_status(tx, code_id.as_str(), ApplicantStatus::Verified)?;
        notify(
          tx,
          Audience::Applicant,
          code_id.as_str(),
          NotificationKind::AccountReinstated,
          "Your account has been reactivated.",
        );
        notify(
          tx,
          Audience::Barangay,
          &summary.barangay,
          NotificationKind::AccountReinstated,
          &format!(
            "{} is a new solo parent in your barangay.",
            applicant.full_name
          ),
        );

        let applicant = require_applicant(tx, &code_id)?;
        let mail = Some(MailRequest {
          to:         applicant.email.clone(),
          first_name: summary.first_name.clone(),
          event:      MailEvent::Reinstated,
        });
        Ok(TransitionOutcome { applicant, mail })
      })
      .await
  }

  async fn start_renewal(&self, code_id: &CodeId) -> Result<TransitionOutcome> {
    let code_id = code_id.clone();
    self
      .write(move |tx| {
        let applicant = require_applicant(tx, &code_id)?;
        lifecycle::check_transition(
          applicant.status,
          LifecycleAction::StartRenewal,
        )
        .map_err(Error::Core)?;

        set_status(tx, code_id.as_str(), ApplicantStatus::Renewal)?;
        notify(
          tx,
          Audience::Applicant,
          code_id.as_str(),
          NotificationKind::RenewalStarted,
          "Your ID has expired. Please submit your renewal application.",
        );

        let applicant = require_applicant(tx, &code_id)?;
        Ok(TransitionOutcome { applicant, mail: None })
      })
      .await
  }

  async fn resolve_renewal(
    &self,
    code_id: &CodeId,
    decision: RenewalDecision,
  ) -> Result<TransitionOutcome> {
    let code_id = code_id.clone();
    self
      .write(move |tx| {
        let applicant = require_applicant(tx, &code_id)?;
        lifecycle::check_transition(
          applicant.status,
          LifecycleAction::ResolveRenewal,
        )
        .map_err(Error::Core)?;
        let summary = require_profile_summary(tx, &code_id)?;

        let mail_event = match &decision {
          RenewalDecision::Approve => {
            set_status(tx, code_id.as_str(), ApplicantStatus::Verified)?;
            tx.execute(
              "UPDATE documents SET status = ?2
               WHERE code_id = ?1 AND kind = ?3",
              rusqlite::params![
                code_id.as_str(),
                DocumentStatus::Approved.as_str(),
                DocumentKind::BarangayCert.as_str(),
              ],
            )?;
            notify(
              tx,
              Audience::Applicant,
              code_id.as_str(),
              NotificationKind::RenewalAccepted,
              "Your renewal has been approved.",
            );
            MailEvent::RenewalApproved
          }

          RenewalDecision::Decline { remarks } => {
            if !remarks.to_lowercase().contains("declined") {
              return Err(Error::Core(
                kalinga_core::Error::InvalidRenewalRemarks,
              ));
            }
            // Status stays Renewal; the stale certificate is dropped so
            // the applicant can upload a fresh one.
            tx.execute(
              "DELETE FROM documents WHERE code_id = ?1 AND kind = ?2",
              rusqlite::params![
                code_id.as_str(),
                DocumentKind::BarangayCert.as_str(),
              ],
            )?;
            notify(
              tx,
              Audience::Applicant,
              code_id.as_str(),
              NotificationKind::RenewalDeclined,
              &format!("Your renewal was declined. Remarks: {remarks}"),
            );
            MailEvent::RenewalDeclined { remarks: remarks.clone() }
          }
        };

        let applicant = require_applicant(tx, &code_id)?;
        let mail = Some(MailRequest {
          to:         applicant.email.clone(),
          first_name: summary.first_name.clone(),
          event:      mail_event,
        });
        Ok(TransitionOutcome { applicant, mail })
      })
      .await
  }

  async fn list_remarks(&self, code_id: &CodeId) -> Result<Vec<Remark>> {
    let code_id = code_id.clone();
    self
      .read(move |conn| {
        require_applicant(conn, &code_id)?;
        fetch_remarks(conn, code_id.as_str())
      })
      .await
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn notifications_for(
    &self,
    audience: Audience,
    target: &str,
  ) -> Result<Vec<Notification>> {
    let target = target.to_string();
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT notification_id, target, audience, kind, message, is_read,
                  created_at
           FROM notifications
           WHERE audience = ?1 AND target = ?2
           ORDER BY created_at DESC",
        )?;
        let raws = stmt
          .query_map(rusqlite::params![audience.as_str(), target], |row| {
            Ok(RawNotification {
              notification_id: row.get(0)?,
              target:          row.get(1)?,
              audience:        row.get(2)?,
              kind:            row.get(3)?,
              message:         row.get(4)?,
              is_read:         row.get(5)?,
              created_at:      row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws
          .into_iter()
          .map(RawNotification::into_notification)
          .collect()
      })
      .await
  }

  async fn mark_notifications_read(
    &self,
    audience: Audience,
    target: &str,
    kind: Option<NotificationKind>,
  ) -> Result<u64> {
    let target = target.to_string();
    self
      .write(move |tx| {
        let affected = if let Some(kind) = kind {
          tx.execute(
            "UPDATE notifications SET is_read = 1
             WHERE audience = ?1 AND target = ?2 AND kind = ?3
               AND is_read = 0",
            rusqlite::params![audience.as_str(), target, kind.as_str()],
          )?
        } else {
          tx.execute(
            "UPDATE notifications SET is_read = 1
             WHERE audience = ?1 AND target = ?2 AND is_read = 0",
            rusqlite::params![audience.as_str(), target],
          )?
        };
        Ok(affected as u64)
      })
      .await
  }
}
