//! SQL schema for the Kalinga SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS applicants (
    code_id     TEXT PRIMARY KEY,   -- YYYY_MM_NNNNNN; never reassigned
    email       TEXT NOT NULL UNIQUE,
    full_name   TEXT NOT NULL,
    status      TEXT NOT NULL,      -- 'Pending' | 'Verified' | 'Declined' |
                                    -- 'Terminated' | 'Renewal' | 'Incomplete' |
                                    -- 'Pending Remarks'
    created_at  TEXT NOT NULL       -- ISO 8601 UTC
);

CREATE TABLE IF NOT EXISTS intake_profiles (
    code_id           TEXT PRIMARY KEY REFERENCES applicants(code_id),
    first_name        TEXT NOT NULL,
    middle_name       TEXT,
    last_name         TEXT NOT NULL,
    suffix            TEXT,
    age               INTEGER NOT NULL,
    gender            TEXT NOT NULL,
    date_of_birth     TEXT NOT NULL,  -- YYYY-MM-DD
    place_of_birth    TEXT NOT NULL,
    barangay          TEXT NOT NULL,
    education         TEXT,
    civil_status      TEXT NOT NULL,  -- lowercase; drives the document set
    occupation        TEXT,
    income            TEXT,
    employment_status TEXT,
    contact_number    TEXT NOT NULL,
    classification    TEXT,
    needs             TEXT
);

CREATE TABLE IF NOT EXISTS children (
    child_id               TEXT PRIMARY KEY,
    code_id                TEXT NOT NULL REFERENCES applicants(code_id),
    name                   TEXT NOT NULL,
    age                    INTEGER NOT NULL,
    educational_attainment TEXT,
    birthdate              TEXT NOT NULL  -- YYYY-MM-DD
);

CREATE TABLE IF NOT EXISTS emergency_contacts (
    code_id        TEXT PRIMARY KEY REFERENCES applicants(code_id),
    name           TEXT NOT NULL,
    relationship   TEXT NOT NULL,
    address        TEXT NOT NULL,
    contact_number TEXT NOT NULL
);

-- One row per (applicant, kind); uploads replace the row in place.
CREATE TABLE IF NOT EXISTS documents (
    code_id          TEXT NOT NULL REFERENCES applicants(code_id),
    kind             TEXT NOT NULL,  -- 'psa' | 'itr' | 'med_cert' | ...
    file_name        TEXT NOT NULL,
    display_name     TEXT NOT NULL,
    status           TEXT NOT NULL,  -- 'Pending' | 'Submitted' | 'Approved' | 'Rejected'
    category         TEXT,           -- 'application' | 'followup'; always NULL
                                     -- for barangay_cert rows
    rejection_reason TEXT,
    uploaded_at      TEXT NOT NULL,
    PRIMARY KEY (code_id, kind)
);

-- Staff investigation notes; append-only.
CREATE TABLE IF NOT EXISTS remarks (
    remark_id   TEXT PRIMARY KEY,
    code_id     TEXT NOT NULL REFERENCES applicants(code_id),
    body        TEXT NOT NULL,
    author      TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

-- Unified notification feed; append-only apart from the is_read flag.
CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    target          TEXT NOT NULL,   -- code_id, barangay name, or the
                                     -- program-office sentinel
    audience        TEXT NOT NULL,   -- 'applicant' | 'barangay' | 'program_office'
    kind            TEXT NOT NULL,
    message         TEXT NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS applicants_email_idx  ON applicants(email);
CREATE INDEX IF NOT EXISTS applicants_status_idx ON applicants(status);
CREATE INDEX IF NOT EXISTS children_code_idx     ON children(code_id);
CREATE INDEX IF NOT EXISTS documents_code_idx    ON documents(code_id);
CREATE INDEX IF NOT EXISTS remarks_code_idx      ON remarks(code_id, recorded_at);
CREATE INDEX IF NOT EXISTS notifications_feed_idx
    ON notifications(audience, target, is_read);

PRAGMA user_version = 1;
";
