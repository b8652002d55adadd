//! Error type for `kalinga-store-sqlite`.

use kalinga_core::store::{ClassifyError, ErrorClass};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] kalinga_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Lock contention that survived the retry budget.
  #[error("store busy; try again")]
  Busy,
}

impl Error {
  /// Whether the underlying SQLite failure was lock contention — the only
  /// class of error the write path retries.
  pub(crate) fn is_busy(&self) -> bool {
    fn busy_code(e: &rusqlite::Error) -> bool {
      matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
          if matches!(
            f.code,
            rusqlite::ErrorCode::DatabaseBusy
              | rusqlite::ErrorCode::DatabaseLocked
          )
      )
    }
    match self {
      Self::Sqlite(e) => busy_code(e),
      Self::Database(tokio_rusqlite::Error::Rusqlite(e)) => busy_code(e),
      _ => false,
    }
  }
}

impl ClassifyError for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Self::Core(e) => e.class(),
      Self::Busy => ErrorClass::Busy,
      _ => ErrorClass::Storage,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
