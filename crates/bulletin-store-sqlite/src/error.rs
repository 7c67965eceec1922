//! Error type for `bulletin-store-sqlite`.

use bulletin_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Validation or lookup failure; see [`bulletin_core::Error`].
  #[error(transparent)]
  Core(#[from] bulletin_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("unknown enum value in column: {0}")]
  Decode(#[from] strum::ParseError),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl StoreError for Error {
  fn domain(&self) -> Option<&bulletin_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      Error::Database(_) | Error::Decode(_) | Error::DateParse(_) => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
