use crate::codec::CodecError;
use crate::task_validation::TaskValidationError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backing store is missing, unreadable or unwritable.
    #[error("cannot access backing store: {0}")]
    Access(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The store was reachable but its contents could not be decoded (or the value encoded).
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl PersistenceError {
    pub fn is_access(&self) -> bool {
        matches!(self, PersistenceError::Access(_))
    }

    pub fn is_codec(&self) -> bool {
        matches!(self, PersistenceError::Codec(_))
    }
}

impl From<TaskValidationError> for PersistenceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Codec(CodecError::Validation(value))
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(CodecError::Json(value))
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// A named resource holding one UTF-8 document, read and overwritten whole.
pub trait TextStore: Send + Sync {
    /// Human readable location, used in log lines and errors.
    fn describe(&self) -> String;
    fn is_readable(&self) -> bool;
    fn is_writable(&self) -> bool;
    fn read_text(&self) -> PersistenceResult<String>;
    fn write_text(&self, text: &str) -> PersistenceResult<()>;
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    FileStore, load_task_set_from_csv, load_task_set_from_json, save_task_set_to_csv,
    save_task_set_to_json,
};
