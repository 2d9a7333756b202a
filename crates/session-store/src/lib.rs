//! Session Store
//!
//! Keeps final totals of completed sessions for the report screen.

mod repository;

pub use repository::{SessionRecord, SessionRepository, SessionStore};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Store lock poisoned: {0}")]
    Lock(String),
    #[error("Session {0} not found")]
    NotFound(u64),
    #[error("Serialization error: {0}")]
    Serialization(#[from] postcard::Error),
    #[error("Store file error: {0}")]
    Io(#[from] std::io::Error),
}
