//! Record store adapter.
//!
//! A [`StoreBackend`] holds one serialized collection per [`Domain`]. The
//! [`RecordStore`] decodes collections into typed records, tolerates missing or
//! corrupt data, and announces every successful write on the
//! [`ChangeBus`](crate::bus::ChangeBus).

pub mod backend;
pub mod repository;
pub mod watcher;

use std::io;

use thiserror::Error;

use crate::records::Domain;

pub use backend::{FileBackend, Fingerprint, MemoryBackend, Observed, StoreBackend};
pub use repository::RecordStore;
pub use watcher::StoreWatcher;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached at all.
    #[error("store unavailable for {domain}: {reason}")]
    Unavailable { domain: Domain, reason: String },

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error while writing.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn unavailable(domain: Domain, reason: impl Into<String>) -> Self {
        StoreError::Unavailable {
            domain,
            reason: reason.into(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Stored data that could not be decoded. Logged, never returned.
#[derive(Error, Debug)]
#[error("could not parse {domain} data: {reason}")]
pub struct ParseFailure {
    pub domain: Domain,
    pub reason: String,
}
