//! PlaySync Error Types
//!
//! Centralized error handling for the resolution, catalog and cache layers.

use thiserror::Error;

/// Central error type for PlaySync
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("no candidates to match against")]
    EmptyCandidates,

    #[error("catalog has no tracks to fall back on")]
    EmptyCatalog,

    #[error("playlist source error: {0}")]
    Source(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
}

/// Result type alias for PlaySync operations
pub type SyncResult<T> = Result<T, SyncError>;
