use thiserror::Error;

use crate::version::SchemaVersion;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not detect schema version: {reason}")]
    VersionDetection { reason: String },

    #[error("migration to version {version} ({name}) failed: {source}")]
    StepExecution {
        version: SchemaVersion,
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to create new database: {0}")]
    Bootstrap(#[source] rusqlite::Error),

    #[error("database schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        found: SchemaVersion,
        supported: SchemaVersion,
    },
}

impl Error {
    /// Returns `true` when the error left earlier migration steps committed
    /// without a matching version marker.
    pub fn is_partial_upgrade(&self) -> bool {
        matches!(self, Self::StepExecution { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
