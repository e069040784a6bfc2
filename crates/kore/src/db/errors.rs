//! Error type for the database wrapper.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised by [`Database`](super::Database) and its registry.
#[derive(Debug, Error)]
pub enum DbError {
    /// No configuration section exists for the requested key.
    #[error("database config {key} is not found")]
    MissingConfig {
        /// Configuration key that was requested.
        key: String,
    },
    /// The configuration section does not describe a database.
    #[error("database config {key} is invalid: {source}")]
    InvalidConfig {
        /// Configuration key that was requested.
        key: String,
        /// Decoding error.
        #[source]
        source: kore_config::ConfigStoreError,
    },
    /// The database file could not be opened.
    #[error("failed to open database '{path}': {source}")]
    Open {
        /// Database file.
        path: Utf8PathBuf,
        /// Driver error.
        #[source]
        source: rusqlite::Error,
    },
    /// A statement could not be prepared.
    #[error("failed to prepare statement '{query}': {source}")]
    Statement {
        /// Statement text.
        query: String,
        /// Driver error.
        #[source]
        source: rusqlite::Error,
    },
    /// A parameter has no matching `:name` placeholder.
    #[error("statement has no placeholder :{name}")]
    UnknownParameter {
        /// Parameter name without the colon.
        name: String,
    },
    /// The driver rejected an operation.
    #[error(transparent)]
    Driver(#[from] rusqlite::Error),
    /// A transaction was rolled back because its unit of work failed.
    #[error("transaction rolled back: {reason}")]
    RolledBack {
        /// Rendered failure that caused the rollback.
        reason: String,
    },
}

impl DbError {
    pub(crate) fn statement(query: &str, source: rusqlite::Error) -> Self {
        Self::Statement {
            query: query.to_owned(),
            source,
        }
    }

    /// Returns true when the error reports a rolled back transaction.
    #[must_use]
    pub const fn is_rolled_back(&self) -> bool {
        matches!(self, Self::RolledBack { .. })
    }
}
