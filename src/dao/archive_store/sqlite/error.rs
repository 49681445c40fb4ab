//! Error types shared by the SQLite storage implementation.

use thiserror::Error;

/// Convenient result alias returning [`SqliteDaoError`] failures.
pub type SqliteResult<T> = Result<T, SqliteDaoError>;

/// Failures that can occur while interacting with the SQLite archive.
#[derive(Debug, Error)]
pub enum SqliteDaoError {
    /// The database file could not be opened.
    #[error("failed to open SQLite database `{path}`")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Creating the archive table failed.
    #[error("failed to create table `{table}`")]
    CreateTable {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    /// Inserting a record failed.
    #[error("failed to insert archive record `{id}`")]
    Insert {
        id: uuid::Uuid,
        #[source]
        source: rusqlite::Error,
    },
    /// Reading records back failed.
    #[error("failed to query table `{table}`")]
    Query {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    /// A stored value could not be decoded into the archive model.
    #[error("invalid `{column}` value in archive row: {value}")]
    InvalidValue { column: &'static str, value: String },
    /// Formatting a timestamp for storage failed.
    #[error("failed to format archive timestamp")]
    FormatTimestamp {
        #[source]
        source: time::error::Format,
    },
    /// The blocking worker running the statement was cancelled or panicked.
    #[error("SQLite worker task failed")]
    Worker {
        #[source]
        source: tokio::task::JoinError,
    },
}
