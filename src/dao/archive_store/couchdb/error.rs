use reqwest::StatusCode;
use thiserror::Error;

pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures of the CouchDB archive backend.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    #[error("`{var}` must point at the CouchDB server")]
    MissingBaseUrl { var: &'static str },
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The archive database could not be read or created.
    #[error("failed to {action} CouchDB database `{database}`")]
    Database {
        action: &'static str,
        database: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB answered {status} for database `{database}`")]
    DatabaseStatus {
        database: String,
        status: StatusCode,
    },
    #[error("CouchDB request to `{path}` failed")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB answered {status} for `{path}`")]
    Status { path: String, status: StatusCode },
    /// An archive document with the same id is already stored.
    #[error("archive document `{path}` already exists")]
    Conflict { path: String },
    #[error("failed to decode CouchDB response for `{path}`")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A stored document does not describe a complete archive row.
    #[error("archive document `{doc_id}` is invalid: {reason}")]
    InvalidDocument { doc_id: String, reason: String },
}
