mod error;
mod store;

pub use error::SqliteDaoError;
pub use store::SqliteArchiveStore;

use rusqlite::ErrorCode;

use crate::dao::storage::StorageError;

impl From<SqliteDaoError> for StorageError {
    fn from(err: SqliteDaoError) -> Self {
        if let SqliteDaoError::Insert { source, .. } = &err
            && source.sqlite_error_code() == Some(ErrorCode::ConstraintViolation)
        {
            return StorageError::rejected(err.to_string());
        }
        StorageError::unavailable(err.to_string(), err)
    }
}
