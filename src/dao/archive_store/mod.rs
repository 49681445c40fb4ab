#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;
#[cfg(feature = "sqlite-store")]
pub mod sqlite;

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{info, warn};

use crate::{
    config::StorageBackend,
    dao::{models::ArchiveRecordEntity, storage::StorageResult},
};

#[cfg(feature = "sqlite-store")]
const SQLITE_PATH_ENV: &str = "SQLITE_PATH";
#[cfg(feature = "sqlite-store")]
const DEFAULT_SQLITE_PATH: &str = "beach_volley_live_2026.db";

/// Append-only persistence for saved matches. No update or delete path exists.
pub trait ArchiveStore: Send + Sync {
    /// Append a new row; every call stores a distinct record.
    fn append_record(&self, record: ArchiveRecordEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Every archived record, oldest first.
    fn list_records(&self) -> BoxFuture<'static, StorageResult<Vec<ArchiveRecordEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Open a store for `backend`. Backends compiled out of this build fall back to memory.
pub fn connect(backend: StorageBackend) -> BoxFuture<'static, StorageResult<Arc<dyn ArchiveStore>>> {
    Box::pin(async move {
        match backend {
            #[cfg(feature = "sqlite-store")]
            StorageBackend::Sqlite => {
                let path = std::env::var(SQLITE_PATH_ENV)
                    .unwrap_or_else(|_| DEFAULT_SQLITE_PATH.into());
                let store = sqlite::SqliteArchiveStore::open(path.clone()).await?;
                info!(%path, "using sqlite archive store");
                Ok(Arc::new(store) as Arc<dyn ArchiveStore>)
            }
            #[cfg(feature = "mongo-store")]
            StorageBackend::Mongo => {
                let config = mongodb::MongoConfig::from_env().await?;
                let store = mongodb::MongoArchiveStore::connect(config).await?;
                info!("using mongodb archive store");
                Ok(Arc::new(store) as Arc<dyn ArchiveStore>)
            }
            #[cfg(feature = "couch-store")]
            StorageBackend::Couch => {
                let config = couchdb::CouchConfig::from_env()?;
                let store = couchdb::CouchArchiveStore::connect(config).await?;
                info!("using couchdb archive store");
                Ok(Arc::new(store) as Arc<dyn ArchiveStore>)
            }
            StorageBackend::Memory => {
                warn!("using in-memory archive store; saved matches are lost on shutdown");
                Ok(Arc::new(memory::MemoryArchiveStore::new()) as Arc<dyn ArchiveStore>)
            }
            #[allow(unreachable_patterns)]
            other => {
                warn!(backend = ?other, "backend not compiled in; using in-memory archive store");
                Ok(Arc::new(memory::MemoryArchiveStore::new()) as Arc<dyn ArchiveStore>)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_starts_empty() {
        let store = connect(StorageBackend::Memory).await.unwrap();
        store.health_check().await.unwrap();
        assert!(store.list_records().await.unwrap().is_empty());
    }
}
