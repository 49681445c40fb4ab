//! Process-local archive used when no database is configured. Records are lost on shutdown.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{
    archive_store::ArchiveStore, models::ArchiveRecordEntity, storage::StorageResult,
};

#[derive(Clone, Default)]
pub struct MemoryArchiveStore {
    records: Arc<RwLock<Vec<ArchiveRecordEntity>>>,
}

impl MemoryArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records appended so far.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

impl ArchiveStore for MemoryArchiveStore {
    fn append_record(&self, record: ArchiveRecordEntity) -> BoxFuture<'static, StorageResult<()>> {
        let records = self.records.clone();
        Box::pin(async move {
            records.write().await.push(record);
            Ok(())
        })
    }

    fn list_records(&self) -> BoxFuture<'static, StorageResult<Vec<ArchiveRecordEntity>>> {
        let records = self.records.clone();
        Box::pin(async move { Ok(records.read().await.clone()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
