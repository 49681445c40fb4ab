use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{DATE_FIELD, from_document, to_document},
};
use crate::dao::{
    archive_store::ArchiveStore,
    models::{ARCHIVE_TABLE, ArchiveRecordEntity},
    storage::StorageResult,
};

#[derive(Clone)]
pub struct MongoArchiveStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    // Kept alive alongside the database handle it produced.
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoArchiveStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { DATE_FIELD: 1 })
            .options(
                IndexOptions::builder()
                    .name(Some("archive_date_idx".to_owned()))
                    .build(),
            )
            .build();

        self.collection()
            .await
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ARCHIVE_TABLE,
                index: DATE_FIELD,
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<Document> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<Document>(ARCHIVE_TABLE)
    }

    async fn append_record(&self, record: ArchiveRecordEntity) -> MongoResult<()> {
        let id = record.id;
        let document = to_document(&record);
        self.collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::AppendRecord { id, source })?;
        Ok(())
    }

    async fn list_records(&self) -> MongoResult<Vec<ArchiveRecordEntity>> {
        let documents: Vec<Document> = self
            .collection()
            .await
            .find(doc! {})
            .sort(doc! { DATE_FIELD: 1 })
            .await
            .map_err(|source| MongoDaoError::ListRecords { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListRecords { source })?;

        documents.iter().map(from_document).collect()
    }
}

impl ArchiveStore for MongoArchiveStore {
    fn append_record(&self, record: ArchiveRecordEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append_record(record).await.map_err(Into::into) })
    }

    fn list_records(&self) -> BoxFuture<'static, StorageResult<Vec<ArchiveRecordEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_records().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
