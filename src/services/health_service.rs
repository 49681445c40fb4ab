use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether matches can currently be archived. A failed probe answers `degraded`
/// right away, before the supervisor flips the shared flag.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let reachable = match state.archive_store().await {
        Some(store) => match store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "archive store health check failed");
                false
            }
        },
        None => {
            warn!("archive store unavailable (degraded mode)");
            false
        }
    };

    if reachable && !state.is_degraded() {
        HealthResponse::ok()
    } else {
        HealthResponse::degraded()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            archive_store::{ArchiveStore, memory::MemoryArchiveStore},
            models::ArchiveRecordEntity,
            storage::{StorageError, StorageResult},
        },
        state::AppState,
    };

    struct UnreachableStore;

    impl ArchiveStore for UnreachableStore {
        fn append_record(&self, _record: ArchiveRecordEntity) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Err(StorageError::rejected("unreachable")) })
        }

        fn list_records(&self) -> BoxFuture<'static, StorageResult<Vec<ArchiveRecordEntity>>> {
            Box::pin(async { Err(StorageError::rejected("unreachable")) })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Err(StorageError::rejected("unreachable")) })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Err(StorageError::rejected("unreachable")) })
        }
    }

    #[tokio::test]
    async fn healthy_store_reports_ok() {
        let state = AppState::new(&AppConfig::default());
        assert_eq!(health_status(&state).await.status, "degraded");

        state.set_archive_store(Arc::new(MemoryArchiveStore::new())).await;
        assert_eq!(health_status(&state).await.status, "ok");
    }

    #[tokio::test]
    async fn failing_probe_reports_degraded_before_the_flag_flips() {
        let state = AppState::new(&AppConfig::default());
        state.set_archive_store(Arc::new(UnreachableStore)).await;
        assert!(!state.is_degraded());

        assert_eq!(health_status(&state).await.status, "degraded");
    }
}
