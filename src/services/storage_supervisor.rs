use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{archive_store::ArchiveStore, storage::StorageError},
    services::sse_events,
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Flip the degraded flag and tell SSE observers when it actually changed.
fn set_degraded(state: &SharedState, degraded: bool) {
    if state.update_degraded(degraded) {
        sse_events::broadcast_system_status(state, degraded);
    }
}

/// Connect to the archive backend and keep the shared state in degraded mode while it is
/// unavailable. Live scoring never waits on this loop.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn ArchiveStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                if state.set_archive_store(store.clone()).await {
                    sse_events::broadcast_system_status(&state, false);
                }
                info!("archive store connected; leaving degraded mode");
                delay = INITIAL_DELAY;

                loop {
                    match store.health_check().await {
                        Ok(()) => {
                            if state.is_degraded() {
                                info!("archive store healthy again; leaving degraded mode");
                                set_degraded(&state, false);
                            }
                            sleep(HEALTH_POLL_INTERVAL).await;
                        }
                        Err(_) => {
                            let mut attempt = 0;
                            let mut reconnect_delay = INITIAL_DELAY;
                            let mut reconnected = false;

                            while attempt < MAX_RECONNECT_ATTEMPTS {
                                match store.try_reconnect().await {
                                    Ok(()) => {
                                        info!(
                                            "archive store reconnected after health check failure"
                                        );
                                        reconnected = true;
                                        break;
                                    }
                                    Err(reconnect_err) => {
                                        if attempt == 0 {
                                            warn!(
                                                attempt, error = %reconnect_err,
                                                "archive store reconnect first attempt failed; entering degraded mode"
                                            );
                                            set_degraded(&state, true);
                                        } else {
                                            warn!(attempt, error = %reconnect_err, "archive store reconnect attempt failed");
                                        };
                                        attempt += 1;
                                        sleep(reconnect_delay).await;
                                        reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
                                    }
                                }
                            }

                            if reconnected {
                                set_degraded(&state, false);
                                sleep(HEALTH_POLL_INTERVAL).await;
                                continue;
                            } else {
                                warn!(
                                    "exhausted archive store reconnect attempts; reconnecting from scratch"
                                );
                                if state.clear_archive_store().await {
                                    sse_events::broadcast_system_status(&state, true);
                                }
                                break;
                            }
                        }
                    }
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "archive store connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use futures::future::BoxFuture;
    use tokio::sync::broadcast;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            archive_store::memory::MemoryArchiveStore, models::ArchiveRecordEntity,
            storage::StorageResult,
        },
        dto::sse::ServerEvent,
        state::AppState,
    };

    /// Store whose health checks and reconnects fail a configured number of times.
    struct FlakyStore {
        failing_health_checks: AtomicU32,
        failing_reconnects: AtomicU32,
        reconnect_calls: AtomicU32,
    }

    impl FlakyStore {
        fn new(failing_health_checks: u32, failing_reconnects: u32) -> Arc<Self> {
            Arc::new(Self {
                failing_health_checks: AtomicU32::new(failing_health_checks),
                failing_reconnects: AtomicU32::new(failing_reconnects),
                reconnect_calls: AtomicU32::new(0),
            })
        }
    }

    fn take_failure(remaining: &AtomicU32) -> bool {
        remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    impl ArchiveStore for FlakyStore {
        fn append_record(&self, _record: ArchiveRecordEntity) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn list_records(&self) -> BoxFuture<'static, StorageResult<Vec<ArchiveRecordEntity>>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            let failed = take_failure(&self.failing_health_checks);
            Box::pin(async move {
                if failed {
                    Err(StorageError::rejected("ping refused"))
                } else {
                    Ok(())
                }
            })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.reconnect_calls.fetch_add(1, Ordering::SeqCst);
            let failed = take_failure(&self.failing_reconnects);
            Box::pin(async move {
                if failed {
                    Err(StorageError::rejected("connection refused"))
                } else {
                    Ok(())
                }
            })
        }
    }

    async fn next_status(events: &mut broadcast::Receiver<ServerEvent>) -> String {
        let event = events.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(sse_events::EVENT_SYSTEM_STATUS));
        event.data
    }

    #[tokio::test]
    async fn installs_store_and_leaves_degraded_mode() {
        let state = AppState::new(&AppConfig::default());
        let mut watcher = state.degraded_watcher();
        let mut events = state.sse().subscribe();
        assert!(state.is_degraded());

        let supervisor = tokio::spawn(run(state.clone(), || async {
            Ok::<_, StorageError>(Arc::new(MemoryArchiveStore::new()) as Arc<dyn ArchiveStore>)
        }));

        watcher.changed().await.unwrap();
        assert!(!*watcher.borrow());
        assert!(state.archive_store().await.is_some());

        let event = events.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(sse_events::EVENT_SYSTEM_STATUS));
        assert_eq!(event.data, r#"{"degraded":false}"#);

        supervisor.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_health_check_degrades_until_reconnect_succeeds() {
        let state = AppState::new(&AppConfig::default());
        let mut watcher = state.degraded_watcher();
        let mut events = state.sse().subscribe();
        let store = FlakyStore::new(1, 1);

        let supervisor = tokio::spawn(run(state.clone(), {
            let store = store.clone();
            move || {
                let store = store.clone();
                async move { Ok::<_, StorageError>(store as Arc<dyn ArchiveStore>) }
            }
        }));

        assert_eq!(next_status(&mut events).await, r#"{"degraded":false}"#);
        assert_eq!(next_status(&mut events).await, r#"{"degraded":true}"#);
        watcher.wait_for(|degraded| *degraded).await.unwrap();

        assert_eq!(next_status(&mut events).await, r#"{"degraded":false}"#);
        watcher.wait_for(|degraded| !*degraded).await.unwrap();
        assert_eq!(store.reconnect_calls.load(Ordering::SeqCst), 2);
        assert!(state.archive_store().await.is_some());

        supervisor.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_reconnects_drop_the_store() {
        let state = AppState::new(&AppConfig::default());
        let mut events = state.sse().subscribe();
        let store = FlakyStore::new(u32::MAX, u32::MAX);
        let connects = Arc::new(AtomicU32::new(0));

        let supervisor = tokio::spawn(run(state.clone(), {
            let store = store.clone();
            let connects = connects.clone();
            move || {
                let attempt = connects.fetch_add(1, Ordering::SeqCst);
                let store = store.clone();
                async move {
                    if attempt == 0 {
                        Ok::<_, StorageError>(store as Arc<dyn ArchiveStore>)
                    } else {
                        Err(StorageError::rejected("server gone"))
                    }
                }
            }
        }));

        assert_eq!(next_status(&mut events).await, r#"{"degraded":false}"#);
        assert_eq!(next_status(&mut events).await, r#"{"degraded":true}"#);

        while connects.load(Ordering::SeqCst) < 2 {
            sleep(Duration::from_millis(100)).await;
        }

        assert_eq!(
            store.reconnect_calls.load(Ordering::SeqCst),
            MAX_RECONNECT_ATTEMPTS
        );
        assert!(state.archive_store().await.is_none());
        assert!(state.is_degraded());

        supervisor.abort();
    }
}
