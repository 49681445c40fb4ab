pub mod scoreboard;
mod sse;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::archive_store::ArchiveStore, error::ServiceError};

pub use self::scoreboard::MatchState;
pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Capacity of the match SSE broadcast channel.
const SSE_CAPACITY: usize = 32;

/// Central application state: the live match, the archive store handle and the SSE hub.
pub struct AppState {
    archive_store: RwLock<Option<Arc<dyn ArchiveStore>>>,
    sse: SseHub,
    scoreboard: RwLock<MatchState>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until an archive store is installed.
    pub fn new(config: &AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            archive_store: RwLock::new(None),
            sse: SseHub::new(SSE_CAPACITY),
            scoreboard: RwLock::new(config.fresh_match()),
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current archive store, if one is installed.
    pub async fn archive_store(&self) -> Option<Arc<dyn ArchiveStore>> {
        let guard = self.archive_store.read().await;
        guard.as_ref().cloned()
    }

    /// Return the archive store or fail with [`ServiceError::Degraded`].
    pub async fn require_archive_store(&self) -> Result<Arc<dyn ArchiveStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.archive_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new archive store implementation and leave degraded mode.
    pub async fn set_archive_store(&self, store: Arc<dyn ArchiveStore>) -> bool {
        {
            let mut guard = self.archive_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false)
    }

    /// Remove the current archive store and enter degraded mode.
    pub async fn clear_archive_store(&self) -> bool {
        {
            let mut guard = self.archive_store.write().await;
            guard.take();
        }
        self.update_degraded(true)
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, returning `true` when the value actually changed.
    pub fn update_degraded(&self, value: bool) -> bool {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        })
    }

    /// Broadcast hub used for the match SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Run `f` against the live match under the read lock.
    pub async fn read_match<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&MatchState) -> R,
    {
        let guard = self.scoreboard.read().await;
        f(&guard)
    }

    /// Run `f` against the live match under the write lock. The whole mutation completes
    /// before any other request observes the match.
    pub async fn write_match<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut MatchState) -> R,
    {
        let mut guard = self.scoreboard.write().await;
        f(&mut guard)
    }
}
