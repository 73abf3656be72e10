use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use watchbridge_config::CredentialStore;
use watchbridge_models::SyncStats;

use crate::sync::SyncEngine;

/// Single-flight wrapper around the sync engine.
///
/// Triggers come from anywhere (CLI command, daemon schedule, startup); at
/// most one pass runs at a time and a trigger arriving mid-pass is dropped,
/// not queued. The next scheduled trigger picks up whatever that one missed.
pub struct SyncOrchestrator {
    engine: Arc<SyncEngine>,
    running: AtomicBool,
    credentials_path: PathBuf,
}

/// Outcome of a trigger attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerOutcome {
    Completed(SyncStats),
    AlreadyRunning,
}

impl SyncOrchestrator {
    pub fn new(engine: Arc<SyncEngine>, credentials_path: PathBuf) -> Self {
        Self {
            engine,
            running: AtomicBool::new(false),
            credentials_path,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn trigger(&self) -> TriggerOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Sync already in progress, dropping trigger");
            return TriggerOutcome::AlreadyRunning;
        }

        let started = std::time::Instant::now();
        info!("Sync pass starting");
        let stats = self.engine.run_pass().await;
        info!(elapsed = ?started.elapsed(), "Sync pass complete");

        self.persist_last_sync_time();
        self.running.store(false, Ordering::SeqCst);
        TriggerOutcome::Completed(stats)
    }

    /// Bounded wait for an in-flight pass to finish, used on shutdown before
    /// shared connections are released. Returns false when the pass is still
    /// running after the timeout.
    pub async fn wait_until_idle(&self, timeout: std::time::Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while self.is_running() {
            if std::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        true
    }

    fn persist_last_sync_time(&self) {
        let mut store = CredentialStore::new(self.credentials_path.clone());
        if let Err(e) = store.load() {
            warn!(error = %e, "Could not load session store to record sync time");
            return;
        }
        store.set_last_sync_time(Utc::now());
        if let Err(e) = store.save() {
            warn!(error = %e, "Could not persist last sync time");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use watchbridge_config::SyncOptions;
    use watchbridge_models::{
        HistoryMovie, HistoryShow, LibraryEpisode, LibraryMovie, LibraryShow, MediaIds, MediaType,
        RemoteStatus, ScrobbleMedia,
    };
    use watchbridge_remote::{
        HistoryAdded, LibraryError, MediaLibrary, RemoteError, RemoteService, RemoteUser,
        ScrobbleAck, ScrobbleAction,
    };

    use crate::state_store::StateStore;

    /// Remote whose history fetch blocks until released, to hold a pass open.
    struct BlockingRemote {
        release: tokio::sync::Notify,
        entered: tokio::sync::Notify,
        calls: Mutex<usize>,
    }

    impl BlockingRemote {
        fn new() -> Self {
            Self {
                release: tokio::sync::Notify::new(),
                entered: tokio::sync::Notify::new(),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl RemoteService for BlockingRemote {
        async fn search(
            &self,
            _media_type: MediaType,
            _query: &str,
            _year: Option<u32>,
        ) -> Result<Vec<MediaIds>, RemoteError> {
            Ok(vec![])
        }

        async fn scrobble(
            &self,
            _action: ScrobbleAction,
            _media: &ScrobbleMedia,
            _progress: f64,
        ) -> Result<ScrobbleAck, RemoteError> {
            Ok(ScrobbleAck::default())
        }

        async fn add_to_history(
            &self,
            _movies: &[HistoryMovie],
            _shows: &[HistoryShow],
        ) -> Result<HistoryAdded, RemoteError> {
            Ok(HistoryAdded::default())
        }

        async fn movie_history(
            &self,
            _status: RemoteStatus,
        ) -> Result<Vec<HistoryMovie>, RemoteError> {
            *self.calls.lock().unwrap() += 1;
            self.entered.notify_one();
            self.release.notified().await;
            Ok(vec![])
        }

        async fn show_history(
            &self,
            _status: RemoteStatus,
        ) -> Result<Vec<HistoryShow>, RemoteError> {
            Ok(vec![])
        }

        async fn ratings(
            &self,
            _media_type: MediaType,
        ) -> Result<Vec<(MediaIds, u8)>, RemoteError> {
            Ok(vec![])
        }

        async fn add_rating(&self, _media: &ScrobbleMedia, _rating: u8) -> Result<(), RemoteError> {
            Ok(())
        }

        async fn remove_rating(&self, _media: &ScrobbleMedia) -> Result<(), RemoteError> {
            Ok(())
        }

        async fn user_settings(&self) -> Result<RemoteUser, RemoteError> {
            Ok(RemoteUser::default())
        }

        async fn refresh_token(&self) -> bool {
            false
        }
    }

    struct EmptyLibrary;

    #[async_trait]
    impl MediaLibrary for EmptyLibrary {
        async fn movies(&self) -> Result<Vec<LibraryMovie>, LibraryError> {
            Ok(vec![])
        }

        async fn episodes(&self) -> Result<Vec<LibraryEpisode>, LibraryError> {
            Ok(vec![])
        }

        async fn shows(&self) -> Result<Vec<LibraryShow>, LibraryError> {
            Ok(vec![])
        }

        async fn set_movie_play_count(&self, _: u32, _: u32) -> Result<(), LibraryError> {
            Ok(())
        }

        async fn set_episode_play_count(&self, _: u32, _: u32) -> Result<(), LibraryError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn concurrent_trigger_is_dropped() {
        let remote = Arc::new(BlockingRemote::new());
        let dir = tempfile::tempdir().unwrap();
        let options = SyncOptions {
            export_movies: false,
            export_episodes: false,
            import_episodes: false,
            ..SyncOptions::default()
        };
        let engine = Arc::new(SyncEngine::new(
            remote.clone(),
            Arc::new(EmptyLibrary),
            StateStore::new(dir.path()),
            options,
        ));
        let orchestrator = Arc::new(SyncOrchestrator::new(
            engine,
            dir.path().join("credentials.toml"),
        ));

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.trigger().await })
        };

        // Wait for the pass to actually be inside the engine.
        remote.entered.notified().await;
        assert!(orchestrator.is_running());
        assert_eq!(orchestrator.trigger().await, TriggerOutcome::AlreadyRunning);

        remote.release.notify_one();
        let outcome = first.await.unwrap();
        assert!(matches!(outcome, TriggerOutcome::Completed(_)));
        assert!(!orchestrator.is_running());

        // The dropped trigger never reached the remote.
        assert_eq!(*remote.calls.lock().unwrap(), 1);
    }
}
