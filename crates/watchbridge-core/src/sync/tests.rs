use super::*;
use async_trait::async_trait;
use std::sync::Mutex;
use watchbridge_models::{HistorySeason, LibraryMovie, MediaIds, MediaType, ScrobbleMedia};
use watchbridge_remote::{
    HistoryAdded, LibraryError, RemoteError, RemoteUser, ScrobbleAck, ScrobbleAction,
};

#[derive(Default)]
struct MockRemote {
    history_calls: Mutex<Vec<(Vec<HistoryMovie>, Vec<HistoryShow>)>>,
    remote_movies: Mutex<Vec<HistoryMovie>>,
    remote_shows_completed: Mutex<Vec<HistoryShow>>,
    remote_shows_watching: Mutex<Vec<HistoryShow>>,
    fail_movie_history: bool,
}

impl MockRemote {
    fn history_calls(&self) -> Vec<(Vec<HistoryMovie>, Vec<HistoryShow>)> {
        self.history_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteService for MockRemote {
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
        movies: &[HistoryMovie],
        shows: &[HistoryShow],
    ) -> Result<HistoryAdded, RemoteError> {
        self.history_calls
            .lock()
            .unwrap()
            .push((movies.to_vec(), shows.to_vec()));
        Ok(HistoryAdded {
            movies: movies.len(),
            episodes: shows.iter().map(|s| s.episode_count()).sum(),
        })
    }

    async fn movie_history(&self, _status: RemoteStatus) -> Result<Vec<HistoryMovie>, RemoteError> {
        if self.fail_movie_history {
            return Err(RemoteError::Server(503));
        }
        Ok(self.remote_movies.lock().unwrap().clone())
    }

    async fn show_history(&self, status: RemoteStatus) -> Result<Vec<HistoryShow>, RemoteError> {
        Ok(match status {
            RemoteStatus::Completed => self.remote_shows_completed.lock().unwrap().clone(),
            RemoteStatus::Watching => self.remote_shows_watching.lock().unwrap().clone(),
        })
    }

    async fn ratings(&self, _media_type: MediaType) -> Result<Vec<(MediaIds, u8)>, RemoteError> {
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

#[derive(Default)]
struct MockLibrary {
    movies: Mutex<Vec<LibraryMovie>>,
    episodes: Mutex<Vec<LibraryEpisode>>,
    shows: Mutex<Vec<LibraryShow>>,
    movie_writes: Mutex<Vec<(u32, u32)>>,
    episode_writes: Mutex<Vec<(u32, u32)>>,
}

impl MockLibrary {
    fn movie_writes(&self) -> Vec<(u32, u32)> {
        self.movie_writes.lock().unwrap().clone()
    }

    fn episode_writes(&self) -> Vec<(u32, u32)> {
        self.episode_writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaLibrary for MockLibrary {
    async fn movies(&self) -> Result<Vec<LibraryMovie>, LibraryError> {
        Ok(self.movies.lock().unwrap().clone())
    }

    async fn episodes(&self) -> Result<Vec<LibraryEpisode>, LibraryError> {
        Ok(self.episodes.lock().unwrap().clone())
    }

    async fn shows(&self) -> Result<Vec<LibraryShow>, LibraryError> {
        Ok(self.shows.lock().unwrap().clone())
    }

    async fn set_movie_play_count(
        &self,
        movie_id: u32,
        play_count: u32,
    ) -> Result<(), LibraryError> {
        self.movie_writes.lock().unwrap().push((movie_id, play_count));
        for movie in self.movies.lock().unwrap().iter_mut() {
            if movie.movie_id == movie_id {
                movie.play_count = play_count;
            }
        }
        Ok(())
    }

    async fn set_episode_play_count(
        &self,
        episode_id: u32,
        play_count: u32,
    ) -> Result<(), LibraryError> {
        self.episode_writes
            .lock()
            .unwrap()
            .push((episode_id, play_count));
        for episode in self.episodes.lock().unwrap().iter_mut() {
            if episode.episode_id == episode_id {
                episode.play_count = play_count;
            }
        }
        Ok(())
    }
}

fn imdb(id: &str) -> MediaIds {
    let mut ids = MediaIds::new();
    ids.imdb = Some(id.to_string());
    ids
}

fn movie(id: u32, imdb_id: Option<&str>, play_count: u32) -> LibraryMovie {
    LibraryMovie {
        movie_id: id,
        title: format!("Movie {}", id),
        year: Some(2000),
        ids: imdb_id.map(imdb).unwrap_or_default(),
        play_count,
        last_played: None,
    }
}

fn show(id: u32, imdb_id: &str) -> LibraryShow {
    LibraryShow {
        show_id: id,
        title: format!("Show {}", id),
        year: Some(2010),
        ids: imdb(imdb_id),
    }
}

fn episode(id: u32, show_id: u32, season: u32, number: u32, play_count: u32) -> LibraryEpisode {
    LibraryEpisode {
        episode_id: id,
        show_id,
        show_title: format!("Show {}", show_id),
        season,
        episode: number,
        ids: MediaIds::new(),
        play_count,
        last_played: None,
    }
}

fn remote_movie(imdb_id: &str) -> HistoryMovie {
    HistoryMovie {
        title: "Remote Movie".to_string(),
        year: Some(2000),
        ids: imdb(imdb_id),
        watched_at: Some(Utc::now()),
    }
}

fn remote_show(imdb_id: &str, season: u32, numbers: &[u32]) -> HistoryShow {
    HistoryShow {
        title: "Remote Show".to_string(),
        year: Some(2010),
        ids: imdb(imdb_id),
        seasons: vec![HistorySeason {
            number: season,
            episodes: numbers
                .iter()
                .map(|n| HistoryEpisode {
                    number: *n,
                    watched_at: Some(Utc::now()),
                })
                .collect(),
        }],
    }
}

struct Fixture {
    remote: Arc<MockRemote>,
    library: Arc<MockLibrary>,
    _dir: tempfile::TempDir,
    engine: SyncEngine,
}

fn fixture(options: SyncOptions) -> Fixture {
    let remote = Arc::new(MockRemote::default());
    let library = Arc::new(MockLibrary::default());
    let dir = tempfile::tempdir().unwrap();
    let engine = SyncEngine::new(
        remote.clone(),
        library.clone(),
        StateStore::new(dir.path()),
        options,
    );
    Fixture {
        remote,
        library,
        _dir: dir,
        engine,
    }
}

fn export_only() -> SyncOptions {
    SyncOptions {
        import_movies: false,
        import_episodes: false,
        ..SyncOptions::default()
    }
}

#[tokio::test]
async fn second_pass_without_changes_submits_nothing() {
    let f = fixture(export_only());
    f.library.movies.lock().unwrap().extend([
        movie(1, Some("tt0000001"), 1),
        movie(2, Some("tt0000002"), 1),
        movie(3, Some("tt0000003"), 0),
    ]);

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.movies_exported, 2);
    assert_eq!(f.remote.history_calls().len(), 1);

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.movies_exported, 0);
    assert_eq!(f.remote.history_calls().len(), 1);
}

#[tokio::test]
async fn play_count_change_is_exported_again() {
    let f = fixture(export_only());
    f.library
        .movies
        .lock()
        .unwrap()
        .push(movie(1, Some("tt0000001"), 1));

    f.engine.run_pass().await;
    f.library.movies.lock().unwrap()[0].play_count = 2;
    let stats = f.engine.run_pass().await;

    assert_eq!(stats.movies_exported, 1);
}

#[tokio::test]
async fn watched_movie_without_ids_counts_as_error() {
    let f = fixture(export_only());
    f.library.movies.lock().unwrap().extend([
        movie(1, None, 1),
        movie(2, Some("tt0000002"), 1),
    ]);

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.movies_exported, 1);
    assert_eq!(stats.errors, 1);
}

#[tokio::test]
async fn export_respects_batch_size() {
    let f = fixture(SyncOptions {
        batch_size: 2,
        ..export_only()
    });
    f.library.movies.lock().unwrap().extend([
        movie(1, Some("tt0000001"), 1),
        movie(2, Some("tt0000002"), 1),
        movie(3, Some("tt0000003"), 1),
        movie(4, Some("tt0000004"), 1),
        movie(5, Some("tt0000005"), 1),
    ]);

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.movies_exported, 5);

    let sizes: Vec<usize> = f.remote.history_calls().iter().map(|(m, _)| m.len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
}

#[tokio::test]
async fn episode_export_groups_by_show_and_season() {
    let f = fixture(export_only());
    f.library.shows.lock().unwrap().push(show(7, "tt0903747"));
    f.library.episodes.lock().unwrap().extend([
        episode(100, 7, 1, 1, 1),
        episode(101, 7, 1, 2, 1),
        episode(102, 7, 2, 1, 1),
    ]);

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.episodes_exported, 3);

    let calls = f.remote.history_calls();
    let shows = &calls
        .iter()
        .find(|(_, shows)| !shows.is_empty())
        .unwrap()
        .1;
    assert_eq!(shows.len(), 1);
    assert_eq!(shows[0].seasons.len(), 2);
    assert_eq!(shows[0].episode_count(), 3);
}

#[tokio::test]
async fn episode_with_unresolvable_show_counts_as_error() {
    let f = fixture(export_only());
    // Show 9 is absent from the show snapshot entirely.
    f.library.episodes.lock().unwrap().push(episode(100, 9, 1, 1, 1));

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.episodes_exported, 0);
    assert_eq!(stats.errors, 1);
}

fn import_only() -> SyncOptions {
    SyncOptions {
        export_movies: false,
        export_episodes: false,
        ..SyncOptions::default()
    }
}

#[tokio::test]
async fn import_marks_matched_unwatched_movie() {
    let f = fixture(import_only());
    f.library
        .movies
        .lock()
        .unwrap()
        .push(movie(1, Some("tt0000001"), 0));
    f.remote
        .remote_movies
        .lock()
        .unwrap()
        .push(remote_movie("tt0000001"));

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.movies_imported, 1);
    assert_eq!(f.library.movie_writes(), vec![(1, 1)]);
}

#[tokio::test]
async fn already_watched_movie_is_not_rewritten() {
    let f = fixture(import_only());
    f.library
        .movies
        .lock()
        .unwrap()
        .push(movie(1, Some("tt0000001"), 1));
    f.remote
        .remote_movies
        .lock()
        .unwrap()
        .push(remote_movie("tt0000001"));

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.movies_imported, 0);
    assert!(f.library.movie_writes().is_empty());
}

#[tokio::test]
async fn unmatched_remote_movie_never_creates_local_entries() {
    let f = fixture(import_only());
    f.remote
        .remote_movies
        .lock()
        .unwrap()
        .push(remote_movie("tt9999999"));

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.movies_imported, 0);
    assert_eq!(stats.errors, 0);
    assert!(f.library.movie_writes().is_empty());
}

#[tokio::test]
async fn import_walks_completed_and_watching_shows() {
    let f = fixture(import_only());
    f.library.shows.lock().unwrap().push(show(7, "tt0903747"));
    f.library.episodes.lock().unwrap().extend([
        episode(100, 7, 1, 1, 0),
        episode(101, 7, 1, 2, 0),
    ]);
    f.remote
        .remote_shows_completed
        .lock()
        .unwrap()
        .push(remote_show("tt0903747", 1, &[1]));
    f.remote
        .remote_shows_watching
        .lock()
        .unwrap()
        .push(remote_show("tt0903747", 1, &[2]));

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.episodes_imported, 2);
    assert_eq!(f.library.episode_writes(), vec![(100, 1), (101, 1)]);
}

#[tokio::test]
async fn movie_fetch_failure_aborts_only_that_category() {
    let remote = Arc::new(MockRemote {
        fail_movie_history: true,
        ..MockRemote::default()
    });
    let library = Arc::new(MockLibrary::default());
    let dir = tempfile::tempdir().unwrap();
    let engine = SyncEngine::new(
        remote.clone(),
        library.clone(),
        StateStore::new(dir.path()),
        import_only(),
    );

    library.shows.lock().unwrap().push(show(7, "tt0903747"));
    library.episodes.lock().unwrap().push(episode(100, 7, 1, 1, 0));
    remote
        .remote_shows_completed
        .lock()
        .unwrap()
        .push(remote_show("tt0903747", 1, &[1]));

    let stats = engine.run_pass().await;
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.episodes_imported, 1);
}

#[tokio::test]
async fn unmark_disabled_keeps_locally_watched_items() {
    let f = fixture(import_only());
    f.library
        .movies
        .lock()
        .unwrap()
        .push(movie(1, Some("tt0000001"), 1));

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.unmarked, 0);
    assert!(f.library.movie_writes().is_empty());
}

#[tokio::test]
async fn unmark_enabled_resets_items_absent_from_remote() {
    let f = fixture(SyncOptions {
        unmark_missing: true,
        ..import_only()
    });
    f.library.movies.lock().unwrap().extend([
        movie(1, Some("tt0000001"), 1),
        movie(2, Some("tt0000002"), 1),
    ]);
    f.remote
        .remote_movies
        .lock()
        .unwrap()
        .push(remote_movie("tt0000002"));

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.unmarked, 1);
    assert_eq!(f.library.movie_writes(), vec![(1, 0)]);
}

#[tokio::test]
async fn exported_item_is_already_watched_on_next_import() {
    let f = fixture(SyncOptions::default());
    f.library
        .movies
        .lock()
        .unwrap()
        .push(movie(1, Some("tt0000001"), 1));

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.movies_exported, 1);

    // Remote now lists what the export submitted.
    let submitted = f.remote.history_calls()[0].0.clone();
    *f.remote.remote_movies.lock().unwrap() = submitted;

    let stats = f.engine.run_pass().await;
    assert_eq!(stats.movies_exported, 0);
    assert_eq!(stats.movies_imported, 0);
    assert!(f.library.movie_writes().is_empty());
}
