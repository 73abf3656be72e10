//! Bidirectional delta sync between the local library and the remote watch
//! history.
//!
//! A pass runs export then import, per category. Export submits only items
//! whose play count moved since the last persisted state; import walks the
//! remote watched sets against the local id indexes. No failure aborts more
//! than its own item or category.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use watchbridge_config::SyncOptions;
use watchbridge_models::{
    HistoryEpisode, HistoryMovie, HistoryShow, LibraryEpisode, LibraryShow, RemoteStatus,
    SyncState, SyncStats,
};
use watchbridge_remote::{MediaLibrary, RemoteService};

use crate::identity;
use crate::index::{EpisodeIndex, MovieIndex, ShowIndex};
use crate::state_store::StateStore;

#[cfg(test)]
mod tests;

const MOVIES: &str = "movies";
const EPISODES: &str = "episodes";

pub struct SyncEngine {
    remote: Arc<dyn RemoteService>,
    library: Arc<dyn MediaLibrary>,
    store: StateStore,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(
        remote: Arc<dyn RemoteService>,
        library: Arc<dyn MediaLibrary>,
        store: StateStore,
        options: SyncOptions,
    ) -> Self {
        Self {
            remote,
            library,
            store,
            options,
        }
    }

    /// One full pass: export both categories, then import both categories.
    pub async fn run_pass(&self) -> SyncStats {
        let mut stats = SyncStats::default();

        if self.options.export_movies {
            self.export_movies(&mut stats).await;
        }
        if self.options.export_episodes {
            self.export_episodes(&mut stats).await;
        }
        if self.options.import_movies || self.options.unmark_missing {
            self.import_movies(&mut stats).await;
        }
        if self.options.import_episodes || self.options.unmark_missing {
            self.import_episodes(&mut stats).await;
        }

        info!(
            exported = stats.total_exported(),
            imported = stats.total_imported(),
            unmarked = stats.unmarked,
            errors = stats.errors,
            "Sync pass finished"
        );
        stats
    }

    // ---- export ----

    async fn export_movies(&self, stats: &mut SyncStats) {
        let movies = match self.library.movies().await {
            Ok(movies) => movies,
            Err(e) => {
                warn!(error = %e, "Could not read movie library, skipping movie export");
                stats.errors += 1;
                return;
            }
        };

        let state = self.store.load(MOVIES);
        let mut changed: Vec<HistoryMovie> = Vec::new();
        let mut next_state = SyncState::new();

        for movie in &movies {
            let ids = match identity::resolve(movie.ids.clone()) {
                Ok(ids) if !ids.is_empty() => ids,
                _ => {
                    if movie.is_watched() {
                        debug!(title = %movie.title, "Movie has no usable ids, skipping export");
                        stats.errors += 1;
                    }
                    continue;
                }
            };
            let key = match ids.primary_id() {
                Some(key) => key,
                None => continue,
            };

            next_state.record(key.clone(), movie.play_count);

            if movie.is_watched() && state.is_changed(&key, movie.play_count) {
                changed.push(HistoryMovie {
                    title: movie.title.clone(),
                    year: movie.year,
                    ids,
                    watched_at: movie.last_played.or_else(|| Some(Utc::now())),
                });
            }
        }

        info!(changed = changed.len(), total = movies.len(), "Movie export delta");
        for batch in changed.chunks(self.options.batch_size.max(1)) {
            match self.remote.add_to_history(batch, &[]).await {
                Ok(_) => stats.movies_exported += batch.len(),
                Err(e) => {
                    warn!(error = %e, size = batch.len(), "Movie history batch failed");
                    stats.errors += 1;
                }
            }
        }

        // State becomes the full current snapshot even when batches failed;
        // those items come back only when their play count changes again.
        if let Err(e) = self.store.save(MOVIES, &next_state) {
            warn!(error = %e, "Could not persist movie sync state");
            stats.errors += 1;
        }
    }

    async fn export_episodes(&self, stats: &mut SyncStats) {
        let episodes = match self.library.episodes().await {
            Ok(episodes) => episodes,
            Err(e) => {
                warn!(error = %e, "Could not read episode library, skipping episode export");
                stats.errors += 1;
                return;
            }
        };
        let shows = match self.library.shows().await {
            Ok(shows) => shows,
            Err(e) => {
                warn!(error = %e, "Could not read show library, skipping episode export");
                stats.errors += 1;
                return;
            }
        };
        let shows_by_id: HashMap<u32, &LibraryShow> =
            shows.iter().map(|s| (s.show_id, s)).collect();

        let state = self.store.load(EPISODES);
        let mut changed: Vec<&LibraryEpisode> = Vec::new();
        let mut next_state = SyncState::new();

        for episode in &episodes {
            let key = episode.state_key();
            next_state.record(key.clone(), episode.play_count);
            if episode.is_watched() && state.is_changed(&key, episode.play_count) {
                changed.push(episode);
            }
        }

        info!(
            changed = changed.len(),
            total = episodes.len(),
            "Episode export delta"
        );

        for batch in changed.chunks(self.options.batch_size.max(1)) {
            let (grouped, unresolved) = group_episodes(batch, &shows_by_id);
            stats.errors += unresolved;
            if grouped.is_empty() {
                continue;
            }
            let submitted: usize = grouped.iter().map(|s| s.episode_count()).sum();
            match self.remote.add_to_history(&[], &grouped).await {
                Ok(_) => stats.episodes_exported += submitted,
                Err(e) => {
                    warn!(error = %e, size = submitted, "Episode history batch failed");
                    stats.errors += 1;
                }
            }
        }

        if let Err(e) = self.store.save(EPISODES, &next_state) {
            warn!(error = %e, "Could not persist episode sync state");
            stats.errors += 1;
        }
    }

    // ---- import ----

    async fn import_movies(&self, stats: &mut SyncStats) {
        let remote_watched = match self.remote.movie_history(RemoteStatus::Completed).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Could not fetch remote movie history, skipping movie import");
                stats.errors += 1;
                return;
            }
        };
        let movies = match self.library.movies().await {
            Ok(movies) => movies,
            Err(e) => {
                warn!(error = %e, "Could not read movie library, skipping movie import");
                stats.errors += 1;
                return;
            }
        };
        let index = MovieIndex::build(&movies);

        let mut matched: HashSet<u32> = HashSet::new();
        let mut already_watched = 0usize;
        let mut not_found = 0usize;

        for entry in &remote_watched {
            let Some(movie) = index.lookup(&entry.ids) else {
                not_found += 1;
                debug!(title = %entry.title, "Remote movie not in local library");
                continue;
            };
            matched.insert(movie.movie_id);

            if !self.options.import_movies {
                continue;
            }
            if movie.is_watched() {
                already_watched += 1;
                continue;
            }
            match self.library.set_movie_play_count(movie.movie_id, 1).await {
                Ok(()) => {
                    stats.movies_imported += 1;
                    debug!(title = %movie.title, "Marked movie watched locally");
                }
                Err(e) => {
                    warn!(title = %movie.title, error = %e, "Could not mark movie watched");
                    stats.errors += 1;
                }
            }
        }

        info!(
            remote = remote_watched.len(),
            imported = stats.movies_imported,
            already_watched,
            not_found,
            "Movie import finished"
        );

        if self.options.unmark_missing {
            for movie in movies.iter().filter(|m| m.is_watched()) {
                if matched.contains(&movie.movie_id) {
                    continue;
                }
                match self.library.set_movie_play_count(movie.movie_id, 0).await {
                    Ok(()) => {
                        stats.unmarked += 1;
                        info!(title = %movie.title, "Unmarked movie absent from remote history");
                    }
                    Err(e) => {
                        warn!(title = %movie.title, error = %e, "Could not unmark movie");
                        stats.errors += 1;
                    }
                }
            }
        }
    }

    async fn import_episodes(&self, stats: &mut SyncStats) {
        // In-progress shows still contain individually completed episodes,
        // so both remote lists participate.
        let mut remote_shows = Vec::new();
        for status in [RemoteStatus::Completed, RemoteStatus::Watching] {
            match self.remote.show_history(status).await {
                Ok(mut entries) => remote_shows.append(&mut entries),
                Err(e) => {
                    warn!(status = status.as_str(), error = %e, "Could not fetch remote show history, skipping episode import");
                    stats.errors += 1;
                    return;
                }
            }
        }

        let shows = match self.library.shows().await {
            Ok(shows) => shows,
            Err(e) => {
                warn!(error = %e, "Could not read show library, skipping episode import");
                stats.errors += 1;
                return;
            }
        };
        let episodes = match self.library.episodes().await {
            Ok(episodes) => episodes,
            Err(e) => {
                warn!(error = %e, "Could not read episode library, skipping episode import");
                stats.errors += 1;
                return;
            }
        };
        let show_index = ShowIndex::build(&shows);
        let episode_index = EpisodeIndex::build(&episodes);

        let mut matched: HashSet<u32> = HashSet::new();
        let mut already_watched = 0usize;
        let mut not_found = 0usize;

        for entry in &remote_shows {
            let Some(show) = show_index.lookup(&entry.ids) else {
                not_found += entry.episode_count();
                debug!(title = %entry.title, "Remote show not in local library");
                continue;
            };
            for season in &entry.seasons {
                for episode in &season.episodes {
                    let Some(local) =
                        episode_index.lookup(show.show_id, season.number, episode.number)
                    else {
                        not_found += 1;
                        continue;
                    };
                    matched.insert(local.episode_id);

                    if !self.options.import_episodes {
                        continue;
                    }
                    if local.is_watched() {
                        already_watched += 1;
                        continue;
                    }
                    match self
                        .library
                        .set_episode_play_count(local.episode_id, 1)
                        .await
                    {
                        Ok(()) => stats.episodes_imported += 1,
                        Err(e) => {
                            warn!(
                                show = %local.show_title,
                                season = season.number,
                                episode = episode.number,
                                error = %e,
                                "Could not mark episode watched"
                            );
                            stats.errors += 1;
                        }
                    }
                }
            }
        }

        info!(
            remote_shows = remote_shows.len(),
            imported = stats.episodes_imported,
            already_watched,
            not_found,
            "Episode import finished"
        );

        if self.options.unmark_missing {
            for episode in episodes.iter().filter(|e| e.is_watched()) {
                if matched.contains(&episode.episode_id) {
                    continue;
                }
                match self
                    .library
                    .set_episode_play_count(episode.episode_id, 0)
                    .await
                {
                    Ok(()) => {
                        stats.unmarked += 1;
                        info!(
                            show = %episode.show_title,
                            season = episode.season,
                            episode = episode.episode,
                            "Unmarked episode absent from remote history"
                        );
                    }
                    Err(e) => {
                        warn!(error = %e, "Could not unmark episode");
                        stats.errors += 1;
                    }
                }
            }
        }
    }
}

/// Group a flat episode batch into the show → seasons → episodes shape the
/// bulk history contract requires. Episodes whose show identity cannot be
/// resolved are dropped and counted.
fn group_episodes(
    episodes: &[&LibraryEpisode],
    shows_by_id: &HashMap<u32, &LibraryShow>,
) -> (Vec<HistoryShow>, usize) {
    let mut grouped: Vec<HistoryShow> = Vec::new();
    let mut positions: HashMap<u32, usize> = HashMap::new();
    let mut unresolved = 0usize;

    for episode in episodes {
        let show_entry = shows_by_id.get(&episode.show_id).and_then(|show| {
            identity::resolve(show.ids.clone())
                .ok()
                .filter(|ids| !ids.is_empty())
                .map(|ids| (show.title.clone(), show.year, ids))
        });
        let Some((title, year, ids)) = show_entry else {
            debug!(show = %episode.show_title, "Show has no usable ids, skipping episode export");
            unresolved += 1;
            continue;
        };

        let pos = match positions.get(&episode.show_id) {
            Some(pos) => *pos,
            None => {
                grouped.push(HistoryShow {
                    title,
                    year,
                    ids,
                    seasons: Vec::new(),
                });
                let pos = grouped.len() - 1;
                positions.insert(episode.show_id, pos);
                pos
            }
        };

        grouped[pos]
            .season_mut(episode.season)
            .episodes
            .push(HistoryEpisode {
                number: episode.episode,
                watched_at: episode.last_played.or_else(|| Some(Utc::now())),
            });
    }

    (grouped, unresolved)
}
