//! Library-side id indexes for import matching.
//!
//! Each index maps one id namespace to local items. Lookups walk namespaces
//! in fixed precedence and stop at the first hit; duplicate ids across items
//! resolve last-write-wins at build time.

use std::collections::HashMap;

use watchbridge_models::{LibraryEpisode, LibraryMovie, LibraryShow, MediaIds};

pub struct MovieIndex<'a> {
    by_imdb: HashMap<&'a str, &'a LibraryMovie>,
    by_tmdb: HashMap<u32, &'a LibraryMovie>,
}

impl<'a> MovieIndex<'a> {
    pub fn build(movies: &'a [LibraryMovie]) -> Self {
        let mut by_imdb = HashMap::new();
        let mut by_tmdb = HashMap::new();
        for movie in movies {
            if let Some(imdb) = movie.ids.imdb.as_deref() {
                by_imdb.insert(imdb, movie);
            }
            if let Some(tmdb) = movie.ids.tmdb {
                by_tmdb.insert(tmdb, movie);
            }
        }
        Self { by_imdb, by_tmdb }
    }

    /// imdb wins over tmdb even when both would match different entries.
    pub fn lookup(&self, ids: &MediaIds) -> Option<&'a LibraryMovie> {
        if let Some(imdb) = ids.imdb.as_deref() {
            if let Some(found) = self.by_imdb.get(imdb) {
                return Some(found);
            }
        }
        ids.tmdb.and_then(|tmdb| self.by_tmdb.get(&tmdb).copied())
    }
}

pub struct ShowIndex<'a> {
    by_imdb: HashMap<&'a str, &'a LibraryShow>,
    by_tvdb: HashMap<u32, &'a LibraryShow>,
    by_tmdb: HashMap<u32, &'a LibraryShow>,
}

impl<'a> ShowIndex<'a> {
    pub fn build(shows: &'a [LibraryShow]) -> Self {
        let mut by_imdb = HashMap::new();
        let mut by_tvdb = HashMap::new();
        let mut by_tmdb = HashMap::new();
        for show in shows {
            if let Some(imdb) = show.ids.imdb.as_deref() {
                by_imdb.insert(imdb, show);
            }
            if let Some(tvdb) = show.ids.tvdb {
                by_tvdb.insert(tvdb, show);
            }
            if let Some(tmdb) = show.ids.tmdb {
                by_tmdb.insert(tmdb, show);
            }
        }
        Self {
            by_imdb,
            by_tvdb,
            by_tmdb,
        }
    }

    pub fn lookup(&self, ids: &MediaIds) -> Option<&'a LibraryShow> {
        if let Some(imdb) = ids.imdb.as_deref() {
            if let Some(found) = self.by_imdb.get(imdb) {
                return Some(found);
            }
        }
        if let Some(tvdb) = ids.tvdb {
            if let Some(found) = self.by_tvdb.get(&tvdb) {
                return Some(found);
            }
        }
        ids.tmdb.and_then(|tmdb| self.by_tmdb.get(&tmdb).copied())
    }
}

/// Episodes are addressed by position under an already-matched show, never
/// by their own external ids.
pub struct EpisodeIndex<'a> {
    by_position: HashMap<(u32, u32, u32), &'a LibraryEpisode>,
}

impl<'a> EpisodeIndex<'a> {
    pub fn build(episodes: &'a [LibraryEpisode]) -> Self {
        let mut by_position = HashMap::new();
        for episode in episodes {
            by_position.insert((episode.show_id, episode.season, episode.episode), episode);
        }
        Self { by_position }
    }

    pub fn lookup(&self, show_id: u32, season: u32, episode: u32) -> Option<&'a LibraryEpisode> {
        self.by_position.get(&(show_id, season, episode)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: u32, imdb: Option<&str>, tmdb: Option<u32>) -> LibraryMovie {
        let mut ids = MediaIds::new();
        ids.imdb = imdb.map(String::from);
        ids.tmdb = tmdb;
        LibraryMovie {
            movie_id: id,
            title: format!("Movie {}", id),
            year: Some(2000),
            ids,
            play_count: 0,
            last_played: None,
        }
    }

    #[test]
    fn imdb_precedence_over_tmdb() {
        let movies = vec![
            movie(1, Some("tt0000001"), None),
            movie(2, None, Some(42)),
        ];
        let index = MovieIndex::build(&movies);

        // Query ids point at movie 1 via imdb and movie 2 via tmdb.
        let mut query = MediaIds::new();
        query.imdb = Some("tt0000001".to_string());
        query.tmdb = Some(42);
        assert_eq!(index.lookup(&query).map(|m| m.movie_id), Some(1));
    }

    #[test]
    fn duplicate_id_is_last_write_wins() {
        let movies = vec![movie(1, Some("tt0000009"), None), movie(2, Some("tt0000009"), None)];
        let index = MovieIndex::build(&movies);

        let mut query = MediaIds::new();
        query.imdb = Some("tt0000009".to_string());
        assert_eq!(index.lookup(&query).map(|m| m.movie_id), Some(2));
    }

    #[test]
    fn no_id_overlap_is_no_match() {
        let movies = vec![movie(1, Some("tt0000001"), None)];
        let index = MovieIndex::build(&movies);
        let mut query = MediaIds::new();
        query.tmdb = Some(603);
        assert!(index.lookup(&query).is_none());
    }
}
