use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media_ids::MediaIds;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Episode,
}

impl MediaType {
    /// Fallback runtime used when the player cannot report a duration.
    pub fn fallback_duration_secs(self) -> f64 {
        match self {
            MediaType::Movie => 90.0 * 60.0,
            MediaType::Episode => 45.0 * 60.0,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Movie => write!(f, "movie"),
            MediaType::Episode => write!(f, "episode"),
        }
    }
}

/// Movie row from the local library snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryMovie {
    pub movie_id: u32,
    pub title: String,
    pub year: Option<u32>,
    pub ids: MediaIds,
    pub play_count: u32,
    pub last_played: Option<DateTime<Utc>>,
}

impl LibraryMovie {
    pub fn is_watched(&self) -> bool {
        self.play_count > 0
    }
}

/// Show row from the local library snapshot. Episodes reference it by
/// `show_id`; the show itself carries no play count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryShow {
    pub show_id: u32,
    pub title: String,
    pub year: Option<u32>,
    pub ids: MediaIds,
}

/// Episode row from the local library snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryEpisode {
    pub episode_id: u32,
    pub show_id: u32,
    pub show_title: String,
    pub season: u32,
    pub episode: u32,
    pub ids: MediaIds,
    pub play_count: u32,
    pub last_played: Option<DateTime<Utc>>,
}

impl LibraryEpisode {
    pub fn is_watched(&self) -> bool {
        self.play_count > 0
    }

    /// Delta-state key. Episodes are keyed by position under their show
    /// rather than by external id, matching how the library addresses them.
    pub fn state_key(&self) -> String {
        format!("{}:{}:{}", self.show_id, self.season, self.episode)
    }
}
