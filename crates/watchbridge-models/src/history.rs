use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media_ids::MediaIds;

/// Remote-side list a history fetch can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    Completed,
    Watching,
}

impl RemoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteStatus::Completed => "completed",
            RemoteStatus::Watching => "watching",
        }
    }
}

/// Movie entry in the remote watch history, either fetched from the remote
/// service or prepared for a bulk submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryMovie {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub ids: MediaIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<DateTime<Utc>>,
}

/// Show entry in the remote watch history with its nested watched episodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryShow {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub ids: MediaIds,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seasons: Vec<HistorySeason>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistorySeason {
    pub number: u32,
    #[serde(default)]
    pub episodes: Vec<HistoryEpisode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEpisode {
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<DateTime<Utc>>,
}

impl HistoryShow {
    /// Find or create the season bucket, keeping episodes grouped the way
    /// the bulk history contract expects.
    pub fn season_mut(&mut self, number: u32) -> &mut HistorySeason {
        let pos = match self.seasons.iter().position(|s| s.number == number) {
            Some(pos) => pos,
            None => {
                self.seasons.push(HistorySeason {
                    number,
                    episodes: Vec::new(),
                });
                self.seasons.len() - 1
            }
        };
        &mut self.seasons[pos]
    }

    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}
