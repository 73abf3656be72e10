use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::library::MediaType;
use crate::media_ids::MediaIds;

/// Raw playback event delivered by the player event source.
///
/// Events are queued and consumed strictly in arrival order; the scrobbler
/// never sees two of them concurrently.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Started(PlaybackInfo),
    Paused,
    Resumed,
    Seek,
    Stopped,
    Ended,
}

/// Best-effort metadata the player knows about the item it started.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackInfo {
    pub media_type: Option<MediaType>,
    pub title: Option<String>,
    pub year: Option<u32>,
    pub show_title: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub ids: MediaIds,
    pub file: String,
}

/// Resolved media payload a scrobble call reports against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ScrobbleMedia {
    Movie {
        title: String,
        year: Option<u32>,
        ids: MediaIds,
    },
    Episode {
        show_title: String,
        show_year: Option<u32>,
        show_ids: MediaIds,
        season: u32,
        number: u32,
    },
}

impl ScrobbleMedia {
    pub fn display_title(&self) -> String {
        match self {
            ScrobbleMedia::Movie { title, .. } => title.clone(),
            ScrobbleMedia::Episode {
                show_title,
                season,
                number,
                ..
            } => format!("{} S{:02}E{:02}", show_title, season, number),
        }
    }
}

/// The single live playback session. Exactly one exists at a time, owned by
/// the scrobble state machine; created after identification succeeds and
/// cleared when playback finalizes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub media: ScrobbleMedia,
    pub watched_seconds: f64,
    pub total_duration_seconds: f64,
    pub started_at: DateTime<Utc>,
    pub paused_at: Option<DateTime<Utc>>,
    pub last_heartbeat_at: DateTime<Utc>,
    pub last_progress_log_at: DateTime<Utc>,
    pub is_paused: bool,
    pub file: String,
}

impl PlaybackSession {
    /// Percentage watched against the floored duration, zero when the
    /// duration is unusable.
    pub fn watched_percent(&self) -> f64 {
        watched_percent(self.watched_seconds, self.total_duration_seconds)
    }
}

/// `watched / floor(duration) * 100`, clamped to zero for missing durations.
pub fn watched_percent(watched_seconds: f64, total_duration_seconds: f64) -> f64 {
    if total_duration_seconds <= 0.0 {
        return 0.0;
    }
    let floored = total_duration_seconds.floor();
    if floored <= 0.0 {
        return 0.0;
    }
    (watched_seconds / floored) * 100.0
}

/// Detached copy of a finished session, captured before the session is
/// cleared and handed to the rating-prompt collaborator so new playback is
/// never blocked on a pending rating interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSnapshot {
    pub media: ScrobbleMedia,
    pub watched_seconds: f64,
    pub total_duration_seconds: f64,
}
