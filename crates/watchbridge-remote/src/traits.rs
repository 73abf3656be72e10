use async_trait::async_trait;
use watchbridge_models::{
    HistoryMovie, HistoryShow, LibraryEpisode, LibraryMovie, LibraryShow, MediaIds, MediaType,
    RemoteStatus, ScrobbleMedia,
};

use crate::error::{LibraryError, RemoteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrobbleAction {
    Start,
    Pause,
    Stop,
}

impl ScrobbleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrobbleAction::Start => "start",
            ScrobbleAction::Pause => "pause",
            ScrobbleAction::Stop => "stop",
        }
    }
}

impl std::fmt::Display for ScrobbleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement of a scrobble call. A 409 from the remote (already
/// recorded recently) is reported as a successful no-op here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrobbleAck {
    pub already_recorded: bool,
}

/// Counts the remote reports added after a bulk history submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryAdded {
    pub movies: usize,
    pub episodes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteUser {
    pub name: Option<String>,
}

/// Call contract of the remote watch-history service. The wire shapes stay
/// inside the implementation; everything crossing this boundary uses the
/// uniform model types.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Title/year search, used as identification fallback when no usable
    /// external ids are available.
    async fn search(
        &self,
        media_type: MediaType,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<MediaIds>, RemoteError>;

    /// Live progress report for the single active playback session.
    async fn scrobble(
        &self,
        action: ScrobbleAction,
        media: &ScrobbleMedia,
        progress: f64,
    ) -> Result<ScrobbleAck, RemoteError>;

    /// Bulk add to watch history; episodes must be grouped show → seasons →
    /// episodes before they reach this call.
    async fn add_to_history(
        &self,
        movies: &[HistoryMovie],
        shows: &[HistoryShow],
    ) -> Result<HistoryAdded, RemoteError>;

    async fn movie_history(&self, status: RemoteStatus) -> Result<Vec<HistoryMovie>, RemoteError>;

    async fn show_history(&self, status: RemoteStatus) -> Result<Vec<HistoryShow>, RemoteError>;

    /// Current user ratings for one category, as (identity, rating) pairs.
    async fn ratings(&self, media_type: MediaType) -> Result<Vec<(MediaIds, u8)>, RemoteError>;

    async fn add_rating(&self, media: &ScrobbleMedia, rating: u8) -> Result<(), RemoteError>;

    async fn remove_rating(&self, media: &ScrobbleMedia) -> Result<(), RemoteError>;

    async fn user_settings(&self) -> Result<RemoteUser, RemoteError>;

    /// Re-read the access token from the session store. Idempotent; safe to
    /// call redundantly from the scrobbler and the sync engine. Returns true
    /// when the token actually changed.
    async fn refresh_token(&self) -> bool;
}

/// Call contract of the local media library. Reads return full snapshots;
/// the only write this system ever issues is a single-field play count.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn movies(&self) -> Result<Vec<LibraryMovie>, LibraryError>;

    async fn episodes(&self) -> Result<Vec<LibraryEpisode>, LibraryError>;

    async fn shows(&self) -> Result<Vec<LibraryShow>, LibraryError>;

    async fn set_movie_play_count(&self, movie_id: u32, play_count: u32)
        -> Result<(), LibraryError>;

    async fn set_episode_play_count(
        &self,
        episode_id: u32,
        play_count: u32,
    ) -> Result<(), LibraryError>;
}

/// Live view of the player, sampled by the scrobbler on start, tick, and
/// seek. All methods are best-effort; `None` means the player could not
/// answer right now (normal during transitions).
#[async_trait]
pub trait PlayerHandle: Send + Sync {
    async fn is_playing_video(&self) -> bool;

    async fn position_secs(&self) -> Option<f64>;

    async fn duration_secs(&self) -> Option<f64>;

    async fn playing_file(&self) -> Option<String>;
}
