//! Scrobble state machine.
//!
//! Turns the ordered player event stream into timed remote progress reports
//! and a watched decision on finalize. Holds at most one
//! [`PlaybackSession`]; remote failures while a session is active are logged
//! and playback tracking continues locally.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use watchbridge_config::ScrobbleConfig;
use watchbridge_models::{
    HistoryEpisode, HistoryMovie, HistorySeason, HistoryShow, MediaIds, MediaType, PlaybackInfo,
    PlaybackSession, PlayerEvent, RatingSnapshot, ScrobbleMedia,
};
use watchbridge_remote::{PlayerHandle, RemoteService, ScrobbleAction};

use crate::exclusions::ExclusionFilter;
use crate::identity::{self, IdentityError};
use crate::rating::RatingPrompt;

/// Remote-side watched threshold. The stop call itself marks the item
/// watched at or above this percentage; it is fixed by the service, unlike
/// the configurable local threshold.
const REMOTE_WATCHED_THRESHOLD: f64 = 80.0;

/// Re-emit "start" this often while playing, as keepalive and progress sync.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15 * 60);

const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Instant resume-after-seek double fires a start; new sessions wait this
/// long before sampling the player.
const SETTLE_DELAY: Duration = Duration::from_secs(1);


pub struct Scrobbler {
    remote: Arc<dyn RemoteService>,
    player: Arc<dyn PlayerHandle>,
    rating: Arc<dyn RatingPrompt>,
    filter: ExclusionFilter,
    movies_enabled: bool,
    episodes_enabled: bool,
    watched_threshold: f64,
    settle_delay: Duration,
    session: Option<PlaybackSession>,
}

impl Scrobbler {
    pub fn new(
        remote: Arc<dyn RemoteService>,
        player: Arc<dyn PlayerHandle>,
        rating: Arc<dyn RatingPrompt>,
        config: &ScrobbleConfig,
    ) -> Self {
        Self {
            remote,
            player,
            rating,
            filter: ExclusionFilter::new(&config.exclusions),
            movies_enabled: config.movies,
            episodes_enabled: config.episodes,
            watched_threshold: f64::from(config.watched_threshold),
            settle_delay: SETTLE_DELAY,
            session: None,
        }
    }

    #[cfg(test)]
    fn without_settle_delay(mut self) -> Self {
        self.settle_delay = Duration::ZERO;
        self
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Apply one player event. Events must arrive in playback order; the
    /// service guarantees a single consumer.
    pub async fn handle_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Started(info) => self.on_started(info).await,
            PlayerEvent::Paused => self.on_paused().await,
            PlayerEvent::Resumed => self.on_resumed().await,
            PlayerEvent::Seek => self.on_seek().await,
            PlayerEvent::Stopped | PlayerEvent::Ended => self.finalize().await,
        }
    }

    async fn on_started(&mut self, info: PlaybackInfo) {
        if self.filter.is_excluded(&info.file) {
            return;
        }
        let media_type = match info.media_type {
            Some(t) => t,
            None => {
                debug!("Start event without media type, ignoring");
                return;
            }
        };
        let enabled = match media_type {
            MediaType::Movie => self.movies_enabled,
            MediaType::Episode => self.episodes_enabled,
        };
        if !enabled {
            debug!(%media_type, "Scrobbling disabled for this type");
            return;
        }

        // Seamless next-item playback delivers a fresh start while the old
        // session is still live; its finalize (and remote stop) comes first.
        if let Some(session) = &self.session {
            if session.file != info.file {
                self.finalize().await;
            } else {
                return;
            }
        }

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let position = self.player.position_secs().await.unwrap_or(0.0);
        let duration = match self.player.duration_secs().await {
            Some(d) if d > 0.0 => d,
            _ => {
                let fallback = media_type.fallback_duration_secs();
                debug!(fallback, "Player reported no duration, using fallback");
                fallback
            }
        };

        let media = match self.identify(media_type, &info).await {
            Ok(media) => media,
            Err(IdentityError::Unresolved) => {
                debug!(file = %info.file, "Could not identify media, not scrobbling");
                return;
            }
        };

        info!(title = %media.display_title(), "Playback started");
        let now = Utc::now();
        let session = PlaybackSession {
            media,
            watched_seconds: position,
            total_duration_seconds: duration,
            started_at: now,
            paused_at: None,
            last_heartbeat_at: now,
            last_progress_log_at: now,
            is_paused: false,
            file: info.file,
        };
        self.send_scrobble(ScrobbleAction::Start, &session).await;
        self.session = Some(session);
    }

    async fn identify(
        &self,
        media_type: MediaType,
        info: &PlaybackInfo,
    ) -> Result<ScrobbleMedia, IdentityError> {
        match media_type {
            MediaType::Movie => {
                let ids = identity::identify(
                    self.remote.as_ref(),
                    MediaType::Movie,
                    info.ids.clone(),
                    info.title.as_deref(),
                    info.year,
                )
                .await?;
                Ok(ScrobbleMedia::Movie {
                    title: info
                        .title
                        .clone()
                        .or_else(|| ids.title.clone())
                        .unwrap_or_default(),
                    year: info.year.or(ids.year),
                    ids,
                })
            }
            MediaType::Episode => {
                let (season, number) = match (info.season, info.episode) {
                    (Some(s), Some(e)) => (s, e),
                    _ => return Err(IdentityError::Unresolved),
                };
                // The player's ids belong to the episode entry; the remote
                // wants the show identified, so resolution goes through the
                // show title.
                let show_ids = identity::identify(
                    self.remote.as_ref(),
                    MediaType::Episode,
                    MediaIds::new(),
                    info.show_title.as_deref(),
                    info.year,
                )
                .await?;
                Ok(ScrobbleMedia::Episode {
                    show_title: info.show_title.clone().unwrap_or_default(),
                    show_year: info.year.or(show_ids.year),
                    show_ids,
                    season,
                    number,
                })
            }
        }
    }

    async fn on_paused(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_paused {
            return;
        }
        session.is_paused = true;
        session.paused_at = Some(Utc::now());
        let session = session.clone();
        info!(title = %session.media.display_title(), "Playback paused");
        self.send_scrobble(ScrobbleAction::Pause, &session).await;
    }

    async fn on_resumed(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_paused {
            return;
        }
        session.is_paused = false;
        session.paused_at = None;
        session.last_heartbeat_at = Utc::now();
        let session = session.clone();
        info!(title = %session.media.display_title(), "Playback resumed");
        // Re-sending start is how remote progress catches up after a pause.
        self.send_scrobble(ScrobbleAction::Start, &session).await;
    }

    /// Seeks carry no payload; the player is re-sampled. A changed file
    /// means the playlist advanced without a stop, so the old session
    /// finalizes now and the monitor's following start event rebuilds state.
    async fn on_seek(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        if let Some(file) = self.player.playing_file().await {
            if file != session.file {
                debug!("Source path changed under a seek, finalizing prior session");
                self.finalize().await;
                return;
            }
        }
        if let Some(position) = self.player.position_secs().await {
            if let Some(session) = self.session.as_mut() {
                session.watched_seconds = position;
            }
        }
    }

    /// Periodic upkeep while a session is live: track position, heartbeat
    /// the remote, log progress. Driven by the service at 1s cadence.
    pub async fn tick(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_paused {
            return;
        }

        if let Some(position) = self.player.position_secs().await {
            session.watched_seconds = position;
        }
        if let Some(duration) = self.player.duration_secs().await {
            if duration > 0.0 {
                session.total_duration_seconds = duration;
            }
        }

        let now = Utc::now();
        let heartbeat_due = (now - session.last_heartbeat_at).to_std().ok()
            >= Some(HEARTBEAT_INTERVAL);
        let log_due =
            (now - session.last_progress_log_at).to_std().ok() >= Some(PROGRESS_LOG_INTERVAL);

        if log_due {
            session.last_progress_log_at = now;
            info!(
                title = %session.media.display_title(),
                percent = format!("{:.1}", session.watched_percent()),
                "Playback progress"
            );
        }

        if heartbeat_due {
            session.last_heartbeat_at = now;
            let session = session.clone();
            self.send_scrobble(ScrobbleAction::Start, &session).await;
        }
    }

    /// Finalize the active session: unconditional remote stop, watched
    /// decision, rating hand-off, back to idle.
    pub async fn finalize(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        let percent = session.watched_percent();
        info!(
            title = %session.media.display_title(),
            percent = format!("{:.1}", percent),
            "Playback finished"
        );

        self.send_scrobble(ScrobbleAction::Stop, &session).await;

        let watched = if percent >= REMOTE_WATCHED_THRESHOLD {
            // The stop call alone marks it watched remotely.
            true
        } else if percent >= self.watched_threshold {
            self.add_to_history_fallback(&session.media).await
        } else {
            false
        };

        if watched {
            let snapshot = RatingSnapshot {
                media: session.media.clone(),
                watched_seconds: session.watched_seconds,
                total_duration_seconds: session.total_duration_seconds,
            };
            self.rating.offer(snapshot).await;
        }
    }

    /// One bulk history-add for an item that crossed the local threshold but
    /// not the remote one. Not retried within the same playback.
    async fn add_to_history_fallback(&self, media: &ScrobbleMedia) -> bool {
        let now = Utc::now();
        let (movies, shows) = match media {
            ScrobbleMedia::Movie { title, year, ids } => (
                vec![HistoryMovie {
                    title: title.clone(),
                    year: *year,
                    ids: ids.clone(),
                    watched_at: Some(now),
                }],
                vec![],
            ),
            ScrobbleMedia::Episode {
                show_title,
                show_year,
                show_ids,
                season,
                number,
            } => (
                vec![],
                vec![HistoryShow {
                    title: show_title.clone(),
                    year: *show_year,
                    ids: show_ids.clone(),
                    seasons: vec![HistorySeason {
                        number: *season,
                        episodes: vec![HistoryEpisode {
                            number: *number,
                            watched_at: Some(now),
                        }],
                    }],
                }],
            ),
        };

        match self.remote.add_to_history(&movies, &shows).await {
            Ok(added) => {
                debug!(?added, "Marked watched via history fallback");
                true
            }
            Err(e) => {
                warn!(error = %e, "History fallback failed, item not marked watched");
                false
            }
        }
    }

    async fn send_scrobble(&self, action: ScrobbleAction, session: &PlaybackSession) {
        let percent = session.watched_percent().clamp(0.0, 100.0);
        match self.remote.scrobble(action, &session.media, percent).await {
            Ok(ack) if ack.already_recorded => {
                debug!(%action, "Remote already recorded this scrobble");
            }
            Ok(_) => {
                debug!(%action, percent = format!("{:.1}", percent), "Scrobble sent");
            }
            Err(e) if e.is_transient() => {
                debug!(%action, error = %e, "Scrobble failed, next heartbeat retries");
            }
            Err(e) => {
                warn!(%action, error = %e, "Scrobble failed, continuing local tracking");
            }
        }
    }
}
