use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace};
use watchbridge_models::{MediaType, PlaybackInfo, PlayerEvent};

use crate::kodi::client::KodiClient;
use crate::kodi::rpc::{self, PlayerItem};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A position jump larger than this between two polls, after accounting for
/// normal playback progress, is reported as a seek.
const SEEK_JUMP_SECS: f64 = 5.0;

/// Polls the Kodi player over JSON-RPC and synthesizes playback events from
/// the differences between consecutive snapshots. Kodi's HTTP interface has
/// no push notifications, so state transitions have to be inferred.
pub struct PlayerMonitor {
    kodi: Arc<KodiClient>,
    events: mpsc::UnboundedSender<PlayerEvent>,
    shutdown: watch::Receiver<bool>,
    last: Option<Snapshot>,
}

struct Snapshot {
    file: Option<String>,
    position: f64,
    speed: f64,
    polled_at: chrono::DateTime<Utc>,
}

impl PlayerMonitor {
    pub fn new(
        kodi: Arc<KodiClient>,
        events: mpsc::UnboundedSender<PlayerEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            kodi,
            events,
            shutdown,
            last: None,
        }
    }

    pub async fn run(mut self) {
        info!("Player monitor started");
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.poll().await.is_err() {
                        break;
                    }
                }
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Player monitor stopped");
    }

    /// One poll cycle. Errors only when the event receiver is gone.
    async fn poll(&mut self) -> Result<(), ()> {
        let properties = self.kodi.player_properties().await;
        let item = match &properties {
            Some(_) => self.kodi.player_item().await,
            None => None,
        };

        let current = match (properties, item) {
            (Some(props), Some(item)) => Some((props, item)),
            _ => None,
        };

        match (&self.last, current) {
            (None | Some(Snapshot { file: None, .. }), Some((props, item))) => {
                self.emit(PlayerEvent::Started(playback_info(&item)))?;
                self.remember(&item, &props);
            }
            (Some(prev), Some((props, item))) => {
                if prev.file != item.file {
                    // Playlist advanced or the user started something else.
                    // The scrobbler finalizes the old session on Started.
                    self.emit(PlayerEvent::Started(playback_info(&item)))?;
                } else {
                    let position = props.time.as_secs();
                    if prev.speed > 0.0 && props.speed == 0.0 {
                        self.emit(PlayerEvent::Paused)?;
                    } else if prev.speed == 0.0 && props.speed > 0.0 {
                        self.emit(PlayerEvent::Resumed)?;
                    } else if self.is_jump(prev, position) {
                        trace!(
                            from = prev.position,
                            to = position,
                            "Position jump detected"
                        );
                        self.emit(PlayerEvent::Seek)?;
                    }
                }
                self.remember(&item, &props);
            }
            (Some(prev), None) => {
                if prev.file.is_some() {
                    debug!("Player went idle");
                    self.emit(PlayerEvent::Stopped)?;
                }
                self.last = None;
            }
            (None, None) => {}
        }

        Ok(())
    }

    fn is_jump(&self, prev: &Snapshot, position: f64) -> bool {
        let elapsed = (Utc::now() - prev.polled_at).num_milliseconds() as f64 / 1000.0;
        let expected = prev.position + elapsed * prev.speed;
        (position - expected).abs() > SEEK_JUMP_SECS
    }

    fn remember(&mut self, item: &PlayerItem, props: &rpc::PlayerProperties) {
        self.last = Some(Snapshot {
            file: item.file.clone(),
            position: props.time.as_secs(),
            speed: props.speed,
            polled_at: Utc::now(),
        });
    }

    fn emit(&self, event: PlayerEvent) -> Result<(), ()> {
        self.events.send(event).map_err(|_| ())
    }
}

fn playback_info(item: &PlayerItem) -> PlaybackInfo {
    let media_type = if item.item_type.as_deref() == Some("episode") {
        MediaType::Episode
    } else {
        MediaType::Movie
    };

    PlaybackInfo {
        media_type: Some(media_type),
        title: item.title.clone().filter(|t| !t.is_empty()),
        year: item.year,
        show_title: item.showtitle.clone().filter(|s| !s.is_empty()),
        season: item.season.filter(|s| *s >= 0).map(|s| s as u32),
        episode: item.episode.filter(|e| *e >= 0).map(|e| e as u32),
        ids: rpc::extract_ids(item.uniqueid.as_ref(), None, false),
        file: item.file.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn item(file: &str, item_type: &str) -> PlayerItem {
        PlayerItem {
            item_type: Some(item_type.to_string()),
            title: Some("Pilot".to_string()),
            year: Some(2008),
            showtitle: Some("Breaking Bad".to_string()),
            season: Some(1),
            episode: Some(1),
            file: Some(file.to_string()),
            uniqueid: Some(HashMap::from([(
                "imdb".to_string(),
                "tt0959621".to_string(),
            )])),
        }
    }

    #[test]
    fn playback_info_maps_episode_fields() {
        let info = playback_info(&item("/media/bb.mkv", "episode"));
        assert_eq!(info.media_type, Some(MediaType::Episode));
        assert_eq!(info.show_title.as_deref(), Some("Breaking Bad"));
        assert_eq!(info.season, Some(1));
        assert_eq!(info.ids.imdb.as_deref(), Some("tt0959621"));
    }

    #[test]
    fn negative_season_treated_as_unknown() {
        let mut raw = item("/media/special.mkv", "episode");
        raw.season = Some(-1);
        let info = playback_info(&raw);
        assert_eq!(info.season, None);
    }
}
