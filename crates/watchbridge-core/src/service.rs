use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::info;
use watchbridge_models::PlayerEvent;

use crate::scrobble::Scrobbler;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Event loop that owns the scrobbler.
///
/// Player events are appended to the queue by the monitor and drained here
/// by a single consumer, so transitions apply strictly in arrival order and
/// the state machine never sees two events concurrently.
pub struct ScrobbleService {
    scrobbler: Scrobbler,
    events: mpsc::UnboundedReceiver<PlayerEvent>,
    shutdown: watch::Receiver<bool>,
}

impl ScrobbleService {
    pub fn new(
        scrobbler: Scrobbler,
        events: mpsc::UnboundedReceiver<PlayerEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            scrobbler,
            events,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        info!("Scrobble service started");
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = self.events.recv() => {
                    match event {
                        Some(event) => self.scrobbler.handle_event(event).await,
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    self.scrobbler.tick().await;
                }
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        // Whatever is still queued applies before the final flush, so a stop
        // event racing the shutdown signal is not lost.
        while let Ok(event) = self.events.try_recv() {
            self.scrobbler.handle_event(event).await;
        }
        if self.scrobbler.is_active() {
            info!("Finalizing active playback session on shutdown");
            self.scrobbler.finalize().await;
        }
        info!("Scrobble service stopped");
    }
}
