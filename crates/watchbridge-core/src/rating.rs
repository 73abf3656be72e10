use async_trait::async_trait;
use watchbridge_models::RatingSnapshot;

/// Collaborator invoked after a session finalizes as watched. The snapshot is
/// detached from the state machine, so a slow or interactive implementation
/// never blocks the next playback.
#[async_trait]
pub trait RatingPrompt: Send + Sync {
    async fn offer(&self, snapshot: RatingSnapshot);
}

/// Does nothing; used when rating prompts are disabled.
pub struct NoRatingPrompt;

#[async_trait]
impl RatingPrompt for NoRatingPrompt {
    async fn offer(&self, _snapshot: RatingSnapshot) {}
}
