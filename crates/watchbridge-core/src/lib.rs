pub mod exclusions;
pub mod identity;
pub mod index;
pub mod orchestrator;
pub mod rating;
pub mod scrobble;
pub mod service;
pub mod state_store;
pub mod sync;

pub use exclusions::ExclusionFilter;
pub use identity::IdentityError;
pub use orchestrator::{SyncOrchestrator, TriggerOutcome};
pub use rating::{NoRatingPrompt, RatingPrompt};
pub use scrobble::Scrobbler;
pub use service::ScrobbleService;
pub use state_store::StateStore;
pub use sync::SyncEngine;
