pub mod history;
pub mod library;
pub mod media_ids;
pub mod playback;
pub mod sync_state;

pub use history::{HistoryEpisode, HistoryMovie, HistorySeason, HistoryShow, RemoteStatus};
pub use library::{LibraryEpisode, LibraryMovie, LibraryShow, MediaType};
pub use media_ids::MediaIds;
pub use playback::{
    watched_percent, PlaybackInfo, PlaybackSession, PlayerEvent, RatingSnapshot, ScrobbleMedia,
};
pub use sync_state::{SyncState, SyncStats};
