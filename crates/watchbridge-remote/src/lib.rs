//! Remote service and media library adapters.
//!
//! The traits in [`traits`] are the only surface the sync engine and the
//! scrobbler see. Wire formats live inside the adapter modules and never
//! leak past the trait boundary.

pub mod error;
pub mod kodi;
pub mod simkl;
pub mod traits;

pub use error::{LibraryError, RemoteError};
pub use kodi::{KodiClient, PlayerMonitor};
pub use simkl::SimklClient;
pub use traits::{
    HistoryAdded, MediaLibrary, PlayerHandle, RemoteService, RemoteUser, ScrobbleAck,
    ScrobbleAction,
};
