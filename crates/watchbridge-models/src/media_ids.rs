use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Normalized external identifiers for a title.
///
/// Aggregates ids from the namespaces both sides of the bridge understand
/// (IMDb, TMDb, TVDB, and the remote service's native id) so the same title
/// can be matched across the local library and the remote watch history.
///
/// Title and year ride along for search fallback; they are not used for
/// id-based matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaIds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simkl: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
}

impl MediaIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical primary key, preferring imdb and falling back through the
    /// remaining namespaces with a prefix so numeric ids cannot collide.
    pub fn primary_id(&self) -> Option<String> {
        self.imdb
            .clone()
            .or_else(|| self.tmdb.map(|id| format!("tmdb:{}", id)))
            .or_else(|| self.tvdb.map(|id| format!("tvdb:{}", id)))
            .or_else(|| self.simkl.map(|id| format!("simkl:{}", id)))
    }

    /// True when no external id is present in any namespace.
    pub fn is_empty(&self) -> bool {
        self.imdb.is_none() && self.tmdb.is_none() && self.tvdb.is_none() && self.simkl.is_none()
    }

    /// Merge ids from another record, only filling in missing values.
    pub fn merge(&mut self, other: &MediaIds) {
        if self.imdb.is_none() {
            self.imdb = other.imdb.clone();
        }
        if self.tmdb.is_none() {
            self.tmdb = other.tmdb;
        }
        if self.tvdb.is_none() {
            self.tvdb = other.tvdb;
        }
        if self.simkl.is_none() {
            self.simkl = other.simkl;
        }
        if self.title.is_none() {
            self.title = other.title.clone();
        }
        if self.year.is_none() {
            self.year = other.year;
        }
    }

    pub fn with_metadata(mut self, title: impl Into<String>, year: Option<u32>) -> Self {
        self.title = Some(title.into());
        self.year = year;
        self
    }
}

impl Hash for MediaIds {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.imdb.hash(state);
        self.tmdb.hash(state);
        self.tvdb.hash(state);
        self.simkl.hash(state);
    }
}
