//! Wire types for the SIMKL API. Nothing in here leaks past the client; the
//! rest of the system only sees the uniform model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use watchbridge_models::{
    HistoryEpisode, HistoryMovie, HistorySeason, HistoryShow, MediaIds, ScrobbleMedia,
};

pub const API_BASE: &str = "https://api.simkl.com";

/// Numeric ids arrive as numbers or strings depending on the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Num(u64),
    Text(String),
}

impl IdValue {
    fn as_u64(&self) -> Option<u64> {
        match self {
            IdValue::Num(n) => Some(*n),
            IdValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimklIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simkl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<IdValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<IdValue>,
}

impl SimklIds {
    pub fn from_media_ids(ids: &MediaIds) -> Self {
        Self {
            // Slashes occasionally sneak into scraped imdb ids.
            imdb: ids.imdb.as_ref().map(|s| s.replace('/', "")),
            simkl: ids.simkl,
            tmdb: ids.tmdb.map(|id| IdValue::Text(id.to_string())),
            tvdb: ids.tvdb.map(|id| IdValue::Text(id.to_string())),
        }
    }

    pub fn to_media_ids(&self) -> MediaIds {
        MediaIds {
            imdb: self
                .imdb
                .as_ref()
                .map(|s| s.replace('/', ""))
                .filter(|s| !s.is_empty()),
            tmdb: self.tmdb.as_ref().and_then(|v| v.as_u64()).map(|v| v as u32),
            tvdb: self.tvdb.as_ref().and_then(|v| v.as_u64()).map(|v| v as u32),
            simkl: self.simkl,
            title: None,
            year: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimklTitle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default)]
    pub ids: Option<SimklIds>,
}

impl SimklTitle {
    pub fn to_media_ids(&self) -> MediaIds {
        let mut ids = self
            .ids
            .as_ref()
            .map(SimklIds::to_media_ids)
            .unwrap_or_default();
        ids.title = self.title.clone();
        ids.year = self.year;
        ids
    }
}

// ---- scrobble ----

#[derive(Debug, Serialize)]
pub struct ScrobbleEpisodeBody {
    pub season: u32,
    // SIMKL requires "number" for the episode number field.
    pub number: u32,
}

#[derive(Debug, Serialize)]
pub struct ScrobbleBody {
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie: Option<MovieBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<ShowBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<ScrobbleEpisodeBody>,
}

#[derive(Debug, Serialize)]
pub struct MovieBody {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub ids: SimklIds,
}

#[derive(Debug, Serialize)]
pub struct ShowBody {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub ids: SimklIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasons: Option<Vec<SeasonBody>>,
}

#[derive(Debug, Serialize)]
pub struct SeasonBody {
    pub number: u32,
    pub episodes: Vec<EpisodeBody>,
}

#[derive(Debug, Serialize)]
pub struct EpisodeBody {
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl ScrobbleBody {
    pub fn new(media: &ScrobbleMedia, progress: f64) -> Self {
        match media {
            ScrobbleMedia::Movie { title, year, ids } => Self {
                progress,
                movie: Some(MovieBody {
                    title: title.clone(),
                    year: *year,
                    ids: SimklIds::from_media_ids(ids),
                }),
                show: None,
                episode: None,
            },
            ScrobbleMedia::Episode {
                show_title,
                show_year,
                show_ids,
                season,
                number,
            } => Self {
                progress,
                movie: None,
                show: Some(ShowBody {
                    title: show_title.clone(),
                    year: *show_year,
                    ids: SimklIds::from_media_ids(show_ids),
                    seasons: None,
                }),
                episode: Some(ScrobbleEpisodeBody {
                    season: *season,
                    number: *number,
                }),
            },
        }
    }
}

// ---- history ----

#[derive(Debug, Serialize)]
pub struct AddHistoryBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movies: Option<Vec<HistoryMovieBody>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shows: Option<Vec<ShowBody>>,
}

#[derive(Debug, Serialize)]
pub struct HistoryMovieBody {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub ids: SimklIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<String>,
}

pub fn history_movie_body(movie: &HistoryMovie) -> HistoryMovieBody {
    HistoryMovieBody {
        title: movie.title.clone(),
        year: movie.year,
        ids: SimklIds::from_media_ids(&movie.ids),
        watched_at: movie.watched_at.map(format_timestamp),
    }
}

pub fn history_show_body(show: &HistoryShow) -> ShowBody {
    ShowBody {
        title: show.title.clone(),
        year: show.year,
        ids: SimklIds::from_media_ids(&show.ids),
        seasons: Some(
            show.seasons
                .iter()
                .map(|season| SeasonBody {
                    number: season.number,
                    episodes: season
                        .episodes
                        .iter()
                        .map(|ep| EpisodeBody {
                            number: ep.number,
                            watched_at: ep.watched_at.map(format_timestamp),
                            rating: None,
                        })
                        .collect(),
                })
                .collect(),
        ),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AddedCounts {
    #[serde(default)]
    pub movies: Option<usize>,
    #[serde(default)]
    pub episodes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddToHistoryResponse {
    #[serde(default)]
    pub added: Option<AddedCounts>,
}

// ---- all-items ----

#[derive(Debug, Deserialize)]
pub struct SimklAllItem {
    #[serde(default)]
    pub movie: Option<SimklTitle>,
    #[serde(default)]
    pub show: Option<SimklTitle>,
    #[serde(default)]
    pub anime: Option<SimklTitle>,
    #[serde(default)]
    pub seasons: Option<Vec<SimklSeason>>,
    #[serde(default)]
    pub last_watched_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SimklSeason {
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub episodes: Vec<SimklEpisodeRef>,
}

#[derive(Debug, Deserialize)]
pub struct SimklEpisodeRef {
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub watched_at: Option<String>,
}

/// The all-items endpoint returns either a plain list or an object keyed by
/// category depending on the request.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AllItemsResponse {
    List(Vec<SimklAllItem>),
    Keyed {
        #[serde(default)]
        movies: Option<Vec<SimklAllItem>>,
        #[serde(default)]
        shows: Option<Vec<SimklAllItem>>,
        #[serde(default)]
        anime: Option<Vec<SimklAllItem>>,
    },
}

impl AllItemsResponse {
    pub fn into_items(self, category: &str) -> Vec<SimklAllItem> {
        match self {
            AllItemsResponse::List(items) => items,
            AllItemsResponse::Keyed {
                movies,
                shows,
                anime,
            } => match category {
                "movies" => movies.unwrap_or_default(),
                "shows" => shows.or(anime).unwrap_or_default(),
                _ => Vec::new(),
            },
        }
    }
}

pub fn all_item_to_history_movie(item: &SimklAllItem) -> Option<HistoryMovie> {
    let movie = item.movie.as_ref()?;
    Some(HistoryMovie {
        title: movie.title.clone().unwrap_or_else(|| "Unknown".to_string()),
        year: movie.year,
        ids: movie.to_media_ids(),
        watched_at: item.last_watched_at.as_deref().and_then(parse_timestamp),
    })
}

pub fn all_item_to_history_show(item: &SimklAllItem) -> Option<HistoryShow> {
    let show = item.show.as_ref().or(item.anime.as_ref())?;
    Some(HistoryShow {
        title: show.title.clone().unwrap_or_else(|| "Unknown".to_string()),
        year: show.year,
        ids: show.to_media_ids(),
        seasons: item
            .seasons
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|season| HistorySeason {
                number: season.number,
                episodes: season
                    .episodes
                    .iter()
                    .map(|ep| HistoryEpisode {
                        number: ep.number,
                        watched_at: ep.watched_at.as_deref().and_then(parse_timestamp),
                    })
                    .collect(),
            })
            .collect(),
    })
}

// ---- ratings ----

#[derive(Debug, Serialize)]
pub struct RatingsBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movies: Option<Vec<RatedMovieBody>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shows: Option<Vec<ShowBody>>,
}

#[derive(Debug, Serialize)]
pub struct RatedMovieBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub ids: SimklIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RatingsResponse {
    #[serde(default)]
    pub movies: Option<Vec<SimklRatingItem>>,
    #[serde(default)]
    pub shows: Option<Vec<SimklRatingItem>>,
    #[serde(default)]
    pub anime: Option<Vec<SimklRatingItem>>,
}

#[derive(Debug, Deserialize)]
pub struct SimklRatingItem {
    #[serde(default)]
    pub user_rating: Option<u8>,
    #[serde(default)]
    pub movie: Option<SimklTitle>,
    #[serde(default)]
    pub show: Option<SimklTitle>,
    #[serde(default)]
    pub anime: Option<SimklTitle>,
}

// ---- users ----

#[derive(Debug, Default, Deserialize)]
pub struct UserSettingsResponse {
    #[serde(default)]
    pub user: Option<SimklUser>,
}

#[derive(Debug, Deserialize)]
pub struct SimklUser {
    #[serde(default)]
    pub name: Option<String>,
}

// ---- timestamps ----

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_values_parse_from_numbers_and_strings() {
        let ids: SimklIds =
            serde_json::from_str(r#"{"imdb":"tt0133093","tmdb":603,"tvdb":"71663"}"#).unwrap();
        let media = ids.to_media_ids();
        assert_eq!(media.imdb.as_deref(), Some("tt0133093"));
        assert_eq!(media.tmdb, Some(603));
        assert_eq!(media.tvdb, Some(71663));
    }

    #[test]
    fn all_items_accepts_list_and_keyed_shapes() {
        let list: AllItemsResponse =
            serde_json::from_str(r#"[{"movie":{"title":"Heat","ids":{"imdb":"tt0113277"}}}]"#)
                .unwrap();
        assert_eq!(list.into_items("movies").len(), 1);

        let keyed: AllItemsResponse = serde_json::from_str(
            r#"{"shows":[{"show":{"title":"Dark","ids":{"tvdb":332484}},"seasons":[{"number":1,"episodes":[{"number":1}]}]}]}"#,
        )
        .unwrap();
        let items = keyed.into_items("shows");
        assert_eq!(items.len(), 1);
        let show = all_item_to_history_show(&items[0]).unwrap();
        assert_eq!(show.episode_count(), 1);
    }

    #[test]
    fn scrobble_body_for_episode_uses_number_field() {
        let media = ScrobbleMedia::Episode {
            show_title: "Dark".to_string(),
            show_year: Some(2017),
            show_ids: MediaIds {
                tvdb: Some(332484),
                ..Default::default()
            },
            season: 1,
            number: 3,
        };
        let body = serde_json::to_value(ScrobbleBody::new(&media, 42.5)).unwrap();
        assert_eq!(body["episode"]["number"], 3);
        assert_eq!(body["episode"]["season"], 1);
        assert!(body.get("movie").is_none());
    }
}
