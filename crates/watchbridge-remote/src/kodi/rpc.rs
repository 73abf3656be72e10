//! Kodi JSON-RPC wire shapes. Field naming follows Kodi's VideoLibrary and
//! Player APIs; extraction into the uniform model types happens here so the
//! rest of the system never sees `uniqueid` or `imdbnumber`.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use watchbridge_models::MediaIds;

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u32,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

// ---- VideoLibrary ----

#[derive(Debug, Default, Deserialize)]
pub struct GetMoviesResult {
    #[serde(default)]
    pub movies: Vec<KodiMovie>,
}

#[derive(Debug, Deserialize)]
pub struct KodiMovie {
    pub movieid: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub imdbnumber: Option<String>,
    #[serde(default)]
    pub uniqueid: Option<HashMap<String, String>>,
    #[serde(default)]
    pub playcount: Option<u32>,
    #[serde(default)]
    pub lastplayed: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GetEpisodesResult {
    #[serde(default)]
    pub episodes: Vec<KodiEpisode>,
}

#[derive(Debug, Deserialize)]
pub struct KodiEpisode {
    pub episodeid: u32,
    #[serde(default)]
    pub tvshowid: u32,
    #[serde(default)]
    pub showtitle: String,
    #[serde(default)]
    pub season: u32,
    #[serde(default)]
    pub episode: u32,
    #[serde(default)]
    pub uniqueid: Option<HashMap<String, String>>,
    #[serde(default)]
    pub playcount: Option<u32>,
    #[serde(default)]
    pub lastplayed: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GetTvShowsResult {
    #[serde(default)]
    pub tvshows: Vec<KodiTvShow>,
}

#[derive(Debug, Deserialize)]
pub struct KodiTvShow {
    pub tvshowid: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub imdbnumber: Option<String>,
    #[serde(default)]
    pub uniqueid: Option<HashMap<String, String>>,
}

// ---- Player ----

#[derive(Debug, Deserialize)]
pub struct ActivePlayer {
    pub playerid: u32,
    #[serde(rename = "type", default)]
    pub player_type: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayerTime {
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub seconds: u32,
    #[serde(default)]
    pub milliseconds: u32,
}

impl PlayerTime {
    pub fn as_secs(&self) -> f64 {
        f64::from(self.hours) * 3600.0
            + f64::from(self.minutes) * 60.0
            + f64::from(self.seconds)
            + f64::from(self.milliseconds) / 1000.0
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayerProperties {
    #[serde(default)]
    pub time: PlayerTime,
    #[serde(default)]
    pub totaltime: PlayerTime,
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct GetItemResult {
    #[serde(default)]
    pub item: Option<PlayerItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayerItem {
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub showtitle: Option<String>,
    #[serde(default)]
    pub season: Option<i64>,
    #[serde(default)]
    pub episode: Option<i64>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub uniqueid: Option<HashMap<String, String>>,
}

// ---- id extraction ----

/// Pull external ids out of Kodi's `uniqueid` map and legacy `imdbnumber`
/// field. A numeric `imdbnumber` is a TVDB id on shows scraped by older
/// scrapers; `for_show` controls that fallback.
pub fn extract_ids(
    uniqueid: Option<&HashMap<String, String>>,
    imdbnumber: Option<&str>,
    for_show: bool,
) -> MediaIds {
    let mut ids = MediaIds::new();

    if let Some(uniqueid) = uniqueid {
        if let Some(imdb) = uniqueid.get("imdb").filter(|s| !s.is_empty()) {
            ids.imdb = Some(imdb.clone());
        }
        if let Some(tmdb) = uniqueid.get("tmdb").and_then(|s| s.trim().parse().ok()) {
            ids.tmdb = Some(tmdb);
        }
        if let Some(tvdb) = uniqueid.get("tvdb").and_then(|s| s.trim().parse().ok()) {
            ids.tvdb = Some(tvdb);
        }
    }

    if let Some(imdbnumber) = imdbnumber.filter(|s| !s.is_empty()) {
        if imdbnumber.starts_with("tt") {
            if ids.imdb.is_none() {
                ids.imdb = Some(imdbnumber.to_string());
            }
        } else if for_show && ids.tvdb.is_none() {
            ids.tvdb = imdbnumber.trim().parse().ok();
        }
    }

    ids
}

/// Kodi stores `lastplayed` as "YYYY-MM-DD HH:MM:SS" in local time.
pub fn parse_lastplayed(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value.filter(|s| !s.is_empty())?;
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").ok()?;
    Local
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniqueid(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn extracts_from_uniqueid_map() {
        let ids = extract_ids(
            Some(&uniqueid(&[("imdb", "tt0133093"), ("tmdb", "603")])),
            None,
            false,
        );
        assert_eq!(ids.imdb.as_deref(), Some("tt0133093"));
        assert_eq!(ids.tmdb, Some(603));
    }

    #[test]
    fn numeric_imdbnumber_becomes_tvdb_for_shows_only() {
        let as_show = extract_ids(None, Some("71663"), true);
        assert_eq!(as_show.tvdb, Some(71663));

        let as_movie = extract_ids(None, Some("71663"), false);
        assert!(as_movie.is_empty());
    }

    #[test]
    fn imdbnumber_tt_prefix_wins_when_uniqueid_missing() {
        let ids = extract_ids(None, Some("tt0071663"), false);
        assert_eq!(ids.imdb.as_deref(), Some("tt0071663"));
    }
}
