use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use watchbridge_config::KodiConfig;
use watchbridge_models::{LibraryEpisode, LibraryMovie, LibraryShow};

use crate::error::LibraryError;
use crate::kodi::rpc::{self, RpcRequest, RpcResponse};
use crate::traits::{MediaLibrary, PlayerHandle};

/// Media library adapter over Kodi's JSON-RPC HTTP endpoint. Also serves as
/// the live player handle for the scrobbler, since both surfaces live on the
/// same RPC socket.
pub struct KodiClient {
    client: Client,
    url: String,
    username: Option<String>,
    password: Option<String>,
}

impl KodiClient {
    pub fn new(config: &KodiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<T, LibraryError> {
        let request = RpcRequest::new(method, params);
        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(username) = &self.username {
            builder = builder.basic_auth(username, self.password.as_deref());
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LibraryError::Rpc(format!(
                "{} returned HTTP {}",
                method,
                status.as_u16()
            )));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| LibraryError::Decode(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(LibraryError::Rpc(format!(
                "{} failed: {} (code {})",
                method, error.message, error.code
            )));
        }

        let result = envelope
            .result
            .ok_or_else(|| LibraryError::Decode(format!("{} returned no result", method)))?;
        serde_json::from_value(result).map_err(|e| LibraryError::Decode(e.to_string()))
    }

    /// Same call surface, but used where a failure is routine (player idle,
    /// item mid-transition) and should read as absence, not as an error.
    async fn call_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Option<T> {
        match self.call(method, params).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("{} unavailable: {}", method, e);
                None
            }
        }
    }

    async fn active_video_player(&self) -> Option<u32> {
        let players: Vec<rpc::ActivePlayer> = self.call_optional("Player.GetActivePlayers", None).await?;
        players
            .into_iter()
            .find(|p| p.player_type == "video")
            .map(|p| p.playerid)
    }

    pub(crate) async fn player_properties(&self) -> Option<rpc::PlayerProperties> {
        let playerid = self.active_video_player().await?;
        self.call_optional(
            "Player.GetProperties",
            Some(json!({
                "playerid": playerid,
                "properties": ["time", "totaltime", "speed"],
            })),
        )
        .await
    }

    pub(crate) async fn player_item(&self) -> Option<rpc::PlayerItem> {
        let playerid = self.active_video_player().await?;
        let result: rpc::GetItemResult = self
            .call_optional(
                "Player.GetItem",
                Some(json!({
                    "playerid": playerid,
                    "properties": ["title", "year", "showtitle", "season", "episode", "file", "uniqueid"],
                })),
            )
            .await?;
        result.item
    }
}

#[async_trait]
impl MediaLibrary for KodiClient {
    async fn movies(&self) -> Result<Vec<LibraryMovie>, LibraryError> {
        let result: rpc::GetMoviesResult = self
            .call(
                "VideoLibrary.GetMovies",
                Some(json!({
                    "properties": ["title", "year", "imdbnumber", "uniqueid", "playcount", "lastplayed"],
                })),
            )
            .await?;

        debug!("Library returned {} movies", result.movies.len());
        Ok(result
            .movies
            .into_iter()
            .map(|m| LibraryMovie {
                ids: rpc::extract_ids(m.uniqueid.as_ref(), m.imdbnumber.as_deref(), false),
                movie_id: m.movieid,
                title: m.title,
                year: m.year,
                play_count: m.playcount.unwrap_or(0),
                last_played: rpc::parse_lastplayed(m.lastplayed.as_deref()),
            })
            .collect())
    }

    async fn episodes(&self) -> Result<Vec<LibraryEpisode>, LibraryError> {
        let result: rpc::GetEpisodesResult = self
            .call(
                "VideoLibrary.GetEpisodes",
                Some(json!({
                    "properties": ["showtitle", "season", "episode", "uniqueid", "playcount", "lastplayed", "tvshowid"],
                })),
            )
            .await?;

        debug!("Library returned {} episodes", result.episodes.len());
        Ok(result
            .episodes
            .into_iter()
            .map(|e| LibraryEpisode {
                ids: rpc::extract_ids(e.uniqueid.as_ref(), None, false),
                episode_id: e.episodeid,
                show_id: e.tvshowid,
                show_title: e.showtitle,
                season: e.season,
                episode: e.episode,
                play_count: e.playcount.unwrap_or(0),
                last_played: rpc::parse_lastplayed(e.lastplayed.as_deref()),
            })
            .collect())
    }

    async fn shows(&self) -> Result<Vec<LibraryShow>, LibraryError> {
        let result: rpc::GetTvShowsResult = self
            .call(
                "VideoLibrary.GetTVShows",
                Some(json!({
                    "properties": ["title", "year", "imdbnumber", "uniqueid"],
                })),
            )
            .await?;

        debug!("Library returned {} shows", result.tvshows.len());
        Ok(result
            .tvshows
            .into_iter()
            .map(|s| LibraryShow {
                ids: rpc::extract_ids(s.uniqueid.as_ref(), s.imdbnumber.as_deref(), true),
                show_id: s.tvshowid,
                title: s.title,
                year: s.year,
            })
            .collect())
    }

    async fn set_movie_play_count(
        &self,
        movie_id: u32,
        play_count: u32,
    ) -> Result<(), LibraryError> {
        let _: serde_json::Value = self
            .call(
                "VideoLibrary.SetMovieDetails",
                Some(json!({ "movieid": movie_id, "playcount": play_count })),
            )
            .await?;
        Ok(())
    }

    async fn set_episode_play_count(
        &self,
        episode_id: u32,
        play_count: u32,
    ) -> Result<(), LibraryError> {
        let _: serde_json::Value = self
            .call(
                "VideoLibrary.SetEpisodeDetails",
                Some(json!({ "episodeid": episode_id, "playcount": play_count })),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PlayerHandle for KodiClient {
    async fn is_playing_video(&self) -> bool {
        self.active_video_player().await.is_some()
    }

    async fn position_secs(&self) -> Option<f64> {
        self.player_properties().await.map(|p| p.time.as_secs())
    }

    async fn duration_secs(&self) -> Option<f64> {
        self.player_properties()
            .await
            .map(|p| p.totaltime.as_secs())
    }

    async fn playing_file(&self) -> Option<String> {
        self.player_item().await.and_then(|item| item.file)
    }
}
