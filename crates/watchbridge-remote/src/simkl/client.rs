use async_trait::async_trait;
use reqwest::{header, Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use watchbridge_config::CredentialStore;
use watchbridge_models::{
    HistoryMovie, HistoryShow, MediaIds, MediaType, RemoteStatus, ScrobbleMedia,
};

use crate::error::RemoteError;
use crate::simkl::api::{self, API_BASE};
use crate::traits::{HistoryAdded, RemoteService, RemoteUser, ScrobbleAck, ScrobbleAction};

/// SIMKL API client. One instance is shared between the scrobbler and the
/// sync engine; the persistent reqwest client reuses connections across both.
pub struct SimklClient {
    client: Client,
    client_id: String,
    credentials_path: PathBuf,
    access_token: RwLock<Option<String>>,
}

impl SimklClient {
    pub fn new(client_id: String, credentials_path: PathBuf) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            client_id,
            credentials_path,
            access_token: RwLock::new(None),
        }
    }

    /// Load the stored access token before first use.
    pub async fn load_token(&self) -> bool {
        self.reload_token().await
    }

    async fn reload_token(&self) -> bool {
        let mut store = CredentialStore::new(self.credentials_path.clone());
        if let Err(e) = store.load() {
            warn!("Could not read credential store: {}", e);
            return false;
        }
        let new_token = store.get_access_token().cloned();
        let mut current = self.access_token.write().await;
        let changed = new_token.is_some() && new_token != *current;
        if changed {
            info!("Access token refreshed from session store");
        }
        *current = new_token;
        changed
    }

    /// One request with the shared headers, with at most one retry, and that
    /// only after a 401 when a token refresh actually produced a new token.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        query: Option<&[(&str, String)]>,
    ) -> Result<Response, RemoteError> {
        let url = format!("{}{}", API_BASE, path);
        let mut attempted_refresh = false;

        loop {
            let token = self.access_token.read().await.clone();
            let mut request = self
                .client
                .request(method.clone(), &url)
                .header("simkl-api-key", &self.client_id)
                .header(header::CONTENT_TYPE, "application/json");
            if let Some(token) = &token {
                request = request.bearer_auth(token);
            }
            if let Some(query) = query {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();
            debug!("{} {} -> HTTP {}", method, path, status.as_u16());

            match classify_status(status.as_u16(), attempted_refresh) {
                StatusAction::RefreshAndRetry => {
                    attempted_refresh = true;
                    if self.reload_token().await {
                        debug!("Retrying {} {} with refreshed token", method, path);
                        continue;
                    }
                    return Err(RemoteError::AuthExpired);
                }
                StatusAction::Fail(e) => return Err(e),
                StatusAction::Accept => return Ok(response),
            }
        }
    }

    async fn decode<T: DeserializeOwned + Default>(response: Response) -> Result<T, RemoteError> {
        let status = response.status();
        let text = response.text().await?;
        decode_body(status, &text)
    }

    async fn get_json<T: DeserializeOwned + Default>(
        &self,
        path: &str,
        query: Option<&[(&str, String)]>,
    ) -> Result<T, RemoteError> {
        let response = self.execute(Method::GET, path, None, query).await?;
        Self::decode(response).await
    }

    async fn post_json<T: DeserializeOwned + Default>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, RemoteError> {
        let response = self.execute(Method::POST, path, Some(body), None).await?;
        Self::decode(response).await
    }

    fn search_endpoint(media_type: MediaType) -> &'static str {
        match media_type {
            MediaType::Movie => "/search/movie",
            MediaType::Episode => "/search/tv",
        }
    }
}

#[async_trait]
impl RemoteService for SimklClient {
    async fn search(
        &self,
        media_type: MediaType,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<MediaIds>, RemoteError> {
        let mut params = vec![("q", query.to_string())];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }

        let results: Vec<api::SimklTitle> = self
            .get_json(Self::search_endpoint(media_type), Some(&params))
            .await?;
        debug!("Search '{}' returned {} result(s)", query, results.len());
        Ok(results.iter().map(api::SimklTitle::to_media_ids).collect())
    }

    async fn scrobble(
        &self,
        action: ScrobbleAction,
        media: &ScrobbleMedia,
        progress: f64,
    ) -> Result<ScrobbleAck, RemoteError> {
        let body = serde_json::to_value(api::ScrobbleBody::new(media, progress))
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        let path = format!("/scrobble/{}", action);
        let response = self.execute(Method::POST, &path, Some(&body), None).await?;

        // 409 means the item was scrobbled moments ago; the remote state is
        // already what we wanted, so this is a successful no-op.
        if response.status() == StatusCode::CONFLICT {
            info!("Scrobble {} acknowledged as duplicate (409)", action);
            return Ok(ScrobbleAck {
                already_recorded: true,
            });
        }
        if !response.status().is_success() {
            return Err(RemoteError::Server(response.status().as_u16()));
        }
        Ok(ScrobbleAck::default())
    }

    async fn add_to_history(
        &self,
        movies: &[HistoryMovie],
        shows: &[HistoryShow],
    ) -> Result<HistoryAdded, RemoteError> {
        let body = api::AddHistoryBody {
            movies: (!movies.is_empty())
                .then(|| movies.iter().map(api::history_movie_body).collect()),
            shows: (!shows.is_empty())
                .then(|| shows.iter().map(api::history_show_body).collect()),
        };
        let body = serde_json::to_value(body).map_err(|e| RemoteError::Decode(e.to_string()))?;

        let response: api::AddToHistoryResponse = self.post_json("/sync/history", &body).await?;
        let added = response.added.unwrap_or_default();
        Ok(HistoryAdded {
            movies: added.movies.unwrap_or_default(),
            episodes: added.episodes.unwrap_or_default(),
        })
    }

    async fn movie_history(&self, status: RemoteStatus) -> Result<Vec<HistoryMovie>, RemoteError> {
        let path = format!("/sync/all-items/movies/{}", status.as_str());
        let response: Option<api::AllItemsResponse> = self.get_json(&path, None).await?;
        let items = response
            .map(|r| r.into_items("movies"))
            .unwrap_or_default();
        Ok(items
            .iter()
            .filter_map(api::all_item_to_history_movie)
            .collect())
    }

    async fn show_history(&self, status: RemoteStatus) -> Result<Vec<HistoryShow>, RemoteError> {
        let path = format!("/sync/all-items/shows/{}", status.as_str());
        let response: Option<api::AllItemsResponse> = self.get_json(&path, None).await?;
        let items = response.map(|r| r.into_items("shows")).unwrap_or_default();
        Ok(items
            .iter()
            .filter_map(api::all_item_to_history_show)
            .collect())
    }

    async fn ratings(&self, media_type: MediaType) -> Result<Vec<(MediaIds, u8)>, RemoteError> {
        let response: api::RatingsResponse = self.get_json("/sync/ratings", None).await?;
        let items = match media_type {
            MediaType::Movie => response.movies.unwrap_or_default(),
            MediaType::Episode => {
                let mut shows = response.shows.unwrap_or_default();
                shows.extend(response.anime.unwrap_or_default());
                shows
            }
        };
        Ok(items
            .into_iter()
            .filter_map(|item| {
                let title = item.movie.or(item.show).or(item.anime)?;
                Some((title.to_media_ids(), item.user_rating?))
            })
            .collect())
    }

    async fn add_rating(&self, media: &ScrobbleMedia, rating: u8) -> Result<(), RemoteError> {
        let body = rating_body(media, Some(rating));
        let body = serde_json::to_value(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
        let _: serde_json::Value = self.post_json("/sync/ratings", &body).await?;
        Ok(())
    }

    async fn remove_rating(&self, media: &ScrobbleMedia) -> Result<(), RemoteError> {
        let body = rating_body(media, None);
        let body = serde_json::to_value(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
        let _: serde_json::Value = self.post_json("/sync/ratings/remove", &body).await?;
        Ok(())
    }

    async fn user_settings(&self) -> Result<RemoteUser, RemoteError> {
        let response: api::UserSettingsResponse = self.get_json("/users/settings", None).await?;
        Ok(RemoteUser {
            name: response.user.and_then(|u| u.name),
        })
    }

    async fn refresh_token(&self) -> bool {
        self.reload_token().await
    }
}

fn rating_body(media: &ScrobbleMedia, rating: Option<u8>) -> api::RatingsBody {
    match media {
        ScrobbleMedia::Movie { title, year, ids } => api::RatingsBody {
            movies: Some(vec![api::RatedMovieBody {
                rating,
                ids: api::SimklIds::from_media_ids(ids),
                title: Some(title.clone()),
                year: *year,
            }]),
            shows: None,
        },
        ScrobbleMedia::Episode {
            show_title,
            show_year,
            show_ids,
            season,
            number,
        } => api::RatingsBody {
            movies: None,
            shows: Some(vec![api::ShowBody {
                title: show_title.clone(),
                year: *show_year,
                ids: api::SimklIds::from_media_ids(show_ids),
                seasons: Some(vec![api::SeasonBody {
                    number: *season,
                    episodes: vec![api::EpisodeBody {
                        number: *number,
                        watched_at: None,
                        rating,
                    }],
                }]),
            }]),
        },
    }
}

/// What the shared request path does with a response status. A 401 asks for
/// one token refresh; a second 401 on the same call is a hard auth failure.
#[derive(Debug)]
enum StatusAction {
    Accept,
    RefreshAndRetry,
    Fail(RemoteError),
}

fn classify_status(status: u16, attempted_refresh: bool) -> StatusAction {
    match status {
        401 if attempted_refresh => StatusAction::Fail(RemoteError::AuthExpired),
        401 => StatusAction::RefreshAndRetry,
        404 => StatusAction::Fail(RemoteError::NotFound),
        429 => StatusAction::Fail(RemoteError::RateLimited),
        s if s >= 500 => StatusAction::Fail(RemoteError::Server(s)),
        _ => StatusAction::Accept,
    }
}

/// Decode a JSON body, treating 204 and empty bodies as the default value
/// and any remaining client error as a hard failure.
fn decode_body<T: DeserializeOwned + Default>(
    status: StatusCode,
    text: &str,
) -> Result<T, RemoteError> {
    if status == StatusCode::NO_CONTENT {
        return Ok(T::default());
    }
    if !status.is_success() {
        return Err(RemoteError::Server(status.as_u16()));
    }
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(text).map_err(|e| RemoteError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_credentials(dir: &TempDir, token: &str) -> PathBuf {
        let path = dir.path().join("credentials.toml");
        let mut store = CredentialStore::new(path.clone());
        store.set_access_token(token.to_string());
        store.save().unwrap();
        path
    }

    #[test]
    fn first_unauthorized_asks_for_a_refresh() {
        assert!(matches!(
            classify_status(401, false),
            StatusAction::RefreshAndRetry
        ));
    }

    #[test]
    fn second_unauthorized_is_a_hard_auth_failure() {
        assert!(matches!(
            classify_status(401, true),
            StatusAction::Fail(RemoteError::AuthExpired)
        ));
    }

    #[test]
    fn status_mapping_covers_the_error_table() {
        assert!(matches!(
            classify_status(404, false),
            StatusAction::Fail(RemoteError::NotFound)
        ));
        assert!(matches!(
            classify_status(429, false),
            StatusAction::Fail(RemoteError::RateLimited)
        ));
        assert!(matches!(
            classify_status(503, false),
            StatusAction::Fail(RemoteError::Server(503))
        ));
        assert!(matches!(classify_status(200, false), StatusAction::Accept));
        assert!(matches!(classify_status(409, false), StatusAction::Accept));
    }

    #[tokio::test]
    async fn reload_reports_change_only_when_the_token_moved() {
        let dir = TempDir::new().unwrap();
        let path = write_credentials(&dir, "token-a");
        let client = SimklClient::new("client-id".to_string(), path.clone());

        // First load picks the token up, a redundant reload is a no-op.
        assert!(client.reload_token().await);
        assert!(!client.reload_token().await);

        // A rewritten store is a real refresh again.
        write_credentials(&dir, "token-b");
        assert!(client.reload_token().await);
        assert!(!client.reload_token().await);
    }

    #[tokio::test]
    async fn reload_without_a_store_is_not_a_refresh() {
        let dir = TempDir::new().unwrap();
        let client =
            SimklClient::new("client-id".to_string(), dir.path().join("missing.toml"));
        assert!(!client.reload_token().await);
    }

    #[test]
    fn empty_and_no_content_bodies_decode_to_defaults() {
        let settings: api::UserSettingsResponse =
            decode_body(StatusCode::NO_CONTENT, "").unwrap();
        assert!(settings.user.is_none());
        let settings: api::UserSettingsResponse = decode_body(StatusCode::OK, "  ").unwrap();
        assert!(settings.user.is_none());
    }
}
