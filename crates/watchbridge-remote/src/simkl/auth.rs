use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::RemoteError;
use crate::simkl::api::API_BASE;

/// Issued device PIN. The user enters `user_code` at `verification_url`;
/// the caller polls until the grant lands or `expires_in` runs out.
#[derive(Debug, Clone)]
pub struct DevicePin {
    pub user_code: String,
    pub verification_url: String,
    pub expires_in: u64,
    pub interval: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinPoll {
    Pending,
    Granted { access_token: String },
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(default)]
    user_code: Option<String>,
    #[serde(default)]
    verification_url: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    interval: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PinStatusResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

pub fn create_auth_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Ask the remote service for a device PIN. Device auth needs only the
/// public client id, no secret.
pub async fn request_pin(client: &Client, client_id: &str) -> Result<DevicePin, RemoteError> {
    let url = format!("{}/oauth/pin", API_BASE);
    let response = client
        .get(&url)
        .query(&[("client_id", client_id)])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(RemoteError::Server(response.status().as_u16()));
    }

    let body: PinResponse = response
        .json()
        .await
        .map_err(|e| RemoteError::Decode(e.to_string()))?;

    let user_code = body
        .user_code
        .ok_or_else(|| RemoteError::Decode("pin response missing user_code".to_string()))?;
    debug!("Issued device PIN {}", user_code);

    Ok(DevicePin {
        verification_url: body
            .verification_url
            .unwrap_or_else(|| "https://simkl.com/pin".to_string()),
        user_code,
        expires_in: body.expires_in.unwrap_or(900),
        interval: body.interval.unwrap_or(5).max(1),
    })
}

/// One poll of the PIN status endpoint. `Pending` until the user enters the
/// code; respect `DevicePin::interval` between calls.
pub async fn poll_pin(
    client: &Client,
    client_id: &str,
    user_code: &str,
) -> Result<PinPoll, RemoteError> {
    let url = format!("{}/oauth/pin/{}", API_BASE, user_code);
    let response = client
        .get(&url)
        .query(&[("client_id", client_id)])
        .send()
        .await?;

    if response.status().as_u16() == 429 {
        return Err(RemoteError::RateLimited);
    }
    if !response.status().is_success() {
        return Err(RemoteError::Server(response.status().as_u16()));
    }

    let body: PinStatusResponse = response
        .json()
        .await
        .map_err(|e| RemoteError::Decode(e.to_string()))?;

    match (body.result.as_deref(), body.access_token) {
        (Some("OK"), Some(access_token)) => Ok(PinPoll::Granted { access_token }),
        _ => Ok(PinPoll::Pending),
    }
}
