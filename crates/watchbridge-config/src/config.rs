use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub simkl: SimklConfig,
    #[serde(default)]
    pub kodi: KodiConfig,
    #[serde(default)]
    pub scrobble: ScrobbleConfig,
    #[serde(default)]
    pub sync: SyncOptions,
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimklConfig {
    /// Registered application id sent with every request. Device auth does
    /// not need a client secret.
    #[serde(default = "default_simkl_client_id")]
    pub client_id: String,
}

impl Default for SimklConfig {
    fn default() -> Self {
        Self {
            client_id: default_simkl_client_id(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KodiConfig {
    /// Base URL of Kodi's JSON-RPC HTTP endpoint.
    #[serde(default = "default_kodi_url")]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for KodiConfig {
    fn default() -> Self {
        Self {
            url: default_kodi_url(),
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScrobbleConfig {
    #[serde(default = "default_true")]
    pub movies: bool,
    #[serde(default = "default_true")]
    pub episodes: bool,
    /// Local watched threshold in percent. The remote service applies its own
    /// fixed 80% threshold on the stop call.
    #[serde(default = "default_watched_threshold")]
    pub watched_threshold: u8,
    #[serde(default)]
    pub exclusions: ExclusionConfig,
}

impl Default for ScrobbleConfig {
    fn default() -> Self {
        Self {
            movies: true,
            episodes: true,
            watched_threshold: default_watched_threshold(),
            exclusions: ExclusionConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct ExclusionConfig {
    /// Skip live TV sources (pvr://).
    #[serde(default)]
    pub live_tv: bool,
    /// Skip http:// and https:// streams.
    #[serde(default)]
    pub http: bool,
    /// Skip addon-triggered playback (plugin://).
    #[serde(default)]
    pub plugin: bool,
    /// Skip anything under these path prefixes.
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncOptions {
    #[serde(default = "default_true")]
    pub export_movies: bool,
    #[serde(default = "default_true")]
    pub export_episodes: bool,
    #[serde(default = "default_true")]
    pub import_movies: bool,
    #[serde(default = "default_true")]
    pub import_episodes: bool,
    /// Full-set reconciliation: unwatch local items the remote no longer
    /// lists as watched. Off by default; this is a destructive comparison,
    /// not a delta.
    #[serde(default)]
    pub unmark_missing: bool,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            export_movies: true,
            export_episodes: true,
            import_movies: true,
            import_episodes: true,
            unmark_missing: false,
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Cron expression for scheduled sync passes.
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        schedule: default_schedule(),
        run_on_startup: true,
    }
}

fn default_simkl_client_id() -> String {
    // Public application id, safe to ship in config defaults.
    "ab02f10030b0d629ffada90e2bf6236c57f42256a9e94d243255392af7b391e7".to_string()
}

fn default_kodi_url() -> String {
    "http://127.0.0.1:8080/jsonrpc".to_string()
}

fn default_watched_threshold() -> u8 {
    70
}

fn default_batch_size() -> usize {
    100
}

fn default_schedule() -> String {
    // Every 6 hours.
    "0 0 */6 * * *".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = Config::default();
        assert_eq!(config.scrobble.watched_threshold, 70);
        assert_eq!(config.sync.batch_size, 100);
        assert!(!config.sync.unmark_missing);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scrobble]
            watched_threshold = 85

            [sync]
            unmark_missing = true
            "#,
        )
        .unwrap();
        assert_eq!(config.scrobble.watched_threshold, 85);
        assert!(config.sync.unmark_missing);
        assert!(config.scrobble.movies);
        assert_eq!(config.sync.batch_size, 100);
    }
}
