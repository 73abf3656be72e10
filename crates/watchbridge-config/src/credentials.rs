use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Flat key/value store for tokens and session bookkeeping, kept in a TOML
/// file outside the main config so the config can be checked in or shared.
///
/// Both the scrobbler and the sync engine may re-read the token through this
/// store; a refresh is a plain reload and is safe to invoke redundantly.
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn clear(&mut self) {
        self.credentials.clear();
    }

    // Convenience accessors for the keys this application actually uses.

    pub fn get_access_token(&self) -> Option<&String> {
        self.get("simkl_access_token")
    }

    pub fn set_access_token(&mut self, token: String) {
        self.set("simkl_access_token".to_string(), token);
    }

    pub fn get_username(&self) -> Option<&String> {
        self.get("simkl_username")
    }

    pub fn set_username(&mut self, username: String) {
        self.set("simkl_username".to_string(), username);
    }

    pub fn get_last_sync_time(&self) -> Option<DateTime<Utc>> {
        self.get("last_sync_time")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn set_last_sync_time(&mut self, time: DateTime<Utc>) {
        self.set("last_sync_time".to_string(), time.to_rfc3339());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn round_trips_through_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.toml");

        let mut store = CredentialStore::new(path.clone());
        store.set_access_token("abc123".to_string());
        store.set_username("someone".to_string());
        store.save().unwrap();

        let mut reloaded = CredentialStore::new(path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.get_access_token().map(String::as_str), Some("abc123"));
        assert_eq!(reloaded.get_username().map(String::as_str), Some("someone"));
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let mut store = CredentialStore::new(dir.path().join("nope.toml"));
        store.load().unwrap();
        assert!(store.get_access_token().is_none());
    }
}
