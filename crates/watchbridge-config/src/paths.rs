use anyhow::Result;
use std::path::PathBuf;

/// Well-known file locations under a single base directory.
///
/// The base is `WATCHBRIDGE_BASE_PATH` when set (containers mount a volume
/// there), otherwise the platform config directory plus `watchbridge`.
pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = match std::env::var("WATCHBRIDGE_BASE_PATH") {
            Ok(base) => PathBuf::from(base),
            Err(_) => dirs::config_dir()
                .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
                .join("watchbridge"),
        };

        Ok(Self {
            config_dir: base_dir.clone(),
            data_dir: base_dir.join("data"),
            log_dir: base_dir.join("logs"),
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("credentials.toml")
    }

    /// Directory holding the per-category sync-state blobs.
    pub fn sync_state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("watchbridge.log")
    }
}
