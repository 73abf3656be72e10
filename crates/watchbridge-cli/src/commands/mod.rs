pub mod auth;
pub mod clear;
pub mod daemon;
pub mod rate;
pub mod status;
pub mod sync;

use std::sync::Arc;

use color_eyre::Result;
use watchbridge_config::{Config, PathManager};
use watchbridge_core::{StateStore, SyncEngine, SyncOrchestrator};
use watchbridge_remote::{KodiClient, SimklClient};

pub struct AppContext {
    pub config: Config,
    pub paths: PathManager,
    pub simkl: Arc<SimklClient>,
    pub kodi: Arc<KodiClient>,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let paths = PathManager::new().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
        let config = Config::load(&paths.config_file())
            .map_err(|e| color_eyre::eyre::eyre!("Could not load config: {}", e))?;

        let simkl = Arc::new(SimklClient::new(
            config.simkl.client_id.clone(),
            paths.credentials_file(),
        ));
        let kodi = Arc::new(KodiClient::new(&config.kodi));

        Ok(Self {
            config,
            paths,
            simkl,
            kodi,
        })
    }

    pub fn orchestrator(&self, options: watchbridge_config::SyncOptions) -> Arc<SyncOrchestrator> {
        let engine = Arc::new(SyncEngine::new(
            self.simkl.clone(),
            self.kodi.clone(),
            StateStore::new(self.paths.sync_state_dir()),
            options,
        ));
        Arc::new(SyncOrchestrator::new(engine, self.paths.credentials_file()))
    }
}
