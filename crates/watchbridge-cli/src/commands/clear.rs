use color_eyre::Result;
use watchbridge_config::{CredentialStore, PathManager};

use crate::output::Output;

pub fn run_clear(credentials: bool, state: bool, all: bool, output: &Output) -> Result<()> {
    if !credentials && !state && !all {
        output.warn("Nothing selected. Use --credentials, --state, or --all.");
        return Ok(());
    }

    let paths = PathManager::new().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    if credentials || all {
        let mut store = CredentialStore::new(paths.credentials_file());
        store.load().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
        store.clear();
        store.save().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
        output.success("Cleared stored credentials");
    }

    if state || all {
        let state_dir = paths.sync_state_dir();
        if state_dir.exists() {
            std::fs::remove_dir_all(&state_dir)?;
        }
        output.success("Cleared sync state; the next pass exports everything");
    }

    Ok(())
}
