use color_eyre::Result;
use owo_colors::OwoColorize;
use watchbridge_config::{Config, CredentialStore, PathManager};

use crate::output::Output;

pub async fn run_status(output: &Output) -> Result<()> {
    let paths = PathManager::new().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
    let config = Config::load(&paths.config_file())
        .map_err(|e| color_eyre::eyre::eyre!("Could not load config: {}", e))?;

    let mut store = CredentialStore::new(paths.credentials_file());
    store.load().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    match (store.get_access_token(), store.get_username()) {
        (Some(_), Some(name)) => output.success(format!("Authenticated as {}", name.bold())),
        (Some(_), None) => output.success("Authenticated with Simkl"),
        (None, _) => output.warn("Not authenticated. Run `watchbridge auth`."),
    }

    match store.get_last_sync_time() {
        Some(time) => output.info(format!(
            "Last sync: {}",
            time.format("%Y-%m-%d %H:%M:%S UTC")
        )),
        None => output.info("Last sync: never"),
    }

    output.info(format!("Kodi endpoint: {}", config.kodi.url));
    output.info(format!(
        "Scrobbling: movies {}, episodes {} (watched at {}%)",
        enabled(config.scrobble.movies),
        enabled(config.scrobble.episodes),
        config.scrobble.watched_threshold
    ));
    output.info(format!(
        "Unmark missing: {}",
        enabled(config.sync.unmark_missing)
    ));
    output.info(format!("Config file: {}", paths.config_file().display()));
    Ok(())
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
