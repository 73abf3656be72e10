use color_eyre::Result;
use watchbridge_core::TriggerOutcome;

use crate::commands::AppContext;
use crate::output::Output;

pub async fn run_sync(
    movies_only: bool,
    episodes_only: bool,
    unmark_missing: bool,
    output: &Output,
) -> Result<()> {
    let ctx = AppContext::load()?;

    if !ctx.simkl.load_token().await {
        output.error("Not authenticated. Run `watchbridge auth` first.");
        return Err(color_eyre::eyre::eyre!("missing access token"));
    }

    let mut options = ctx.config.sync.clone();
    if movies_only {
        options.export_episodes = false;
        options.import_episodes = false;
    }
    if episodes_only {
        options.export_movies = false;
        options.import_movies = false;
    }
    if unmark_missing {
        options.unmark_missing = true;
    }

    output.info("Starting sync pass...");
    let orchestrator = ctx.orchestrator(options);
    match orchestrator.trigger().await {
        TriggerOutcome::Completed(stats) => {
            output.sync_summary(&stats);
            if stats.errors > 0 {
                output.warn("Sync finished with errors; see the log for details.");
            } else {
                output.success("Sync complete");
            }
            Ok(())
        }
        TriggerOutcome::AlreadyRunning => {
            output.warn("A sync pass is already running.");
            Ok(())
        }
    }
}
