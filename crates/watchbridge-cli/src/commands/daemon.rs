use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use tokio::sync::{mpsc, watch};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};
use watchbridge_config::default_scheduler_config;
use watchbridge_core::{NoRatingPrompt, ScrobbleService, Scrobbler};
use watchbridge_remote::PlayerMonitor;

use crate::commands::AppContext;
use crate::output::Output;

/// How long shutdown waits for an in-flight sync pass before releasing
/// shared connections anyway.
const SYNC_SHUTDOWN_WAIT: Duration = Duration::from_secs(3);

pub async fn run_daemon(
    schedule_override: Option<String>,
    no_startup_sync: bool,
    output: &Output,
) -> Result<()> {
    let ctx = AppContext::load()?;

    if !ctx.simkl.load_token().await {
        output.error("Not authenticated. Run `watchbridge auth` first.");
        return Err(color_eyre::eyre::eyre!("missing access token"));
    }

    let scheduler_config = ctx
        .config
        .scheduler
        .clone()
        .unwrap_or_else(default_scheduler_config);
    let schedule = schedule_override.unwrap_or(scheduler_config.schedule);

    let orchestrator = ctx.orchestrator(ctx.config.sync.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let monitor = PlayerMonitor::new(ctx.kodi.clone(), event_tx, shutdown_rx.clone());
    let monitor_task = tokio::spawn(monitor.run());

    let scrobbler = Scrobbler::new(
        ctx.simkl.clone(),
        ctx.kodi.clone(),
        Arc::new(NoRatingPrompt),
        &ctx.config.scrobble,
    );
    let service = ScrobbleService::new(scrobbler, event_rx, shutdown_rx.clone());
    let service_task = tokio::spawn(service.run());

    if scheduler_config.run_on_startup && !no_startup_sync {
        info!("Running startup sync pass");
        orchestrator.trigger().await;
    }

    let mut scheduler = JobScheduler::new().await?;
    let job_orchestrator = orchestrator.clone();
    let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let orchestrator = job_orchestrator.clone();
        Box::pin(async move {
            orchestrator.trigger().await;
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;

    output.info(format!(
        "Daemon running. Scrobbling playback and syncing on schedule '{}'. Ctrl-C to stop.",
        schedule
    ));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    let _ = shutdown_tx.send(true);

    if let Err(e) = scheduler.shutdown().await {
        warn!(error = %e, "Scheduler did not shut down cleanly");
    }
    if !orchestrator.wait_until_idle(SYNC_SHUTDOWN_WAIT).await {
        warn!("Sync pass still running at shutdown, abandoning it");
    }

    let _ = monitor_task.await;
    let _ = service_task.await;

    output.info("Daemon stopped.");
    Ok(())
}
