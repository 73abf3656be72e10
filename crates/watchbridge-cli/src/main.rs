use clap::{ArgAction, Parser, Subcommand};
use commands::{auth, clear, daemon, rate, status, sync};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "watchbridge")]
#[command(about = "Watchbridge - keep your Kodi library and Simkl watch history in step")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with Simkl (device PIN flow)
    #[command(long_about = "Request a device PIN from Simkl, wait for you to enter it at the verification URL, and store the resulting access token.")]
    Auth,

    /// Run one sync pass between Kodi and Simkl
    #[command(long_about = "Export locally watched items to Simkl and import the Simkl watch history into Kodi. Without flags both categories sync in both directions per the config.")]
    Sync {
        /// Sync movies only
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "episodes")]
        movies: bool,

        /// Sync episodes only
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "movies")]
        episodes: bool,

        /// Unwatch local items Simkl no longer lists as watched
        #[arg(long, action = ArgAction::SetTrue)]
        unmark_missing: bool,
    },

    /// Run the scrobbler and scheduled sync in the foreground
    #[command(long_about = "Watch Kodi playback and scrobble it to Simkl in real time, and run sync passes on the configured cron schedule.")]
    Daemon {
        /// Cron schedule expression (overrides the configured one)
        #[arg(long, value_name = "SCHEDULE")]
        schedule: Option<String>,

        /// Skip the sync pass normally run on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,
    },

    /// Rate a movie on Simkl, or list your ratings
    Rate {
        /// Title to rate (resolved via Simkl search)
        title: Option<String>,

        /// Release year, to disambiguate the search
        #[arg(long)]
        year: Option<u32>,

        /// Rating from 1 to 10
        #[arg(long, conflicts_with = "remove")]
        rating: Option<u8>,

        /// Remove the existing rating instead
        #[arg(long, action = ArgAction::SetTrue)]
        remove: bool,

        /// List current ratings instead of rating
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["title", "rating", "remove"])]
        list: bool,
    },

    /// Show authentication and sync status
    Status,

    /// Clear stored credentials or sync state
    Clear {
        /// Clear the stored Simkl token and username
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,

        /// Clear delta-sync state (forces a full export next pass)
        #[arg(long, action = ArgAction::SetTrue)]
        state: bool,

        /// Clear everything
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["credentials", "state"])]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // The daemon logs to a rotating file; one-shot commands log to stderr.
    let log_file = match &cli.command {
        Commands::Daemon { .. } => watchbridge_config::PathManager::new()
            .ok()
            .map(|paths| paths.log_file()),
        _ => None,
    };
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Auth => auth::run_auth(&output).await,
        Commands::Sync {
            movies,
            episodes,
            unmark_missing,
        } => sync::run_sync(movies, episodes, unmark_missing, &output).await,
        Commands::Daemon {
            schedule,
            no_startup_sync,
        } => daemon::run_daemon(schedule, no_startup_sync, &output).await,
        Commands::Rate {
            title,
            year,
            rating,
            remove,
            list,
        } => rate::run_rate(title, year, rating, remove, list, &output).await,
        Commands::Status => status::run_status(&output).await,
        Commands::Clear {
            credentials,
            state,
            all,
        } => clear::run_clear(credentials, state, all, &output),
    }
}
