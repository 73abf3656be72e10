pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{
    default_scheduler_config, Config, ExclusionConfig, KodiConfig, SchedulerConfig,
    ScrobbleConfig, SimklConfig, SyncOptions,
};
pub use credentials::CredentialStore;
pub use paths::PathManager;
