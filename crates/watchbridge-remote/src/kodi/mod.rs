pub mod client;
pub mod monitor;
pub(crate) mod rpc;

pub use client::KodiClient;
pub use monitor::PlayerMonitor;
