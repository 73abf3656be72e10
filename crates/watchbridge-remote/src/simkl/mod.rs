pub mod api;
pub mod auth;
pub mod client;

pub use auth::{create_auth_client, poll_pin, request_pin, DevicePin, PinPoll};
pub use client::SimklClient;
