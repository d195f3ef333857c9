// mixdeck-api: Async Rust client for the mixer backend's control API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::MixerClient;
pub use error::Error;
pub use models::{ControlPatch, ControlRecord, PatchValue};
pub use transport::TransportConfig;
