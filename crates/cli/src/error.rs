use engine::{config::SettingsError, error::SyncError, state::StateError};
use thiserror::Error;
use transport::error::TransportError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read the configuration file: {0}")]
    ConfigFileRead(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] SettingsError),

    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Transport setup failed: {0}")]
    Transport(#[from] TransportError),

    #[error("State store failure: {0}")]
    State(#[from] StateError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(serde_json::Error),
}
