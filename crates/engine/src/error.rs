use crate::{config::SettingsError, state::StateError};
use model::window::DateWindow;
use thiserror::Error;
use transport::error::TransportError;

/// Top-level errors of a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The partition registry refuses to grow past its cap. Raised instead
    /// of silently evicting older partitions and their progress.
    #[error("Partition registry is full: {count} partitions exceeds the limit of {max}")]
    TooManyPartitions { count: usize, max: usize },

    /// A chunk request failed after retries; the whole slice is abandoned
    /// and its partial merges discarded.
    #[error("Upstream request failed for window {window} of partition {partition}: {source}")]
    UpstreamRequestFailed {
        partition: String,
        window: DateWindow,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}
