use thiserror::Error;

/// Failures at the HTTP boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A request was given both a JSON body and a form body. Caught before
    /// any bytes are sent.
    #[error("Request may carry either a JSON body or a form body, not both")]
    ConflictingRequestBody,

    #[error("Access token environment variable `{0}` is not set")]
    MissingToken(String),

    #[error("HTTP transport failure: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}
