use crate::{
    error::TransportError,
    request::{ApiRequest, Method, RequestBody},
};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const ERROR_BODY_SNIPPET: usize = 256;

/// Response with the payload already decoded from JSON.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// Capability to execute one prepared request against the upstream.
pub trait Requester: Send + Sync {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Default requester over a blocking HTTP client.
///
/// The query string is baked into the URL before the client sees it, so the
/// client never re-encodes the structured grammar.
pub struct HttpRequester {
    client: reqwest::blocking::Client,
    bearer_token: String,
    default_headers: Vec<(String, String)>,
}

impl HttpRequester {
    pub fn new(bearer_token: String) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            bearer_token,
            default_headers: Vec::new(),
        })
    }

    /// Reads the bearer token from the named environment variable.
    pub fn from_env(var: &str) -> Result<Self, TransportError> {
        let token =
            std::env::var(var).map_err(|_| TransportError::MissingToken(var.to_string()))?;
        Self::new(token)
    }

    /// Header sent with every request, e.g. the protocol version pair the
    /// upstream requires.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }
}

impl Requester for HttpRequester {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = request.full_url();
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        builder = builder.bearer_auth(&self.bearer_token);
        for (name, value) in self.default_headers.iter().chain(request.headers.iter()) {
            builder = builder.header(name.as_str(), value.as_str());
        }

        match request.body()? {
            RequestBody::Empty => {}
            RequestBody::Json(json) => builder = builder.json(json),
            RequestBody::Form(fields) => builder = builder.form(fields),
        }

        debug!(url = %url, "sending upstream request");
        let response = builder.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_SNIPPET).collect(),
            });
        }

        let body = response.json::<Value>()?;
        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}
