use crate::{error::TransportError, retry::RetryDisposition};
use std::error::Error;

/// Maps a transport failure to its retry disposition.
pub fn classify_transport_error(err: &TransportError) -> RetryDisposition {
    match err {
        TransportError::ConflictingRequestBody | TransportError::MissingToken(_) => {
            RetryDisposition::Stop
        }
        TransportError::Status { status, .. } => classify_status(*status),
        TransportError::Http(err) => classify_http_error(err),
    }
}

/// 408/429 and the 5xx range are worth retrying; other client errors mean
/// the request itself is wrong.
pub fn classify_status(status: u16) -> RetryDisposition {
    match status {
        408 | 429 => RetryDisposition::Retry,
        s if s >= 500 => RetryDisposition::Retry,
        _ => RetryDisposition::Stop,
    }
}

fn classify_http_error(err: &reqwest::Error) -> RetryDisposition {
    if err.is_timeout() || err.is_connect() {
        return RetryDisposition::Retry;
    }
    if let Some(status) = err.status() {
        return classify_status(status.as_u16());
    }
    // Name-resolution failures surface as opaque request errors rather than
    // connect errors. At this upstream they are temporary resolver glitches,
    // not a bad host in the config, so they get retried too.
    if is_dns_failure(err) {
        return RetryDisposition::Retry;
    }
    RetryDisposition::Stop
}

fn is_dns_failure(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return true;
        }
        source = cause.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        assert_eq!(classify_status(408), RetryDisposition::Retry);
        assert_eq!(classify_status(429), RetryDisposition::Retry);
        assert_eq!(classify_status(500), RetryDisposition::Retry);
        assert_eq!(classify_status(503), RetryDisposition::Retry);
    }

    #[test]
    fn client_errors_are_fatal() {
        assert_eq!(classify_status(400), RetryDisposition::Stop);
        assert_eq!(classify_status(401), RetryDisposition::Stop);
        assert_eq!(classify_status(404), RetryDisposition::Stop);
    }

    #[test]
    fn body_conflict_is_never_retried() {
        assert_eq!(
            classify_transport_error(&TransportError::ConflictingRequestBody),
            RetryDisposition::Stop
        );
    }

    #[test]
    fn server_error_response_is_retried() {
        let err = TransportError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(classify_transport_error(&err), RetryDisposition::Retry);
    }
}
