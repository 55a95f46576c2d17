//! Error types for the typed JSON request adapter.
//!
//! # Design
//! `DecodeError` covers the two ways a payload can fail to become a typed
//! value: the declared charset is unknown, or the text is not JSON of the
//! expected shape. `TransportError` mirrors the failure kinds a dispatcher
//! reports; the status-bearing variants keep the raw `NetworkResponse` so an
//! error body can still be decoded.

use thiserror::Error;

use crate::http::NetworkResponse;

/// A payload could not be turned into a typed value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The charset named by the response is not one we can decode.
    #[error("unsupported charset: {charset}")]
    UnsupportedCharset { charset: String },

    /// The decoded text is not valid JSON or does not match the target shape.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl DecodeError {
    /// True for charset failures, false for JSON failures.
    pub fn is_encoding(&self) -> bool {
        matches!(self, DecodeError::UnsupportedCharset { .. })
    }
}

/// Failure reported by the transport, or produced while parsing a response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("no connection: {0}")]
    NoConnection(String),

    #[error("network error: {0}")]
    Network(String),

    /// 401 or 403.
    #[error("authentication failed: HTTP {}", .0.status)]
    AuthFailure(NetworkResponse),

    /// Any other 4xx.
    #[error("client error: HTTP {}", .0.status)]
    Client(NetworkResponse),

    /// 5xx, or any other status outside 200-299.
    #[error("server error: HTTP {}", .0.status)]
    Server(NetworkResponse),

    /// A 2xx response whose body could not be parsed.
    #[error("failed to parse response: {0}")]
    Parse(#[from] DecodeError),
}

impl TransportError {
    /// Classify a non-2xx response by status code.
    pub fn from_response(response: NetworkResponse) -> Self {
        match response.status {
            401 | 403 => TransportError::AuthFailure(response),
            400..=499 => TransportError::Client(response),
            _ => TransportError::Server(response),
        }
    }

    /// The raw response attached to this failure, if the server answered.
    pub fn network_response(&self) -> Option<&NetworkResponse> {
        match self {
            TransportError::AuthFailure(response)
            | TransportError::Client(response)
            | TransportError::Server(response) => Some(response),
            TransportError::Timeout
            | TransportError::NoConnection(_)
            | TransportError::Network(_)
            | TransportError::Parse(_) => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.network_response().map(|response| response.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> NetworkResponse {
        NetworkResponse::new(status, Vec::new(), "")
    }

    #[test]
    fn auth_statuses_map_to_auth_failure() {
        assert!(matches!(
            TransportError::from_response(response(401)),
            TransportError::AuthFailure(_)
        ));
        assert!(matches!(
            TransportError::from_response(response(403)),
            TransportError::AuthFailure(_)
        ));
    }

    #[test]
    fn other_4xx_map_to_client() {
        assert!(matches!(
            TransportError::from_response(response(404)),
            TransportError::Client(_)
        ));
        assert!(matches!(
            TransportError::from_response(response(422)),
            TransportError::Client(_)
        ));
    }

    #[test]
    fn server_and_unexpected_statuses_map_to_server() {
        assert!(matches!(
            TransportError::from_response(response(500)),
            TransportError::Server(_)
        ));
        assert!(matches!(
            TransportError::from_response(response(302)),
            TransportError::Server(_)
        ));
    }

    #[test]
    fn only_status_variants_carry_a_response() {
        assert_eq!(TransportError::from_response(response(503)).status(), Some(503));
        assert!(TransportError::Timeout.network_response().is_none());
        assert!(TransportError::NoConnection("refused".into()).network_response().is_none());

        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(TransportError::from(DecodeError::from(json_err)).network_response().is_none());
    }

    #[test]
    fn encoding_errors_are_distinguished_from_json_errors() {
        let charset = DecodeError::UnsupportedCharset {
            charset: "x-klingon".into(),
        };
        assert!(charset.is_encoding());
        assert_eq!(charset.to_string(), "unsupported charset: x-klingon");

        let json = DecodeError::from(serde_json::from_str::<u32>("{").unwrap_err());
        assert!(!json.is_encoding());
        assert!(json.to_string().starts_with("malformed JSON"));
    }

    #[test]
    fn display_includes_status() {
        let err = TransportError::from_response(response(404));
        assert_eq!(err.to_string(), "client error: HTTP 404");
    }
}
