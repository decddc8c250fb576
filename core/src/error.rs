//! Error types for the REST client.
//!
//! # Design
//! Transport failures (DNS, connect, TLS, timeouts) are kept apart from
//! completed exchanges that carry a non-2xx status. A `TransportError` is
//! also what the client keeps in its last-error slot, so it carries the
//! human-readable message together with a numeric code.

use std::fmt;

use thiserror::Error;

/// A failed network exchange: nothing came back from the server.
///
/// `code` follows libcurl's numbering so logs stay comparable with
/// curl-based tooling (see [`TransportError::TIMEOUT`] and friends).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub message: String,
    pub code: i32,
}

impl TransportError {
    pub const OTHER: i32 = 0;
    pub const BAD_URL: i32 = 3;
    pub const HOST_NOT_FOUND: i32 = 6;
    pub const CONNECT_FAILED: i32 = 7;
    pub const TIMEOUT: i32 = 28;
    pub const TLS: i32 = 35;
    pub const TOO_MANY_REDIRECTS: i32 = 47;
    pub const RECEIVE: i32 = 56;

    pub fn new(message: impl Into<String>, code: i32) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transport error: {} | error number: {}",
            self.message, self.code
        )
    }
}

impl std::error::Error for TransportError {}

/// Errors returned by `RestClient` operations and JSON document accessors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never completed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A raw header line had no `Name: value` shape.
    #[error("invalid header line: {0:?}")]
    InvalidHeader(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response body was not valid JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// A JSON document lacked a path the caller relied on.
    #[error("missing field `{path}` in response")]
    MissingField { path: String },

    /// Writing a downloaded body to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_carries_code() {
        let err = TransportError::new("Connection refused", TransportError::CONNECT_FAILED);
        assert_eq!(
            err.to_string(),
            "transport error: Connection refused | error number: 7"
        );
    }

    #[test]
    fn transport_converts_transparently() {
        let err: ClientError = TransportError::new("timed out", TransportError::TIMEOUT).into();
        assert_eq!(err.to_string(), "transport error: timed out | error number: 28");
    }

    #[test]
    fn missing_field_names_path() {
        let err = ClientError::MissingField {
            path: "/Results/0/ID".to_string(),
        };
        assert_eq!(err.to_string(), "missing field `/Results/0/ID` in response");
    }
}
