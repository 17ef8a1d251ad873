//! Gateway error types.

use std::fmt;

use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Classification of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// Connection, TLS or other transport failure.
    Transport,
    /// Remote service answered with a non-success status.
    Status(u16),
    /// Response body could not be decoded.
    Decode,
    /// No response within the configured bound.
    Timeout,
}

impl fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => f.write_str("transport failure"),
            Self::Status(code) => write!(f, "HTTP {code}"),
            Self::Decode => f.write_str("malformed response"),
            Self::Timeout => f.write_str("timed out"),
        }
    }
}

/// A remote call to the media-session or telephony service failed.
#[derive(Debug, Clone, Error)]
#[error("{operation} failed ({kind}): {message}")]
pub struct GatewayError {
    /// Name of the gateway operation, e.g. `create_session`.
    pub operation: &'static str,
    pub kind: GatewayErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(operation: &'static str, kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(operation: &'static str, after: std::time::Duration) -> Self {
        Self::new(
            operation,
            GatewayErrorKind::Timeout,
            format!("no response after {} ms", after.as_millis()),
        )
    }

    /// Translate a reqwest failure, keeping timeouts distinct.
    pub fn from_reqwest(operation: &'static str, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            GatewayErrorKind::Timeout
        } else if err.is_decode() {
            GatewayErrorKind::Decode
        } else if let Some(status) = err.status() {
            GatewayErrorKind::Status(status.as_u16())
        } else {
            GatewayErrorKind::Transport
        };
        Self::new(operation, kind, err.to_string())
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == GatewayErrorKind::Timeout
    }
}
