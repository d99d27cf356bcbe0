//! Error types for RPC channel operations

use crate::protocol::RemoteError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Framing violations: bad headers, oversized frames, unexpected messages
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON encoding or decoding failures
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Frame of {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { size: usize, limit: usize },

    /// Socket read/write failures
    #[error("Channel communication error: {0}")]
    Communication(String),

    /// The channel was closed locally or by the peer
    #[error("Channel closed: {0}")]
    Closed(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Structured failure returned by the peer
    #[error("Remote error: {0}")]
    Remote(RemoteError),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidMessage(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Communication(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::Protocol(format!("Invalid UTF-8: {}", err))
    }
}

// Remote failures come back as the domain error the peer raised
impl From<Error> for gallery_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Remote(remote) => remote.into_core_error(),
            Error::Timeout(ms) => gallery_core::Error::Timeout(ms),
            Error::Closed(reason) => gallery_core::Error::ConnectionClosed(reason),
            Error::Communication(reason) => gallery_core::Error::Transport(reason),
            other @ (Error::Protocol(_)
            | Error::InvalidMessage(_)
            | Error::FrameTooLarge { .. }) => {
                gallery_core::Error::ProtocolViolation(other.to_string())
            }
        }
    }
}
