//! Error types for the Gallery core domain

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Error Codes - Machine-readable codes carried over the wire
// ============================================================================

/// Machine-readable error codes.
///
/// These travel inside RPC error responses so that a peer can rebuild the
/// same domain error on its side of the connection.
///
/// Error code ranges:
/// - 1xxx: Catalog errors
/// - 2xxx: Connection / protocol errors
/// - 3xxx: Config errors
/// - 9xxx: Generic errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum ErrorCode {
    // Catalog errors (1xxx)
    /// Component not present in the current snapshot (1001)
    ComponentNotFound = 1001,
    /// Preview not present on the component (1002)
    PreviewNotFound = 1002,
    /// Preview factory declares parameters (1003)
    PreviewParametersNotSupported = 1003,
    /// Preview has no factory on this side of the wire (1004)
    PreviewNotInstantiable = 1004,
    /// App service cannot capture preview images (1005)
    SnapshotNotSupported = 1005,

    // Connection errors (2xxx)
    /// Malformed `host:port` connection string (2001)
    ConnectionFormat = 2001,
    /// Connection never registered (2002)
    RegistrationTimeout = 2002,
    /// Malformed frame or unexpected message (2003)
    ProtocolViolation = 2003,
    /// Socket reset / EOF / dial failure (2004)
    Transport = 2004,
    /// Connection id unknown (2005)
    ConnectionNotFound = 2005,
    /// Connection already closed (2006)
    ConnectionClosed = 2006,
    /// App id unknown (2007)
    AppNotFound = 2007,
    /// Request timed out (2008)
    Timeout = 2008,
    /// Peer does not implement the method (2009)
    MethodNotFound = 2009,

    // Config errors (3xxx)
    /// Invalid configuration (3001)
    InvalidConfig = 3001,

    // Generic (9xxx)
    /// Internal error (9001)
    Internal = 9001,
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        let code = match value {
            1001 => ErrorCode::ComponentNotFound,
            1002 => ErrorCode::PreviewNotFound,
            1003 => ErrorCode::PreviewParametersNotSupported,
            1004 => ErrorCode::PreviewNotInstantiable,
            1005 => ErrorCode::SnapshotNotSupported,
            2001 => ErrorCode::ConnectionFormat,
            2002 => ErrorCode::RegistrationTimeout,
            2003 => ErrorCode::ProtocolViolation,
            2004 => ErrorCode::Transport,
            2005 => ErrorCode::ConnectionNotFound,
            2006 => ErrorCode::ConnectionClosed,
            2007 => ErrorCode::AppNotFound,
            2008 => ErrorCode::Timeout,
            2009 => ErrorCode::MethodNotFound,
            3001 => ErrorCode::InvalidConfig,
            9001 => ErrorCode::Internal,
            other => return Err(format!("unknown error code {}", other)),
        };
        Ok(code)
    }
}

// ============================================================================
// Error Categories - Classification for retry logic
// ============================================================================

/// Error categorization for caller retry handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Temporary failure, safe to retry (timeouts, dropped sockets)
    Retryable,
    /// Permanent failure, don't retry (unknown component, bad input)
    Terminal,
    /// Bug or invariant violation on one side of the connection
    Internal,
}

impl ErrorCategory {
    /// Get the category name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCategory::Retryable => "retryable",
            ErrorCategory::Terminal => "terminal",
            ErrorCategory::Internal => "internal",
        }
    }

    /// Returns true if this error category indicates the operation can be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Retryable)
    }
}

impl ErrorCode {
    /// Get the numeric value of the error code
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Get the category of this error code
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::Transport
            | ErrorCode::Timeout
            | ErrorCode::ConnectionClosed
            | ErrorCode::RegistrationTimeout => ErrorCategory::Retryable,

            ErrorCode::ComponentNotFound
            | ErrorCode::PreviewNotFound
            | ErrorCode::PreviewParametersNotSupported
            | ErrorCode::PreviewNotInstantiable
            | ErrorCode::SnapshotNotSupported
            | ErrorCode::ConnectionFormat
            | ErrorCode::ConnectionNotFound
            | ErrorCode::AppNotFound
            | ErrorCode::MethodNotFound
            | ErrorCode::InvalidConfig => ErrorCategory::Terminal,

            ErrorCode::ProtocolViolation | ErrorCode::Internal => ErrorCategory::Internal,
        }
    }

    /// Get the error code name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::ComponentNotFound => "COMPONENT_NOT_FOUND",
            ErrorCode::PreviewNotFound => "PREVIEW_NOT_FOUND",
            ErrorCode::PreviewParametersNotSupported => "PREVIEW_PARAMETERS_NOT_SUPPORTED",
            ErrorCode::PreviewNotInstantiable => "PREVIEW_NOT_INSTANTIABLE",
            ErrorCode::SnapshotNotSupported => "SNAPSHOT_NOT_SUPPORTED",
            ErrorCode::ConnectionFormat => "CONNECTION_FORMAT",
            ErrorCode::RegistrationTimeout => "REGISTRATION_TIMEOUT",
            ErrorCode::ProtocolViolation => "PROTOCOL_VIOLATION",
            ErrorCode::Transport => "TRANSPORT_FAILURE",
            ErrorCode::ConnectionNotFound => "CONNECTION_NOT_FOUND",
            ErrorCode::ConnectionClosed => "CONNECTION_CLOSED",
            ErrorCode::AppNotFound => "APP_NOT_FOUND",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::MethodNotFound => "METHOD_NOT_FOUND",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::Internal => "INTERNAL_ERROR",
        }
    }
}

// ============================================================================
// NotFoundError Trait - Common interface for "not found" style errors
// ============================================================================

/// Trait for "not found" style errors.
pub trait NotFoundError {
    /// Returns true if this error represents a "not found" condition
    fn is_not_found(&self) -> bool;

    /// The type of resource that wasn't found (e.g., "component", "preview")
    fn resource_type(&self) -> Option<&'static str>;

    /// The resource identifier that wasn't found
    fn resource_id(&self) -> Option<&str>;
}

impl NotFoundError for Error {
    fn is_not_found(&self) -> bool {
        self.resource_type().is_some()
    }

    fn resource_type(&self) -> Option<&'static str> {
        match self {
            Error::ComponentNotFound(_) => Some("component"),
            Error::PreviewNotFound { .. } => Some("preview"),
            Error::ConnectionNotFound(_) => Some("connection"),
            Error::AppNotFound(_) => Some("app"),
            _ => None,
        }
    }

    fn resource_id(&self) -> Option<&str> {
        match self {
            Error::ComponentNotFound(name) => Some(name),
            Error::PreviewNotFound { preview, .. } => Some(preview),
            Error::ConnectionNotFound(id) => Some(id),
            Error::AppNotFound(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Catalog errors
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Preview '{preview}' not found on component '{component}'")]
    PreviewNotFound { component: String, preview: String },

    /// Parameterized previews are never invoked with made-up arguments.
    #[error("Preview '{preview}' declares {count} parameter(s); parameters are not supported")]
    PreviewParametersNotSupported { preview: String, count: usize },

    #[error("Preview '{0}' has no factory in this process")]
    PreviewNotInstantiable(String),

    #[error("Preview snapshots are not supported by this app")]
    SnapshotNotSupported,

    // Connection errors
    #[error("Invalid connection string '{input}': {reason}")]
    ConnectionFormat { input: String, reason: String },

    #[error("Connection did not register within {0}ms")]
    RegistrationTimeout(u64),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Socket reset, EOF or failed dial
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    #[error("App not found: {0}")]
    AppNotFound(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Helper to create a component not found error
    pub fn component_not_found(name: impl Into<String>) -> Self {
        Error::ComponentNotFound(name.into())
    }

    /// Helper to create a preview not found error
    pub fn preview_not_found(component: impl Into<String>, preview: impl Into<String>) -> Self {
        Error::PreviewNotFound {
            component: component.into(),
            preview: preview.into(),
        }
    }

    /// Helper to create a connection format error
    pub fn connection_format(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ConnectionFormat {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Get the machine-readable error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ComponentNotFound(_) => ErrorCode::ComponentNotFound,
            Error::PreviewNotFound { .. } => ErrorCode::PreviewNotFound,
            Error::PreviewParametersNotSupported { .. } => ErrorCode::PreviewParametersNotSupported,
            Error::PreviewNotInstantiable(_) => ErrorCode::PreviewNotInstantiable,
            Error::SnapshotNotSupported => ErrorCode::SnapshotNotSupported,
            Error::ConnectionFormat { .. } => ErrorCode::ConnectionFormat,
            Error::RegistrationTimeout(_) => ErrorCode::RegistrationTimeout,
            Error::ProtocolViolation(_) => ErrorCode::ProtocolViolation,
            Error::Transport(_) => ErrorCode::Transport,
            Error::ConnectionNotFound(_) => ErrorCode::ConnectionNotFound,
            Error::ConnectionClosed(_) => ErrorCode::ConnectionClosed,
            Error::AppNotFound(_) => ErrorCode::AppNotFound,
            Error::Timeout(_) => ErrorCode::Timeout,
            Error::MethodNotFound(_) => ErrorCode::MethodNotFound,
            Error::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Error::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Get the error code name (e.g., "COMPONENT_NOT_FOUND")
    pub fn code_name(&self) -> &'static str {
        self.code().name()
    }

    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }

    /// Returns true if this error is safe to retry.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ProtocolViolation(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(err.to_string())
    }
}
