//! RPC message types
//!
//! Every message is one JSON object framed with a `Content-Length` header:
//! ```text
//! Content-Length: 92\r\n
//! \r\n
//! {"type":"request","id":1,"method":"registerApp","params":{"projectPath":"C:\\app\\app.csproj","platformName":"Windows"}}
//! ```
//!
//! Both peers send requests and both answer them; `id` is scoped to the
//! sender, so a response always travels back to the peer that picked the id.

use gallery_core::{AppId, CatalogInfo, ConnectionId, ErrorCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

// ============================================================
// ENVELOPE
// ============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RpcMessage {
    Request(Request),
    Response(Response),
}

impl RpcMessage {
    pub fn id(&self) -> u64 {
        match self {
            RpcMessage::Request(r) => r.id,
            RpcMessage::Response(r) => r.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(id: u64, method: impl Into<String>) -> Self {
        Self {
            id,
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }
}

/// Exactly one of `result` / `error` is meaningful
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

impl Response {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, error: RemoteError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

// ============================================================
// STRUCTURED ERRORS
// ============================================================

/// A domain error as it travels over the wire
///
/// `data` carries the variant's fields so the receiving side can rebuild the
/// exact `gallery_core::Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.name(), self.message)
    }
}

impl From<&gallery_core::Error> for RemoteError {
    fn from(err: &gallery_core::Error) -> Self {
        use gallery_core::Error as E;

        let data = match err {
            E::ComponentNotFound(component) => Some(json!({ "component": component })),
            E::PreviewNotFound { component, preview } => {
                Some(json!({ "component": component, "preview": preview }))
            }
            E::PreviewParametersNotSupported { preview, count } => {
                Some(json!({ "preview": preview, "count": count }))
            }
            E::PreviewNotInstantiable(preview) => Some(json!({ "preview": preview })),
            E::ConnectionFormat { input, reason } => {
                Some(json!({ "input": input, "reason": reason }))
            }
            E::RegistrationTimeout(ms) | E::Timeout(ms) => Some(json!({ "timeoutMs": ms })),
            E::MethodNotFound(method) => Some(json!({ "method": method })),
            E::AppNotFound(id) | E::ConnectionNotFound(id) => Some(json!({ "id": id })),
            _ => None,
        };

        Self {
            code: err.code(),
            message: err.to_string(),
            data,
        }
    }
}

impl From<gallery_core::Error> for RemoteError {
    fn from(err: gallery_core::Error) -> Self {
        RemoteError::from(&err)
    }
}

impl RemoteError {
    fn field(&self, name: &str) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|d| d.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn number(&self, name: &str) -> Option<u64> {
        self.data.as_ref().and_then(|d| d.get(name)).and_then(Value::as_u64)
    }

    /// Rebuild the domain error the peer raised
    ///
    /// Missing `data` degrades to the message text; it never fails.
    pub fn into_core_error(self) -> gallery_core::Error {
        use gallery_core::Error as E;

        let text = |key: &str| self.field(key).unwrap_or_else(|| self.message.clone());
        match self.code {
            ErrorCode::ComponentNotFound => E::ComponentNotFound(text("component")),
            ErrorCode::PreviewNotFound => E::PreviewNotFound {
                component: text("component"),
                preview: text("preview"),
            },
            ErrorCode::PreviewParametersNotSupported => E::PreviewParametersNotSupported {
                preview: text("preview"),
                count: self.number("count").unwrap_or(0) as usize,
            },
            ErrorCode::PreviewNotInstantiable => E::PreviewNotInstantiable(text("preview")),
            ErrorCode::SnapshotNotSupported => E::SnapshotNotSupported,
            ErrorCode::ConnectionFormat => E::ConnectionFormat {
                input: text("input"),
                reason: text("reason"),
            },
            ErrorCode::RegistrationTimeout => {
                E::RegistrationTimeout(self.number("timeoutMs").unwrap_or(0))
            }
            ErrorCode::Timeout => E::Timeout(self.number("timeoutMs").unwrap_or(0)),
            ErrorCode::MethodNotFound => E::MethodNotFound(text("method")),
            ErrorCode::AppNotFound => E::AppNotFound(text("id")),
            ErrorCode::ConnectionNotFound => E::ConnectionNotFound(text("id")),
            ErrorCode::ProtocolViolation => E::ProtocolViolation(self.message.clone()),
            ErrorCode::Transport => E::Transport(self.message.clone()),
            ErrorCode::ConnectionClosed => E::ConnectionClosed(self.message.clone()),
            ErrorCode::InvalidConfig => E::InvalidConfig(self.message.clone()),
            ErrorCode::Internal => E::Internal(self.message.clone()),
        }
    }
}

// ============================================================
// METHOD PAYLOADS
// ============================================================

/// `registerApp` parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAppParams {
    pub project_path: String,
    pub platform_name: String,
}

/// `registerApp` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAppResult {
    pub app_id: AppId,
    pub connection_id: ConnectionId,
}

/// `navigateToPreview` and `getPreviewSnapshot` parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewParams {
    pub component_name: String,
    pub preview_name: String,
}

impl PreviewParams {
    pub fn new(component_name: impl Into<String>, preview_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            preview_name: preview_name.into(),
        }
    }
}

/// `getPreviewsForComponent` parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentParams {
    pub component_name: String,
}

/// `getPreviewsForComponent` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewList {
    pub preview_names: Vec<String>,
}

/// `getCatalog` result
pub type GetCatalogResult = CatalogInfo;

/// `getPreviewSnapshot` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSnapshot {
    /// Encoded image bytes, base64
    pub image_base64: String,
}
