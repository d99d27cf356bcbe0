//! Server surface of a channel
//!
//! Each peer answers the requests its counterpart sends through a
//! `RequestHandler`. Handlers return domain errors; the channel turns them
//! into structured `RemoteError` responses.

use crate::channel::RpcPeer;
use async_trait::async_trait;
use gallery_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Answer one request
    ///
    /// `peer` is the channel the request arrived on; handlers may call back
    /// through it while the request is still open. Unknown methods should
    /// return `Error::MethodNotFound`.
    async fn handle_request(
        &self,
        peer: RpcPeer,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value>;
}

pub type RequestHandlerRef = Arc<dyn RequestHandler>;

/// Decode request parameters, mapping failures to `ProtocolViolation`
pub fn decode_params<T: DeserializeOwned>(method: &str, params: Option<Value>) -> Result<T> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| Error::ProtocolViolation(format!("invalid params for '{}': {}", method, e)))
}

/// Encode a handler result
pub fn encode_result<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| Error::Internal(format!("failed to encode result: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PreviewParams;
    use serde_json::json;

    #[test]
    fn test_decode_params() {
        let params: PreviewParams = decode_params(
            "navigateToPreview",
            Some(json!({"componentName": "A", "previewName": "B"})),
        )
        .unwrap();
        assert_eq!(params, PreviewParams::new("A", "B"));
    }

    #[test]
    fn test_decode_params_rejects_wrong_shape() {
        let err = decode_params::<PreviewParams>("navigateToPreview", None).unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation(msg) if msg.contains("navigateToPreview")));
    }

    #[test]
    fn test_unit_params_accept_missing() {
        decode_params::<()>("getCatalog", None).unwrap();
    }
}
