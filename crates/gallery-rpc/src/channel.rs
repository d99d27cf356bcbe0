//! RPC channel - one duplex connection, both peers acting as client and server
//!
//! The channel handles:
//! - Message framing (see `framing`)
//! - Request id generation
//! - Request/response correlation for outbound calls
//! - Dispatching inbound requests to a `RequestHandler`
//! - Close detection (EOF, transport errors, protocol violations)
//!
//! Writes go through one mutex so frames never interleave. The reader task
//! never blocks on a handler: every inbound request is answered from its own
//! task, so a handler may call back to the peer on the same channel.

use crate::framing::{read_frame, write_frame};
use crate::handler::RequestHandlerRef;
use crate::{Error, RemoteError, Request, Response, Result, RpcMessage};
use gallery_config::RpcConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Channel for sending responses back to request callers
type ResponseSender = oneshot::Sender<Result<Response>>;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

struct Shared {
    /// Log label (e.g. the connection id)
    label: String,
    next_id: AtomicU64,
    /// Outbound requests awaiting a response, keyed by request id
    pending: Mutex<HashMap<u64, ResponseSender>>,
    /// `None` once the channel is closed
    writer: Mutex<Option<BoxedWriter>>,
    config: RpcConfig,
    /// `Some(reason)` once closed
    state: watch::Sender<Option<String>>,
}

impl Shared {
    async fn send(&self, message: &RpcMessage) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or_else(|| Error::Closed(format!("{} is closed", self.label)))?;
        write_frame(writer, message, self.config.max_frame_bytes).await
    }

    async fn complete(&self, response: Response) {
        let sender = self.pending.lock().await.remove(&response.id);
        match sender {
            Some(tx) => {
                if tx.send(Ok(response)).is_err() {
                    debug!(channel = %self.label, "Response arrived after caller gave up");
                }
            }
            None => warn!(
                channel = %self.label,
                request_id = response.id,
                "Received response for unknown request id"
            ),
        }
    }

    fn is_closed(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Mark closed, shut the writer down and fail every pending call
    async fn shutdown(&self, reason: &str) {
        let first = self.state.send_if_modified(|state| {
            if state.is_none() {
                *state = Some(reason.to_string());
                true
            } else {
                false
            }
        });

        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                trace!(channel = %self.label, error = %e, "Writer shutdown failed");
            }
        }

        let mut pending = self.pending.lock().await;
        let failed = pending.len();
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(Error::Closed(reason.to_string())));
        }

        if first {
            info!(channel = %self.label, reason, failed_requests = failed, "RPC channel closed");
        }
    }
}

/// Cloneable handle to a channel's outbound side
///
/// Handed to request handlers so they can call back to the peer.
#[derive(Clone)]
pub struct RpcPeer {
    shared: Arc<Shared>,
}

impl RpcPeer {
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Send a request and wait for its response
    ///
    /// Unit params (`&()`) are sent without a `params` field. A structured
    /// error from the peer comes back as `Error::Remote`.
    #[tracing::instrument(skip(self, params), fields(channel = %self.shared.label, request_id))]
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        if let Some(reason) = self.close_reason() {
            return Err(Error::Closed(reason));
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::Span::current().record("request_id", id);

        let params = serde_json::to_value(params)?;
        let mut request = Request::new(id, method);
        if !params.is_null() {
            request = request.with_params(params);
        }

        // Register before sending so a fast response always finds its caller
        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().await.insert(id, tx);

        if let Err(e) = self.shared.send(&RpcMessage::Request(request)).await {
            self.shared.pending.lock().await.remove(&id);
            return Err(e);
        }
        debug!(method, "Sent request");

        let timeout_ms = self.shared.config.request_timeout_ms;
        let started = Instant::now();
        let response = match tokio::time::timeout(self.shared.config.request_timeout(), rx).await {
            Ok(Ok(response)) => response?,
            Ok(Err(_)) => return Err(Error::Closed("response channel dropped".to_string())),
            Err(_) => {
                self.shared.pending.lock().await.remove(&id);
                warn!(method, timeout_ms, "Request timed out");
                return Err(Error::Timeout(timeout_ms));
            }
        };
        debug!(
            method,
            response_time_ms = started.elapsed().as_millis() as u64,
            success = response.is_success(),
            "Request completed"
        );

        if let Some(error) = response.error {
            return Err(Error::Remote(error));
        }
        Ok(serde_json::from_value(response.result.unwrap_or(Value::Null))?)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn close_reason(&self) -> Option<String> {
        self.shared.state.borrow().clone()
    }

    /// Resolves once the channel is closed for any reason
    pub async fn closed(&self) {
        let mut state = self.shared.state.subscribe();
        let _ = state.wait_for(Option::is_some).await;
    }

    /// Close the channel; in-flight calls fail with `Error::Closed`
    pub async fn close(&self) {
        self.shared.shutdown("closed locally").await;
    }

    /// Number of outbound calls awaiting a response
    pub async fn pending_request_count(&self) -> usize {
        self.shared.pending.lock().await.len()
    }

    async fn answer(&self, handler: RequestHandlerRef, request: Request) {
        let Request { id, method, params } = request;
        trace!(channel = %self.shared.label, request_id = id, method = %method, "Handling request");

        let response = match handler.handle_request(self.clone(), &method, params).await {
            Ok(result) => Response::success(id, result),
            Err(err) => {
                debug!(
                    channel = %self.shared.label,
                    request_id = id,
                    method = %method,
                    error = %err,
                    "Request failed"
                );
                Response::failure(id, RemoteError::from(&err))
            }
        };

        match self.shared.send(&RpcMessage::Response(response)).await {
            Ok(()) => {}
            Err(err @ Error::FrameTooLarge { .. }) => {
                warn!(
                    channel = %self.shared.label,
                    method = %method,
                    error = %err,
                    "Response too large"
                );
                let failure = Response::failure(
                    id,
                    RemoteError::from(&gallery_core::Error::Internal(err.to_string())),
                );
                let _ = self.shared.send(&RpcMessage::Response(failure)).await;
            }
            Err(err) => {
                debug!(
                    channel = %self.shared.label,
                    method = %method,
                    error = %err,
                    "Could not send response"
                );
            }
        }
    }
}

/// RPC channel over one duplex byte stream
pub struct RpcChannel {
    peer: RpcPeer,
    /// Reader task handle (for shutdown)
    reader_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl RpcChannel {
    /// Start a channel; inbound requests go to `handler`
    pub fn new<R, W>(
        label: impl Into<String>,
        reader: R,
        writer: W,
        config: RpcConfig,
        handler: RequestHandlerRef,
    ) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (state, _) = watch::channel(None);
        let shared = Arc::new(Shared {
            label: label.into(),
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            writer: Mutex::new(Some(Box::new(writer) as BoxedWriter)),
            config,
            state,
        });

        let reader_task = tokio::spawn(read_loop(reader, Arc::clone(&shared), handler));

        Self {
            peer: RpcPeer { shared },
            reader_task: std::sync::Mutex::new(Some(reader_task)),
        }
    }

    /// Start a channel over a TCP stream
    pub fn from_tcp(
        label: impl Into<String>,
        stream: tokio::net::TcpStream,
        config: RpcConfig,
        handler: RequestHandlerRef,
    ) -> Self {
        let (reader, writer) = stream.into_split();
        Self::new(label, reader, writer, config, handler)
    }

    pub fn peer(&self) -> RpcPeer {
        self.peer.clone()
    }

    pub fn label(&self) -> &str {
        self.peer.label()
    }

    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.peer.call(method, params).await
    }

    /// Returns false once the reader task has exited or the channel was closed
    pub fn is_alive(&self) -> bool {
        if self.peer.is_closed() {
            return false;
        }
        let guard = self
            .reader_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn is_closed(&self) -> bool {
        self.peer.is_closed()
    }

    pub fn close_reason(&self) -> Option<String> {
        self.peer.close_reason()
    }

    pub async fn closed(&self) {
        self.peer.closed().await
    }

    pub async fn close(&self) {
        self.peer.close().await;
        let handle = self
            .reader_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for RpcChannel {
    fn drop(&mut self) {
        let handle = self
            .reader_task
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

async fn read_loop<R>(reader: R, shared: Arc<Shared>, handler: RequestHandlerRef)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    debug!(channel = %shared.label, "Reader task started");
    let mut reader = BufReader::new(reader);

    let reason = loop {
        match read_frame(&mut reader, shared.config.max_frame_bytes).await {
            Ok(Some(RpcMessage::Response(response))) => shared.complete(response).await,
            Ok(Some(RpcMessage::Request(request))) => {
                let peer = RpcPeer {
                    shared: Arc::clone(&shared),
                };
                let handler = Arc::clone(&handler);
                tokio::spawn(async move { peer.answer(handler, request).await });
            }
            Ok(None) => break "peer closed the connection".to_string(),
            Err(Error::Communication(e)) => {
                debug!(channel = %shared.label, error = %e, "Transport failure");
                break format!("transport failure: {}", e);
            }
            Err(e) => {
                warn!(
                    channel = %shared.label,
                    error = %e,
                    "Protocol violation, dropping connection"
                );
                break format!("protocol violation: {}", e);
            }
        }
    };

    shared.shutdown(&reason).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::RequestHandler;
    use crate::framing::encode_frame;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    struct EchoHandler;

    #[async_trait]
    impl RequestHandler for EchoHandler {
        async fn handle_request(
            &self,
            _peer: RpcPeer,
            method: &str,
            params: Option<Value>,
        ) -> gallery_core::Result<Value> {
            match method {
                "echo" => Ok(params.unwrap_or(Value::Null)),
                "missing" => Err(gallery_core::Error::component_not_found("MyApp.Missing")),
                other => Err(gallery_core::Error::MethodNotFound(other.to_string())),
            }
        }
    }

    fn config(request_timeout_ms: u64) -> RpcConfig {
        RpcConfig {
            request_timeout_ms,
            ..RpcConfig::default()
        }
    }

    fn raw_channel(timeout_ms: u64) -> (RpcChannel, tokio::io::DuplexStream) {
        let (local, remote) = tokio::io::duplex(8192);
        let (read, write) = tokio::io::split(local);
        let channel = RpcChannel::new(
            "test",
            read,
            write,
            config(timeout_ms),
            Arc::new(EchoHandler),
        );
        (channel, remote)
    }

    #[tokio::test]
    async fn test_request_ids_start_at_one() {
        let (channel, mut remote) = raw_channel(1000);

        let call = tokio::spawn(async move {
            let _ = channel.call::<_, Value>("echo", &()).await;
        });

        let mut reader = BufReader::new(&mut remote);
        let message = read_frame(&mut reader, 8192).await.unwrap().unwrap();
        match message {
            RpcMessage::Request(req) => {
                assert_eq!(req.id, 1);
                assert_eq!(req.method, "echo");
                assert!(req.params.is_none());
            }
            _ => panic!("Expected Request"),
        }
        call.abort();
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let (channel, _remote) = raw_channel(50);

        let result = channel.call::<_, Value>("echo", &json!({})).await;
        assert_eq!(result.unwrap_err(), Error::Timeout(50));
        assert_eq!(channel.peer().pending_request_count().await, 0);
    }

    #[tokio::test]
    async fn test_pending_call_fails_on_eof() {
        let (channel, remote) = raw_channel(5000);
        let peer = channel.peer();

        let call = tokio::spawn(async move { peer.call::<_, Value>("echo", &()).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(remote);

        let result = call.await.unwrap();
        assert!(matches!(result, Err(Error::Closed(_))));
        tokio::time::timeout(Duration::from_secs(1), channel.closed())
            .await
            .unwrap();
        assert!(!channel.is_alive());
    }

    #[tokio::test]
    async fn test_malformed_frame_closes_channel() {
        let (channel, mut remote) = raw_channel(1000);

        remote.write_all(b"Content-Length: 5\r\n\r\nnope!").await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), channel.closed())
            .await
            .unwrap();

        assert!(channel.close_reason().unwrap().starts_with("protocol violation"));
    }

    #[tokio::test]
    async fn test_inbound_request_answered() {
        let (_channel, mut remote) = raw_channel(1000);

        let request = RpcMessage::Request(Request::new(9, "echo").with_params(json!({"x": 1})));
        remote.write_all(&encode_frame(&request, 8192).unwrap()).await.unwrap();

        let mut reader = BufReader::new(&mut remote);
        match read_frame(&mut reader, 8192).await.unwrap().unwrap() {
            RpcMessage::Response(resp) => {
                assert_eq!(resp.id, 9);
                assert_eq!(resp.result.unwrap()["x"], 1);
            }
            _ => panic!("Expected Response"),
        }
    }

    #[tokio::test]
    async fn test_unknown_response_id_ignored() {
        let (channel, mut remote) = raw_channel(1000);

        let stray = RpcMessage::Response(Response::success(77, json!(null)));
        remote.write_all(&encode_frame(&stray, 8192).unwrap()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(channel.is_alive());
    }

    #[tokio::test]
    async fn test_close_shuts_writer() {
        let (channel, mut remote) = raw_channel(1000);
        channel.close().await;

        let mut buf = Vec::new();
        let read = remote.read_to_end(&mut buf).await.unwrap();
        assert_eq!(read, 0);
        assert!(channel.is_closed());
        assert!(matches!(
            channel.call::<_, Value>("echo", &()).await,
            Err(Error::Closed(_))
        ));
    }
}
