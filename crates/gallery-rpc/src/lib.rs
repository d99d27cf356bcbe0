//! Gallery RPC - Duplex JSON-RPC channel between apps and the tool
//!
//! One TCP connection carries two call surfaces: the app calls the tool
//! (`registerApp`, `notifyCatalogChanged`) and the tool calls the app
//! (`navigateToPreview`, `getPreviewsForComponent`, `getCatalog`,
//! `getPreviewSnapshot`). Each side builds an `RpcChannel` with the
//! `RequestHandler` for the surface it serves.
//!
//! # Example
//!
//! ```rust,ignore
//! use gallery_rpc::{methods, PreviewParams, RpcChannel};
//!
//! let channel = RpcChannel::from_tcp("conn-1", stream, RpcConfig::default(), handler);
//! let () = channel
//!     .call(methods::NAVIGATE_TO_PREVIEW, &PreviewParams::new("MyApp.LoginPage", "Default"))
//!     .await?;
//! ```

pub mod channel;
pub mod constants;
pub mod error;
pub mod framing;
pub mod handler;
pub mod protocol;

pub use channel::{RpcChannel, RpcPeer};
pub use constants::methods;
pub use error::{Error, Result};
pub use handler::{decode_params, encode_result, RequestHandler, RequestHandlerRef};
pub use protocol::*;
