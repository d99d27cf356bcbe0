//! Gallery App - the target application's side of the tooling connection
//!
//! An app hosts a `CatalogManager` built from its own types and connects to
//! the tool with a `ToolingClient`. The tool can then browse the catalog and
//! ask the app to navigate to a preview; the app hands the instantiated
//! preview to its platform `AppService`.
//!
//! ```rust,ignore
//! let config = AppClientConfig::new("127.0.0.1:50123");
//! let identity = AppIdentity::new("C:\\app\\app.csproj", "Windows");
//! let client = ToolingClient::connect(&config, identity, catalog, service).await?;
//! client.closed().await;
//! ```

mod client;
mod endpoint;
mod handler;
mod service;

pub use client::ToolingClient;
pub use endpoint::ToolEndpoint;
pub use handler::AppRequestHandler;
pub use service::{AppService, AppServiceRef};
