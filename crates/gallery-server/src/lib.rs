//! Gallery Server - Tool side of the app connection protocol
//!
//! - `listener` - `ConnectionListener`: TCP accept loop, registration window,
//!   open-connection count
//! - `connection` - `AppConnection`: one socket, its state and typed calls to
//!   the app (`navigateToPreview`, `getPreviewsForComponent`, `getCatalog`,
//!   `getPreviewSnapshot`)
//! - `app` - `AppManager`: one logical App, its connections and catalog
//! - `apps` - `AppsManager`: the set of Apps, removal policy, `AppEvent`s
//! - `handler` - answers `registerApp` / `notifyCatalogChanged`
//! - `context` - `DevToolsContext` composition root
//!
//! # Example
//!
//! ```rust,ignore
//! let context = DevToolsContext::new(&config);
//! let port = context.start().await?;
//! let mut events = context.apps.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{} {}", event.kind, event.app_id);
//! }
//! ```

pub mod app;
pub mod apps;
pub mod connection;
pub mod context;
pub mod handler;
pub mod listener;

pub use app::{AppManager, NavigationOutcome};
pub use apps::AppsManager;
pub use connection::AppConnection;
pub use context::DevToolsContext;
pub use handler::ToolRequestHandler;
pub use listener::ConnectionListener;
