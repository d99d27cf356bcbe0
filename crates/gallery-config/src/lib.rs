//! Configuration types and loading for the preview gallery
//!
//! This crate provides:
//! - Configuration structures for the tool side (`Config`) and the app side
//!   (`AppClientConfig`)
//! - Config file loading (TOML format) with an embedded default template
//! - Environment variable overrides
//!
//! # Module Organization
//!
//! - `listener` - Connection listener bind address and registration window
//! - `rpc` - Request/dial timeouts and frame limits
//! - `apps` - App removal policy and event channel sizing
//! - `scanner` - Assembly exclusion prefixes
//! - `client` - App-side tooling client settings
//! - `constants` - Every default value in one place
//!
//! # Usage
//!
//! ```rust,ignore
//! use gallery_config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("gallery.toml"))?.with_env_overrides();
//! println!("Listening on {}", config.listener.bind_address());
//! ```

mod loader;

pub mod constants;

mod apps;
mod client;
mod listener;
mod rpc;
mod scanner;
mod types;

pub use apps::{AppRemovalPolicy, AppsConfig};
pub use client::AppClientConfig;
pub use listener::ListenerConfig;
pub use loader::{create_config, load_config, load_config_from_str, ConfigError, DEFAULT_CONFIG};
pub use rpc::RpcConfig;
pub use scanner::ScannerConfig;
pub use types::Config;
