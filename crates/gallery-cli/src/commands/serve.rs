//! Serve command - run the tool side until Ctrl-C
//!
//! Config resolution order:
//! 1. `--config <path>` (must exist)
//! 2. `GALLERY_CONFIG` environment variable (must exist)
//! 3. `./gallery.toml` if present
//! 4. built-in defaults
//!
//! `GALLERY_*` overrides apply on top, then `--port`.

use anyhow::{Context, Result};
use gallery_config::{
    constants::{DEFAULT_CONFIG_FILENAME, ENV_GALLERY_CONFIG},
    load_config, Config,
};
use gallery_core::{AppEvent, AppEventKind};
use gallery_logging::{debug, info, warn, LogConfig, WorkerGuard};
use gallery_server::{AppsManager, DevToolsContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Default)]
pub struct ServeOptions {
    pub config: Option<PathBuf>,
    pub port: Option<u16>,
    pub debug: bool,
    pub log_file: Option<PathBuf>,
}

pub async fn run(options: ServeOptions) -> Result<()> {
    let _log_guard = init_logging(&options)?;

    let env_path = std::env::var_os(ENV_GALLERY_CONFIG).map(PathBuf::from);
    let config = resolve_config(
        options.config.as_deref(),
        env_path.as_deref(),
        Path::new(DEFAULT_CONFIG_FILENAME),
    )?;
    let config = apply_port(config.with_env_overrides(), options.port);
    config.validate().context("Invalid configuration")?;

    let context = DevToolsContext::new(&config);
    let events = tokio::spawn(log_app_events(Arc::clone(&context.apps)));

    let port = context
        .start()
        .await
        .context("Failed to start the connection listener")?;
    info!(
        host = %config.listener.host,
        port,
        removal_policy = %config.apps.removal_policy,
        "Gallery tool ready"
    );
    println!("Listening for apps on {}:{}", config.listener.host, port);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutting down");

    context.shutdown().await;
    events.abort();
    Ok(())
}

fn init_logging(options: &ServeOptions) -> Result<Option<WorkerGuard>> {
    let log_config = LogConfig::serve(options.debug);
    match &options.log_file {
        Some(path) => {
            let guard = gallery_logging::init_with_file(log_config, path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Ok(Some(guard))
        }
        None => {
            gallery_logging::init(log_config);
            Ok(None)
        }
    }
}

/// Pick and load the config file; explicit paths must exist
fn resolve_config(
    explicit: Option<&Path>,
    from_env: Option<&Path>,
    local: &Path,
) -> Result<Config> {
    if let Some(path) = explicit.or(from_env) {
        return load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }
    if local.exists() {
        return load_config(local)
            .with_context(|| format!("Failed to load config from {}", local.display()));
    }
    debug!("No config file found, using defaults");
    Ok(Config::default())
}

fn apply_port(mut config: Config, port: Option<u16>) -> Config {
    if let Some(port) = port {
        config.listener.port = port;
    }
    config
}

async fn log_app_events(apps: Arc<AppsManager>) {
    let mut events = apps.subscribe();
    loop {
        match events.recv().await {
            Ok(event) => log_event(&apps, &event),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "App event log fell behind"),
            Err(RecvError::Closed) => return,
        }
    }
}

fn log_event(apps: &AppsManager, event: &AppEvent) {
    let app = apps.app(&event.app_id);
    let project = app
        .as_ref()
        .map(|a| a.project_name().to_string())
        .unwrap_or_default();
    let connection = event
        .connection_id
        .map(|id| id.to_string())
        .unwrap_or_default();

    match event.kind {
        AppEventKind::CatalogUpdated => {
            let components = app.as_ref().map(|a| a.catalog().current().len()).unwrap_or(0);
            info!(
                app_id = %event.app_id,
                project = %project,
                connection = %connection,
                components,
                "Catalog updated"
            );
        }
        kind => info!(
            app_id = %event.app_id,
            project = %project,
            connection = %connection,
            apps = apps.len(),
            "{}",
            kind
        ),
    }
}
