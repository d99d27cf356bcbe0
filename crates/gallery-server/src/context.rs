//! DevToolsContext - composition root for the tool process
//!
//! Built once at startup from `Config` and passed by reference to whatever
//! needs the Apps or the listener. There is no global instance.

use crate::apps::AppsManager;
use crate::listener::ConnectionListener;
use gallery_config::Config;
use gallery_core::Result;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct DevToolsContext {
    pub apps: Arc<AppsManager>,
    pub listener: Arc<ConnectionListener>,
}

impl DevToolsContext {
    pub fn new(config: &Config) -> Self {
        let apps = Arc::new(AppsManager::new(&config.apps));
        let listener = Arc::new(ConnectionListener::new(
            config.listener.clone(),
            config.rpc.clone(),
            Arc::clone(&apps),
        ));
        Self { apps, listener }
    }

    /// Start accepting app connections; returns the bound port
    pub async fn start(&self) -> Result<u16> {
        self.listener.start_listening().await
    }

    pub async fn shutdown(&self) {
        self.listener.stop_listening().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_config::AppRemovalPolicy;

    #[tokio::test]
    async fn test_context_wires_listener_to_apps() {
        let mut config = Config::default();
        config.apps.removal_policy = AppRemovalPolicy::Immediate;

        let context = DevToolsContext::new(&config);
        let port = context.start().await.unwrap();

        assert_eq!(context.listener.port(), Some(port));
        assert_eq!(context.apps.removal_policy(), AppRemovalPolicy::Immediate);
        assert!(context.apps.is_empty());

        context.shutdown().await;
        assert!(!context.listener.is_listening());
    }
}
