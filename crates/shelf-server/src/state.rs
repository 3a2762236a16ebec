//! Application state shared across handlers.

use std::sync::Arc;

use shelf_core::SystemClock;
use shelf_rules::{Credentials, RuleEngine};
use shelf_store::Store;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
///
/// This is cloneable and can be extracted in handlers using `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Document store.
    store: Store,
    /// Server configuration.
    config: Arc<ServerConfig>,
    /// Write rules consulted before every request reaches the store.
    engine: Arc<RuleEngine>,
}

impl AppState {
    /// Create new application state using the system clock.
    pub fn new(store: Store, config: ServerConfig) -> Self {
        let credentials = Credentials::basic(&config.auth_username, &config.auth_password);
        let engine = RuleEngine::new(credentials, Arc::new(SystemClock));
        Self::with_engine(store, config, engine)
    }

    /// Create application state around a prepared rule engine.
    pub fn with_engine(store: Store, config: ServerConfig, engine: RuleEngine) -> Self {
        Self {
            store,
            config: Arc::new(config),
            engine: Arc::new(engine),
        }
    }

    /// Get a reference to the document store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Get a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get a reference to the rule engine.
    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
