//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::relay::RelayHub;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub hub: Arc<RelayHub>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Initialize the relay hub (connection registry lives inside it)
        let hub = Arc::new(RelayHub::new());

        Self { config, hub }
    }
}
