//! Application state shared across the host tasks

use std::sync::Arc;

use crate::config::Config;
use crate::game::{GameHooks, GameRegistry};
use crate::host::TracingHost;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<GameRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_hooks(config, GameHooks::from_single(Arc::new(TracingHost)))
    }

    /// Build the state around explicit collaborators
    pub fn with_hooks(config: Config, hooks: GameHooks) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(GameRegistry::new(hooks)),
        }
    }
}
