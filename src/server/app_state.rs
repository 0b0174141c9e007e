use std::sync::Arc;

use crate::{configs::Config, server::SessionRegistry, ws::EventRouter};

/// Top-level application state.
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub router: EventRouter,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.session.clone()));
        Self {
            router: EventRouter::new(registry.clone()),
            registry,
            config,
        }
    }
}
