//! Shared application state handed to every Axum handler.

use searchctl_core::Config;
use searchctl_engine::EngineClient;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn EngineClient>,
    pub config: Arc<Config>,
    pub index_template: Arc<serde_json::Value>,
}

impl AppState {
    #[must_use]
    pub fn new(engine: Arc<dyn EngineClient>, config: Config, index_template: serde_json::Value) -> Self {
        Self {
            engine,
            config: Arc::new(config),
            index_template: Arc::new(index_template),
        }
    }
}
