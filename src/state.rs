use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::realtime::Dispatcher;

/// Shared handles cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            dispatcher: Dispatcher::new(),
        }
    }
}
