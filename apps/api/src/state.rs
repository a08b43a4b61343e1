use std::sync::Arc;

use crate::config::Config;
use crate::dispatcher::Dispatcher;

/// Shared application state injected into all route handlers via Axum extractors.
/// Nothing here is per-request; uploads and indexes live on the handler's stack.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub dispatcher: Arc<Dispatcher>,
}
