//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::relay::EventRelay;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Central event relay; also exposes the session registry.
    pub relay: Arc<EventRelay>,
}
