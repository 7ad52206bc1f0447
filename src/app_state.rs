//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::LedgerService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Ledger service for all business logic.
    pub ledger: Arc<LedgerService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wraps `ledger`, sharing its event bus with the WebSocket layer.
    #[must_use]
    pub fn new(ledger: Arc<LedgerService>) -> Self {
        let event_bus = ledger.event_bus().clone();
        Self { ledger, event_bus }
    }
}
