//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::Config;
use crate::entities::SqliteStore;
use crate::gateway::ModelGateway;
use crate::services::{ReviewOrchestrator, TurnLocks};

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Persistent store for users, sessions, registry and reviews.
    pub store: Arc<SqliteStore>,
    /// External model service.
    pub gateway: Arc<dyn ModelGateway>,
    /// Per-review turn serialization, shared by every orchestrator.
    pub turn_locks: Arc<TurnLocks>,
}

impl AppState {
    pub fn new(config: Config, store: SqliteStore, gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            gateway,
            turn_locks: Arc::new(TurnLocks::new()),
        }
    }

    /// Orchestrator wired to this state's store and gateway.
    pub fn reviews(&self) -> ReviewOrchestrator<SqliteStore> {
        let reviews = ReviewOrchestrator::new(Arc::clone(&self.store), Arc::clone(&self.gateway));
        if self.config.serialize_turns {
            reviews.with_turn_locks(Arc::clone(&self.turn_locks))
        } else {
            reviews
        }
    }
}
