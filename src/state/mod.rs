/// Per-battle phase state machine.
pub mod phase;
/// Process-local registry of running orchestrators.
pub mod registry;

use std::sync::Arc;

use crate::{dao::battle_store::BattleStore, services::broadcaster::EventSink};

pub use self::registry::{BattleRegistry, Registration, RunId};

/// Handle to the application state shared by handlers and tasks.
pub type SharedState = Arc<AppState>;

/// Central application state shared by the HTTP handlers and orchestrator tasks.
pub struct AppState {
    store: Arc<dyn BattleStore>,
    events: Arc<dyn EventSink>,
    registry: BattleRegistry,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(store: Arc<dyn BattleStore>, events: Arc<dyn EventSink>) -> SharedState {
        Arc::new(Self {
            store,
            events,
            registry: BattleRegistry::new(),
        })
    }

    /// Persistent store holding battle status and phase data.
    pub fn store(&self) -> &Arc<dyn BattleStore> {
        &self.store
    }

    /// Sink receiving every battle event.
    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    /// Battles owned by an orchestrator in this process.
    pub fn registry(&self) -> &BattleRegistry {
        &self.registry
    }
}
