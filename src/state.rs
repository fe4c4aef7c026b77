use std::sync::Arc;

use tracing::info;

use crate::engine::ledger::PickupLedger;
use crate::engine::session::SessionManager;
use crate::observability::metrics::Metrics;
use crate::store::KeyValueStore;

/// Everything the UI layer talks to, built once at process start and handed
/// around by reference.
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub session: SessionManager,
    pub ledger: PickupLedger,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(store: Arc<dyn KeyValueStore>, event_buffer_size: usize) -> Self {
        let metrics = Metrics::new();

        Self {
            session: SessionManager::new(store.clone(), metrics.clone()),
            ledger: PickupLedger::new(store.clone(), metrics.clone(), event_buffer_size),
            store,
            metrics,
        }
    }

    /// Builds the state and loads the persisted session and ledger.
    pub async fn bootstrap(store: Arc<dyn KeyValueStore>, event_buffer_size: usize) -> Self {
        let state = Self::new(store, event_buffer_size);

        let (session, loaded) = tokio::join!(state.session.load_session(), state.ledger.refresh());

        info!(
            backend = state.store.backend_tag(),
            authenticated = session.is_authenticated,
            pickups = loaded.unwrap_or_default(),
            "application state ready"
        );
        state
    }
}
