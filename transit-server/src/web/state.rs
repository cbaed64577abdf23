//! Application state for the web layer.

use std::sync::Arc;

use crate::domain::ProviderId;
use crate::provider::EdgeProvider;

/// Shared application state.
///
/// Providers are registered once at startup; their order is the tie-break
/// order for departure listings and edge discovery.
#[derive(Clone)]
pub struct AppState {
    /// Registered edge providers, in priority order.
    pub providers: Arc<Vec<Arc<dyn EdgeProvider>>>,

    /// Providers whose edges the alternatives endpoint may vary.
    pub variable: Arc<Vec<ProviderId>>,
}

impl AppState {
    /// Create app state. Scheduled providers are the ones varied when
    /// enumerating alternatives; walking legs stay fixed.
    pub fn new(providers: Vec<Arc<dyn EdgeProvider>>) -> Self {
        let variable = providers
            .iter()
            .map(|provider| provider.id())
            .filter(|id| !id.is_walking())
            .collect();
        Self {
            providers: Arc::new(providers),
            variable: Arc::new(variable),
        }
    }
}
