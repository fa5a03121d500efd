use std::sync::Arc;

use craft_core::Crafter;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub crafter: Arc<Crafter>,
}

impl AppState {
    pub fn new(crafter: Crafter) -> Self {
        Self {
            crafter: Arc::new(crafter),
        }
    }
}
