use mockernetes_storage::ResourceStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// In-memory resource store shared by every handler
    pub store: Arc<ResourceStore>,
}

impl AppState {
    pub fn new(store: Arc<ResourceStore>) -> Self {
        Self { store }
    }
}

impl Default for AppState {
    /// A fresh store seeded with the `default` namespace
    fn default() -> Self {
        Self::new(Arc::new(ResourceStore::new()))
    }
}
