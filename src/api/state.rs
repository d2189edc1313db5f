//! Application state for the Professional Tax API.

use std::sync::Arc;

use crate::calculation::ProfessionalTaxHook;
use crate::config::{ConfigLoader, Settings};
use crate::store::InMemoryStore;

/// Shared application state.
///
/// Holds the hook and its master data behind an `Arc`; requests only read
/// it, and each request owns the slip it mutates.
#[derive(Clone)]
pub struct AppState {
    hook: Arc<ProfessionalTaxHook<InMemoryStore>>,
}

impl AppState {
    /// Creates application state from a loaded configuration directory.
    pub fn new(config: ConfigLoader) -> Self {
        let (store, settings) = config.into_parts();
        Self::from_parts(store, settings)
    }

    /// Creates application state from a store and settings.
    pub fn from_parts(store: InMemoryStore, settings: Settings) -> Self {
        Self {
            hook: Arc::new(ProfessionalTaxHook::new(store, settings)),
        }
    }

    /// Returns the hook.
    pub fn hook(&self) -> &ProfessionalTaxHook<InMemoryStore> {
        &self.hook
    }
}
