//! Adapter registration table keyed by platform.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::extractor::Platform;

use super::ProviderAdapter;

/// Registration table mapping each platform to its adapter.
///
/// The transfer engine resolves the adapter once per item; platforms with
/// no registered adapter are skipped, not failed.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Platform, Box<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter for its platform, replacing any previous one.
    pub fn register(&mut self, adapter: Box<dyn ProviderAdapter>) {
        let platform = adapter.platform();
        debug!(name = adapter.name(), %platform, "registering provider adapter");
        if let Some(previous) = self.adapters.insert(platform, adapter) {
            warn!(
                name = previous.name(),
                %platform,
                "replaced previously registered adapter"
            );
        }
    }

    /// Returns the adapter registered for a platform, if any.
    #[must_use]
    pub fn adapter_for(&self, platform: Platform) -> Option<&dyn ProviderAdapter> {
        self.adapters.get(&platform).map(AsRef::as_ref)
    }

    /// Returns the number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Returns true if no adapters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Returns the platforms with a registered adapter.
    #[must_use]
    pub fn platforms(&self) -> Vec<Platform> {
        self.adapters.keys().copied().collect()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}
