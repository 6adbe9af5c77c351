//! System type to adapter constructor mapping

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::adapter::SiteAdapter;
use crate::errors::AdapterError;
use crate::gitlab::GitlabAdapter;

/// Builds a fresh adapter instance.
pub type AdapterFactory =
    Arc<dyn Fn() -> Result<Arc<dyn SiteAdapter>, AdapterError> + Send + Sync>;

/// Registry of adapter constructors keyed by system type.
///
/// Supporting a new tracker is a `register` call; lookup never branches on
/// concrete types.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    factories: BTreeMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    /// Registry without any adapters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every adapter shipped in this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            "gitlab",
            Arc::new(|| -> Result<Arc<dyn SiteAdapter>, AdapterError> {
                Ok(Arc::new(GitlabAdapter::new()?))
            }),
        );
        registry
    }

    /// Register (or replace) the constructor for `system_type`.
    pub fn register(
        &mut self,
        system_type: impl AsRef<str>,
        factory: AdapterFactory,
    ) -> Option<AdapterFactory> {
        self.factories.insert(normalize(system_type.as_ref()), factory)
    }

    pub fn supports(&self, system_type: &str) -> bool {
        self.factories.contains_key(&normalize(system_type))
    }

    /// Construct the adapter for `system_type`.
    pub fn create(&self, system_type: &str) -> Result<Arc<dyn SiteAdapter>, AdapterError> {
        let factory = self
            .factories
            .get(&normalize(system_type))
            .ok_or_else(|| AdapterError::UnsupportedSystemType(system_type.to_string()))?;
        factory()
    }

    pub fn system_types(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("system_types", &self.system_types())
            .finish()
    }
}

fn normalize(system_type: &str) -> String {
    system_type.trim().to_ascii_lowercase()
}
