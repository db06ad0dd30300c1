use crate::container::Container;
use crate::errors::CoreError;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Type-erased service instance
pub type SharedInstance = Arc<dyn Any + Send + Sync>;

/// Type-erased factory; receives the container so it can pull its own dependencies
pub type FactoryFn = dyn Fn(&Container) -> Result<SharedInstance, CoreError> + Send + Sync;

/// Service entry in the registry
pub enum ServiceEntry {
    /// Value stored as-is
    Instance(SharedInstance),
    /// Factory run on first lookup; its result is memoized in `instance`
    Factory {
        factory: Box<FactoryFn>,
        instance: OnceCell<SharedInstance>,
    },
}

impl ServiceEntry {
    /// Whether a value is available without running a factory
    pub fn is_resolved(&self) -> bool {
        match self {
            ServiceEntry::Instance(_) => true,
            ServiceEntry::Factory { instance, .. } => instance.get().is_some(),
        }
    }
}

impl std::fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceEntry::Instance(_) => f.debug_tuple("Instance").field(&"<instance>").finish(),
            ServiceEntry::Factory { instance, .. } => f
                .debug_struct("Factory")
                .field("resolved", &instance.get().is_some())
                .finish(),
        }
    }
}

/// A registered entry together with the type it was registered as
#[derive(Debug)]
pub struct RegisteredService {
    pub type_name: &'static str,
    pub entry: ServiceEntry,
}

/// Name-keyed storage behind [`Container`]
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: HashMap<&'static str, RegisteredService>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the one it replaced
    pub fn insert(
        &mut self,
        name: &'static str,
        type_name: &'static str,
        entry: ServiceEntry,
    ) -> Option<RegisteredService> {
        self.services
            .insert(name, RegisteredService { type_name, entry })
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredService> {
        self.services.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.services
            .get(name)
            .map(|service| service.entry.is_resolved())
            .unwrap_or(false)
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.services.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
