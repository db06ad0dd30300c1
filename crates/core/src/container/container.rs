use crate::container::key::ServiceKey;
use crate::container::registry::{ServiceEntry, ServiceRegistry, SharedInstance};
use crate::errors::CoreError;
use once_cell::sync::OnceCell;
use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    /// Entries currently being built on this thread, tagged with their container
    static RESOLVING: RefCell<Vec<(usize, &'static str)>> = const { RefCell::new(Vec::new()) };
}

/// Marks an entry as under construction for the lifetime of the guard
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(owner: usize, name: &'static str) -> Result<Self, CoreError> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|&(o, n)| o == owner && n == name) {
                let path = stack
                    .iter()
                    .filter(|(o, _)| *o == owner)
                    .map(|(_, n)| *n)
                    .chain(std::iter::once(name))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(CoreError::CircularDependency {
                    path,
                    service: name.to_string(),
                });
            }
            stack.push((owner, name));
            Ok(ResolutionGuard)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Dependency injection container with lazily built, memoized entries
///
/// Entries are registered under a [`ServiceKey`] either as a ready value or as a
/// factory receiving the container itself. A factory runs on the first
/// [`get`](Container::get) of its key; the result is shared by every later
/// lookup. Registration needs `&mut self`, lookups only `&self`, so a built
/// container can be shared across threads.
#[derive(Default)]
pub struct Container {
    registry: ServiceRegistry,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ready value
    pub fn set<T>(&mut self, key: ServiceKey<T>, value: T)
    where
        T: Send + Sync + 'static,
    {
        let instance: SharedInstance = Arc::new(value);
        self.insert(key, ServiceEntry::Instance(instance));
    }

    /// Register a factory, run at most once on first lookup
    pub fn set_factory<T, F>(&mut self, key: ServiceKey<T>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        let factory = move |container: &Container| -> Result<SharedInstance, CoreError> {
            let instance: SharedInstance = Arc::new(factory(container)?);
            Ok(instance)
        };
        self.insert(
            key,
            ServiceEntry::Factory {
                factory: Box::new(factory),
                instance: OnceCell::new(),
            },
        );
    }

    fn insert<T>(&mut self, key: ServiceKey<T>, entry: ServiceEntry) {
        if let Some(previous) = self.registry.insert(key.name(), key.type_name(), entry) {
            tracing::debug!(
                service = key.name(),
                was_resolved = previous.entry.is_resolved(),
                "Replacing existing registration"
            );
        } else {
            tracing::debug!(service = key.name(), "Registered service");
        }
    }

    /// Resolve an entry, running its factory if this is the first lookup
    ///
    /// A factory that requests its own key again, directly or through other
    /// factories, fails with [`CoreError::CircularDependency`]. Cycles are
    /// tracked per thread: if two threads start building two entries of the
    /// same cycle at the same time, each waits on the other's build and
    /// neither returns. Resolve cyclic-prone entries from a single thread, or
    /// resolve one of them before sharing the container.
    pub fn get<T>(&self, key: ServiceKey<T>) -> Result<Arc<T>, CoreError>
    where
        T: Send + Sync + 'static,
    {
        let service = self
            .registry
            .get(key.name())
            .ok_or_else(|| CoreError::service_not_found(key.name()))?;

        let instance = match &service.entry {
            ServiceEntry::Instance(instance) => instance,
            ServiceEntry::Factory { factory, instance } => match instance.get() {
                Some(instance) => instance,
                None => {
                    let _guard = ResolutionGuard::enter(self.owner_id(), key.name())?;
                    instance.get_or_try_init(|| {
                        tracing::debug!(service = key.name(), "Building service");
                        factory(self)
                    })?
                }
            },
        };

        instance
            .clone()
            .downcast::<T>()
            .map_err(|_| CoreError::TypeMismatch {
                service: key.name().to_string(),
                expected: key.type_name(),
                actual: service.type_name,
            })
    }

    /// Resolve an entry, returning None when it is missing or fails to build
    pub fn try_get<T>(&self, key: ServiceKey<T>) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get(key).ok()
    }

    /// Check if an entry is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Check if the entry under `name` has a value without running a factory
    pub fn is_resolved(&self, name: &str) -> bool {
        self.registry.is_resolved(name)
    }

    /// Get the number of registered entries
    pub fn service_count(&self) -> usize {
        self.registry.service_count()
    }

    /// Registered entry names, sorted
    pub fn keys(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    fn owner_id(&self) -> usize {
        self as *const Self as usize
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.service_count())
            .field("keys", &self.keys())
            .finish()
    }
}
