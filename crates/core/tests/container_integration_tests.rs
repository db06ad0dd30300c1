//! Integration tests for the lazy container and provider registry
//!
//! Exercises the container the way an application bootstrap does: several
//! providers register entries, then many threads race for the first lookup.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use stencil_core::{Container, ProviderError, ProviderRegistry, ServiceKey, ServiceProvider};

const BASE_URL: ServiceKey<String> = ServiceKey::new("base_url");
const CLIENT: ServiceKey<Client> = ServiceKey::new("client");

#[derive(Debug)]
struct Client {
    base_url: String,
}

struct SettingsProvider;

impl ServiceProvider for SettingsProvider {
    fn name(&self) -> &'static str {
        "settings"
    }

    fn register(&self, container: &mut Container) -> Result<(), ProviderError> {
        container.set(BASE_URL, "https://example.test".to_string());
        Ok(())
    }
}

struct ClientProvider {
    builds: Arc<AtomicUsize>,
}

impl ServiceProvider for ClientProvider {
    fn name(&self) -> &'static str {
        "client"
    }

    fn register(&self, container: &mut Container) -> Result<(), ProviderError> {
        let builds = self.builds.clone();
        container.set_factory(CLIENT, move |c| {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(Client {
                base_url: c.get(BASE_URL)?.to_string(),
            })
        });
        Ok(())
    }

    fn boot(&self, container: &Container) -> Result<(), ProviderError> {
        if container.contains("base_url") {
            Ok(())
        } else {
            Err(ProviderError::BootFailed {
                message: "base_url is not registered".to_string(),
            })
        }
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["settings"]
    }
}

fn bootstrapped(builds: Arc<AtomicUsize>) -> Container {
    let mut registry = ProviderRegistry::new();
    registry.register(ClientProvider { builds });
    registry.register(SettingsProvider);

    let mut container = Container::new();
    registry.bootstrap(&mut container).unwrap();
    container
}

#[test]
fn test_providers_register_lazily() {
    let builds = Arc::new(AtomicUsize::new(0));
    let container = bootstrapped(builds.clone());

    assert!(container.contains("client"));
    assert!(!container.is_resolved("client"));
    assert_eq!(builds.load(Ordering::SeqCst), 0);

    let client = container.get(CLIENT).unwrap();
    assert_eq!(client.base_url, "https://example.test");
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_first_lookup_builds_once() {
    let builds = Arc::new(AtomicUsize::new(0));
    let container = bootstrapped(builds.clone());

    let clients: Vec<Arc<Client>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| container.get(CLIENT).unwrap()))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("resolver thread panicked"))
            .collect()
    });

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(clients.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

#[test]
fn test_missing_provider_dependency_registers_nothing() {
    let mut registry = ProviderRegistry::new();
    registry.register(ClientProvider {
        builds: Arc::new(AtomicUsize::new(0)),
    });

    let mut container = Container::new();
    // settings provider missing: ordering fails before anything registers
    let err = registry.bootstrap(&mut container).unwrap_err();
    assert!(matches!(err, ProviderError::MissingDependency { .. }));
    assert_eq!(container.service_count(), 0);
}
