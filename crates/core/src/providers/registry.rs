use crate::container::Container;
use crate::providers::{ProviderError, ProviderMetadata, ServiceProvider};
use std::collections::HashMap;

/// Orders service providers by their dependencies and runs their phases
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Box<dyn ServiceProvider>>,
    order: Vec<usize>,
    metadata: HashMap<&'static str, ProviderMetadata>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Pending,
    InProgress,
    Done,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider; the execution order is recomputed on next use
    pub fn register<P: ServiceProvider + 'static>(&mut self, provider: P) {
        self.metadata
            .insert(provider.name(), ProviderMetadata::from_provider(&provider));
        self.providers.push(Box::new(provider));
        self.order.clear();
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn get_metadata(&self, name: &str) -> Option<&ProviderMetadata> {
        self.metadata.get(name)
    }

    /// Provider names in execution order; empty until dependencies are resolved
    pub fn execution_order(&self) -> Vec<&'static str> {
        self.order
            .iter()
            .map(|&index| self.providers[index].name())
            .collect()
    }

    /// Sort providers so every provider comes after its dependencies
    pub fn resolve_dependencies(&mut self) -> Result<(), ProviderError> {
        let by_name: HashMap<&'static str, usize> = self
            .providers
            .iter()
            .enumerate()
            .map(|(index, provider)| (provider.name(), index))
            .collect();

        let mut state = vec![Visit::Pending; self.providers.len()];
        let mut order = Vec::with_capacity(self.providers.len());
        for index in 0..self.providers.len() {
            self.visit(index, &by_name, &mut state, &mut order)?;
        }

        self.order = order;
        Ok(())
    }

    fn visit(
        &self,
        index: usize,
        by_name: &HashMap<&'static str, usize>,
        state: &mut [Visit],
        order: &mut Vec<usize>,
    ) -> Result<(), ProviderError> {
        let provider = &self.providers[index];
        match state[index] {
            Visit::Done => return Ok(()),
            Visit::InProgress => {
                return Err(ProviderError::CircularDependency {
                    provider: provider.name().to_string(),
                })
            }
            Visit::Pending => state[index] = Visit::InProgress,
        }

        for dependency in provider.dependencies() {
            let &dependency_index =
                by_name
                    .get(dependency)
                    .ok_or_else(|| ProviderError::MissingDependency {
                        provider: provider.name().to_string(),
                        dependency: dependency.to_string(),
                    })?;
            self.visit(dependency_index, by_name, state, order)?;
        }

        state[index] = Visit::Done;
        order.push(index);
        Ok(())
    }

    /// Run every provider's `register`, dependencies first
    pub fn register_all(&mut self, container: &mut Container) -> Result<(), ProviderError> {
        if self.order.len() != self.providers.len() {
            self.resolve_dependencies()?;
        }

        for &index in &self.order {
            let provider = &self.providers[index];
            tracing::info!(provider = provider.name(), "Registering provider");
            provider.register(container)?;
        }
        Ok(())
    }

    /// Run every provider's `boot` in execution order
    pub fn boot_all(&self, container: &Container) -> Result<(), ProviderError> {
        for &index in &self.order {
            let provider = &self.providers[index];
            tracing::info!(provider = provider.name(), "Booting provider");
            provider
                .boot(container)
                .map_err(|e| ProviderError::BootFailed {
                    message: format!("{}: {}", provider.name(), e),
                })?;
        }
        Ok(())
    }

    /// Order, register and boot everything
    pub fn bootstrap(&mut self, container: &mut Container) -> Result<(), ProviderError> {
        self.resolve_dependencies()?;
        self.register_all(container)?;
        self.boot_all(container)
    }
}
