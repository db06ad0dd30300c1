use crate::container::Container;
use crate::errors::CoreError;
use serde::Serialize;

/// Errors raised while ordering, registering or booting providers
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider '{provider}' is part of a dependency cycle")]
    CircularDependency { provider: String },

    #[error("Provider '{provider}' requires '{dependency}', which is not registered")]
    MissingDependency { provider: String, dependency: String },

    #[error("Boot failed: {message}")]
    BootFailed { message: String },

    #[error(transparent)]
    Container(#[from] CoreError),
}

/// Fills a [`Container`] with related entries
///
/// A [`ProviderRegistry`](crate::ProviderRegistry) calls `register` on every
/// provider, dependencies first, then `boot` on each of them.
pub trait ServiceProvider: Send + Sync {
    /// Unique name, referenced by other providers' `dependencies`
    fn name(&self) -> &'static str;

    /// Store values and factories; nothing should be built here
    fn register(&self, container: &mut Container) -> Result<(), ProviderError>;

    /// Runs once every provider has registered
    fn boot(&self, _container: &Container) -> Result<(), ProviderError> {
        Ok(())
    }

    fn dependencies(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn description(&self) -> Option<&'static str> {
        None
    }
}

/// Snapshot of a provider's name, description and dependencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderMetadata {
    pub name: String,
    pub description: Option<String>,
    pub dependencies: Vec<String>,
}

impl ProviderMetadata {
    pub fn from_provider<P: ServiceProvider + ?Sized>(provider: &P) -> Self {
        Self {
            name: provider.name().to_owned(),
            description: provider.description().map(str::to_owned),
            dependencies: provider
                .dependencies()
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
