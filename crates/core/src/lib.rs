//! # stencil-core
//!
//! Foundation of the stencil view layer: a lazy, name-keyed service container,
//! service providers that fill it, and shared configuration primitives.

pub mod config;
pub mod container;
pub mod errors;
pub mod providers;

pub use config::{AppConfigTrait, ConfigError, ConfigSource, Environment};
pub use container::{Container, ServiceKey};
pub use errors::CoreError;
pub use providers::{ProviderError, ProviderMetadata, ProviderRegistry, ServiceProvider};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}
