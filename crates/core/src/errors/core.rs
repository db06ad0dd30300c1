use crate::config::ConfigError;
use thiserror::Error;

/// Errors raised by the container while resolving entries
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Nothing is registered under '{service}'")]
    ServiceNotFound { service: String },

    #[error("Service '{service}' holds a {actual} but was requested as {expected}")]
    TypeMismatch {
        service: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Circular dependency while building '{service}': {path}")]
    CircularDependency { path: String, service: String },
}

impl CoreError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn service_not_found(service: impl Into<String>) -> Self {
        Self::ServiceNotFound {
            service: service.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// True when the requested key has no registration
    pub fn is_service(&self) -> bool {
        matches!(self, Self::ServiceNotFound { .. })
    }
}

impl From<ConfigError> for CoreError {
    fn from(error: ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}
