use std::path::PathBuf;
use stencil_core::CoreError;
use thiserror::Error;

/// View layer errors
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Template \"{name}\" not found: {message}")]
    TemplateNotFound { name: String, message: String },

    #[error("Invalid template name \"{name}\": {message}")]
    InvalidName { name: String, message: String },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template cache error on {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render template \"{name}\": {source}")]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Lock error on resource: {resource}")]
    Lock { resource: String },

    #[error("Container error: {0}")]
    Container(#[from] CoreError),
}

impl ViewError {
    pub fn not_found(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TemplateNotFound {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_name(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn cache(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Cache {
            path: path.into(),
            source,
        }
    }

    pub fn render(name: impl Into<String>, source: tera::Error) -> Self {
        Self::Render {
            name: name.into(),
            source,
        }
    }

    pub fn lock(resource: impl Into<String>) -> Self {
        Self::Lock {
            resource: resource.into(),
        }
    }

    /// Check if the error means no loader knows the template
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TemplateNotFound { .. })
    }
}

/// Result alias used throughout the view layer
pub type ViewResult<T> = Result<T, ViewError>;
