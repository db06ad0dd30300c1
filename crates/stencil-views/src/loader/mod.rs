//! Template loaders.
//!
//! A [`Loader`] turns a template name into its source text. Loaders compose:
//! [`ChainLoader`] asks an ordered list of loaders and returns the first hit,
//! so an application can stack a [`FilesystemLoader`] on top of, say, a
//! [`MemoryLoader`] holding built-in fallbacks.

pub mod chain;
pub mod filesystem;
pub mod memory;

pub use chain::ChainLoader;
pub use filesystem::FilesystemLoader;
pub use memory::MemoryLoader;

use crate::error::ViewResult;
use std::path::PathBuf;
use std::time::SystemTime;

/// Source text of a template together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub name: String,
    pub code: String,
    pub path: Option<PathBuf>,
}

impl TemplateSource {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Resolves template names to source text
pub trait Loader: Send + Sync {
    /// Fetch the source of `name`, or fail with `TemplateNotFound`
    fn source(&self, name: &str) -> ViewResult<TemplateSource>;

    /// Key that changes whenever `name` would resolve to a different template
    fn cache_key(&self, name: &str) -> ViewResult<String>;

    /// Whether `name` is unchanged since `time`
    fn is_fresh(&self, name: &str, time: SystemTime) -> ViewResult<bool>;

    /// Whether this loader can resolve `name`
    fn exists(&self, name: &str) -> bool;

    /// Short label used in diagnostics
    fn describe(&self) -> String {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("loader")
            .to_string()
    }
}
