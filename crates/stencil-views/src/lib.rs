//! # stencil-views
//!
//! Tera-backed view layer for applications built on the stencil service
//! container.
//!
//! [`TemplateServiceProvider::bootstrap`] registers a lazily built [`Engine`]
//! together with the pieces it is assembled from: a [`ChainLoader`] holding a
//! [`FilesystemLoader`] rooted at the template directory, [`EngineOptions`]
//! pointing at a per-user compiled template cache, and an empty extension list.
//! Every piece lives under its own [`keys`] entry, so an application can
//! override any of them before the engine is first requested.
//!
//! ```rust,no_run
//! use stencil_core::Container;
//! use stencil_views::{keys, TemplateServiceProvider};
//! use stencil_views::tera::Context;
//!
//! let mut container = Container::new();
//! TemplateServiceProvider::new("templates").bootstrap(&mut container);
//!
//! let mut context = Context::new();
//! context.insert("name", "David");
//! let html = container.get(keys::ENGINE)?.render("test", &context)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache;
pub mod cache_dir;
pub mod config;
pub mod engine;
pub mod error;
pub mod extension;
pub mod keys;
pub mod loader;
pub mod options;
pub mod provider;

pub use cache::{FilesystemCache, NullCache, TemplateCache};
pub use cache_dir::default_cache_directory;
pub use config::ViewConfig;
pub use engine::Engine;
pub use error::{ViewError, ViewResult};
pub use extension::{DebugExtension, Extension};
pub use loader::{ChainLoader, FilesystemLoader, Loader, MemoryLoader, TemplateSource};
pub use options::EngineOptions;
pub use provider::TemplateServiceProvider;

pub use tera;
