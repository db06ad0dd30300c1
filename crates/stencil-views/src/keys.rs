//! Container keys registered by [`TemplateServiceProvider`](crate::TemplateServiceProvider).

use crate::engine::Engine;
use crate::extension::Extension;
use crate::loader::{ChainLoader, FilesystemLoader, Loader};
use crate::options::EngineOptions;
use std::path::PathBuf;
use std::sync::Arc;
use stencil_core::ServiceKey;

/// Fully configured engine
pub const ENGINE: ServiceKey<Engine> = ServiceKey::new("stencil_views::Engine");

/// Loader the engine reads from; resolves to the loader chain
pub const LOADER: ServiceKey<Arc<dyn Loader>> = ServiceKey::new("stencil_views::Loader");

pub const LOADER_CHAIN: ServiceKey<ChainLoader> = ServiceKey::new("stencil_views::ChainLoader");

pub const FILESYSTEM_LOADER: ServiceKey<FilesystemLoader> =
    ServiceKey::new("stencil_views::FilesystemLoader");

/// Members of the loader chain, in lookup order
pub const LOADERS: ServiceKey<Vec<Arc<dyn Loader>>> = ServiceKey::new("loaders");

pub const OPTIONS: ServiceKey<EngineOptions> = ServiceKey::new("options");

pub const TEMPLATE_DIRECTORY: ServiceKey<PathBuf> = ServiceKey::new("templateDirectory");

pub const CACHE_DIRECTORY: ServiceKey<PathBuf> = ServiceKey::new("cacheDirectory");

/// Extensions injected into the engine after construction
pub const EXTENSIONS: ServiceKey<Vec<Arc<dyn Extension>>> = ServiceKey::new("extensions");
