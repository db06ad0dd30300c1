use crate::cache_dir::default_cache_directory;
use crate::config::ViewConfig;
use crate::engine::Engine;
use crate::keys::{
    CACHE_DIRECTORY, ENGINE, EXTENSIONS, FILESYSTEM_LOADER, LOADER, LOADERS, LOADER_CHAIN,
    OPTIONS, TEMPLATE_DIRECTORY,
};
use crate::loader::{ChainLoader, FilesystemLoader, Loader};
use crate::options::EngineOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stencil_core::{Container, CoreError, ProviderError, ServiceProvider};

/// Registers a lazily built, fully configured [`Engine`] in a [`Container`]
///
/// ```rust,no_run
/// use stencil_core::Container;
/// use stencil_views::{keys, TemplateServiceProvider};
///
/// let mut container = Container::new();
/// TemplateServiceProvider::new("/srv/app/views").bootstrap(&mut container);
///
/// let engine = container.get(keys::ENGINE)?;
/// # Ok::<(), stencil_core::CoreError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateServiceProvider {
    template_directory: PathBuf,
    cache_directory: PathBuf,
    debug: bool,
}

impl TemplateServiceProvider {
    /// Provider for `template_directory` with the default cache directory, in debug mode
    pub fn new(template_directory: impl Into<PathBuf>) -> Self {
        Self::with_options(template_directory, None, true)
    }

    /// Provider with explicit settings; `None` picks the default cache directory
    pub fn with_options(
        template_directory: impl Into<PathBuf>,
        cache_directory: Option<PathBuf>,
        debug: bool,
    ) -> Self {
        Self {
            template_directory: template_directory.into(),
            cache_directory: cache_directory.unwrap_or_else(default_cache_directory),
            debug,
        }
    }

    pub fn from_config(config: &ViewConfig) -> Self {
        Self::with_options(
            &config.template_directory,
            config.cache_directory.clone(),
            config.debug,
        )
    }

    pub fn template_directory(&self) -> &Path {
        &self.template_directory
    }

    pub fn cache_directory(&self) -> &Path {
        &self.cache_directory
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Register the engine and everything it is built from
    ///
    /// Only factories and plain values are stored; nothing is built and the
    /// filesystem is not touched until [`ENGINE`] is first requested. Calling
    /// this again replaces the previous registrations.
    pub fn bootstrap(&self, container: &mut Container) {
        tracing::debug!(
            template_directory = %self.template_directory.display(),
            cache_directory = %self.cache_directory.display(),
            debug = self.debug,
            "Bootstrapping view services"
        );

        container.set_factory(ENGINE, Self::create_engine);
        container.set_factory(LOADER, |c| {
            let chain = c.get(LOADER_CHAIN)?;
            Ok(chain as Arc<dyn Loader>)
        });
        container.set_factory(LOADER_CHAIN, Self::create_loader_chain);

        let debug = self.debug;
        container.set_factory(OPTIONS, move |c| Self::create_options(c, debug));

        container.set_factory(LOADERS, Self::create_loaders);
        container.set_factory(FILESYSTEM_LOADER, Self::create_filesystem_loader);

        container.set(TEMPLATE_DIRECTORY, self.template_directory.clone());
        container.set(CACHE_DIRECTORY, self.cache_directory.clone());
        container.set(EXTENSIONS, Vec::new());
    }

    pub fn create_engine(container: &Container) -> Result<Engine, CoreError> {
        let loader = container.get(LOADER)?;
        let options = container.get(OPTIONS)?;

        let mut engine = Engine::new(Arc::clone(&*loader), EngineOptions::clone(&options));
        engine.set_extensions(container.get(EXTENSIONS)?.to_vec());
        Ok(engine)
    }

    /// Options are always auto-reloading; `debug` comes from the provider
    pub fn create_options(container: &Container, debug: bool) -> Result<EngineOptions, CoreError> {
        let cache = container.get(CACHE_DIRECTORY)?;
        Ok(EngineOptions::new(debug, true, Some(PathBuf::clone(&cache))))
    }

    pub fn create_loader_chain(container: &Container) -> Result<ChainLoader, CoreError> {
        Ok(ChainLoader::new(container.get(LOADERS)?.to_vec()))
    }

    pub fn create_loaders(container: &Container) -> Result<Vec<Arc<dyn Loader>>, CoreError> {
        let filesystem = container.get(FILESYSTEM_LOADER)?;
        Ok(vec![filesystem as Arc<dyn Loader>])
    }

    pub fn create_filesystem_loader(container: &Container) -> Result<FilesystemLoader, CoreError> {
        let root = container.get(TEMPLATE_DIRECTORY)?;
        Ok(FilesystemLoader::new(PathBuf::clone(&root)))
    }
}

impl ServiceProvider for TemplateServiceProvider {
    fn name(&self) -> &'static str {
        "views"
    }

    fn register(&self, container: &mut Container) -> Result<(), ProviderError> {
        self.bootstrap(container);
        Ok(())
    }

    fn boot(&self, _container: &Container) -> Result<(), ProviderError> {
        if !self.template_directory.is_dir() {
            tracing::warn!(
                "Template directory {} does not exist; template lookups will fail",
                self.template_directory.display()
            );
        }
        tracing::info!("View service provider booted");
        Ok(())
    }

    fn description(&self) -> Option<&'static str> {
        Some("Tera view engine with filesystem loader chain and compiled template cache")
    }
}
