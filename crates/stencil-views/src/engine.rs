use crate::cache::{FilesystemCache, NullCache, TemplateCache};
use crate::error::{ViewError, ViewResult};
use crate::extension::{DebugExtension, Extension};
use crate::loader::Loader;
use crate::options::EngineOptions;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;
use tera::{Context, Tera};
use tracing::debug;

/// `{% extends %}`, `{% include %}` and `{% import %}` tags
static DEPENDENCY_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\{%-?\s*(extends|include|import)\s+(.*?)-?%\}").expect("valid tag regex")
});

/// Comments and `raw` blocks, whose tags tera never evaluates
static INERT_REGION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\{#.*?#\}|\{%-?\s*raw\s*-?%\}.*?\{%-?\s*endraw\s*-?%\}")
        .expect("valid inert region regex")
});

/// Quoted string literal in any of the quote styles tera accepts
static STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)"|'([^']*)'|`([^`]*)`"#).expect("valid literal regex"));

/// A template referenced by another template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    /// Missing optional dependencies are left for tera to handle at render time
    pub optional: bool,
}

/// Templates referenced by `code` through string literals
///
/// Parents (`extends`) and macro files (`import`) are required. Includes are
/// optional since tera only resolves them when the enclosing branch renders.
/// Names built from variables cannot be discovered and must be loaded
/// explicitly with [`Engine::load_template`].
pub fn template_dependencies(code: &str) -> Vec<Dependency> {
    let code = INERT_REGION.replace_all(code, "");
    let mut dependencies = Vec::new();
    for tag in DEPENDENCY_TAG.captures_iter(&code) {
        let kind = &tag[1];
        let args = &tag[2];
        let names: Vec<&str> = STRING_LITERAL
            .captures_iter(args)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
            .map(|m| m.as_str())
            .collect();

        let optional = kind == "include";
        for name in names {
            if !dependencies.iter().any(|d: &Dependency| d.name == name) {
                dependencies.push(Dependency {
                    name: name.to_string(),
                    optional,
                });
            }
        }
    }
    dependencies
}

#[derive(Debug)]
struct LoadedTemplate {
    loaded_at: SystemTime,
    dependencies: Vec<Dependency>,
}

struct PendingTemplate {
    name: String,
    code: String,
    dependencies: Vec<Dependency>,
}

/// Template engine: pulls sources from a [`Loader`] and renders them with tera
///
/// Templates are loaded lazily on first render, together with everything they
/// extend, include or import. With `auto_reload` each render first asks the
/// loader whether the template or any of its dependencies changed. With a
/// `cache` directory, resolved sources are persisted there and reused by later
/// engines instead of asking the loader again.
pub struct Engine {
    loader: Arc<dyn Loader>,
    options: EngineOptions,
    cache: Box<dyn TemplateCache>,
    tera: RwLock<Tera>,
    loaded: RwLock<HashMap<String, LoadedTemplate>>,
    extensions: Vec<Arc<dyn Extension>>,
}

impl Engine {
    pub fn new(loader: Arc<dyn Loader>, options: EngineOptions) -> Self {
        let cache: Box<dyn TemplateCache> = match &options.cache {
            Some(directory) => Box::new(FilesystemCache::new(directory)),
            None => Box::new(NullCache),
        };

        Self {
            tera: RwLock::new(Self::base_tera(&options)),
            loader,
            options,
            cache,
            loaded: RwLock::new(HashMap::new()),
            extensions: Vec::new(),
        }
    }

    fn base_tera(options: &EngineOptions) -> Tera {
        let mut tera = Tera::default();
        if options.debug {
            DebugExtension.register(&mut tera);
        }
        tera
    }

    pub fn loader(&self) -> &Arc<dyn Loader> {
        &self.loader
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.extensions
    }

    /// Replace the extension list
    ///
    /// Filters from previously set extensions are dropped and loaded templates
    /// are discarded, so they are reloaded on next use.
    pub fn set_extensions(&mut self, extensions: Vec<Arc<dyn Extension>>) {
        let mut tera = Self::base_tera(&self.options);
        for extension in &extensions {
            debug!(extension = extension.name(), "Registering view extension");
            extension.register(&mut tera);
        }

        *self.tera.get_mut().unwrap_or_else(PoisonError::into_inner) = tera;
        self.loaded
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.extensions = extensions;
    }

    /// Register one more extension on top of the current ones
    pub fn add_extension(&mut self, extension: Arc<dyn Extension>) {
        debug!(extension = extension.name(), "Registering view extension");
        extension.register(self.tera.get_mut().unwrap_or_else(PoisonError::into_inner));
        self.extensions.push(extension);
    }

    /// Whether the loader knows `name`
    pub fn has_template(&self, name: &str) -> bool {
        self.loader.exists(name)
    }

    /// Names of the templates loaded so far, sorted
    pub fn loaded_templates(&self) -> ViewResult<Vec<String>> {
        let loaded = self.loaded.read().map_err(|_| ViewError::lock("engine.loaded"))?;
        let mut names: Vec<String> = loaded.keys().cloned().collect();
        names.sort_unstable();
        Ok(names)
    }

    /// Render `name` with the given context
    pub fn render(&self, name: &str, context: &Context) -> ViewResult<String> {
        self.load_template(name)?;
        let tera = self.tera.read().map_err(|_| ViewError::lock("engine.tera"))?;
        tera.render(name, context)
            .map_err(|e| ViewError::render(name, e))
    }

    /// Render `name` with any serializable mapping as context
    pub fn render_serialize<T: Serialize>(&self, name: &str, data: &T) -> ViewResult<String> {
        let context = Context::from_serialize(data).map_err(|e| ViewError::Serialization {
            message: e.to_string(),
        })?;
        self.render(name, &context)
    }

    /// Make sure `name` and its dependencies are loaded and current
    pub fn load_template(&self, name: &str) -> ViewResult<()> {
        let started = SystemTime::now();
        let mut batch = Vec::new();
        {
            let loaded = self.loaded.read().map_err(|_| ViewError::lock("engine.loaded"))?;
            if !self.options.auto_reload && loaded.contains_key(name) {
                return Ok(());
            }
            self.collect(name, &loaded, &mut HashSet::new(), &mut batch)?;
        }

        if batch.is_empty() {
            return Ok(());
        }

        {
            let mut tera = self.tera.write().map_err(|_| ViewError::lock("engine.tera"))?;
            tera.add_raw_templates(
                batch
                    .iter()
                    .map(|template| (template.name.as_str(), template.code.as_str())),
            )
            .map_err(|e| ViewError::render(name, e))?;
        }

        let mut loaded = self.loaded.write().map_err(|_| ViewError::lock("engine.loaded"))?;
        for template in batch {
            debug!(template = %template.name, debug = self.options.debug, "Loaded template");
            loaded.insert(
                template.name,
                LoadedTemplate {
                    loaded_at: started,
                    dependencies: template.dependencies,
                },
            );
        }
        Ok(())
    }

    /// Queue `name` and its dependency tree for loading where missing or stale
    fn collect(
        &self,
        name: &str,
        loaded: &HashMap<String, LoadedTemplate>,
        visited: &mut HashSet<String>,
        batch: &mut Vec<PendingTemplate>,
    ) -> ViewResult<()> {
        if !visited.insert(name.to_string()) {
            return Ok(());
        }

        let dependencies = match loaded.get(name) {
            Some(entry) if !self.options.auto_reload || self.loader.is_fresh(name, entry.loaded_at)? => {
                entry.dependencies.clone()
            }
            previous => {
                if previous.is_some() {
                    debug!(template = name, "Template changed, reloading");
                }
                let code = self.load_source(name)?;
                let dependencies = template_dependencies(&code);
                batch.push(PendingTemplate {
                    name: name.to_string(),
                    code,
                    dependencies: dependencies.clone(),
                });
                dependencies
            }
        };

        for dependency in dependencies {
            match self.collect(&dependency.name, loaded, visited, batch) {
                Err(e) if dependency.optional && e.is_not_found() => {
                    debug!(template = name, dependency = %dependency.name, "Skipping missing optional template");
                }
                other => other?,
            }
        }
        Ok(())
    }

    /// Source of `name`, from the cache when it holds a current copy
    fn load_source(&self, name: &str) -> ViewResult<String> {
        let loader_key = self.loader.cache_key(name)?;
        let key = self.cache.generate_key(name, &loader_key);

        if let Some(written) = self.cache.timestamp(&key) {
            if !self.options.auto_reload || self.loader.is_fresh(name, written)? {
                if let Some(code) = self.cache.load(&key)? {
                    debug!(template = name, "Using cached template");
                    return Ok(code);
                }
            } else {
                debug!(template = name, "Cached template is stale");
            }
        }

        let source = self.loader.source(name)?;
        self.cache.write(&key, &source.code)?;
        Ok(source.code)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("loader", &self.loader.describe())
            .field("options", &self.options)
            .field(
                "extensions",
                &self.extensions.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{FilesystemLoader, MemoryLoader};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn memory_engine(templates: &[(&str, &str)], options: EngineOptions) -> Engine {
        let loader: MemoryLoader = templates.iter().copied().collect();
        Engine::new(Arc::new(loader), options)
    }

    fn context(name: &str) -> Context {
        let mut context = Context::new();
        context.insert("name", name);
        context
    }

    fn touch_future(path: &std::path::Path) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(30))
            .unwrap();
    }

    #[test]
    fn test_dependencies_from_tags() {
        let code = r#"{% extends "base.html" %}
{% import 'macros.html' as m %}
{%- include "a.html" -%}
{% include ["b.html", "c.html"] %}
{% include "d.html" ignore missing %}
{% include "a.html" %}"#;

        let dependencies = template_dependencies(code);
        let names: Vec<&str> = dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["base.html", "macros.html", "a.html", "b.html", "c.html", "d.html"]
        );
        let optional: Vec<bool> = dependencies.iter().map(|d| d.optional).collect();
        assert_eq!(optional, vec![false, false, true, true, true, true]);
    }

    #[test]
    fn test_dependencies_skip_comments_and_raw_blocks() {
        let code = r#"{# {% extends "old.html" %} #}
{%- raw %}{% include "example.html" %}{% endraw -%}
{% import "macros.html" as m %}"#;

        let dependencies = template_dependencies(code);
        assert_eq!(
            dependencies,
            vec![Dependency {
                name: "macros.html".to_string(),
                optional: false,
            }]
        );
    }

    #[test]
    fn test_inert_tags_do_not_block_rendering() {
        let engine = memory_engine(
            &[
                ("commented", r#"{# {% include "ghost" %} #}ok"#),
                ("raw", r#"{% raw %}{% include "ghost" %}{% endraw %}ok"#),
                ("branch", r#"{% if false %}{% include "ghost" %}{% endif %}ok"#),
            ],
            EngineOptions::default(),
        );

        assert_eq!(engine.render("commented", &Context::new()).unwrap(), "ok");
        assert_eq!(
            engine.render("raw", &Context::new()).unwrap(),
            r#"{% include "ghost" %}ok"#
        );
        assert_eq!(engine.render("branch", &Context::new()).unwrap(), "ok");
    }

    #[test]
    fn test_missing_include_that_renders_is_a_render_error() {
        let engine = memory_engine(
            &[("page", r#"{% include "ghost" %}"#)],
            EngineOptions::default(),
        );
        assert!(matches!(
            engine.render("page", &Context::new()),
            Err(ViewError::Render { .. })
        ));
    }

    #[test]
    fn test_renders_with_inheritance() {
        let engine = memory_engine(
            &[
                ("base", "[{% block body %}{% endblock body %}]"),
                ("page", r#"{% extends "base" %}{% block body %}Hi {{ name }}{% endblock body %}"#),
            ],
            EngineOptions::default(),
        );

        assert_eq!(engine.render("page", &context("David")).unwrap(), "[Hi David]");
        assert_eq!(engine.loaded_templates().unwrap(), vec!["base", "page"]);
    }

    #[test]
    fn test_missing_optional_include_is_tolerated() {
        let engine = memory_engine(
            &[("page", r#"A{% include "ghost" ignore missing %}B"#)],
            EngineOptions::default(),
        );
        assert_eq!(engine.render("page", &Context::new()).unwrap(), "AB");
    }

    #[test]
    fn test_missing_parent_is_not_found() {
        let engine = memory_engine(
            &[("page", r#"{% extends "ghost" %}"#)],
            EngineOptions::default(),
        );
        assert!(engine.render("page", &Context::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_render_serialize() {
        #[derive(Serialize)]
        struct Greeting<'a> {
            name: &'a str,
        }

        let engine = memory_engine(&[("hello", "Hello {{ name }}")], EngineOptions::default());
        let rendered = engine
            .render_serialize("hello", &Greeting { name: "David" })
            .unwrap();
        assert_eq!(rendered, "Hello David");
        assert!(matches!(
            engine.render_serialize("hello", &"not a map"),
            Err(ViewError::Serialization { .. })
        ));
    }

    #[test]
    fn test_undefined_variable_is_a_render_error() {
        let engine = memory_engine(&[("hello", "Hello {{ name }}")], EngineOptions::default());
        assert!(matches!(
            engine.render("hello", &Context::new()),
            Err(ViewError::Render { .. })
        ));
    }

    #[test]
    fn test_dump_only_in_debug() {
        let templates = [("t", "{{ name | dump }}")];

        let debug = memory_engine(&templates, EngineOptions::new(true, true, None));
        assert_eq!(debug.render("t", &context("David")).unwrap(), "\"David\"");

        let quiet = memory_engine(&templates, EngineOptions::default());
        assert!(quiet.render("t", &context("David")).is_err());
    }

    #[test]
    fn test_extensions_can_be_replaced() {
        fn shout(
            value: &tera::Value,
            _: &HashMap<String, tera::Value>,
        ) -> tera::Result<tera::Value> {
            Ok(tera::Value::String(
                value.as_str().unwrap_or_default().to_uppercase(),
            ))
        }

        struct Shout;
        impl Extension for Shout {
            fn name(&self) -> &str {
                "shout"
            }
            fn register(&self, tera: &mut Tera) {
                tera.register_filter("shout", shout);
            }
        }

        let mut engine = memory_engine(&[("t", "{{ name | shout }}")], EngineOptions::default());
        engine.set_extensions(vec![Arc::new(Shout)]);
        assert_eq!(engine.render("t", &context("david")).unwrap(), "DAVID");
        assert_eq!(engine.extensions().len(), 1);

        engine.set_extensions(Vec::new());
        assert!(engine.render("t", &context("david")).is_err());
    }

    #[test]
    fn test_auto_reload_picks_up_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "v1 {{ name }}").unwrap();

        let engine = Engine::new(
            Arc::new(FilesystemLoader::new(dir.path())),
            EngineOptions::new(false, true, None),
        );
        assert_eq!(engine.render("page.html", &context("x")).unwrap(), "v1 x");

        fs::write(&path, "v2 {{ name }}").unwrap();
        touch_future(&path);
        assert_eq!(engine.render("page.html", &context("x")).unwrap(), "v2 x");
    }

    #[test]
    fn test_without_auto_reload_first_load_sticks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "v1").unwrap();

        let engine = Engine::new(
            Arc::new(FilesystemLoader::new(dir.path())),
            EngineOptions::default(),
        );
        assert_eq!(engine.render("page.html", &Context::new()).unwrap(), "v1");

        fs::write(&path, "v2").unwrap();
        touch_future(&path);
        assert_eq!(engine.render("page.html", &Context::new()).unwrap(), "v1");
    }

    #[test]
    fn test_cache_directory_snapshots_are_reused() {
        let views = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let path = views.path().join("page.html");
        fs::write(&path, "v1").unwrap();

        let engine_with = |auto_reload: bool| {
            Engine::new(
                Arc::new(FilesystemLoader::new(views.path())),
                EngineOptions::new(false, auto_reload, Some(cache.path().to_path_buf())),
            )
        };

        assert_eq!(engine_with(true).render("page.html", &Context::new()).unwrap(), "v1");
        assert!(fs::read_dir(cache.path()).unwrap().next().is_some());

        fs::write(&path, "v2").unwrap();
        touch_future(&path);

        // a fresh engine without auto_reload trusts the cache
        assert_eq!(engine_with(false).render("page.html", &Context::new()).unwrap(), "v1");
        assert_eq!(engine_with(true).render("page.html", &Context::new()).unwrap(), "v2");
    }

    #[test]
    fn test_unwritable_cache_fails_on_first_render() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file").unwrap();

        let engine = memory_engine(
            &[("hello", "Hello")],
            EngineOptions::new(false, true, Some(blocker.join("cache"))),
        );
        assert!(matches!(
            engine.render("hello", &Context::new()),
            Err(ViewError::Cache { .. })
        ));
    }
}
