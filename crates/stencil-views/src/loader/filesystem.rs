use crate::error::{ViewError, ViewResult};
use crate::loader::{Loader, TemplateSource};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::SystemTime;

/// Namespace used for names without an `@namespace/` prefix
pub const MAIN_NAMESPACE: &str = "__main__";

/// Loads templates from one or more directories
///
/// Names are relative paths (`emails/welcome.html`). A name of the form
/// `@admin/dashboard.html` is looked up in the directories registered for the
/// `admin` namespace. Directories are searched in order and the first file
/// found wins. Directories are not checked when added: a missing root only
/// shows up as a `TemplateNotFound` error on lookup.
#[derive(Debug)]
pub struct FilesystemLoader {
    paths: HashMap<String, Vec<PathBuf>>,
    resolved: RwLock<HashMap<String, PathBuf>>,
}

impl FilesystemLoader {
    /// Create a loader rooted at `root` for the main namespace
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut loader = Self::empty();
        loader.add_path(root, MAIN_NAMESPACE);
        loader
    }

    /// Create a loader without any directory
    pub fn empty() -> Self {
        Self {
            paths: HashMap::new(),
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// Search `path` after the directories already registered for `namespace`
    pub fn add_path(&mut self, path: impl Into<PathBuf>, namespace: &str) {
        self.paths
            .entry(namespace.to_string())
            .or_default()
            .push(path.into());
        self.clear_resolved();
    }

    /// Search `path` before the directories already registered for `namespace`
    pub fn prepend_path(&mut self, path: impl Into<PathBuf>, namespace: &str) {
        self.paths
            .entry(namespace.to_string())
            .or_default()
            .insert(0, path.into());
        self.clear_resolved();
    }

    /// Directories registered for `namespace`, in search order
    pub fn paths(&self, namespace: &str) -> &[PathBuf] {
        self.paths.get(namespace).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Registered namespaces, sorted
    pub fn namespaces(&self) -> Vec<&str> {
        let mut namespaces: Vec<_> = self.paths.keys().map(String::as_str).collect();
        namespaces.sort_unstable();
        namespaces
    }

    fn clear_resolved(&mut self) {
        match self.resolved.get_mut() {
            Ok(resolved) => resolved.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    /// Resolve `name` to an existing file
    pub fn find_template(&self, name: &str) -> ViewResult<PathBuf> {
        let normalized = normalize_name(name);

        {
            let resolved = self
                .resolved
                .read()
                .map_err(|_| ViewError::lock("filesystem_loader"))?;
            if let Some(path) = resolved.get(&normalized) {
                if path.is_file() {
                    return Ok(path.clone());
                }
            }
        }

        validate_name(&normalized)?;
        let (namespace, short_name) = parse_name(&normalized)?;

        let paths = self.paths.get(namespace).ok_or_else(|| {
            ViewError::not_found(
                name,
                format!("there are no registered paths for namespace \"{}\"", namespace),
            )
        })?;

        for root in paths {
            let candidate = root.join(short_name);
            if candidate.is_file() {
                self.resolved
                    .write()
                    .map_err(|_| ViewError::lock("filesystem_loader"))?
                    .insert(normalized.clone(), candidate.clone());
                return Ok(candidate);
            }
        }

        Err(ViewError::not_found(
            name,
            format!("looked into: {}", describe_paths(paths)),
        ))
    }
}

impl Loader for FilesystemLoader {
    fn source(&self, name: &str) -> ViewResult<TemplateSource> {
        let path = self.find_template(name)?;
        let code = fs::read_to_string(&path).map_err(|e| ViewError::io(&path, e))?;
        Ok(TemplateSource::new(name, code).with_path(path))
    }

    fn cache_key(&self, name: &str) -> ViewResult<String> {
        Ok(self.find_template(name)?.to_string_lossy().into_owned())
    }

    fn is_fresh(&self, name: &str, time: SystemTime) -> ViewResult<bool> {
        let path = self.find_template(name)?;
        let modified = fs::metadata(&path)
            .and_then(|metadata| metadata.modified())
            .map_err(|e| ViewError::io(&path, e))?;
        Ok(modified <= time)
    }

    fn exists(&self, name: &str) -> bool {
        self.find_template(name).is_ok()
    }

    fn describe(&self) -> String {
        format!(
            "FilesystemLoader({})",
            describe_paths(self.paths(MAIN_NAMESPACE))
        )
    }
}

fn describe_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| {
            if path.is_dir() {
                path.display().to_string()
            } else {
                format!("{} (missing directory)", path.display())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Use forward slashes and collapse repeated separators
fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c == '\\' { '/' } else { c };
        if c == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(c);
    }
    normalized
}

/// Reject names that could escape the template directories
fn validate_name(name: &str) -> ViewResult<()> {
    if name.contains('\0') {
        return Err(ViewError::invalid_name(name, "a template name cannot contain NUL bytes"));
    }

    let mut level: i32 = 0;
    for part in name.trim_start_matches('/').split('/') {
        match part {
            ".." => level -= 1,
            "." | "" => {}
            _ => level += 1,
        }
        if level < 0 {
            return Err(ViewError::invalid_name(
                name,
                "the name resolves outside the configured directories",
            ));
        }
    }
    Ok(())
}

/// Split `@namespace/rest` into its parts; plain names belong to the main namespace
fn parse_name(name: &str) -> ViewResult<(&str, &str)> {
    if let Some(rest) = name.strip_prefix('@') {
        return match rest.split_once('/') {
            Some((namespace, short_name)) if !namespace.is_empty() => Ok((namespace, short_name)),
            _ => Err(ViewError::invalid_name(
                name,
                "malformed namespaced template name (expected \"@namespace/template\")",
            )),
        };
    }
    Ok((MAIN_NAMESPACE, name.trim_start_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_loads_from_root() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "emails/welcome.html", "Hi {{ name }}");

        let loader = FilesystemLoader::new(dir.path());
        let source = loader.source("emails/welcome.html").unwrap();

        assert_eq!(source.code, "Hi {{ name }}");
        assert_eq!(source.path.as_deref(), Some(dir.path().join("emails/welcome.html").as_path()));
        assert!(loader.exists("emails\\welcome.html"));
        assert!(loader.exists("emails//welcome.html"));
    }

    #[test]
    fn test_missing_template_lists_searched_paths() {
        let dir = TempDir::new().unwrap();
        let loader = FilesystemLoader::new(dir.path());

        let err = loader.source("nope.html").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains(&dir.path().display().to_string()));
    }

    #[test]
    fn test_missing_root_is_reported_on_lookup() {
        let dir = TempDir::new().unwrap();
        let loader = FilesystemLoader::new(dir.path().join("absent"));

        let err = loader.source("test").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("missing directory"));
    }

    #[test]
    fn test_rejects_names_escaping_root() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "inner/a.html", "a");
        let loader = FilesystemLoader::new(dir.path().join("inner"));

        assert!(matches!(
            loader.source("../inner/a.html"),
            Err(ViewError::InvalidName { .. })
        ));
        assert!(matches!(loader.source("a\0.html"), Err(ViewError::InvalidName { .. })));
        // going down then back up stays inside
        write(dir.path(), "inner/sub/b.html", "b");
        assert_eq!(loader.source("sub/../a.html").unwrap().code, "a");
    }

    #[test]
    fn test_namespaces_and_path_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write(first.path(), "layout.html", "first");
        write(second.path(), "layout.html", "second");
        write(second.path(), "panel.html", "admin panel");

        let mut loader = FilesystemLoader::new(first.path());
        loader.add_path(second.path(), MAIN_NAMESPACE);
        loader.add_path(second.path(), "admin");
        assert_eq!(loader.source("layout.html").unwrap().code, "first");
        assert_eq!(loader.source("@admin/panel.html").unwrap().code, "admin panel");
        assert_eq!(loader.namespaces(), vec![MAIN_NAMESPACE, "admin"]);

        loader.prepend_path(second.path(), MAIN_NAMESPACE);
        assert_eq!(loader.source("layout.html").unwrap().code, "second");

        assert!(matches!(loader.source("@admin"), Err(ViewError::InvalidName { .. })));
        assert!(loader.source("@blog/post.html").unwrap_err().is_not_found());
    }

    #[test]
    fn test_freshness_follows_mtime() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.html", "a");
        let loader = FilesystemLoader::new(dir.path());

        let later = SystemTime::now() + std::time::Duration::from_secs(60);
        assert!(loader.is_fresh("a.html", later).unwrap());
        assert!(!loader.is_fresh("a.html", SystemTime::UNIX_EPOCH).unwrap());
        assert_eq!(
            loader.cache_key("a.html").unwrap(),
            dir.path().join("a.html").to_string_lossy()
        );
    }
}
