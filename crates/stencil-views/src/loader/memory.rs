use crate::error::{ViewError, ViewResult};
use crate::loader::{Loader, TemplateSource};
use std::collections::HashMap;
use std::time::SystemTime;

/// Serves templates from an in-memory map; entries never go stale
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`set_template`](Self::set_template)
    pub fn with_template(mut self, name: impl Into<String>, code: impl Into<String>) -> Self {
        self.set_template(name, code);
        self
    }

    pub fn set_template(&mut self, name: impl Into<String>, code: impl Into<String>) {
        self.templates.insert(name.into(), code.into());
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn lookup(&self, name: &str) -> ViewResult<&String> {
        self.templates
            .get(name)
            .ok_or_else(|| ViewError::not_found(name, "not defined in the memory loader"))
    }
}

impl<N, C> FromIterator<(N, C)> for MemoryLoader
where
    N: Into<String>,
    C: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, C)>>(iter: I) -> Self {
        Self {
            templates: iter
                .into_iter()
                .map(|(name, code)| (name.into(), code.into()))
                .collect(),
        }
    }
}

impl Loader for MemoryLoader {
    fn source(&self, name: &str) -> ViewResult<TemplateSource> {
        Ok(TemplateSource::new(name, self.lookup(name)?.as_str()))
    }

    fn cache_key(&self, name: &str) -> ViewResult<String> {
        Ok(format!("{}:{}", name, self.lookup(name)?))
    }

    fn is_fresh(&self, name: &str, _time: SystemTime) -> ViewResult<bool> {
        self.lookup(name).map(|_| true)
    }

    fn exists(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}
