use crate::error::{ViewError, ViewResult};
use crate::loader::{Loader, TemplateSource};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

/// Asks a list of loaders in order; the first one that knows a name wins
pub struct ChainLoader {
    loaders: Vec<Arc<dyn Loader>>,
    known: RwLock<HashSet<String>>,
}

impl ChainLoader {
    pub fn new(loaders: Vec<Arc<dyn Loader>>) -> Self {
        Self {
            loaders,
            known: RwLock::new(HashSet::new()),
        }
    }

    /// Append a loader, tried after the existing ones
    pub fn add_loader(&mut self, loader: Arc<dyn Loader>) {
        self.loaders.push(loader);
        match self.known.get_mut() {
            Ok(cache) => cache.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    pub fn loaders(&self) -> &[Arc<dyn Loader>] {
        &self.loaders
    }

    /// Run `op` against each loader until one succeeds
    ///
    /// A member that does not know `name` is skipped; any other failure is
    /// returned as-is. When every member misses, the error lists each miss.
    fn first_hit<T>(
        &self,
        name: &str,
        op: impl Fn(&dyn Loader) -> ViewResult<T>,
    ) -> ViewResult<T> {
        let mut misses = Vec::new();
        for loader in &self.loaders {
            if !loader.exists(name) {
                misses.push(format!("{}: not found", loader.describe()));
                continue;
            }
            match op(loader.as_ref()) {
                Ok(value) => return Ok(value),
                Err(ViewError::TemplateNotFound { message, .. }) => {
                    misses.push(format!("{}: {}", loader.describe(), message))
                }
                Err(other) => return Err(other),
            }
        }

        let message = if misses.is_empty() {
            "the loader chain is empty".to_string()
        } else {
            format!("not defined in any loader ({})", misses.join("; "))
        };
        Err(ViewError::not_found(name, message))
    }
}

impl Loader for ChainLoader {
    fn source(&self, name: &str) -> ViewResult<TemplateSource> {
        self.first_hit(name, |loader| loader.source(name))
    }

    fn cache_key(&self, name: &str) -> ViewResult<String> {
        self.first_hit(name, |loader| loader.cache_key(name))
    }

    fn is_fresh(&self, name: &str, time: SystemTime) -> ViewResult<bool> {
        self.first_hit(name, |loader| loader.is_fresh(name, time))
    }

    fn exists(&self, name: &str) -> bool {
        if let Ok(known) = self.known.read() {
            if known.contains(name) {
                return true;
            }
        }

        // misses are not remembered
        let found = self.loaders.iter().any(|loader| loader.exists(name));
        if found {
            if let Ok(mut known) = self.known.write() {
                known.insert(name.to_string());
            }
        }
        found
    }

    fn describe(&self) -> String {
        let members: Vec<String> = self.loaders.iter().map(|l| l.describe()).collect();
        format!("ChainLoader[{}]", members.join(", "))
    }
}

impl std::fmt::Debug for ChainLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainLoader")
            .field("loaders", &self.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;

    fn chain() -> ChainLoader {
        let primary = MemoryLoader::new().with_template("shared", "primary");
        let fallback = MemoryLoader::new()
            .with_template("shared", "fallback")
            .with_template("only_fallback", "fallback only");
        ChainLoader::new(vec![Arc::new(primary), Arc::new(fallback)])
    }

    #[test]
    fn test_first_loader_wins() {
        let chain = chain();
        assert_eq!(chain.source("shared").unwrap().code, "primary");
        assert_eq!(chain.source("only_fallback").unwrap().code, "fallback only");
    }

    #[test]
    fn test_not_found_when_every_loader_misses() {
        let chain = chain();
        assert!(!chain.exists("ghost"));

        let err = chain.source("ghost").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("MemoryLoader"));
        assert!(chain.cache_key("ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn test_empty_chain() {
        let chain = ChainLoader::new(Vec::new());
        let err = chain.source("anything").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_add_loader_resets_existence_cache() {
        let mut chain = chain();
        assert!(!chain.exists("late"));

        chain.add_loader(Arc::new(MemoryLoader::new().with_template("late", "arrived")));
        assert!(chain.exists("late"));
        assert_eq!(chain.source("late").unwrap().code, "arrived");
        assert_eq!(chain.loaders().len(), 3);
    }
}
