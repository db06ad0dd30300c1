//! Persistent cache of resolved template sources.
//!
//! Entries are keyed by a SHA-256 digest of the template name and the loader's
//! cache key, and sharded into two-character subdirectories:
//! `<dir>/ab/abcdef....tera`. Writes go to a temporary sibling first and are
//! renamed into place so concurrent readers never see a partial file.

use crate::error::{ViewError, ViewResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Storage for compiled templates
pub trait TemplateCache: Send + Sync {
    /// Key under which the compiled form of `name` is stored
    fn generate_key(&self, name: &str, loader_key: &str) -> String;

    /// Stored content, or `None` when nothing is cached under `key`
    fn load(&self, key: &str) -> ViewResult<Option<String>>;

    fn write(&self, key: &str, content: &str) -> ViewResult<()>;

    /// When the entry was written, or `None` when absent
    fn timestamp(&self, key: &str) -> Option<SystemTime>;
}

/// Cache that stores nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl TemplateCache for NullCache {
    fn generate_key(&self, _name: &str, _loader_key: &str) -> String {
        String::new()
    }

    fn load(&self, _key: &str) -> ViewResult<Option<String>> {
        Ok(None)
    }

    fn write(&self, _key: &str, _content: &str) -> ViewResult<()> {
        Ok(())
    }

    fn timestamp(&self, _key: &str) -> Option<SystemTime> {
        None
    }
}

/// Cache stored as files under a directory, created on first write
#[derive(Debug, Clone)]
pub struct FilesystemCache {
    directory: PathBuf,
}

impl FilesystemCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl TemplateCache for FilesystemCache {
    fn generate_key(&self, name: &str, loader_key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(loader_key.as_bytes());
        let digest = hex::encode(hasher.finalize());

        self.directory
            .join(&digest[..2])
            .join(format!("{}.tera", digest))
            .to_string_lossy()
            .into_owned()
    }

    fn load(&self, key: &str) -> ViewResult<Option<String>> {
        match fs::read_to_string(key) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ViewError::cache(key, e)),
        }
    }

    fn write(&self, key: &str, content: &str) -> ViewResult<()> {
        let path = Path::new(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ViewError::cache(parent, e))?;
        }

        let tmp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, content).map_err(|e| ViewError::cache(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(ViewError::cache(path, e));
        }

        tracing::debug!(path = %path.display(), "Wrote template cache entry");
        Ok(())
    }

    fn timestamp(&self, key: &str) -> Option<SystemTime> {
        fs::metadata(key).and_then(|m| m.modified()).ok()
    }
}
