//! Default location of the compiled template cache.
//!
//! `<temp>/stencil_compiled_cache_<euid><install root>`, e.g.
//! `/tmp/stencil_compiled_cache_1000/srv/app/bin`. Including the effective user
//! id and the install location keeps separate users and separate deployments
//! sharing one temp directory out of each other's cache files.

use std::path::{Path, PathBuf};

/// Fixed part of the default cache directory name
pub const CACHE_DIR_PREFIX: &str = "stencil_compiled_cache_";

/// Default cache directory for the current process
pub fn default_cache_directory() -> PathBuf {
    compose_cache_directory(&std::env::temp_dir(), effective_user_id(), &install_root())
}

/// Build the cache directory path from its parts
///
/// Trailing separators are stripped from `temp_dir`, and colons are removed
/// from `install_root` so Windows drive letters do not end up mid-path.
pub fn compose_cache_directory(
    temp_dir: &Path,
    user_id: Option<u32>,
    install_root: &Path,
) -> PathBuf {
    let temp_dir = temp_dir.to_string_lossy();
    let temp_dir = temp_dir.trim_end_matches(['/', '\\']);
    let user_id = user_id.map(|id| id.to_string()).unwrap_or_default();
    let install_root = install_root.to_string_lossy().replace(':', "");

    PathBuf::from(format!(
        "{}/{}{}{}",
        temp_dir, CACHE_DIR_PREFIX, user_id, install_root
    ))
}

/// Effective user id of the process where the platform has one
#[cfg(unix)]
pub fn effective_user_id() -> Option<u32> {
    // SAFETY: geteuid has no preconditions and cannot fail
    Some(unsafe { libc::geteuid() })
}

#[cfg(not(unix))]
pub fn effective_user_id() -> Option<u32> {
    None
}

/// Directory holding the running executable, or this crate's manifest directory
pub fn install_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")))
}
