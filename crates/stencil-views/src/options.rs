use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Enables the `dump` filter and verbose load logging
    #[serde(default)]
    pub debug: bool,
    /// Re-check loaded templates against their loader before each render
    #[serde(default)]
    pub auto_reload: bool,
    /// Directory for the compiled template cache; `None` disables it
    #[serde(default)]
    pub cache: Option<PathBuf>,
}

impl EngineOptions {
    pub fn new(debug: bool, auto_reload: bool, cache: Option<PathBuf>) -> Self {
        Self {
            debug,
            auto_reload,
            cache,
        }
    }
}
