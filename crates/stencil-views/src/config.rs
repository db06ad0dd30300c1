//! View layer configuration
//!
//! Loaded from the environment or a YAML file and turned into a
//! [`TemplateServiceProvider`](crate::TemplateServiceProvider) with
//! `TemplateServiceProvider::from_config`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use stencil_core::config::parse_bool;
use stencil_core::{AppConfigTrait, ConfigError, ConfigSource, Environment};

pub const TEMPLATE_DIR_VAR: &str = "STENCIL_TEMPLATE_DIR";
pub const CACHE_DIR_VAR: &str = "STENCIL_CACHE_DIR";
pub const DEBUG_VAR: &str = "STENCIL_DEBUG";
pub const ENV_VAR: &str = "STENCIL_ENV";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Root directory of the filesystem loader
    pub template_directory: PathBuf,
    /// Compiled template cache; the per-user temp location when absent
    #[serde(default)]
    pub cache_directory: Option<PathBuf>,
    #[serde(default = "default_debug")]
    pub debug: bool,
}

fn default_debug() -> bool {
    true
}

impl ViewConfig {
    pub fn new(template_directory: impl Into<PathBuf>) -> Self {
        Self {
            template_directory: template_directory.into(),
            cache_directory: None,
            debug: default_debug(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }
}

impl AppConfigTrait for ViewConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let template_directory = env::var(TEMPLATE_DIR_VAR)
            .ok()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ConfigError::missing_required(
                    "template_directory",
                    format!("Set {} to the directory holding your templates", TEMPLATE_DIR_VAR),
                )
            })?;

        let cache_directory = env::var(CACHE_DIR_VAR)
            .ok()
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let debug = match env::var(DEBUG_VAR) {
            Ok(value) => parse_bool("debug", &value)?,
            Err(_) => environment()?.debug_mode(),
        };

        let config = ViewConfig {
            template_directory: PathBuf::from(template_directory),
            cache_directory,
            debug,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.template_directory.as_os_str().is_empty() {
            return Err(ConfigError::validation_failed(
                "Template directory must not be empty",
            ));
        }

        if let Some(cache) = &self.cache_directory {
            if cache.as_os_str().is_empty() {
                return Err(ConfigError::validation_failed(
                    "Cache directory must not be empty when set",
                ));
            }
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert(
            "template_directory".to_string(),
            ConfigSource::EnvVar(TEMPLATE_DIR_VAR.to_string()),
        );
        sources.insert(
            "cache_directory".to_string(),
            ConfigSource::env_or_default(CACHE_DIR_VAR, "per-user temp directory"),
        );
        let debug_source = if env::var_os(DEBUG_VAR).is_some() {
            ConfigSource::EnvVar(DEBUG_VAR.to_string())
        } else {
            ConfigSource::env_or_default(ENV_VAR, "development")
        };
        sources.insert("debug".to_string(), debug_source);
        sources
    }
}

fn environment() -> Result<Environment, ConfigError> {
    match env::var(ENV_VAR) {
        Ok(value) if !value.is_empty() => value.parse(),
        _ => Ok(Environment::default()),
    }
}
