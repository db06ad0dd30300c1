use crate::config::{ConfigError, ConfigSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Implemented by configuration structs that can be read from the environment
pub trait AppConfigTrait: Sized {
    fn from_env() -> Result<Self, ConfigError>;

    fn validate(&self) -> Result<(), ConfigError>;

    /// Origin of each field, keyed by field name
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }

    /// Debug mode is on everywhere except production
    pub fn debug_mode(&self) -> bool {
        !self.is_production()
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            (Environment::Development, "dev"),
            (Environment::Testing, "test"),
            (Environment::Production, "prod"),
        ]
        .into_iter()
        .find(|(env, short)| {
            let s = s.trim();
            s.eq_ignore_ascii_case(env.as_str()) || s.eq_ignore_ascii_case(short)
        })
        .map(|(env, _)| env)
        .ok_or_else(|| {
            ConfigError::invalid_value("environment", s, "development, testing or production")
        })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
