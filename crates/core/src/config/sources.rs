/// Where a configuration value came from, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from the named environment variable
    EnvVar(String),
    /// Built-in default, with a human readable description of the value
    Default(String),
}

impl ConfigSource {
    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::EnvVar(_))
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default(_))
    }

    /// Pick the environment variable source when `var` is set, the default otherwise
    pub fn env_or_default(var: &str, default: impl Into<String>) -> Self {
        if std::env::var_os(var).is_some() {
            ConfigSource::EnvVar(var.to_string())
        } else {
            ConfigSource::Default(default.into())
        }
    }

    pub fn description(&self) -> String {
        match self {
            ConfigSource::EnvVar(var) => format!("Environment variable: {}", var),
            ConfigSource::Default(value) => format!("Default value: {}", value),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_env_or_default() {
        std::env::remove_var("STENCIL_SOURCES_TEST");
        let source = ConfigSource::env_or_default("STENCIL_SOURCES_TEST", "none");
        assert!(source.is_default());
        assert_eq!(source.to_string(), "Default value: none");

        std::env::set_var("STENCIL_SOURCES_TEST", "1");
        let source = ConfigSource::env_or_default("STENCIL_SOURCES_TEST", "none");
        assert!(source.is_env_var());
        std::env::remove_var("STENCIL_SOURCES_TEST");
    }
}
