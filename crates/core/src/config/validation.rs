use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'{field}' is required: {hint}")]
    MissingRequired { field: String, hint: String },

    #[error("'{value}' is not a valid {field} (expected {expected})")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Invalid configuration: {message}")]
    ValidationFailed { message: String },

    #[error("Could not read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub fn missing_required(field: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
            hint: hint.into(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

/// Parse a boolean flag the way environment variables usually spell them
pub fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::invalid_value(
            field,
            value,
            "a boolean (true/false, 1/0, yes/no, on/off)",
        )),
    }
}
