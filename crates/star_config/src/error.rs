//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `star.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The declared tool environment is outside the supported set.
    #[error("unsupported environment: {field} '{value}' (supported: {supported})")]
    UnsupportedEnvironment {
        /// The environment field (`vendor`, `tool`, or `flow`).
        field: &'static str,
        /// The value found in the configuration.
        value: String,
        /// Comma-separated supported values.
        supported: String,
    },
}
