//! Errors raised while reading `stave.toml`.

/// Why a `stave.toml` could not be turned into a session configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid TOML or a value has the wrong type.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A session setting parsed but is out of range.
    #[error("invalid session.{key}: {reason}")]
    InvalidSetting {
        /// Key inside the `[session]` table.
        key: &'static str,
        /// What the value must satisfy.
        reason: &'static str,
    },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.message().to_string())
    }
}
