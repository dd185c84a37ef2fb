use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur in csindex-core.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Malformed bibliographic source: {0}")]
    MalformedSource(String),

    #[error("Bibliographic source unavailable for {researcher}: {reason}")]
    SourceUnavailable { researcher: String, reason: String },

    #[error("Table {path}: {reason}")]
    Table { path: PathBuf, reason: String },

    #[error("Paper not found: {0}")]
    PaperNotFound(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl IndexError {
    pub fn table(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Table {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the driver may skip the offending record instead of aborting.
    pub fn is_malformed_source(&self) -> bool {
        matches!(self, Self::MalformedSource(_))
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
