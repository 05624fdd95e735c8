//! Error types for directory renaming and configuration

use std::path::PathBuf;
use thiserror::Error;

/// Shared `Result` alias for library operations
pub type Result<T> = std::result::Result<T, RenameError>;

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("no CVE marker found in '{name}'")]
    MarkerNotFound { name: String },

    #[error("cannot rename {from} to {to}: target already exists")]
    TargetExists { from: PathBuf, to: PathBuf },

    #[error("I/O failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl RenameError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable kind, used in JSON reports and journals
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MarkerNotFound { .. } => "marker_not_found",
            Self::TargetExists { .. } => "target_exists",
            Self::Io { .. } => "io",
            Self::InvalidConfig { .. } => "invalid_config",
            Self::ConfigParse { .. } => "config_parse",
        }
    }
}
