//! Configuration file handling
//!
//! Location: `<config dir>/cvedirs/config.toml` unless an explicit path is given.
//! A missing default file means defaults; a missing explicit file is an error.

use crate::error::{RenameError, Result};
use crate::identifier::{MarkerSet, DEFAULT_MARKERS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matching: MatchingConfig,
    pub safety: SafetyConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Marker substrings, each matched case-sensitively unless `ignore_case`
    pub markers: Vec<String>,
    pub ignore_case: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Plan renames without touching the filesystem unless told otherwise
    pub dry_run_default: bool,
    /// Stop the pass at the first failed rename
    pub fail_fast: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    /// Journals kept after pruning (0 = unlimited)
    pub max_entries: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
            ignore_case: false,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 50,
        }
    }
}

impl Config {
    /// Default config file path
    pub fn config_path() -> Result<PathBuf> {
        directories::ProjectDirs::from("", "", "cvedirs")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or_else(|| RenameError::InvalidConfig {
                details: "could not determine a config directory for this user".to_string(),
            })
    }

    /// Load from an explicit path, or from the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path_buf, is_explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::config_path() {
                Ok(p) => (p, false),
                Err(_) => return Ok(Self::default()),
            },
        };

        let config = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|e| RenameError::io(&path_buf, e))?;
            Self::from_toml(&raw, &path_buf)?
        } else if is_explicit {
            return Err(RenameError::io(
                &path_buf,
                std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
            ));
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    fn from_toml(raw: &str, path: &Path) -> Result<Self> {
        toml::from_str(raw).map_err(|source| RenameError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.matching.markers.is_empty() {
            return Err(RenameError::InvalidConfig {
                details: "matching.markers must contain at least one marker".to_string(),
            });
        }
        if self.matching.markers.iter().any(|m| m.is_empty()) {
            return Err(RenameError::InvalidConfig {
                details: "matching.markers must not contain an empty marker".to_string(),
            });
        }
        Ok(())
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| RenameError::io(parent, e))?;
        }
        let raw = toml::to_string_pretty(self).map_err(|e| RenameError::InvalidConfig {
            details: format!("failed to serialize configuration: {e}"),
        })?;
        fs::write(path, raw).map_err(|e| RenameError::io(path, e))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Apply command-line overrides on top of the file values
    pub fn apply_cli_overrides(
        &mut self,
        markers: &[String],
        ignore_case: bool,
        fail_fast: bool,
        no_history: bool,
    ) {
        if !markers.is_empty() {
            self.matching.markers = markers.to_vec();
        }
        if ignore_case {
            self.matching.ignore_case = true;
        }
        if fail_fast {
            self.safety.fail_fast = true;
        }
        if no_history {
            self.history.enabled = false;
        }
    }

    pub fn marker_set(&self) -> MarkerSet {
        MarkerSet::new(self.matching.markers.clone(), self.matching.ignore_case)
    }
}
