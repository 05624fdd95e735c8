//! Rename history journal
//!
//! Every non-dry-run session that attempts at least one rename is written as a
//! JSON journal. Journals are used for:
//! - Audit trails
//! - Undo information (original and new paths)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Record of a single rename attempt
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RenameRecord {
    /// When the rename was attempted
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    /// Original directory path
    pub from: String,
    /// Target directory path
    pub to: String,
    /// Whether the rename succeeded
    pub success: bool,
    /// Error message if the rename failed
    pub error: Option<String>,
}

impl RenameRecord {
    pub fn success(from: &Path, to: &Path) -> Self {
        Self {
            timestamp: Utc::now(),
            from: from.display().to_string(),
            to: to.display().to_string(),
            success: true,
            error: None,
        }
    }

    pub fn failure(from: &Path, to: &Path, error: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            from: from.display().to_string(),
            to: to.display().to_string(),
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Journal of all renames in a session
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RenameLog {
    /// When this session started
    #[serde(with = "chrono::serde::ts_seconds")]
    pub session_start: DateTime<Utc>,
    /// Directory whose entries were renamed
    pub root: String,
    pub records: Vec<RenameRecord>,
    /// Total renames attempted
    pub total_items: usize,
    pub errors: usize,
}

impl RenameLog {
    pub fn new(root: &Path) -> Self {
        Self {
            session_start: Utc::now(),
            root: root.display().to_string(),
            records: Vec::new(),
            total_items: 0,
            errors: 0,
        }
    }

    pub fn add_record(&mut self, record: RenameRecord) {
        self.total_items += 1;
        if !record.success {
            self.errors += 1;
        }
        self.records.push(record);
    }

    pub fn log_success(&mut self, from: &Path, to: &Path) {
        self.add_record(RenameRecord::success(from, to));
    }

    pub fn log_failure(&mut self, from: &Path, to: &Path, error: &str) {
        self.add_record(RenameRecord::failure(from, to, error));
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Save the journal to the default history directory
    pub fn save(&self) -> Result<PathBuf> {
        self.save_in(&get_history_dir()?)
    }

    /// Save the journal into `history_dir`
    ///
    /// Returns the path to the written journal
    pub fn save_in(&self, history_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(history_dir).with_context(|| {
            format!("Failed to create history directory: {}", history_dir.display())
        })?;

        let stem = format!("renames_{}", self.session_start.format("%Y%m%d_%H%M%S"));
        let mut log_path = history_dir.join(format!("{stem}.json"));
        // Sessions started within the same second get a numeric suffix
        let mut n = 1;
        while log_path.exists() {
            log_path = history_dir.join(format!("{stem}_{n}.json"));
            n += 1;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize rename log")?;
        fs::write(&log_path, json)
            .with_context(|| format!("Failed to write rename log to {}", log_path.display()))?;

        Ok(log_path)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} directories renamed, {} errors",
            self.total_items.saturating_sub(self.errors),
            self.errors
        )
    }
}

/// Get the history directory path
///
/// Location: `<data dir>/cvedirs/history`, e.g. `~/.local/share/cvedirs/history` on Linux.
/// Creates the directory if it doesn't exist.
pub fn get_history_dir() -> Result<PathBuf> {
    let history_dir = directories::ProjectDirs::from("", "", "cvedirs")
        .map(|dirs| dirs.data_dir().join("history"))
        .context("Could not determine a data directory for this user")?;

    if !history_dir.exists() {
        fs::create_dir_all(&history_dir).with_context(|| {
            format!("Failed to create history directory: {}", history_dir.display())
        })?;
    }

    Ok(history_dir)
}

/// List journals in the default history directory, newest first
pub fn list_logs() -> Result<Vec<PathBuf>> {
    list_logs_in(&get_history_dir()?)
}

/// List journals in `history_dir`, newest first
pub fn list_logs_in(history_dir: &Path) -> Result<Vec<PathBuf>> {
    if !history_dir.exists() {
        return Ok(Vec::new());
    }

    let mut logs: Vec<PathBuf> = fs::read_dir(history_dir)
        .with_context(|| format!("Failed to read history directory: {}", history_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();

    logs.sort_by_key(|path| std::cmp::Reverse(log_sort_key(path)));

    Ok(logs)
}

/// Ordering key for a journal file name: `renames_<date>_<time>[_n]` sorts by
/// timestamp, then numerically by the same-second suffix
fn log_sort_key(path: &Path) -> (String, u64) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    match stem.rsplit_once('_') {
        Some((base, n)) if base.matches('_').count() == 2 => match n.parse() {
            Ok(n) => (base.to_string(), n),
            Err(_) => (stem, 0),
        },
        _ => (stem, 0),
    }
}

/// Delete the oldest journals so that at most `max_entries` remain (0 = keep all)
///
/// Returns the number of journals removed
pub fn prune_logs_in(history_dir: &Path, max_entries: usize) -> Result<usize> {
    if max_entries == 0 {
        return Ok(0);
    }

    let logs = list_logs_in(history_dir)?;
    let mut removed = 0;
    for stale in logs.iter().skip(max_entries) {
        fs::remove_file(stale)
            .with_context(|| format!("Failed to remove old rename log: {}", stale.display()))?;
        removed += 1;
    }
    Ok(removed)
}

pub fn load_log(path: &Path) -> Result<RenameLog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file: {}", path.display()))?;

    let log: RenameLog = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse log file: {}", path.display()))?;

    Ok(log)
}
