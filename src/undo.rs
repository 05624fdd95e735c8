//! Undo support: reverse the renames recorded in a journal

use crate::history::{list_logs, load_log, RenameLog};
use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Result of an undo operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UndoResult {
    pub restored: usize,
    pub errors: usize,
    pub not_found: usize,
}

impl UndoResult {
    pub fn summary(&self) -> String {
        format!(
            "Restored {} directories, {} errors, {} not found",
            self.restored, self.errors, self.not_found
        )
    }
}

/// Undo the most recent rename session
pub fn undo_last(dry_run: bool) -> Result<UndoResult> {
    let logs = list_logs()?;

    let Some(latest) = logs.first() else {
        return Err(anyhow::anyhow!("No rename history found. Nothing to undo."));
    };

    let log = load_log(latest)?;
    Ok(undo_log(&log, dry_run))
}

/// Rename every successfully renamed directory in `log` back to its original name
///
/// Records are walked newest first. A directory whose original name is taken
/// again is left alone and counted as an error.
pub fn undo_log(log: &RenameLog, dry_run: bool) -> UndoResult {
    let mut result = UndoResult::default();

    for record in log.records.iter().rev().filter(|r| r.success) {
        let current = PathBuf::from(&record.to);
        let original = PathBuf::from(&record.from);

        if !current.is_dir() {
            warn!(path = %current.display(), "renamed directory no longer exists");
            result.not_found += 1;
            continue;
        }

        if original.exists() {
            warn!(
                path = %original.display(),
                "original name is taken again, not restoring"
            );
            result.errors += 1;
            continue;
        }

        if dry_run {
            result.restored += 1;
            continue;
        }

        match fs::rename(&current, &original) {
            Ok(()) => {
                info!(from = %current.display(), to = %original.display(), "restored");
                result.restored += 1;
            }
            Err(e) => {
                warn!(from = %current.display(), error = %e, "failed to restore");
                result.errors += 1;
            }
        }
    }

    result
}
