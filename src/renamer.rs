//! Directory renaming pass
//!
//! Lists the immediate children of a root directory once, classifies each one
//! and renames directories carrying a CVE marker to their bare identifier.
//! Nothing is ever overwritten: a target that already exists, or that an
//! earlier entry of the same pass already claimed, is reported as a failure.

use crate::error::{RenameError, Result};
use crate::history::RenameLog;
use crate::identifier::{self, MarkerSet};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Options for a single renaming pass
#[derive(Debug, Clone, Default)]
pub struct RenameOptions {
    pub markers: MarkerSet,
    /// Plan and report without touching the filesystem
    pub dry_run: bool,
    /// Stop at the first failed rename
    pub fail_fast: bool,
}

/// Why an entry was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotADirectory,
    MarkerNotFound,
    NonUtf8Name,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotADirectory => "not_a_directory",
            SkipReason::MarkerNotFound => "marker_not_found",
            SkipReason::NonUtf8Name => "non_utf8_name",
        }
    }
}

/// What should happen to one entry, before any collision check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Skip(SkipReason),
    /// Name is already the identifier
    Keep,
    Rename { identifier: String, target: PathBuf },
}

/// What happened to one entry
#[derive(Debug)]
pub enum Outcome {
    Renamed { from: PathBuf, to: PathBuf },
    Unchanged { path: PathBuf },
    Skipped { path: PathBuf, reason: SkipReason },
    Failed { from: PathBuf, to: PathBuf, error: RenameError },
}

impl Outcome {
    /// The entry this outcome is about
    pub fn path(&self) -> &Path {
        match self {
            Outcome::Renamed { from, .. } | Outcome::Failed { from, .. } => from,
            Outcome::Unchanged { path } | Outcome::Skipped { path, .. } => path,
        }
    }
}

#[derive(Debug)]
pub struct RenameReport {
    pub root: PathBuf,
    pub dry_run: bool,
    /// Set when `fail_fast` stopped the pass early
    pub aborted: bool,
    pub outcomes: Vec<Outcome>,
}

impl RenameReport {
    fn new(root: &Path, dry_run: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            dry_run,
            aborted: false,
            outcomes: Vec::new(),
        }
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(*o)).count()
    }

    pub fn renamed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Renamed { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Unchanged { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    /// Names of directories skipped for lacking a marker
    pub fn missing_marker(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Skipped {
                path,
                reason: SkipReason::MarkerNotFound,
            } => Some(path.as_path()),
            _ => None,
        })
    }

    /// Journal of every attempted rename in this pass
    pub fn journal(&self) -> RenameLog {
        let mut log = RenameLog::new(&self.root);
        for outcome in &self.outcomes {
            match outcome {
                Outcome::Renamed { from, to } => log.log_success(from, to),
                Outcome::Failed { from, to, error } => log.log_failure(from, to, &error.to_string()),
                _ => {}
            }
        }
        log
    }

    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "would be renamed" } else { "renamed" };
        format!(
            "{} {}, {} unchanged, {} skipped, {} failed",
            self.renamed(),
            verb,
            self.unchanged(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Decide what to do with a single entry
///
/// Symlinks are classified by their own metadata, so a link pointing at a
/// directory is not renamed.
pub fn plan_entry(path: &Path, markers: &MarkerSet) -> Plan {
    let is_dir = fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Plan::Skip(SkipReason::NotADirectory);
    }

    let Some(name) = path.file_name() else {
        return Plan::Skip(SkipReason::NotADirectory);
    };
    let Some(name) = name.to_str() else {
        return Plan::Skip(SkipReason::NonUtf8Name);
    };

    if identifier::is_normalized(name, markers) {
        return Plan::Keep;
    }

    match identifier::extract(name, markers) {
        Ok(id) => {
            let target = path.with_file_name(&id);
            Plan::Rename {
                identifier: id,
                target,
            }
        }
        Err(_) => Plan::Skip(SkipReason::MarkerNotFound),
    }
}

/// Rename every marked directory directly under `root`
///
/// Fails only when `root` itself cannot be listed; per-entry problems are
/// recorded in the returned report.
pub fn rename_all(root: &Path, options: &RenameOptions) -> Result<RenameReport> {
    let entries = list_entries(root)?;
    let mut report = RenameReport::new(root, options.dry_run);
    let mut claimed: HashSet<PathBuf> = HashSet::new();

    for path in entries {
        let outcome = match plan_entry(&path, &options.markers) {
            Plan::Skip(reason) => {
                debug!(path = %path.display(), reason = reason.as_str(), "skipping entry");
                Outcome::Skipped { path, reason }
            }
            Plan::Keep => {
                debug!(path = %path.display(), "already normalized");
                Outcome::Unchanged { path }
            }
            Plan::Rename { target, .. } => apply(path, target, options.dry_run, &mut claimed),
        };

        let failed = matches!(outcome, Outcome::Failed { .. });
        report.outcomes.push(outcome);

        if failed && options.fail_fast {
            warn!("stopping after first failure");
            report.aborted = true;
            break;
        }
    }

    Ok(report)
}

fn apply(from: PathBuf, to: PathBuf, dry_run: bool, claimed: &mut HashSet<PathBuf>) -> Outcome {
    // symlink_metadata also catches dangling links sitting on the target name
    if claimed.contains(&to) || fs::symlink_metadata(&to).is_ok() {
        let error = RenameError::TargetExists {
            from: from.clone(),
            to: to.clone(),
        };
        warn!(%error, "rename collision");
        return Outcome::Failed { from, to, error };
    }

    if !dry_run {
        if let Err(e) = fs::rename(&from, &to) {
            let error = RenameError::io(&from, e);
            warn!(%error, "rename failed");
            return Outcome::Failed { from, to, error };
        }
        info!(from = %from.display(), to = %to.display(), "renamed");
    }

    claimed.insert(to.clone());
    Outcome::Renamed { from, to }
}

/// Immediate children of `root`, sorted by file name
fn list_entries(root: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) => entries.push(entry.into_path()),
            Err(e) if e.depth() == 0 || e.path() == Some(root) => return Err(RenameError::io(root, e.into())),
            Err(e) => warn!(error = %e, "unreadable entry"),
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options() -> RenameOptions {
        RenameOptions::default()
    }

    #[test]
    fn test_plan_entry_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("CVE-2021-1-notes.txt");
        fs::write(&file, "x").unwrap();

        assert_eq!(
            plan_entry(&file, &MarkerSet::default()),
            Plan::Skip(SkipReason::NotADirectory)
        );
    }

    #[test]
    fn test_plan_entry_rename_target_is_sibling() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("old-CVE-2021-12345-extra");
        fs::create_dir(&sub).unwrap();

        match plan_entry(&sub, &MarkerSet::default()) {
            Plan::Rename { identifier, target } => {
                assert_eq!(identifier, "CVE-2021-12345");
                assert_eq!(target, dir.path().join("CVE-2021-12345"));
            }
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn test_plan_entry_keep_and_missing_marker() {
        let dir = TempDir::new().unwrap();
        let keep = dir.path().join("CVE-2021-12345");
        let plain = dir.path().join("writeups");
        fs::create_dir(&keep).unwrap();
        fs::create_dir(&plain).unwrap();

        assert_eq!(plan_entry(&keep, &MarkerSet::default()), Plan::Keep);
        assert_eq!(
            plan_entry(&plain, &MarkerSet::default()),
            Plan::Skip(SkipReason::MarkerNotFound)
        );
    }

    #[test]
    fn test_plan_entry_keeps_lowercase_identifier() {
        let dir = TempDir::new().unwrap();
        let lower = dir.path().join("cve-2022-22965");
        let truncated = dir.path().join("CVE-2020-");
        fs::create_dir(&lower).unwrap();
        fs::create_dir(&truncated).unwrap();

        assert_eq!(plan_entry(&lower, &MarkerSet::default()), Plan::Keep);
        assert_eq!(plan_entry(&truncated, &MarkerSet::default()), Plan::Keep);
    }

    #[test]
    fn test_rename_all_basic() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("poc-CVE-2021-44228-log4shell")).unwrap();
        fs::create_dir(dir.path().join("misc")).unwrap();
        fs::write(dir.path().join("CVE-2020-1-readme.md"), "x").unwrap();

        let report = rename_all(dir.path(), &options()).unwrap();

        assert_eq!(report.renamed(), 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.failed(), 0);
        assert!(dir.path().join("CVE-2021-44228").is_dir());
        assert!(dir.path().join("misc").is_dir());
        assert!(dir.path().join("CVE-2020-1-readme.md").is_file());

        let missing: Vec<_> = report.missing_marker().collect();
        assert_eq!(missing, vec![dir.path().join("misc").as_path()]);
    }

    #[test]
    fn test_collision_within_pass_fails_loudly() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("a-CVE-2021-7")).unwrap();
        fs::create_dir(dir.path().join("b-CVE-2021-7")).unwrap();

        let report = rename_all(dir.path(), &options()).unwrap();

        assert_eq!(report.renamed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(dir.path().join("CVE-2021-7").is_dir());
        // sorted order: "a-" wins, "b-" stays put
        assert!(dir.path().join("b-CVE-2021-7").is_dir());
        assert!(matches!(
            report.outcomes.last(),
            Some(Outcome::Failed {
                error: RenameError::TargetExists { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_existing_target_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("CVE-2021-7")).unwrap();
        fs::write(dir.path().join("CVE-2021-7").join("keep.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("x-CVE-2021-7")).unwrap();

        let report = rename_all(dir.path(), &options()).unwrap();

        assert_eq!(report.unchanged(), 1);
        assert_eq!(report.failed(), 1);
        assert!(dir.path().join("CVE-2021-7").join("keep.txt").is_file());
        assert!(dir.path().join("x-CVE-2021-7").is_dir());
    }

    #[test]
    fn test_fail_fast_stops_pass() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("CVE-2021-7")).unwrap();
        fs::create_dir(dir.path().join("a-CVE-2021-7")).unwrap();
        fs::create_dir(dir.path().join("b-CVE-2022-8")).unwrap();

        let opts = RenameOptions {
            fail_fast: true,
            ..options()
        };
        let report = rename_all(dir.path(), &opts).unwrap();

        assert!(report.aborted);
        assert_eq!(report.failed(), 1);
        assert!(dir.path().join("b-CVE-2022-8").is_dir());
        assert!(!dir.path().join("CVE-2022-8").exists());
    }

    #[test]
    fn test_dry_run_plans_without_renaming() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("a-CVE-2021-7")).unwrap();
        fs::create_dir(dir.path().join("b-CVE-2021-7")).unwrap();

        let opts = RenameOptions {
            dry_run: true,
            ..options()
        };
        let report = rename_all(dir.path(), &opts).unwrap();

        assert_eq!(report.renamed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(dir.path().join("a-CVE-2021-7").is_dir());
        assert!(!dir.path().join("CVE-2021-7").exists());
        assert!(report.summary().contains("would be renamed"));
    }

    #[test]
    fn test_journal_records_attempts_only() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("CVE-2021-7")).unwrap();
        fs::create_dir(dir.path().join("a-CVE-2021-7")).unwrap();
        fs::create_dir(dir.path().join("b-CVE-2022-8")).unwrap();
        fs::create_dir(dir.path().join("notes")).unwrap();

        let report = rename_all(dir.path(), &options()).unwrap();
        let log = report.journal();

        assert_eq!(log.total_items, 2);
        assert_eq!(log.errors, 1);
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = TempDir::new().unwrap();
        let result = rename_all(&dir.path().join("absent"), &options());
        assert!(matches!(result, Err(RenameError::Io { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_symlink_to_directory_is_not_renamed() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        fs::create_dir(&real).unwrap();
        let link = dir.path().join("link-CVE-2021-9");
        symlink(&real, &link).unwrap();

        let report = rename_all(dir.path(), &options()).unwrap();
        assert_eq!(report.renamed(), 0);
        assert!(fs::symlink_metadata(&link).is_ok());
    }
}
