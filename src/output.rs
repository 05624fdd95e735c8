use crate::renamer::{Outcome, RenameReport, SkipReason};
use crate::theme::Theme;
use crate::utils::{display_name, display_path};
use serde::Serialize;

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,       // Only errors
    Normal,      // Renames, missing-marker notices, failures
    Verbose,     // Also unchanged and non-directory entries
    VeryVerbose, // All details including full paths
}

impl OutputMode {
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            OutputMode::Quiet
        } else if verbose >= 2 {
            OutputMode::VeryVerbose
        } else if verbose == 1 {
            OutputMode::Verbose
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Serialize)]
struct JsonReport {
    version: String,
    timestamp: String,
    root: String,
    dry_run: bool,
    aborted: bool,
    entries: Vec<JsonEntry>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonEntry {
    path: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
}

#[derive(Serialize)]
struct JsonSummary {
    renamed: usize,
    unchanged: usize,
    skipped: usize,
    failed: usize,
}

impl JsonEntry {
    fn from_outcome(outcome: &Outcome) -> Self {
        let mut entry = JsonEntry {
            path: display_path(outcome.path()),
            status: "",
            target: None,
            reason: None,
            error: None,
            error_kind: None,
        };
        match outcome {
            Outcome::Renamed { to, .. } => {
                entry.status = "renamed";
                entry.target = Some(display_path(to));
            }
            Outcome::Unchanged { .. } => entry.status = "unchanged",
            Outcome::Skipped { reason, .. } => {
                entry.status = "skipped";
                entry.reason = Some(reason.as_str());
            }
            Outcome::Failed { to, error, .. } => {
                entry.status = "failed";
                entry.target = Some(display_path(to));
                entry.error = Some(error.to_string());
                entry.error_kind = Some(error.kind());
            }
        }
        entry
    }
}

/// Serialize a report for scripting
pub fn render_json(report: &RenameReport) -> anyhow::Result<String> {
    let json = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        root: display_path(&report.root),
        dry_run: report.dry_run,
        aborted: report.aborted,
        entries: report.outcomes.iter().map(JsonEntry::from_outcome).collect(),
        summary: JsonSummary {
            renamed: report.renamed(),
            unchanged: report.unchanged(),
            skipped: report.skipped(),
            failed: report.failed(),
        },
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

pub fn print_json(report: &RenameReport) -> anyhow::Result<()> {
    println!("{}", render_json(report)?);
    Ok(())
}

/// Notice printed for a directory without a CVE marker
pub fn missing_marker_notice(name: &str) -> String {
    format!("No CVE marker in '{name}', skipping")
}

pub fn print_human(report: &RenameReport, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        // Failures still reach stderr
        for outcome in &report.outcomes {
            if let Outcome::Failed { error, .. } = outcome {
                eprintln!("{} {}", Theme::error("error:"), error);
            }
        }
        return;
    }

    let label = |path: &std::path::Path| {
        if mode == OutputMode::VeryVerbose {
            display_path(path)
        } else {
            display_name(path)
        }
    };

    println!();
    if report.dry_run {
        println!("{}", Theme::header("CVE Directory Rename (dry run)"));
    } else {
        println!("{}", Theme::header("CVE Directory Rename"));
    }
    println!("{}", Theme::muted(&display_path(&report.root)));
    println!("{}", Theme::divider_bold(60));

    for outcome in &report.outcomes {
        match outcome {
            Outcome::Renamed { from, to } => println!(
                "  {:<10} {} {} {}",
                Theme::success(if report.dry_run { "would" } else { "renamed" }),
                label(from),
                Theme::muted("->"),
                Theme::value(&label(to))
            ),
            Outcome::Skipped {
                path,
                reason: SkipReason::MarkerNotFound,
            } => println!("  {}", Theme::warning(&missing_marker_notice(&display_name(path)))),
            Outcome::Failed { error, .. } => {
                println!("  {:<10} {}", Theme::error("failed"), error)
            }
            Outcome::Unchanged { path } if mode != OutputMode::Normal => {
                println!("  {:<10} {}", Theme::muted("unchanged"), label(path))
            }
            Outcome::Skipped { path, reason } if mode != OutputMode::Normal => println!(
                "  {:<10} {} {}",
                Theme::muted("skipped"),
                label(path),
                Theme::muted(&format!("({})", reason.as_str()))
            ),
            _ => {}
        }
    }

    println!("{}", Theme::divider(60));
    if report.failed() > 0 {
        println!("{}", Theme::error(&report.summary()));
    } else {
        println!("{}", Theme::primary(&report.summary()));
    }
    if report.aborted {
        println!(
            "{}",
            Theme::warning_msg("Stopped at the first failure; later entries were not processed")
        );
    }
}
