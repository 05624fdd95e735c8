use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::history;
use crate::logging;
use crate::output::{self, OutputMode};
use crate::renamer::{self, RenameOptions, RenameReport};
use crate::theme::Theme;
use crate::undo;
use crate::utils::display_path;

#[derive(Parser)]
#[command(name = "cvedirs")]
#[command(version)]
#[command(about = "Rename directories containing a CVE identifier to just that identifier")]
#[command(long_about = "cvedirs renames every directory directly under a folder whose name \
    embeds a CVE identifier, e.g. 'poc-CVE-2021-44228-log4shell' becomes 'CVE-2021-44228'.\n\n\
    Running without a command renames in the current directory.\n\n\
    Examples:\n  \
    cvedirs                         # Rename in the current directory\n  \
    cvedirs rename ~/poc --dry-run  # Preview renames in ~/poc\n  \
    cvedirs undo                    # Revert the last rename session")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase output verbosity (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Use this config file instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rename CVE directories (default when no command is given)
    #[command(visible_alias = "r")]
    Rename(RenameArgs),

    /// Revert the renames recorded in a history journal
    #[command(visible_alias = "u")]
    Undo {
        /// Journal to revert (default: most recent session)
        #[arg(long, value_name = "LOG_FILE")]
        from: Option<PathBuf>,

        /// Show what would be restored without renaming
        #[arg(long)]
        dry_run: bool,
    },

    /// List recorded rename sessions, newest first
    History,

    /// View or reset configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,

        /// Print the config file location
        #[arg(long)]
        path: bool,
    },
}

#[derive(Args, Default)]
pub struct RenameArgs {
    /// Directory whose entries are renamed (default: current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Preview renames without touching the filesystem
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Rename even if the config asks for dry runs by default
    #[arg(long, conflicts_with = "dry_run")]
    pub apply: bool,

    /// Output results as JSON for scripting
    #[arg(long)]
    pub json: bool,

    /// Marker substring to search for (repeatable, replaces configured markers)
    #[arg(short = 'm', long = "marker", value_name = "MARKER")]
    pub markers: Vec<String>,

    /// Match markers regardless of ASCII case
    #[arg(short = 'i', long)]
    pub ignore_case: bool,

    /// Stop at the first rename that fails
    #[arg(long)]
    pub fail_fast: bool,

    /// Don't write a history journal for this run
    #[arg(long)]
    pub no_history: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn run(self) -> anyhow::Result<()> {
        let output_mode = OutputMode::from_flags(self.quiet, self.verbose);
        logging::init_logging(output_mode);

        let config = Config::load(self.config.as_deref()).context("Failed to load configuration")?;

        match self.command {
            None => run_rename(RenameArgs::default(), config, output_mode),
            Some(Commands::Rename(args)) => run_rename(args, config, output_mode),
            Some(Commands::Undo { from, dry_run }) => run_undo(from, dry_run, output_mode),
            Some(Commands::History) => run_history(output_mode),
            Some(Commands::Config { show, reset, path }) => {
                if show {
                    print_config(&config);
                } else if reset {
                    let saved = match &self.config {
                        Some(explicit) => {
                            Config::default().save_to(explicit)?;
                            explicit.clone()
                        }
                        None => Config::default().save()?,
                    };
                    println!(
                        "{} Configuration reset to defaults ({}).",
                        Theme::success("OK"),
                        display_path(&saved)
                    );
                } else if path {
                    let location = match &self.config {
                        Some(explicit) => explicit.clone(),
                        None => Config::config_path()?,
                    };
                    println!("{}", display_path(&location));
                } else {
                    // Default: show config
                    print_config(&config);
                }
                Ok(())
            }
        }
    }
}

fn run_rename(args: RenameArgs, mut config: Config, output_mode: OutputMode) -> anyhow::Result<()> {
    config.apply_cli_overrides(&args.markers, args.ignore_case, args.fail_fast, args.no_history);
    config.validate()?;

    let root = match args.dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine the current directory")?,
    };
    // Journals need absolute paths to be replayable from anywhere
    let root = root
        .canonicalize()
        .with_context(|| format!("Directory does not exist: {}", root.display()))?;

    let dry_run = resolve_dry_run(&args, &config);
    let options = RenameOptions {
        markers: config.marker_set(),
        dry_run,
        fail_fast: config.safety.fail_fast,
    };

    let report = renamer::rename_all(&root, &options)
        .with_context(|| format!("Failed to read directory: {}", root.display()))?;

    if args.json {
        output::print_json(&report)?;
    } else {
        output::print_human(&report, output_mode);
    }

    if !dry_run && config.history.enabled {
        let history_dir = history::get_history_dir()?;
        if let Some(log_path) = record_session(&report, &config, &history_dir)? {
            if output_mode != OutputMode::Quiet && !args.json {
                println!(
                    "{}",
                    Theme::muted(&format!("Rename log saved to: {}", display_path(&log_path)))
                );
            }
        }
    }

    ensure_no_failures(&report)
}

/// `--apply` wins over everything, then `--dry-run`, then the config default
fn resolve_dry_run(args: &RenameArgs, config: &Config) -> bool {
    !args.apply && (args.dry_run || config.safety.dry_run_default)
}

/// Save the session journal into `history_dir` and prune old journals
///
/// Nothing is written for dry runs, with history disabled, or when no rename
/// was attempted.
fn record_session(
    report: &RenameReport,
    config: &Config,
    history_dir: &Path,
) -> anyhow::Result<Option<PathBuf>> {
    if report.dry_run || !config.history.enabled {
        return Ok(None);
    }

    let journal = report.journal();
    if journal.is_empty() {
        return Ok(None);
    }

    let log_path = journal.save_in(history_dir)?;
    history::prune_logs_in(history_dir, config.history.max_entries)?;
    Ok(Some(log_path))
}

fn ensure_no_failures(report: &RenameReport) -> anyhow::Result<()> {
    let failed = report.failed();
    if failed > 0 {
        return Err(anyhow::anyhow!(
            "{} {} could not be renamed",
            failed,
            if failed == 1 { "directory" } else { "directories" }
        ));
    }
    Ok(())
}

fn run_undo(from: Option<PathBuf>, dry_run: bool, output_mode: OutputMode) -> anyhow::Result<()> {
    let result = match from {
        Some(log_path) => {
            let log = history::load_log(&log_path)
                .with_context(|| format!("Failed to load log file: {}", log_path.display()))?;
            undo::undo_log(&log, dry_run)
        }
        None => undo::undo_last(dry_run).context("Failed to undo")?,
    };

    if output_mode != OutputMode::Quiet {
        println!();
        if dry_run {
            println!("{}", Theme::warning_msg("DRY RUN - nothing was renamed"));
        }
        if result.errors > 0 {
            println!("{}", Theme::error(&result.summary()));
        } else {
            println!("{} {}", Theme::success("OK"), Theme::success(&result.summary()));
        }
    }

    if result.errors > 0 {
        return Err(anyhow::anyhow!("{} directories could not be restored", result.errors));
    }
    Ok(())
}

fn run_history(output_mode: OutputMode) -> anyhow::Result<()> {
    let logs = history::list_logs()?;

    if output_mode == OutputMode::Quiet {
        return Ok(());
    }

    println!("{}", Theme::header("Rename History"));
    println!("{}", Theme::divider_bold(60));
    if logs.is_empty() {
        println!("  {}", Theme::muted("(no sessions recorded)"));
        return Ok(());
    }

    for path in logs {
        match history::load_log(&path) {
            Ok(log) => println!(
                "  {}  {}  {}",
                Theme::value(&log.session_start.format("%Y-%m-%d %H:%M:%S").to_string()),
                log.root,
                Theme::muted(&log.summary())
            ),
            Err(e) => println!("  {} {}", Theme::error("unreadable"), e),
        }
        if output_mode != OutputMode::Normal {
            println!("    {}", Theme::muted(&display_path(&path)));
        }
    }
    Ok(())
}

fn print_config(config: &Config) {
    println!("{}", Theme::header("Current Configuration"));
    println!("{}", Theme::divider_bold(60));
    println!();
    println!("Matching:");
    println!("  Markers: {}", config.matching.markers.join(", "));
    println!("  Ignore case: {}", config.matching.ignore_case);
    println!();
    println!("Safety Settings:");
    println!("  Dry run default: {}", config.safety.dry_run_default);
    println!("  Fail fast: {}", config.safety.fail_fast);
    println!();
    println!("History Settings:");
    println!("  Enabled: {}", config.history.enabled);
    println!("  Max entries: {} (0 = unlimited)", config.history.max_entries);
    println!();
    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", display_path(&path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::TempDir;

    fn real_run(root: &Path) -> RenameReport {
        renamer::rename_all(root, &RenameOptions::default()).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_means_rename_here() {
        let cli = Cli::try_parse_from(["cvedirs"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_rename_flags() {
        let cli = Cli::try_parse_from([
            "cvedirs", "rename", "/tmp/poc", "-n", "-m", "CVE", "-m", "GHSA", "--ignore-case", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Rename(args)) => {
                assert_eq!(args.dir, Some(PathBuf::from("/tmp/poc")));
                assert!(args.dry_run);
                assert!(args.ignore_case);
                assert_eq!(args.markers, vec!["CVE", "GHSA"]);
            }
            _ => panic!("expected rename"),
        }
    }

    #[test]
    fn test_apply_conflicts_with_dry_run() {
        assert!(Cli::try_parse_from(["cvedirs", "rename", "--apply", "--dry-run"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["cvedirs", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_undo_from_log() {
        let cli = Cli::try_parse_from(["cvedirs", "undo", "--from", "log.json", "--dry-run"]).unwrap();
        match cli.command {
            Some(Commands::Undo { from, dry_run }) => {
                assert_eq!(from, Some(PathBuf::from("log.json")));
                assert!(dry_run);
            }
            _ => panic!("expected undo"),
        }
    }

    #[test]
    fn test_config_show_flag() {
        let cli = Cli::try_parse_from(["cvedirs", "config", "--show"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Config { show: true, .. })));
    }

    #[test]
    fn test_resolve_dry_run_precedence() {
        let mut config = Config::default();
        assert!(!resolve_dry_run(&RenameArgs::default(), &config));

        let args = RenameArgs {
            dry_run: true,
            ..Default::default()
        };
        assert!(resolve_dry_run(&args, &config));

        config.safety.dry_run_default = true;
        assert!(resolve_dry_run(&RenameArgs::default(), &config));

        let args = RenameArgs {
            apply: true,
            ..Default::default()
        };
        assert!(!resolve_dry_run(&args, &config));
    }

    #[test]
    fn test_no_journal_for_dry_run() {
        let work = TempDir::new().unwrap();
        let history_dir = TempDir::new().unwrap();
        fs::create_dir(work.path().join("poc-CVE-2021-44228")).unwrap();

        let options = RenameOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = renamer::rename_all(work.path(), &options).unwrap();

        let saved = record_session(&report, &Config::default(), history_dir.path()).unwrap();
        assert!(saved.is_none());
        assert!(history::list_logs_in(history_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_no_journal_with_history_disabled() {
        let work = TempDir::new().unwrap();
        let history_dir = TempDir::new().unwrap();
        fs::create_dir(work.path().join("poc-CVE-2021-44228")).unwrap();
        let report = real_run(work.path());

        let mut config = Config::default();
        config.apply_cli_overrides(&[], false, false, true);

        assert!(record_session(&report, &config, history_dir.path()).unwrap().is_none());
        assert!(history::list_logs_in(history_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_no_journal_without_attempts() {
        let work = TempDir::new().unwrap();
        let history_dir = TempDir::new().unwrap();
        fs::create_dir(work.path().join("CVE-2021-44228")).unwrap();
        let report = real_run(work.path());

        assert!(record_session(&report, &Config::default(), history_dir.path())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_journal_written_and_pruned_after_real_run() {
        let work = TempDir::new().unwrap();
        let history_dir = TempDir::new().unwrap();
        fs::write(history_dir.path().join("renames_20000101_000000.json"), "{}").unwrap();
        fs::write(history_dir.path().join("renames_20000102_000000.json"), "{}").unwrap();
        fs::create_dir(work.path().join("poc-CVE-2021-44228")).unwrap();
        let report = real_run(work.path());

        let mut config = Config::default();
        config.history.max_entries = 2;

        let saved = record_session(&report, &config, history_dir.path())
            .unwrap()
            .unwrap();

        let logs = history::list_logs_in(history_dir.path()).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0], saved);
        assert!(!history_dir.path().join("renames_20000101_000000.json").exists());
        assert_eq!(history::load_log(&saved).unwrap().total_items, 1);
    }

    #[test]
    fn test_failed_rename_is_an_error() {
        let work = TempDir::new().unwrap();
        fs::create_dir(work.path().join("a-CVE-2021-7")).unwrap();
        fs::create_dir(work.path().join("b-CVE-2021-7")).unwrap();
        let report = real_run(work.path());

        let err = ensure_no_failures(&report).unwrap_err();
        assert_eq!(err.to_string(), "1 directory could not be renamed");
    }

    #[test]
    fn test_clean_run_is_ok() {
        let work = TempDir::new().unwrap();
        fs::create_dir(work.path().join("x-CVE-2021-7")).unwrap();
        fs::create_dir(work.path().join("notes")).unwrap();
        let report = real_run(work.path());

        assert!(ensure_no_failures(&report).is_ok());
    }
}
