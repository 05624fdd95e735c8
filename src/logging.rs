//! Diagnostic logging using tracing
//!
//! Diagnostics go to stderr so stdout stays clean for reports and `--json`.

use crate::output::OutputMode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a verbosity mode
pub fn level_for(mode: OutputMode) -> &'static str {
    match mode {
        OutputMode::Quiet => "error",
        OutputMode::Normal => "warn",
        OutputMode::Verbose => "info",
        OutputMode::VeryVerbose => "debug",
    }
}

/// Install the global subscriber; `RUST_LOG` wins over the verbosity flags
pub fn init_logging(mode: OutputMode) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(mode)));

    let fmt_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(mode == OutputMode::VeryVerbose);

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
