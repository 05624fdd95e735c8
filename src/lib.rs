//! cvedirs library crate
//!
//! Renames directories whose names embed a CVE identifier down to just that
//! identifier. The CLI binary is a thin wrapper over this API.

pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod identifier;
pub mod logging;
pub mod output;
pub mod renamer;
pub mod theme;
pub mod undo;
pub mod utils;

pub use error::{RenameError, Result};
pub use identifier::MarkerSet;
pub use renamer::{rename_all, Outcome, RenameOptions, RenameReport, SkipReason};
