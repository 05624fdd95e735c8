//! CVE identifier extraction from directory names
//!
//! An identifier is the first [`PREFIX_LEN`] characters of the name starting at
//! the marker (e.g. `CVE-2021-`), followed by the run of decimal digits that
//! comes directly after them.

use crate::error::{RenameError, Result};

/// Length in characters of the fixed `CVE-NNNN-` prefix
pub const PREFIX_LEN: usize = 9;

/// Markers used when nothing else is configured
pub const DEFAULT_MARKERS: &[&str] = &["CVE", "cve"];

/// The set of marker substrings searched for in a directory name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSet {
    markers: Vec<String>,
    ignore_case: bool,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self::new(DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(), false)
    }
}

impl MarkerSet {
    pub fn new(markers: Vec<String>, ignore_case: bool) -> Self {
        Self {
            markers,
            ignore_case,
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }
}

/// Byte index of the earliest marker occurrence in `name`, if any
pub fn find_marker(name: &str, markers: &MarkerSet) -> Option<usize> {
    if markers.ignore_case {
        // ASCII lowercasing keeps byte offsets stable
        let haystack = name.to_ascii_lowercase();
        markers
            .markers
            .iter()
            .filter(|m| !m.is_empty())
            .filter_map(|m| haystack.find(&m.to_ascii_lowercase()))
            .min()
    } else {
        markers
            .markers
            .iter()
            .filter(|m| !m.is_empty())
            .filter_map(|m| name.find(m.as_str()))
            .min()
    }
}

/// Extract the normalized identifier from a directory name
///
/// Returns [`RenameError::MarkerNotFound`] when no marker is present.
pub fn extract(name: &str, markers: &MarkerSet) -> Result<String> {
    let start = find_marker(name, markers).ok_or_else(|| RenameError::MarkerNotFound {
        name: name.to_string(),
    })?;

    let mut chars = name[start..].chars();
    let mut identifier: String = chars.by_ref().take(PREFIX_LEN).collect();
    identifier.extend(chars.take_while(char::is_ascii_digit));

    Ok(identifier)
}

/// Whether `name` is already in its normalized form
pub fn is_normalized(name: &str, markers: &MarkerSet) -> bool {
    matches!(extract(name, markers), Ok(id) if id == name)
}
