//! Terminal styling for CLI output

use colored::Colorize;

/// Consistent styles for every line the CLI prints
pub struct Theme;

impl Theme {
    pub fn header(text: &str) -> String {
        text.bold().cyan().to_string()
    }

    pub fn divider(width: usize) -> String {
        "─".repeat(width).dimmed().to_string()
    }

    pub fn divider_bold(width: usize) -> String {
        "━".repeat(width).cyan().to_string()
    }

    pub fn primary(text: &str) -> String {
        text.bold().to_string()
    }

    pub fn muted(text: &str) -> String {
        text.dimmed().to_string()
    }

    pub fn value(text: &str) -> String {
        text.bright_white().bold().to_string()
    }

    pub fn success(text: &str) -> String {
        text.green().bold().to_string()
    }

    pub fn warning(text: &str) -> String {
        text.yellow().to_string()
    }

    pub fn warning_msg(text: &str) -> String {
        text.yellow().bold().to_string()
    }

    pub fn error(text: &str) -> String {
        text.red().bold().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_keep_text() {
        colored::control::set_override(false);
        assert_eq!(Theme::header("Rename"), "Rename");
        assert_eq!(Theme::divider(3), "───");
        assert_eq!(Theme::error("boom"), "boom");
        colored::control::unset_override();
    }
}
