//! Outcome color mapping for CLI output.
//!
//! `console` disables styling automatically when stdout is not a terminal.

use console::{style, StyledObject};

/// Returns a styled string for a bootstrap outcome.
///
/// Color scheme:
/// - Green:  created, satisfied
/// - Blue:   pending
/// - Dim:    exists
/// - Red:    missing, mismatched
/// - White:  unknown/default
pub fn colorize_outcome(outcome: &str) -> StyledObject<&str> {
    match outcome {
        "created" | "satisfied" => style(outcome).green().bold(),
        "pending" => style(outcome).blue(),
        "exists" => style(outcome).dim(),
        "missing" | "mismatched" => style(outcome).red().bold(),
        _ => style(outcome).white(),
    }
}

/// Marks unique indexes.
pub fn colorize_unique(unique: bool) -> StyledObject<&'static str> {
    if unique {
        style("unique").magenta().bold()
    } else {
        style("-").dim()
    }
}
