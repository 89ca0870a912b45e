//! Visual styling utilities for the CLI.
//!
//! Colors are applied with `owo-colors` and only when enabled; every helper
//! takes `no_color` and returns plain text when it is set.

use std::io::{self, IsTerminal};

use owo_colors::OwoColorize;

/// Checkmark shown for batteries reporting `ok` or `low`.
pub const CHECKMARK: &str = "\u{2713}";

/// Whether stdout output should be colored.
pub fn should_color(no_color: bool) -> bool {
    !no_color && io::stdout().is_terminal()
}

// ============================================================================
// Device state
// ============================================================================

/// Color a state label: on green, off dimmed, others unchanged.
pub fn format_state_colored(label: &str, no_color: bool) -> String {
    if no_color {
        return label.to_string();
    }
    match label {
        "On" => format!("{}", label.green()),
        "Off" => format!("{}", label.dimmed()),
        "?" => format!("{}", label.yellow()),
        _ => format!("{}", label.cyan()),
    }
}

/// Header row text.
pub fn format_header(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("{}", text.bold())
    }
}

/// Apply the table style: rounded borders when colored, none otherwise.
pub fn apply_table_style(table: &mut tabled::Table, no_color: bool) {
    use tabled::settings::Style;
    if no_color {
        table.with(Style::blank());
    } else {
        table.with(Style::rounded());
    }
}

// ============================================================================
// Status Messages
// ============================================================================

/// Format a success message.
pub fn format_success(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[OK] {}", message)
    } else {
        format!("{} {}", "[OK]".green(), message)
    }
}

/// Format an informational message.
pub fn format_info(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[--] {}", message)
    } else {
        format!("{} {}", "[--]".cyan(), message)
    }
}
