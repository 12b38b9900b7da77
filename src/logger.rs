//! Terminal logging with colored module prefixes.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `WatchStatus` for the timestamped rebuild outcome shown in watch mode
//!
//! # Example
//!
//! ```ignore
//! log!("build"; "parsed {} posts", count);
//!
//! WatchStatus::success("rebuilt: posts/hello.md");
//! ```

use colored::{ColoredString, Colorize};
use crossterm::terminal::size;
use std::{
    io::{Write, stdout},
    sync::OnceLock,
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Total prefix length for a module name: `[`, `]` and the trailing space.
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message with a colored module prefix.
///
/// Single-line messages are truncated to the terminal width; multiline
/// messages (error chains, template diagnostics) are printed in full.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module, &module.to_ascii_lowercase());
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();

    if message.contains('\n') {
        writeln!(stdout, "{prefix} {message}").ok();
    } else {
        let max_msg_len = width.saturating_sub(calc_prefix_len(module.len()));
        writeln!(stdout, "{prefix} {}", truncate_str(message, max_msg_len)).ok();
    }

    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" => prefix.bright_blue().bold(),
        "watch" => prefix.bright_green().bold(),
        "warn" => prefix.bright_magenta().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Watch Status
// ============================================================================

/// Timestamped rebuild outcome line for watch mode.
pub struct WatchStatus;

impl WatchStatus {
    /// Display success message (✓ prefix, green).
    pub fn success(message: &str) {
        Self::display("✓".green().to_string(), message);
    }

    /// Display error message (✗ prefix, red) with optional detail.
    pub fn error(summary: &str, detail: &str) {
        Self::display("✗".red().to_string(), &format_status(summary, detail));
    }

    fn display(symbol: String, message: &str) {
        let mut stdout = stdout().lock();
        let timestamp = format!("[{}]", chrono::Local::now().format("%H:%M:%S")).dimmed();
        writeln!(stdout, "{timestamp} {symbol} {message}").ok();
        stdout.flush().ok();
    }
}

/// Join a status summary with its detail, indenting detail lines.
fn format_status(summary: &str, detail: &str) -> String {
    if detail.is_empty() {
        return summary.to_string();
    }
    let mut message = summary.to_string();
    for line in detail.lines() {
        message.push_str("\n  ");
        message.push_str(line);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_prefix_len() {
        // "build" -> "[build] " = 5 + 2 + 1
        assert_eq!(calc_prefix_len(5), 8);
        assert_eq!(calc_prefix_len(0), 3);
    }

    #[test]
    fn test_truncate_str_fits() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_str_cuts() {
        assert_eq!(truncate_str("hello world", 5), "hello");
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn test_truncate_str_unicode_boundary() {
        // "€" is 3 bytes; byte 4 is inside the second char
        assert_eq!(truncate_str("€€", 4), "€");
        assert_eq!(truncate_str("a€b", 3), "a");
    }

    #[test]
    fn test_format_status() {
        assert_eq!(format_status("rebuilt", ""), "rebuilt");
        assert_eq!(
            format_status("build failed", "posts/a.md\nmetadata not found"),
            "build failed\n  posts/a.md\n  metadata not found"
        );
    }
}
