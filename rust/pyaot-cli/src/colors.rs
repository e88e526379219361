//! ANSI color helpers for CLI output.
//!
//! Colour is dropped when `NO_COLOR` is set or stderr is not a terminal.

use std::io::IsTerminal;

fn enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
}

fn paint(code: &str, s: &str) -> String {
    if enabled() {
        format!("\x1b[{code}m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

/// Format text in red.
pub fn red(s: &str) -> String {
    paint("31", s)
}

/// Format text in bold.
pub fn bold(s: &str) -> String {
    paint("1", s)
}

/// Format text in gray.
pub fn gray(s: &str) -> String {
    paint("90", s)
}

/// Format a status label (right-aligned, green, bold).
pub fn status_label(label: &str) -> String {
    paint("1;32", &format!("{label:>12}"))
}
