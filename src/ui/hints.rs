//! Key hints shown in the footers.

use crate::util::display_width;

const BROWSE_NAV_OPTIONS: &[&str] = &[
    "↑/↓ navigate • ←/→ page • tab/shift+tab section",
    "↑/↓ navigate • ←/→ page • tab section",
    "↑/↓ move • ←/→ page • tab section",
    "↑/↓ move • ←/→ page • tab",
    "↑/↓ move • ←/→ page",
    "↑/↓ move • tab",
    "↑/↓",
];

const BROWSE_ACTION_OPTIONS: &[&str] = &[
    "enter read • type to search • esc clear • q quit",
    "enter read • type search • esc clear • q quit",
    "enter read • search • esc clear • q quit",
    "enter read • search • q quit",
    "enter • search • q quit",
    "enter • search • q",
    "enter • q",
    "q",
];

pub const ARTICLE_LOADING_HELP: &str = "b back • q quit";

/// Number of help lines the browse footer shows.
pub const BROWSE_HELP_LINES: usize = 2;

/// First option whose display width fits `width`; the last one if none do.
///
/// A zero width means "unknown" and picks the longest form.
pub fn select_hint<'a>(width: usize, options: &[&'a str]) -> &'a str {
    let Some(first) = options.first() else {
        return "";
    };
    if width == 0 {
        return first;
    }
    options
        .iter()
        .find(|opt| display_width(opt) <= width)
        .or(options.last())
        .copied()
        .unwrap_or(first)
}

pub fn browse_help_lines(width: usize) -> [&'static str; BROWSE_HELP_LINES] {
    [
        select_hint(width, BROWSE_NAV_OPTIONS),
        select_hint(width, BROWSE_ACTION_OPTIONS),
    ]
}

pub fn article_help(multi_column: bool) -> String {
    let label = if multi_column { "2-col" } else { "1-col" };
    format!("b back • c columns {label} • ↑/↓ scroll • pgup/pgdn • q quit")
}
