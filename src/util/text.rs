use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Ellipsis appended to truncated text.
const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Calculates the display width of a string in terminal columns.
///
/// CJK characters and most emoji count as two columns, combining marks as zero.
///
/// ```
/// use broadsheet::util::display_width;
///
/// assert_eq!(display_width("Hello"), 5);
/// assert_eq!(display_width("日本"), 4);
/// ```
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncates a string to fit within `max_width` columns, appending "..." when cut.
///
/// Widths of three columns or fewer cannot hold a character plus the ellipsis,
/// so those return as many leading characters as fit instead.
///
/// ```
/// use broadsheet::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width <= ELLIPSIS_WIDTH {
        return Cow::Owned(take_width(s, max_width).to_string());
    }
    let kept = take_width(s, max_width - ELLIPSIS_WIDTH);
    Cow::Owned(format!("{}{}", kept, ELLIPSIS))
}

/// Forces an ellipsis onto `s` while staying within `max_width` columns.
///
/// Used when lines were dropped after `s`, so the reader needs a marker even
/// though `s` itself fits.
pub fn ellipsize(s: &str, max_width: usize) -> String {
    if max_width <= ELLIPSIS_WIDTH {
        return take_width(s, max_width).to_string();
    }
    let trimmed = s.trim_end();
    let kept = take_width(trimmed, max_width - ELLIPSIS_WIDTH);
    format!("{}{}", kept.trim_end(), ELLIPSIS)
}

/// Longest prefix of `s` that fits in `width` columns.
fn take_width(s: &str, width: usize) -> &str {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width {
            return &s[..idx];
        }
        used += w;
    }
    s
}

/// Pads `s` with trailing spaces up to `width` display columns.
pub fn pad_right(s: &str, width: usize) -> String {
    let w = display_width(s);
    if w >= width {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + (width - w));
    out.push_str(s);
    out.extend(std::iter::repeat(' ').take(width - w));
    out
}

/// True when the line holds nothing but whitespace.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Word-wraps `text` to `width` columns.
///
/// A width of zero disables wrapping. Existing newlines are kept as hard breaks
/// and an empty input yields no lines.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if width == 0 {
        return text.lines().map(str::to_string).collect();
    }
    let options = textwrap::Options::new(width).break_words(true);
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, &options)
                    .into_iter()
                    .map(Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

/// Caps `lines` at `max` entries, ellipsizing the last kept line when any were dropped.
pub fn limit_lines(mut lines: Vec<String>, max: usize, width: usize) -> Vec<String> {
    if lines.len() <= max {
        return lines;
    }
    lines.truncate(max);
    if let Some(last) = lines.last_mut() {
        *last = ellipsize(last, width);
    }
    lines
}

/// Strips control characters and collapses runs of whitespace into single spaces.
///
/// Titles and descriptions from feeds arrive with stray newlines, tabs and
/// occasionally terminal escapes; list rows need a single clean line.
pub fn clean_inline(s: &str) -> String {
    let stripped = strip_control_chars(s);
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips terminal control characters and ANSI escape sequences from text.
///
/// Removes C0 controls other than tab/newline/CR, DEL, CSI sequences
/// (`ESC [ ... final`), OSC sequences (`ESC ] ... BEL|ST`) and bare ESC bytes.
/// Returns `Cow::Borrowed` when there is nothing to strip.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    fn is_control(c: char) -> bool {
        c == '\u{1b}' || c == '\u{7f}' || (c < ' ' && !matches!(c, '\t' | '\n' | '\r'))
    }

    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            if !is_control(c) {
                out.push(c);
            }
            continue;
        }
        match chars.peek() {
            Some('[') => {
                chars.next();
                for c in chars.by_ref() {
                    if ('\u{40}'..='\u{7e}').contains(&c) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\u{07}' {
                        break;
                    }
                    if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    Cow::Owned(out)
}
