//! Helpers shared by the browse and article views and the effect scheduler.

use futures::FutureExt;
use ratatui::{
    style::Style,
    text::{Line, Span},
};
use std::panic::AssertUnwindSafe;

/// Heavy horizontal rule used under headers and above footers.
pub const ACCENT_RULE: &str = "━";

/// Catch panics in spawned tasks and convert them to error strings.
///
/// Background tasks run in `tokio::spawn`; a panic there would otherwise kill
/// the task silently and leave the UI waiting on a result that never comes.
///
/// # Example
///
/// ```ignore
/// tokio::spawn(async move {
///     match catch_task_panic(async { source.section(&name).await }).await {
///         Ok(result) => send(AppEvent::SectionLoaded { token, result }),
///         Err(panic_msg) => send(AppEvent::TaskPanicked { task: "section", token, error: panic_msg }),
///     }
/// });
/// ```
pub(crate) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "task panicked with a non-string payload".to_string()
            }
        })
}

/// Concatenated text of a line's spans.
pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

/// Shifts a non-empty line right by `margin` columns; empty lines stay empty.
pub fn margin_line(line: Line<'static>, margin: usize) -> Line<'static> {
    if margin == 0 || line.width() == 0 {
        return line;
    }
    let mut spans = Vec::with_capacity(line.spans.len() + 1);
    spans.push(Span::raw(" ".repeat(margin)));
    spans.extend(line.spans);
    Line::from(spans).style(line.style)
}

pub fn rule_line(width: usize, style: Style) -> Line<'static> {
    if width == 0 {
        return Line::default();
    }
    Line::from(Span::styled(ACCENT_RULE.repeat(width), style))
}

/// Content at the top, footer pinned `bottom_padding` lines above the bottom.
///
/// At least one blank line separates non-empty content from the footer, even
/// when that pushes the footer past `height`.
pub fn layout_with_footer(
    content: Vec<Line<'static>>,
    footer: Vec<Line<'static>>,
    height: usize,
    bottom_padding: usize,
) -> Vec<Line<'static>> {
    if footer.is_empty() || height == 0 {
        let mut lines = content;
        lines.extend(footer);
        return lines;
    }

    let used = content.len() + footer.len() + bottom_padding;
    let mut gap = height.saturating_sub(used);
    if !content.is_empty() {
        gap = gap.max(1);
    }

    let mut lines = content;
    lines.extend(std::iter::repeat_with(Line::default).take(gap));
    lines.extend(footer);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_footer_is_pinned_to_bottom() {
        let lines = layout_with_footer(vec![Line::from("body")], vec![Line::from("help")], 6, 1);
        let text: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(text, vec!["body", "", "", "", "help"]);
    }

    #[test]
    fn test_content_keeps_one_line_gap_when_full() {
        let content = vec![Line::from("a"), Line::from("b"), Line::from("c")];
        let lines = layout_with_footer(content, vec![Line::from("help")], 3, 1);
        assert_eq!(lines.len(), 5);
        assert_eq!(line_text(&lines[3]), "");
    }

    #[test]
    fn test_margin_skips_empty_lines() {
        assert_eq!(margin_line(Line::default(), 4).width(), 0);
        assert_eq!(line_text(&margin_line(Line::from("x"), 3)), "   x");
    }

    #[test]
    fn test_rule_line_width() {
        assert_eq!(rule_line(5, Style::default()).width(), 5);
        assert_eq!(rule_line(0, Style::default()).width(), 0);
    }

    #[tokio::test]
    async fn test_catch_task_panic() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
        let err = catch_task_panic(async { panic!("boom") }).await.map(|()| ());
        assert_eq!(err, Err("boom".to_string()));
    }
}
