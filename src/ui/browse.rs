//! Section listing view.

use crate::app::App;
use crate::layout::{self, BROWSE_FOOTER_PADDING};
use crate::source::sections;
use crate::theme::ColorPalette;
use crate::ui::helpers::{layout_with_footer, margin_line, rule_line};
use crate::ui::hints::browse_help_lines;
use crate::util::pad_right;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const DOT_ACTIVE: &str = "●";
const DOT_INACTIVE: &str = "·";

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let lines = browse_lines(app);
    f.render_widget(Paragraph::new(lines), area);
}

/// The full browse screen as lines, centred at the reading width.
pub fn browse_lines(app: &App) -> Vec<Line<'static>> {
    let palette = &app.palette;
    let width = layout::content_width(app.width);
    let margin = layout::centre_offset(app.width, width);

    let mut content = header_lines(app, width);
    let window = app.list_window();

    if let Some(error) = &app.section_error {
        content.push(Line::default());
        content.push(Line::from(Span::styled(format!("  {error}"), palette.error)));
    } else if app.all_items.is_empty() && app.pending_section.is_some() {
        content.push(Line::default());
        content.push(Line::from(Span::styled("  Loading...", palette.dim)));
    } else if app.filtered.is_empty() {
        content.push(Line::default());
        content.push(Line::from(Span::styled("  No matching articles", palette.dim)));
    } else {
        content.extend(row_lines(app, window.start, window.count));
    }

    let mut footer = Vec::new();
    if window.show_position && !app.filtered.is_empty() {
        footer.push(Line::from(Span::styled(
            format!("  ({}/{})", app.cursor + 1, app.filtered.len()),
            palette.dim,
        )));
    }
    footer.push(Line::default());
    footer.push(rule_line(width, palette.accent_rule));
    footer.extend(
        browse_help_lines(width)
            .into_iter()
            .map(|help| Line::from(Span::styled(help, palette.help))),
    );
    if app.shows_section_dots() {
        footer.push(section_dots(&app.section, palette));
    }

    let content = content.into_iter().map(|l| margin_line(l, margin)).collect();
    let footer = footer.into_iter().map(|l| margin_line(l, margin)).collect();
    layout_with_footer(content, footer, app.height, BROWSE_FOOTER_PADDING)
}

fn header_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let palette = &app.palette;
    let title = if app.section_title.is_empty() {
        app.pending_section.clone().unwrap_or_default()
    } else {
        app.section_title.clone()
    };
    let search = if app.query.is_empty() {
        Line::default()
    } else {
        Line::from(Span::styled(format!("search: {}", app.query), palette.search))
    };
    vec![
        Line::default(),
        Line::from(Span::styled(title, palette.section_header)),
        rule_line(width, palette.accent_rule),
        search,
    ]
}

fn row_lines(app: &App, start: usize, count: usize) -> Vec<Line<'static>> {
    let palette = &app.palette;
    let headlines = app.headline_layout();
    let indent = " ".repeat(headlines.prefix_width);
    let mut lines = Vec::new();

    for pos in start..(start + count).min(app.filtered.len()) {
        let Some(item) = app.all_items.get(app.filtered[pos]) else {
            continue;
        };
        let selected = pos == app.cursor;
        let (title_style, date_style) = if selected {
            (palette.headline_selected, palette.headline_selected)
        } else {
            (palette.headline, palette.date)
        };

        let date = if headlines.compact_date {
            item.compact_date()
        } else {
            item.formatted_date()
        };
        let date = format!("{:>width$}", date, width = headlines.date_width);

        for (i, line) in headlines.title_lines(item).into_iter().enumerate() {
            if i == 0 {
                lines.push(Line::from(vec![
                    Span::styled(headlines.number(pos + 1), title_style),
                    Span::styled(pad_right(&line, headlines.title_width), title_style),
                    Span::styled(date.clone(), date_style),
                ]));
            } else {
                lines.push(Line::from(vec![
                    Span::raw(indent.clone()),
                    Span::styled(line, title_style),
                ]));
            }
        }
        for line in headlines.subtitle_lines(item) {
            lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(line, palette.subtitle),
            ]));
        }
        lines.push(Line::default());
    }
    lines
}

fn section_dots(current: &str, palette: &ColorPalette) -> Line<'static> {
    let active = sections::position(current);
    let mut spans = Vec::new();
    for (i, _) in sections::section_list().iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        if Some(i) == active {
            spans.push(Span::styled(DOT_ACTIVE, palette.dot_active));
        } else {
            spans.push(Span::styled(DOT_INACTIVE, palette.dot_inactive));
        }
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{FeedItem, Section};
    use crate::theme::ThemeVariant;
    use crate::ui::helpers::line_text;

    fn app(n: usize, width: usize, height: usize) -> App {
        let mut app = App::new(ThemeVariant::Plain.palette());
        app.resize(width, height);
        app.request_section("leaders");
        let items = (0..n)
            .map(|i| {
                FeedItem::new(
                    format!("Headline number {i}"),
                    "A short description",
                    format!("https://example.com/{i}"),
                )
            })
            .collect();
        app.apply_section(
            "leaders",
            Ok(Section {
                title: "Leaders".into(),
                items,
            }),
        );
        app
    }

    fn text(app: &App) -> Vec<String> {
        browse_lines(app).iter().map(line_text).collect()
    }

    #[test]
    fn test_header_and_rows() {
        let app = app(2, 80, 24);
        let lines = text(&app);
        assert_eq!(lines[1].trim(), "Leaders");
        assert!(lines[2].contains('━'));
        assert!(lines.iter().any(|l| l.contains("1. Headline number 0")));
        assert!(lines.iter().any(|l| l.contains("2. Headline number 1")));
        assert!(!lines.iter().any(|l| l.contains("(1/2)")));
    }

    #[test]
    fn test_position_line_when_rows_overflow() {
        let app = app(30, 80, 24);
        let lines = text(&app);
        assert!(lines.iter().any(|l| l.trim() == "(1/30)"));
        assert!(lines.len() <= 24);
    }

    #[test]
    fn test_no_matches_message() {
        let mut app = app(3, 80, 24);
        for c in "zzz".chars() {
            app.push_query_char(c);
        }
        let lines = text(&app);
        assert!(lines.iter().any(|l| l.contains("search: zzz")));
        assert!(lines.iter().any(|l| l.contains("No matching articles")));
    }

    #[test]
    fn test_section_dots_mark_current() {
        let line = section_dots("leaders", &ThemeVariant::Plain.palette());
        let dots = line_text(&line);
        assert_eq!(dots.matches(DOT_ACTIVE).count(), 1);
        assert_eq!(
            dots.matches(DOT_INACTIVE).count(),
            sections::section_list().len() - 1
        );
    }
}
