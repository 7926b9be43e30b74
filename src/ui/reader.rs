//! Article reader view.
//!
//! [`article_lines`] lays an [`Article`] out into styled lines once per fetch,
//! resize or column toggle. [`render`] only slices those lines by the scroll
//! offset and draws the footer.

use crate::app::{App, ArticleState};
use crate::article::Article;
use crate::layout::{self, ArticleLayout, ColumnPlan, ARTICLE_FOOTER_PADDING, COLUMN_GAP};
use crate::theme::ColorPalette;
use crate::ui::helpers::{layout_with_footer, line_text, margin_line, rule_line};
use crate::ui::hints::{article_help, ARTICLE_LOADING_HELP};
use crate::util::wrap_lines;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthChar;

/// Marks the end of an article body; drawn in the title style.
const END_MARKER: char = '■';
const BULLET: &str = "• ";
const QUOTE_BAR: &str = "│ ";

// ============================================================================
// Markdown blocks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Paragraph,
    Heading,
    Quote,
    ListItem,
    Code,
}

#[derive(Debug, Clone)]
struct Block {
    kind: BlockKind,
    spans: Vec<Span<'static>>,
}

fn flush(blocks: &mut Vec<Block>, spans: &mut Vec<Span<'static>>, kind: BlockKind) {
    if spans.iter().any(|s| !s.content.trim().is_empty()) {
        blocks.push(Block {
            kind,
            spans: std::mem::take(spans),
        });
    } else {
        spans.clear();
    }
}

/// Splits markdown into styled blocks ready for wrapping.
fn parse_blocks(md: &str, palette: &ColorPalette) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::with_capacity(4);
    let mut code = String::new();
    let mut in_code = false;
    let mut in_heading = false;
    let mut in_emphasis = false;
    let mut in_strong = false;
    let mut in_link = false;
    let mut quote_depth = 0usize;
    let mut list_depth = 0usize;

    let text_kind = |quote_depth: usize, list_depth: usize| {
        if list_depth > 0 {
            BlockKind::ListItem
        } else if quote_depth > 0 {
            BlockKind::Quote
        } else {
            BlockKind::Paragraph
        }
    };

    for event in Parser::new(md) {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                flush(&mut blocks, &mut spans, text_kind(quote_depth, list_depth));
                in_heading = true;
            }
            Event::End(TagEnd::Heading { .. }) => {
                flush(&mut blocks, &mut spans, BlockKind::Heading);
                in_heading = false;
            }
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Item) => {
                flush(&mut blocks, &mut spans, text_kind(quote_depth, list_depth));
            }
            Event::Start(Tag::BlockQuote { .. }) => {
                flush(&mut blocks, &mut spans, text_kind(quote_depth, list_depth));
                quote_depth += 1;
            }
            Event::End(TagEnd::BlockQuote { .. }) => {
                flush(&mut blocks, &mut spans, text_kind(quote_depth, list_depth));
                quote_depth = quote_depth.saturating_sub(1);
            }
            Event::Start(Tag::List { .. }) => {
                flush(&mut blocks, &mut spans, text_kind(quote_depth, list_depth));
                list_depth += 1;
            }
            Event::Start(Tag::Item) => {
                flush(&mut blocks, &mut spans, text_kind(quote_depth, list_depth));
            }
            Event::End(TagEnd::List { .. }) => {
                flush(&mut blocks, &mut spans, text_kind(quote_depth, list_depth));
                list_depth = list_depth.saturating_sub(1);
            }
            Event::Start(Tag::CodeBlock { .. }) => {
                flush(&mut blocks, &mut spans, text_kind(quote_depth, list_depth));
                in_code = true;
            }
            Event::End(TagEnd::CodeBlock { .. }) => {
                in_code = false;
                let text = std::mem::take(&mut code);
                let text = text.trim_end_matches('\n');
                if !text.is_empty() {
                    blocks.push(Block {
                        kind: BlockKind::Code,
                        spans: vec![Span::styled(text.to_string(), palette.code)],
                    });
                }
            }
            Event::Start(Tag::Emphasis) => in_emphasis = true,
            Event::End(TagEnd::Emphasis) => in_emphasis = false,
            Event::Start(Tag::Strong) => in_strong = true,
            Event::End(TagEnd::Strong) => in_strong = false,
            Event::Start(Tag::Link { .. }) => in_link = true,
            Event::End(TagEnd::Link) => in_link = false,
            Event::Text(text) if in_code => code.push_str(&text),
            Event::Text(text) => {
                let mut style = if in_heading {
                    palette.heading
                } else if quote_depth > 0 {
                    palette.quote
                } else {
                    palette.body
                };
                if in_strong {
                    style = style.patch(palette.strong);
                }
                if in_emphasis {
                    style = style.patch(palette.emphasis);
                }
                if in_link {
                    style = style.patch(palette.link);
                }
                push_marked_text(&mut spans, &text, style, palette.article_title);
            }
            Event::Code(text) => spans.push(Span::styled(text.into_string(), palette.code)),
            Event::SoftBreak | Event::HardBreak => spans.push(Span::raw(" ")),
            _ => {}
        }
    }
    flush(&mut blocks, &mut spans, BlockKind::Paragraph);
    blocks
}

/// Pushes `text`, giving any end marker its own span.
fn push_marked_text(spans: &mut Vec<Span<'static>>, text: &str, style: Style, marker: Style) {
    let mut parts = text.split(END_MARKER).peekable();
    while let Some(part) = parts.next() {
        if !part.is_empty() {
            spans.push(Span::styled(part.to_string(), style));
        }
        if parts.peek().is_some() {
            spans.push(Span::styled(END_MARKER.to_string(), marker));
        }
    }
}

// ============================================================================
// Styled word wrap
// ============================================================================

/// A run of non-space characters, possibly spanning several styles.
#[derive(Debug, Default)]
struct Word {
    segments: Vec<(String, Style)>,
    width: usize,
}

impl Word {
    fn push(&mut self, ch: char, style: Style) {
        match self.segments.last_mut() {
            Some((text, s)) if *s == style => text.push(ch),
            _ => self.segments.push((ch.to_string(), style)),
        }
        self.width += ch.width().unwrap_or(0);
    }

    fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Hard-breaks a word wider than `width` into pieces that fit.
    fn split(self, width: usize) -> Vec<Word> {
        let mut pieces = Vec::new();
        let mut piece = Word::default();
        for (text, style) in self.segments {
            for ch in text.chars() {
                let w = ch.width().unwrap_or(0);
                if !piece.is_empty() && piece.width + w > width {
                    pieces.push(std::mem::take(&mut piece));
                }
                piece.push(ch, style);
            }
        }
        if !piece.is_empty() {
            pieces.push(piece);
        }
        pieces
    }

    fn into_spans(self) -> impl Iterator<Item = Span<'static>> {
        self.segments
            .into_iter()
            .map(|(text, style)| Span::styled(text, style))
    }
}

fn split_words(spans: &[Span<'static>]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = Word::default();
    for span in spans {
        for ch in span.content.chars() {
            if ch.is_whitespace() {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            } else {
                current.push(ch, span.style);
            }
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Greedy word wrap that keeps each word's styling. Zero width means no wrap.
fn wrap_spans(spans: &[Span<'static>], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut line: Vec<Span<'static>> = Vec::new();
    let mut used = 0;

    let words = split_words(spans).into_iter().flat_map(|word| {
        if width > 0 && word.width > width {
            word.split(width)
        } else {
            vec![word]
        }
    });

    for word in words {
        if width > 0 && used > 0 && used + 1 + word.width > width {
            lines.push(Line::from(std::mem::take(&mut line)));
            used = 0;
        }
        if used > 0 {
            line.push(Span::raw(" "));
            used += 1;
        }
        used += word.width;
        line.extend(word.into_spans());
    }
    if !line.is_empty() {
        lines.push(Line::from(line));
    }
    lines
}

/// Code keeps its own line breaks and is only hard-broken at `width`.
fn wrap_code(text: &str, style: Style, width: usize) -> Vec<Line<'static>> {
    text.lines()
        .flat_map(|raw| {
            let mut word = Word::default();
            for ch in raw.trim_end().chars() {
                word.push(if ch == '\t' { ' ' } else { ch }, style);
            }
            if word.is_empty() {
                return vec![Line::default()];
            }
            let pieces = if width > 0 { word.split(width) } else { vec![word] };
            pieces
                .into_iter()
                .map(|w| Line::from(w.into_spans().collect::<Vec<_>>()))
                .collect()
        })
        .collect()
}

fn prefixed(lines: Vec<Line<'static>>, first: Span<'static>, rest: Span<'static>) -> Vec<Line<'static>> {
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let lead = if i == 0 { first.clone() } else { rest.clone() };
            let mut spans = Vec::with_capacity(line.spans.len() + 1);
            spans.push(lead);
            spans.extend(line.spans);
            Line::from(spans)
        })
        .collect()
}

fn wrap_block(block: &Block, width: usize, palette: &ColorPalette) -> Vec<Line<'static>> {
    let inner = width.saturating_sub(2).max(1);
    match block.kind {
        BlockKind::Paragraph | BlockKind::Heading => wrap_spans(&block.spans, width),
        BlockKind::Quote => prefixed(
            wrap_spans(&block.spans, inner),
            Span::styled(QUOTE_BAR, palette.quote),
            Span::styled(QUOTE_BAR, palette.quote),
        ),
        BlockKind::ListItem => prefixed(
            wrap_spans(&block.spans, inner),
            Span::styled(BULLET, palette.body),
            Span::raw("  "),
        ),
        BlockKind::Code => {
            let text: String = block.spans.iter().map(|s| s.content.as_ref()).collect();
            wrap_code(&text, palette.code, width)
        }
    }
}

/// Wraps every block to `width`, one blank line between blocks.
fn body_lines(blocks: &[Block], width: usize, palette: &ColorPalette) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut prev: Option<BlockKind> = None;
    for block in blocks {
        let tight = prev == Some(BlockKind::ListItem) && block.kind == BlockKind::ListItem;
        if prev.is_some() && !tight {
            lines.push(Line::default());
        }
        lines.extend(wrap_block(block, width, palette));
        prev = Some(block.kind);
    }
    lines
}

/// Body laid out in columns when enabled and long enough, else one column.
fn layout_body(
    blocks: &[Block],
    width: usize,
    multi_column: bool,
    palette: &ColorPalette,
) -> Vec<Line<'static>> {
    if !multi_column {
        return body_lines(blocks, width, palette);
    }
    let plan = layout::plan_columns(width, |w| body_lines(blocks, w, palette).len());
    if plan.columns <= 1 {
        return body_lines(blocks, width, palette);
    }

    columnize(&body_lines(blocks, plan.column_width, palette), plan)
}

/// Lays `lines` out in `plan.columns` newspaper-style columns.
///
/// Blank lines at either end are dropped and the rest is placed by
/// [`layout::column_grid`]. Every cell but the last on a row is padded to the
/// column width, so spans keep their styles.
fn columnize(lines: &[Line<'static>], plan: ColumnPlan) -> Vec<Line<'static>> {
    let texts: Vec<String> = lines.iter().map(line_text).collect();
    let lines = &lines[layout::trim_blank_ends(&texts)];
    if plan.columns <= 1 {
        return lines.to_vec();
    }
    let gap = " ".repeat(COLUMN_GAP);

    layout::column_grid(lines.len(), plan.columns)
        .into_iter()
        .map(|cells| {
            let mut spans = Vec::new();
            for (i, &idx) in cells.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::raw(gap.clone()));
                }
                let cell = &lines[idx];
                spans.extend(cell.spans.iter().cloned());
                let pad = plan.column_width.saturating_sub(cell.width());
                if i + 1 < cells.len() && pad > 0 {
                    spans.push(Span::raw(" ".repeat(pad)));
                }
            }
            Line::from(spans)
        })
        .collect()
}

// ============================================================================
// Header and footer
// ============================================================================

/// `Section | rest` with the section in its own style.
fn overtitle_line(text: &str, palette: &ColorPalette) -> Line<'static> {
    let Some((section, rest)) = text.split_once('|') else {
        return Line::from(Span::styled(text.to_string(), palette.overtitle));
    };
    let (section, rest) = (section.trim(), rest.trim());
    if section.is_empty() {
        return Line::from(Span::styled(text.to_string(), palette.overtitle));
    }
    if rest.is_empty() {
        return Line::from(Span::styled(section.to_string(), palette.overtitle_section));
    }
    Line::from(vec![
        Span::styled(section.to_string(), palette.overtitle_section),
        Span::styled(" | ", palette.overtitle),
        Span::styled(rest.to_string(), palette.overtitle),
    ])
}

fn push_wrapped(lines: &mut Vec<Line<'static>>, text: &str, width: usize, style: Style) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    lines.extend(
        wrap_lines(text, width)
            .into_iter()
            .map(|l| Line::from(Span::styled(l, style))),
    );
    true
}

fn header_lines(article: &Article, layout: &ArticleLayout, palette: &ColorPalette) -> Vec<Line<'static>> {
    let width = layout.header_wrap_width();
    let mut lines = vec![Line::default()];

    let overtitle = article.overtitle.trim();
    if !overtitle.is_empty() {
        lines.extend(
            wrap_lines(overtitle, width)
                .iter()
                .map(|l| overtitle_line(l, palette)),
        );
        let more = [&article.title, &article.subtitle, &article.date_line]
            .iter()
            .any(|s| !s.trim().is_empty());
        if more {
            lines.push(Line::default());
        }
    }
    push_wrapped(&mut lines, &article.title, width, palette.article_title);
    push_wrapped(&mut lines, &article.subtitle, width, palette.article_subtitle);
    push_wrapped(&mut lines, &article.date_line, width, palette.article_date);

    lines.push(Line::default());
    lines.push(rule_line(layout.content_width, palette.accent_rule));
    lines.push(Line::default());
    lines
}

fn footer_lines(article: &Article, layout: &ArticleLayout, palette: &ColorPalette) -> Vec<Line<'static>> {
    vec![
        Line::default(),
        Line::default(),
        rule_line(layout.content_width, palette.accent_rule),
        Line::default(),
        Line::from(Span::styled(article.url.clone(), palette.body)),
    ]
}

// ============================================================================
// Public entry points
// ============================================================================

/// Every line of an article as laid out for a terminal `term_width` wide.
///
/// Single-column text is centred at the reading measure; columns use the
/// full width. Non-empty lines carry the left margin as a leading span.
pub fn article_lines(
    article: &Article,
    term_width: usize,
    multi_column: bool,
    palette: &ColorPalette,
) -> Vec<Line<'static>> {
    let layout = ArticleLayout::new(term_width, multi_column);
    let blocks = parse_blocks(&article.content, palette);
    let body = layout_body(&blocks, layout.content_width, multi_column, palette);

    let margin = layout.offset + layout.indent;
    header_lines(article, &layout, palette)
        .into_iter()
        .chain(body)
        .chain(footer_lines(article, &layout, palette))
        .map(|line| margin_line(line, margin))
        .collect()
}

/// Plain text of laid out lines, one per row, trailing spaces removed.
pub fn lines_to_text(lines: &[Line<'_>]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line_text(line).trim_end());
        out.push('\n');
    }
    out
}

/// Draws the article mode screen: visible lines plus the reader footer.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let palette = &app.palette;
    let term_width = area.width as usize;
    let layout = ArticleLayout::new(term_width, app.multi_column);
    let margin = layout.offset + layout.indent;
    let footer_rule = rule_line(layout.content_width, palette.accent_rule);

    let status = |text: String, style: Style| {
        let content = vec![Line::from(Span::styled(text, style))];
        let footer = vec![
            Line::default(),
            footer_rule.clone(),
            Line::from(Span::styled(ARTICLE_LOADING_HELP, palette.help)),
        ];
        (content, footer)
    };

    let (content, footer) = match &app.article {
        ArticleState::Idle => status("No article loaded.".to_string(), palette.dim),
        ArticleState::Loading { .. } => status("Loading article...".to_string(), palette.body),
        ArticleState::Failed { error } => status(error.to_string(), palette.error),
        ArticleState::Ready { lines, .. } => {
            let view = layout::article_view_height(area.height as usize, app.debug);
            let start = app.scroll.min(layout::max_scroll(lines.len(), view));
            let end = (start + view).min(lines.len());

            let mut footer = vec![Line::default(), footer_rule.clone()];
            if end < lines.len() {
                let pct = layout::scroll_percent(end, lines.len());
                footer.push(Line::from(Span::styled(
                    format!("{pct}% · more ↓"),
                    palette.dim,
                )));
            }
            footer.push(Line::from(Span::styled(
                article_help(app.multi_column),
                palette.help,
            )));
            if app.debug {
                footer.push(Line::from(Span::styled(
                    app.timings.to_string(),
                    palette.dim,
                )));
            }
            return draw(f, area, lines[start..end].to_vec(), footer, margin, true);
        }
    };
    draw(f, area, content, footer, margin, false);
}

fn draw(
    f: &mut Frame,
    area: Rect,
    content: Vec<Line<'static>>,
    footer: Vec<Line<'static>>,
    margin: usize,
    content_has_margin: bool,
) {
    let content = if content_has_margin {
        content
    } else {
        content.into_iter().map(|l| margin_line(l, margin)).collect()
    };
    let footer = footer.into_iter().map(|l| margin_line(l, margin)).collect();
    let lines = layout_with_footer(
        content,
        footer,
        area.height as usize,
        ARTICLE_FOOTER_PADDING,
    );
    f.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeVariant;
    use pretty_assertions::assert_eq;

    fn plain() -> ColorPalette {
        ThemeVariant::Plain.palette()
    }

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(|l| line_text(l).trim_end().to_string()).collect()
    }

    fn sample() -> Article {
        Article {
            overtitle: "Leaders | Artificial intelligence".into(),
            title: "The machines are coming".into(),
            subtitle: "And they are bringing spreadsheets".into(),
            date_line: "Jan 2nd 2024".into(),
            content: "First paragraph of the piece.\n\nSecond paragraph. ■".into(),
            url: "https://example.com/a".into(),
            debug_artifact_path: None,
        }
    }

    #[test]
    fn test_header_body_footer_order() {
        let lines = article_lines(&sample(), 80, false, &plain());
        let text: Vec<String> = texts(&lines).iter().map(|l| l.trim().to_string()).collect();
        let rule = "━".repeat(70);
        assert_eq!(
            text,
            vec![
                "",
                "Leaders | Artificial intelligence",
                "",
                "The machines are coming",
                "And they are bringing spreadsheets",
                "Jan 2nd 2024",
                "",
                rule.as_str(),
                "",
                "First paragraph of the piece.",
                "",
                "Second paragraph. ■",
                "",
                "",
                rule.as_str(),
                "",
                "https://example.com/a",
            ]
        );
    }

    #[test]
    fn test_single_column_is_centred_with_indent() {
        let lines = article_lines(&sample(), 80, false, &plain());
        // content width 72 at 80 columns: offset 4, body indent 2
        let title = texts(&lines)[3].clone();
        assert!(title.starts_with("      The machines"));
    }

    #[test]
    fn test_overtitle_without_separator() {
        let line = overtitle_line("Briefing", &plain());
        assert_eq!(line_text(&line), "Briefing");
        let line = overtitle_line("Science |", &plain());
        assert_eq!(line_text(&line), "Science");
    }

    #[test]
    fn test_wrap_spans_respects_width_and_styles() {
        let palette = ThemeVariant::Dark.palette();
        let blocks = parse_blocks("plain **bold words** and *more* text here", &palette);
        let lines = body_lines(&blocks, 12, &palette);
        for line in &lines {
            assert!(line.width() <= 12, "{:?}", line_text(line));
        }
        let bold = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content == "bold")
            .unwrap();
        assert_eq!(bold.style, palette.body.patch(palette.strong));
    }

    #[test]
    fn test_long_words_are_broken() {
        let lines = wrap_spans(&[Span::raw("abcdefghij")], 4);
        assert_eq!(texts(&lines), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_lists_quotes_and_code() {
        let md = "- one\n- two\n\n> quoted\n\n```\nlet x = 1;\n```";
        let lines = body_lines(&parse_blocks(md, &plain()), 40, &plain());
        assert_eq!(
            texts(&lines),
            vec!["• one", "• two", "", "│ quoted", "", "let x = 1;"]
        );
    }

    #[test]
    fn test_end_marker_gets_title_style() {
        let palette = ThemeVariant::Dark.palette();
        let blocks = parse_blocks("The end. ■", &palette);
        let marker = blocks[0].spans.iter().find(|s| s.content == "■").unwrap();
        assert_eq!(marker.style, palette.article_title);
    }

    #[test]
    fn test_multi_column_splits_long_bodies() {
        let paragraph = "word ".repeat(60);
        let content = vec![paragraph.trim(); 8].join("\n\n");
        let article = Article {
            title: "T".into(),
            content,
            url: "u".into(),
            ..Default::default()
        };
        let single = article_lines(&article, 120, false, &plain());
        let multi = article_lines(&article, 120, true, &plain());
        assert!(multi.len() < single.len());
        assert!(multi.iter().all(|l| l.width() <= 120));
        let gap = format!("word{}", " ".repeat(COLUMN_GAP));
        assert!(texts(&multi).iter().any(|l| l.contains(&gap)));
    }

    #[test]
    fn test_columnize_reads_down_then_across() {
        let palette = ThemeVariant::Dark.palette();
        let lines: Vec<Line<'static>> = ["", "a", "b", "c", "d", "e", ""]
            .iter()
            .map(|s| Line::from(Span::styled(s.to_string(), palette.strong)))
            .collect();
        let plan = ColumnPlan {
            columns: 2,
            column_width: 3,
        };

        let out = columnize(&lines, plan);
        assert_eq!(texts(&out), vec!["a      d", "b      e", "c"]);
        assert_eq!(out[0].spans[0].style, palette.strong);
        assert_eq!(out[0].spans.last().map(|s| s.style), Some(palette.strong));
        assert_eq!(texts(&columnize(&lines, ColumnPlan::single(3))), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_short_body_stays_single_column_when_enabled() {
        let lines = article_lines(&sample(), 120, true, &plain());
        assert!(texts(&lines).iter().any(|l| l.trim() == "First paragraph of the piece."));
    }

    #[test]
    fn test_lines_to_text() {
        let lines = vec![Line::from("a  "), Line::default(), Line::from("b")];
        assert_eq!(lines_to_text(&lines), "a\n\nb\n");
    }
}
