//! Navigation state for the interactive reader.
//!
//! [`App`] is the single source of UI truth. It is owned by the event loop
//! and only mutated through [`crate::ui::update`]; background work reports
//! back as [`AppEvent`]s carrying the token it was dispatched with, and a
//! result whose token no longer matches the pending one is dropped.
//!
//! Dropping is not cancelling: superseded fetches still run to completion and
//! their cost is paid, the result is simply thrown away.

use crate::article::{Article, FeedItem, Section};
use crate::error::FetchError;
use crate::layout::{self, HeadlineLayout, ListWindow};
use crate::search::{self, Query};
use crate::source::sections;
use crate::theme::ColorPalette;
use crate::ui::hints::BROWSE_HELP_LINES;
use crate::ui::reader;
use ratatui::text::Line;
use std::fmt;
use std::time::{Duration, Instant};

// ============================================================================
// Modes and sub-states
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Article,
}

/// What the article view is showing.
///
/// `Ready` holds the laid out lines so drawing a frame never re-wraps text;
/// they are rebuilt only on fetch, resize or column toggle.
#[derive(Debug, Clone)]
pub enum ArticleState {
    Idle,
    Loading {
        item: FeedItem,
    },
    Ready {
        article: Article,
        lines: Vec<Line<'static>>,
    },
    Failed {
        error: FetchError,
    },
}

impl ArticleState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// Durations shown on the debug line under the article help.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timings {
    pub fetch: Option<Duration>,
    pub render: Option<Duration>,
}

impl fmt::Display for Timings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |d: Option<Duration>| match d {
            Some(d) => format!("{d:.1?}"),
            None => "-".to_string(),
        };
        write!(f, "fetch={} render={}", show(self.fetch), show(self.render))
    }
}

// ============================================================================
// Events and effects
// ============================================================================

/// Completion events sent back by background tasks.
#[derive(Debug)]
pub enum AppEvent {
    SectionLoaded {
        token: String,
        result: Result<Section, FetchError>,
    },
    ArticleLoaded {
        token: String,
        result: Result<Article, FetchError>,
        elapsed: Duration,
    },
    /// A background task panicked. Reported so the UI does not wait forever.
    /// `token` is the section or URL the task was loading.
    TaskPanicked {
        task: &'static str,
        token: String,
        error: String,
    },
}

/// Work the reducer asks the scheduler to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadSection { section: String },
    FetchArticle { url: String },
    OpenInBrowser { url: String },
    Quit,
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub mode: Mode,

    // Browse
    /// Registry name of the section on screen.
    pub section: String,
    pub section_title: String,
    pub all_items: Vec<FeedItem>,
    /// Indices into `all_items` that pass the query, in listing order.
    pub filtered: Vec<usize>,
    pub query: String,
    /// Index into `filtered`.
    pub cursor: usize,
    pub viewport_start: usize,
    pub section_error: Option<FetchError>,

    // Tokens of in-flight work; completions must match to be applied.
    pub pending_section: Option<String>,
    pub pending_article: Option<String>,

    // Article
    pub article: ArticleState,
    pub scroll: usize,
    pub multi_column: bool,

    // Terminal and presentation
    pub width: usize,
    pub height: usize,
    pub palette: ColorPalette,
    pub debug: bool,
    pub timings: Timings,

    pub needs_redraw: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(palette: ColorPalette) -> Self {
        Self {
            mode: Mode::Browse,
            section: String::new(),
            section_title: String::new(),
            all_items: Vec::new(),
            filtered: Vec::new(),
            query: String::new(),
            cursor: 0,
            viewport_start: 0,
            section_error: None,
            pending_section: None,
            pending_article: None,
            article: ArticleState::Idle,
            scroll: 0,
            multi_column: false,
            width: layout::DEFAULT_WIDTH,
            height: layout::DEFAULT_HEIGHT,
            palette,
            debug: false,
            timings: Timings::default(),
            needs_redraw: true,
            should_quit: false,
        }
    }

    // ------------------------------------------------------------------------
    // Sections
    // ------------------------------------------------------------------------

    /// Records `name` as the pending section and returns the load to run.
    pub fn request_section(&mut self, name: &str) -> Effect {
        let name = name.trim().to_ascii_lowercase();
        tracing::debug!(section = %name, "Requesting section");
        self.pending_section = Some(name.clone());
        self.section_error = None;
        self.needs_redraw = true;
        Effect::LoadSection { section: name }
    }

    /// Steps through the registry from the most recently requested section.
    pub fn step_section(&mut self, step: isize) -> Effect {
        let from = self
            .pending_section
            .clone()
            .unwrap_or_else(|| self.section.clone());
        let next = sections::step(&from, step);
        self.request_section(next)
    }

    /// Applies a section load if `token` is still pending. Returns whether it was.
    pub fn apply_section(&mut self, token: &str, result: Result<Section, FetchError>) -> bool {
        if self.pending_section.as_deref() != Some(token) {
            tracing::debug!(token = %token, pending = ?self.pending_section, "Discarding stale section result");
            return false;
        }
        self.pending_section = None;
        self.needs_redraw = true;

        match result {
            Ok(section) => {
                tracing::debug!(section = %token, items = section.items.len(), "Section loaded");
                self.section = token.to_string();
                self.section_title = if section.title.trim().is_empty() {
                    token.to_string()
                } else {
                    section.title
                };
                self.all_items = section.items;
                self.section_error = None;
                self.cursor = 0;
                self.viewport_start = 0;
                self.apply_filter();
            }
            Err(error) => {
                tracing::warn!(section = %token, error = %error, "Section load failed");
                self.section_error = Some(error);
            }
        }
        true
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    pub fn push_query_char(&mut self, c: char) {
        if c == ' ' && self.query.is_empty() {
            return;
        }
        self.query.push(c);
        self.apply_filter();
    }

    pub fn pop_query_char(&mut self) {
        if self.query.pop().is_some() {
            self.apply_filter();
        }
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
        self.apply_filter();
    }

    /// Re-runs the filter and places the cursor.
    ///
    /// A digit-only query keeps every item and jumps to that 1-based position;
    /// an out-of-range number leaves the cursor where it is.
    pub fn apply_filter(&mut self) {
        self.filtered = search::filter_indices(&self.all_items, &self.query);
        if let Query::Jump(n) = Query::parse(&self.query) {
            if (1..=self.all_items.len()).contains(&n) {
                self.cursor = n - 1;
            }
        }
        self.needs_redraw = true;
        self.clamp_view();
    }

    pub fn selected_item(&self) -> Option<&FeedItem> {
        self.filtered
            .get(self.cursor)
            .and_then(|&idx| self.all_items.get(idx))
    }

    // ------------------------------------------------------------------------
    // Browse layout and cursor
    // ------------------------------------------------------------------------

    pub fn headline_layout(&self) -> HeadlineLayout {
        HeadlineLayout::new(layout::content_width(self.width), self.all_items.len())
    }

    /// Row height of every filtered item at the current width.
    pub fn row_heights(&self) -> Vec<usize> {
        let headlines = self.headline_layout();
        self.filtered
            .iter()
            .filter_map(|&idx| self.all_items.get(idx))
            .map(|item| headlines.row_height(item))
            .collect()
    }

    pub fn shows_section_dots(&self) -> bool {
        sections::position(&self.section).is_some()
    }

    pub fn list_window(&self) -> ListWindow {
        layout::list_window(
            &self.row_heights(),
            self.viewport_start,
            self.cursor,
            self.height,
            BROWSE_HELP_LINES,
            self.shows_section_dots(),
        )
    }

    /// Restores the cursor and viewport invariants after any change.
    pub fn clamp_view(&mut self) {
        self.cursor = if self.filtered.is_empty() {
            0
        } else {
            self.cursor.min(self.filtered.len() - 1)
        };
        if self.filtered.is_empty() {
            self.viewport_start = 0;
            return;
        }

        let window = self.list_window();
        self.viewport_start = window.start;

        debug_assert!(
            self.cursor < self.filtered.len(),
            "cursor {} out of bounds for {} items",
            self.cursor,
            self.filtered.len()
        );
        debug_assert!(
            self.viewport_start <= self.cursor && self.cursor < window.start + window.count,
            "cursor {} outside window {:?}",
            self.cursor,
            window
        );
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let last = self.filtered.len() as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, last) as usize;
        self.needs_redraw = true;
        self.clamp_view();
    }

    /// Moves by one viewport of rows.
    pub fn page(&mut self, direction: isize) {
        let page = self.list_window().count.max(1) as isize;
        self.move_cursor(page * direction.signum());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
        self.needs_redraw = true;
        self.clamp_view();
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.filtered.len().saturating_sub(1);
        self.needs_redraw = true;
        self.clamp_view();
    }

    // ------------------------------------------------------------------------
    // Article
    // ------------------------------------------------------------------------

    /// Enters the article view for the highlighted item.
    pub fn select(&mut self) -> Option<Effect> {
        let item = self.selected_item()?.clone();
        let url = item.link.clone();
        tracing::debug!(url = %url, "Opening article");

        self.mode = Mode::Article;
        self.pending_article = Some(url.clone());
        self.article = ArticleState::Loading { item };
        self.scroll = 0;
        self.needs_redraw = true;
        Some(Effect::FetchArticle { url })
    }

    /// Back to the listing; any in-flight fetch becomes stale.
    pub fn back(&mut self) {
        self.mode = Mode::Browse;
        self.pending_article = None;
        self.article = ArticleState::Idle;
        self.scroll = 0;
        self.needs_redraw = true;
        self.clamp_view();
    }

    /// Applies an article fetch if `token` is still pending. Returns whether it was.
    pub fn apply_article(
        &mut self,
        token: &str,
        result: Result<Article, FetchError>,
        elapsed: Duration,
    ) -> bool {
        if self.pending_article.as_deref() != Some(token) {
            tracing::debug!(token = %token, pending = ?self.pending_article, "Discarding stale article result");
            return false;
        }
        self.pending_article = None;
        self.scroll = 0;
        self.timings = Timings {
            fetch: Some(elapsed),
            render: None,
        };
        self.needs_redraw = true;

        self.article = match result {
            Ok(article) => {
                let started = Instant::now();
                let lines = reader::article_lines(&article, self.width, self.multi_column, &self.palette);
                self.timings.render = Some(started.elapsed());
                ArticleState::Ready { article, lines }
            }
            Err(error) => {
                tracing::debug!(url = %token, error = %error, "Article fetch failed");
                ArticleState::Failed { error }
            }
        };
        true
    }

    pub fn current_article(&self) -> Option<&Article> {
        match &self.article {
            ArticleState::Ready { article, .. } => Some(article),
            _ => None,
        }
    }

    /// Rebuilds the article lines for the current width and column mode.
    pub fn rerender_article(&mut self) {
        if let ArticleState::Ready { article, lines } = &mut self.article {
            let started = Instant::now();
            *lines = reader::article_lines(article, self.width, self.multi_column, &self.palette);
            self.timings.render = Some(started.elapsed());
        }
        self.clamp_scroll();
        self.needs_redraw = true;
    }

    pub fn toggle_columns(&mut self) {
        self.multi_column = !self.multi_column;
        tracing::debug!(multi_column = self.multi_column, "Toggled columns");
        self.rerender_article();
    }

    pub fn article_line_count(&self) -> usize {
        match &self.article {
            ArticleState::Ready { lines, .. } => lines.len(),
            _ => 0,
        }
    }

    pub fn article_view_height(&self) -> usize {
        layout::article_view_height(self.height, self.debug)
    }

    pub fn max_scroll(&self) -> usize {
        layout::max_scroll(self.article_line_count(), self.article_view_height())
    }

    pub fn clamp_scroll(&mut self) {
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let target = (self.scroll as isize + delta).max(0) as usize;
        self.scroll = target.min(self.max_scroll());
        self.needs_redraw = true;
    }

    pub fn scroll_page(&mut self, direction: isize) {
        let page = layout::article_page_size(self.article_view_height()) as isize;
        self.scroll_by(page * direction.signum());
    }

    pub fn scroll_home(&mut self) {
        self.scroll = 0;
        self.needs_redraw = true;
    }

    pub fn scroll_end(&mut self) {
        self.scroll = self.max_scroll();
        self.needs_redraw = true;
    }

    // ------------------------------------------------------------------------
    // Terminal
    // ------------------------------------------------------------------------

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.rerender_article();
        self.clamp_view();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeVariant;
    use pretty_assertions::assert_eq;

    fn item(title: &str) -> FeedItem {
        FeedItem::new(title, "", format!("https://example.com/{}", title.replace(' ', "-")))
    }

    fn app_with(titles: &[&str]) -> App {
        let mut app = App::new(ThemeVariant::Plain.palette());
        app.request_section("leaders");
        let section = Section {
            title: "Leaders".into(),
            items: titles.iter().map(|t| item(t)).collect(),
        };
        assert!(app.apply_section("leaders", Ok(section)));
        app
    }

    #[test]
    fn test_digit_query_jumps_without_filtering() {
        let mut app = app_with(&["a", "b", "c", "d"]);
        app.push_query_char('3');
        assert_eq!(app.filtered.len(), 4);
        assert_eq!(app.cursor, 2);

        app.push_query_char('0');
        assert_eq!(app.cursor, 2, "out of range leaves the cursor");
    }

    #[test]
    fn test_leading_space_is_ignored() {
        let mut app = app_with(&["a"]);
        app.push_query_char(' ');
        assert_eq!(app.query, "");
        app.push_query_char('a');
        app.push_query_char(' ');
        assert_eq!(app.query, "a ");
    }

    #[test]
    fn test_filter_clamps_cursor() {
        let mut app = app_with(&["alpha", "beta", "gamma"]);
        app.cursor_end();
        assert_eq!(app.cursor, 2);
        app.push_query_char('b');
        assert_eq!(app.filtered, vec![1]);
        assert_eq!(app.cursor, 0);
        assert_eq!(app.selected_item().map(|i| i.title.as_str()), Some("beta"));
    }

    #[test]
    fn test_empty_filter_keeps_cursor_zero() {
        let mut app = app_with(&["alpha"]);
        app.push_query_char('z');
        assert!(app.filtered.is_empty());
        assert_eq!(app.cursor, 0);
        assert_eq!(app.select(), None);
    }

    #[test]
    fn test_section_error_keeps_items() {
        let mut app = app_with(&["alpha"]);
        app.request_section("business");
        assert!(app.apply_section("business", Err(FetchError::transport("offline"))));
        assert_eq!(app.all_items.len(), 1);
        assert_eq!(app.section, "leaders");
        assert!(app.section_error.is_some());
    }

    #[test]
    fn test_article_result_sets_timings_and_scroll() {
        let mut app = app_with(&["alpha"]);
        let Some(Effect::FetchArticle { url }) = app.select() else {
            panic!("expected a fetch");
        };
        let article = Article {
            title: "Alpha".into(),
            content: "Body".into(),
            url: url.clone(),
            ..Default::default()
        };
        assert!(app.apply_article(&url, Ok(article), Duration::from_millis(20)));
        assert!(app.pending_article.is_none());
        assert_eq!(app.timings.fetch, Some(Duration::from_millis(20)));
        assert!(app.timings.render.is_some());
        assert!(matches!(app.article, ArticleState::Ready { .. }));
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut app = app_with(&["alpha"]);
        let Some(Effect::FetchArticle { url }) = app.select() else {
            panic!("expected a fetch");
        };
        let article = Article {
            title: "Alpha".into(),
            content: vec!["Paragraph."; 60].join("\n\n"),
            url: url.clone(),
            ..Default::default()
        };
        app.apply_article(&url, Ok(article), Duration::ZERO);
        app.scroll_end();
        let max = app.max_scroll();
        assert!(max > 0);
        app.scroll_by(10);
        assert_eq!(app.scroll, max);
        app.resize(100, 200);
        assert!(app.scroll <= app.max_scroll());
        app.scroll_by(-1000);
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn test_timings_display() {
        let timings = Timings {
            fetch: Some(Duration::from_millis(1500)),
            render: None,
        };
        assert_eq!(timings.to_string(), "fetch=1.5s render=-");
    }
}
