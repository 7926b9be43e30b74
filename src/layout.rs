//! Responsive layout: widths, line budgets and column plans.
//!
//! Everything here is a pure function of terminal size and content. The same
//! inputs always produce the same layout, so a frame can be re-derived at any
//! time instead of being cached alongside the state.

use crate::article::FeedItem;
use crate::util::{is_blank, limit_lines, wrap_lines};

/// Narrowest comfortable reading measure.
pub const MIN_READABLE_WIDTH: usize = 45;
/// Widest comfortable reading measure.
pub const MAX_READABLE_WIDTH: usize = 72;
/// Columns kept free around the reading measure.
pub const OUTER_MARGINS: usize = 8;

/// Terminal size assumed until the first real measurement.
pub const DEFAULT_WIDTH: usize = 100;
pub const DEFAULT_HEIGHT: usize = 24;

pub const BROWSE_TITLE_LINES: usize = 2;
pub const BROWSE_SUBTITLE_LINES: usize = 2;
pub const BROWSE_ITEM_GAP: usize = 1;
/// Blank line, section title, accent rule, search line.
pub const BROWSE_HEADER_LINES: usize = 4;
pub const BROWSE_FOOTER_PADDING: usize = 1;
pub const BROWSE_MIN_VISIBLE_LINES: usize = 5;

pub const ARTICLE_FOOTER_LINES: usize = 4;
pub const ARTICLE_FOOTER_PADDING: usize = 1;
pub const ARTICLE_MIN_VISIBLE_LINES: usize = 5;

pub const COLUMN_GAP: usize = 4;
pub const MIN_COLUMN_WIDTH: usize = 32;
/// Fewer lines per column than this and the body stays in fewer columns.
pub const MIN_COLUMN_HEIGHT: usize = 12;
pub const BODY_INDENT: usize = 2;

pub const DEFAULT_DATE_WIDTH: usize = 14;
pub const COMPACT_DATE_WIDTH: usize = 9;
pub const MIN_TITLE_WIDTH: usize = 30;

/// Reading measure for a terminal `term_width` columns wide.
///
/// `term_width - OUTER_MARGINS` clamped into the readable range; a terminal
/// narrower than the minimum gets its full width.
pub fn content_width(term_width: usize) -> usize {
    if term_width == 0 {
        return MAX_READABLE_WIDTH;
    }
    if term_width < MIN_READABLE_WIDTH {
        return term_width;
    }
    term_width
        .saturating_sub(OUTER_MARGINS)
        .clamp(MIN_READABLE_WIDTH, MAX_READABLE_WIDTH)
}

/// Left margin that centres a block of `width` columns.
pub fn centre_offset(term_width: usize, width: usize) -> usize {
    term_width.saturating_sub(width) / 2
}

/// Column split of one headline row: `NN. title........ date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlineLayout {
    pub number_width: usize,
    pub prefix_width: usize,
    pub title_width: usize,
    pub date_width: usize,
    pub compact_date: bool,
}

impl HeadlineLayout {
    /// Layout for a listing of `total` items inside `content_width` columns.
    pub fn new(content_width: usize, total: usize) -> Self {
        let number_width = total.max(1).to_string().len();
        // "NN. "
        let prefix_width = number_width + 2;

        let full_title = content_width.saturating_sub(prefix_width + DEFAULT_DATE_WIDTH);
        let (date_width, compact_date) = if full_title >= MIN_TITLE_WIDTH {
            (DEFAULT_DATE_WIDTH, false)
        } else {
            (COMPACT_DATE_WIDTH, true)
        };

        let room = content_width.saturating_sub(prefix_width);
        let title_width = room
            .saturating_sub(date_width)
            .max(MIN_TITLE_WIDTH.min(room))
            .max(1);

        Self {
            number_width,
            prefix_width,
            title_width,
            date_width,
            compact_date,
        }
    }

    /// `" 7. "` style prefix for the 1-based position `n`.
    pub fn number(&self, n: usize) -> String {
        format!("{:>width$}. ", n, width = self.number_width)
    }

    /// Title lines: wrapped, at most two, the last ellipsised when cut.
    pub fn title_lines(&self, item: &FeedItem) -> Vec<String> {
        let lines = limit_lines(
            wrap_lines(&item.clean_title(), self.title_width),
            BROWSE_TITLE_LINES,
            self.title_width,
        );
        if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        }
    }

    /// Description lines: wrapped to the title width, at most two.
    pub fn subtitle_lines(&self, item: &FeedItem) -> Vec<String> {
        limit_lines(
            wrap_lines(&item.clean_description(), self.title_width),
            BROWSE_SUBTITLE_LINES,
            self.title_width,
        )
    }

    /// Screen lines one item occupies, including the gap after it.
    pub fn row_height(&self, item: &FeedItem) -> usize {
        self.title_lines(item).len() + self.subtitle_lines(item).len() + BROWSE_ITEM_GAP
    }
}

/// Lines the browse footer takes: blank and rule, help lines, then the
/// optional position and section-dot lines.
pub fn browse_footer_lines(help_lines: usize, show_position: bool, show_section_dots: bool) -> usize {
    2 + help_lines + usize::from(show_position) + usize::from(show_section_dots)
}

/// Lines left for list rows once header and footer are reserved.
pub fn browse_list_budget(term_height: usize, footer_lines: usize) -> usize {
    term_height
        .saturating_sub(BROWSE_HEADER_LINES + footer_lines + BROWSE_FOOTER_PADDING)
        .max(BROWSE_MIN_VISIBLE_LINES)
}

/// How many rows from `start` fit in `budget` lines.
///
/// Greedy: accumulate heights until the next row would overflow. At least one
/// row is accepted even if it alone is taller than the budget.
pub fn visible_count(heights: &[usize], start: usize, budget: usize) -> usize {
    let mut used = 0;
    let mut count = 0;
    for &h in heights.iter().skip(start) {
        if count > 0 && used + h > budget {
            break;
        }
        used += h;
        count += 1;
    }
    count
}

/// Smallest viewport start at or after `anchor` (moved back to `cursor` when
/// the cursor is above it) whose greedy window contains `cursor`.
pub fn scroll_to_cursor(heights: &[usize], anchor: usize, cursor: usize, budget: usize) -> usize {
    if heights.is_empty() {
        return 0;
    }
    let cursor = cursor.min(heights.len() - 1);
    let mut start = anchor.min(cursor);
    while cursor >= start + visible_count(heights, start, budget) {
        start += 1;
    }
    start
}

/// The visible slice of a listing, plus whether the position line is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListWindow {
    pub start: usize,
    pub count: usize,
    pub show_position: bool,
}

/// Resolves the browse window for the given row heights.
///
/// The position line appears only when some rows do not fit, and taking a
/// line for it can shrink the window, so the fit is checked first without it.
pub fn list_window(
    heights: &[usize],
    anchor: usize,
    cursor: usize,
    term_height: usize,
    help_lines: usize,
    show_section_dots: bool,
) -> ListWindow {
    let budget = browse_list_budget(
        term_height,
        browse_footer_lines(help_lines, false, show_section_dots),
    );
    let all_fit = visible_count(heights, 0, budget) == heights.len();

    let (budget, show_position) = if all_fit {
        (budget, false)
    } else {
        let footer = browse_footer_lines(help_lines, true, show_section_dots);
        (browse_list_budget(term_height, footer), true)
    };

    let start = if show_position {
        scroll_to_cursor(heights, anchor, cursor, budget)
    } else {
        0
    };
    ListWindow {
        start,
        count: visible_count(heights, start, budget),
        show_position,
    }
}

/// Article lines visible above the footer.
pub fn article_view_height(term_height: usize, debug: bool) -> usize {
    let footer = ARTICLE_FOOTER_LINES + usize::from(debug);
    term_height
        .saturating_sub(footer + ARTICLE_FOOTER_PADDING)
        .max(ARTICLE_MIN_VISIBLE_LINES)
}

/// Lines moved by page up/down.
pub fn article_page_size(view_height: usize) -> usize {
    view_height.saturating_sub(2).max(1)
}

pub fn max_scroll(total_lines: usize, view_height: usize) -> usize {
    total_lines.saturating_sub(view_height)
}

/// Where and how wide the article is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleLayout {
    /// Left edge of the block on screen.
    pub offset: usize,
    /// Width of the block after the body indent, used for rules.
    pub content_width: usize,
    pub indent: usize,
    pub multi_column: bool,
}

impl ArticleLayout {
    /// Single column centred at the reading measure, or the full terminal
    /// width when columns are enabled.
    pub fn new(term_width: usize, multi_column: bool) -> Self {
        let term_width = if term_width == 0 { DEFAULT_WIDTH } else { term_width };
        let (offset, mut width) = if multi_column {
            (0, term_width)
        } else {
            let width = content_width(term_width);
            (centre_offset(term_width, width), width)
        };

        let mut indent = 0;
        if width > BODY_INDENT {
            indent = BODY_INDENT;
            width -= BODY_INDENT;
        }

        Self {
            offset,
            content_width: width,
            indent,
            multi_column,
        }
    }

    /// Width header text wraps to.
    pub fn header_wrap_width(&self) -> usize {
        self.content_width
    }
}

/// Column count and width for an article body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnPlan {
    pub columns: usize,
    pub column_width: usize,
}

impl ColumnPlan {
    pub fn single(width: usize) -> Self {
        Self {
            columns: 1,
            column_width: width,
        }
    }
}

/// Most columns of at least [`MIN_COLUMN_WIDTH`] that fit `width`.
pub fn max_columns(width: usize) -> usize {
    // n * min + (n - 1) * gap <= width  <=>  n <= (width + gap) / (min + gap)
    ((width + COLUMN_GAP) / (MIN_COLUMN_WIDTH + COLUMN_GAP)).max(1)
}

/// Width of each of `columns` columns sharing `width`.
pub fn column_width(width: usize, columns: usize) -> usize {
    let columns = columns.max(1);
    width.saturating_sub((columns - 1) * COLUMN_GAP) / columns
}

/// Picks the column count for a body of text.
///
/// Starts from [`max_columns`] and drops a column while each would hold fewer
/// than [`MIN_COLUMN_HEIGHT`] lines. `wrapped_lines(w)` reports how many lines
/// the body wraps to at width `w`.
pub fn plan_columns(width: usize, wrapped_lines: impl Fn(usize) -> usize) -> ColumnPlan {
    let mut columns = max_columns(width);
    while columns > 1 {
        let col_width = column_width(width, columns);
        let per_column = wrapped_lines(col_width).div_ceil(columns);
        if per_column >= MIN_COLUMN_HEIGHT {
            return ColumnPlan {
                columns,
                column_width: col_width,
            };
        }
        columns -= 1;
    }
    ColumnPlan::single(width)
}

/// Range of `lines` left after dropping blank lines at either end.
pub fn trim_blank_ends<T: AsRef<str>>(lines: &[T]) -> std::ops::Range<usize> {
    let first = lines.iter().position(|l| !is_blank(l.as_ref()));
    let last = lines.iter().rposition(|l| !is_blank(l.as_ref()));
    match (first, last) {
        (Some(first), Some(last)) => first..last + 1,
        _ => 0..0,
    }
}

/// Line indices per screen row when `len` lines are cut into `columns`
/// contiguous runs of equal (ceiling-divided) size and read row by row.
pub fn column_grid(len: usize, columns: usize) -> Vec<Vec<usize>> {
    let columns = columns.max(1);
    let rows = len.div_ceil(columns);
    (0..rows)
        .map(|row| {
            (0..columns)
                .map(|col| col * rows + row)
                .filter(|&idx| idx < len)
                .collect()
        })
        .collect()
}

/// Percentage of the article seen once `end` lines are on screen, 1..=99.
pub fn scroll_percent(end: usize, total: usize) -> usize {
    if total == 0 {
        return 1;
    }
    let pct = (end as f64 / total as f64 * 100.0).round() as usize;
    pct.clamp(1, 99)
}
