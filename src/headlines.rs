//! Section listings printed without the interactive UI.
//!
//! `broadsheet headlines` fetches one section feed and prints it in one of
//! three shapes: a readable numbered list, tab-separated `title\turl` lines,
//! or a JSON array for scripts.

use crate::article::FeedItem;
use crate::search;
use crate::util::{display_width, ellipsize};
use crossterm::style::Stylize;
use serde::Serialize;

/// Narrowest title column before dates stop being right-aligned.
const MIN_TITLE_WIDTH: usize = 20;
const INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pretty,
    Plain,
    Json,
}

/// One entry of `--json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Headline {
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// `Jan 2nd 2024`, empty when the feed gave no date.
    pub date: String,
    /// RFC 2822 publication time, empty when unknown.
    pub pub_date: String,
    pub url: String,
    pub section: String,
}

impl Headline {
    pub fn from_item(item: &FeedItem, section: &str) -> Self {
        Self {
            title: item.clean_title(),
            description: item.clean_description(),
            date: item.formatted_date(),
            pub_date: item
                .published_at
                .map(|at| at.to_rfc2822())
                .unwrap_or_default(),
            url: item.link.clone(),
            section: section.to_string(),
        }
    }
}

/// Items whose title or description fuzzily match `query`, in feed order,
/// cut to `limit` (0 keeps everything). A blank query matches all items.
pub fn select<'a>(items: &'a [FeedItem], query: &str, limit: usize) -> Vec<&'a FeedItem> {
    let query = query.trim();
    let limit = if limit == 0 { usize::MAX } else { limit };
    items
        .iter()
        .filter(|item| query.is_empty() || search::matches(&item.search_text(), query))
        .take(limit)
        .collect()
}

/// Heading for the pretty listing.
pub fn heading(section_title: &str, section: &str, query: &str) -> String {
    let query = query.trim();
    if !query.is_empty() {
        return format!("Search: \"{query}\" in {section}");
    }
    match section_title.trim() {
        "" => section.to_string(),
        title => title.to_string(),
    }
}

/// A single-line JSON array.
pub fn to_json(items: &[&FeedItem], section: &str) -> serde_json::Result<String> {
    let headlines: Vec<Headline> = items
        .iter()
        .map(|item| Headline::from_item(item, section))
        .collect();
    serde_json::to_string(&headlines)
}

/// `title<TAB>url` per item.
pub fn to_plain(items: &[&FeedItem]) -> String {
    items
        .iter()
        .map(|item| format!("{}\t{}\n", item.clean_title(), item.link))
        .collect()
}

/// Numbered list with right-aligned dates, descriptions and links, laid out
/// for a terminal `width` columns wide.
pub fn to_pretty(items: &[&FeedItem], heading: &str, width: usize, styled: bool) -> String {
    let mut out = format!("{heading}\n\n");
    if items.is_empty() {
        out.push_str("No articles found.\n");
        return out;
    }

    for (i, item) in items.iter().enumerate() {
        let number = format!("{:2}. ", i + 1);
        let date = item.formatted_date();
        let title_width = width
            .saturating_sub(number.len() + display_width(&date) + 2)
            .max(MIN_TITLE_WIDTH);

        let mut title = item.clean_title();
        if display_width(&title) > title_width {
            title = ellipsize(&title, title_width);
        }
        let padding = " ".repeat(title_width.saturating_sub(display_width(&title)).max(1));

        if styled {
            out.push_str(&format!(
                "{number}{}{padding}{}\n",
                title.as_str().bold(),
                date.as_str().dim()
            ));
        } else {
            let line = format!("{number}{title}{padding}{date}");
            out.push_str(line.trim_end());
            out.push('\n');
        }

        let description = item.clean_description();
        if !description.is_empty() {
            let description_width = width.saturating_sub(INDENT.len()).max(MIN_TITLE_WIDTH);
            let description = if display_width(&description) > description_width {
                ellipsize(&description, description_width)
            } else {
                description
            };
            out.push_str(&format!("{INDENT}{description}\n"));
        }

        if styled {
            out.push_str(&format!("{INDENT}{}\n\n", item.link.as_str().dim()));
        } else {
            out.push_str(&format!("{INDENT}{}\n\n", item.link));
        }
    }
    out
}
