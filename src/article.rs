//! Immutable data produced by an [`ArticleSource`](crate::source::ArticleSource).
//!
//! A [`FeedItem`]'s `link` is its identity: it keys the article cache and is
//! the token that matches an asynchronous fetch result back to its request.

use crate::util::clean_inline;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in a section listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl FeedItem {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            link: link.into(),
            published_at: None,
        }
    }

    pub fn with_published(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    /// Title as a single sanitised line.
    pub fn clean_title(&self) -> String {
        clean_inline(&self.title)
    }

    /// Description as a single sanitised line.
    pub fn clean_description(&self) -> String {
        clean_inline(&self.description)
    }

    /// Text the search filter runs against: `title + " " + description`.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.clean_title(), self.clean_description())
    }

    /// Publication date as `Jan 2nd 2024`, or empty when unknown.
    pub fn formatted_date(&self) -> String {
        self.published_at.map(format_ordinal_date).unwrap_or_default()
    }

    /// Publication date as `02.01.24`, for narrow date columns.
    pub fn compact_date(&self) -> String {
        self.published_at
            .map(|at| at.format("%d.%m.%y").to_string())
            .unwrap_or_default()
    }
}

fn format_ordinal_date(at: DateTime<Utc>) -> String {
    let day = at.day();
    let suffix = match (day % 100, day % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    format!("{} {}{} {}", at.format("%b"), day, suffix, at.year())
}

/// A named grouping of feed items, as returned by a section load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub items: Vec<FeedItem>,
}

/// Fully fetched, displayable content for one [`FeedItem`].
///
/// `url` equals the requesting item's `link`. This is also the JSON shape used
/// on the daemon wire and inside cache files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub overtitle: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub date_line: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    pub url: String,
    /// Where a diagnostic dump of the raw page was written, in debug mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_artifact_path: Option<String>,
}

impl Article {
    /// True when the body holds nothing worth rendering.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Markdown rendition for piping elsewhere: heading, italic subtitle,
    /// dateline, then the body and link between rules.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        if !self.title.is_empty() {
            out.push_str(&format!("# {}\n\n", self.title));
        }
        if !self.subtitle.is_empty() {
            out.push_str(&format!("*{}*\n\n", self.subtitle));
        }
        if !self.date_line.is_empty() {
            out.push_str(&format!("{}\n\n", self.date_line));
        }
        out.push_str("---\n\n");
        out.push_str(self.content.trim_end());
        out.push_str("\n\n---\n");
        out.push_str(&format!("🔗 {}\n", self.url));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markdown_rendition() {
        let article = Article {
            title: "Chips".into(),
            subtitle: "A tale of two fabs".into(),
            content: "Body text.\n".into(),
            url: "https://example.com/chips".into(),
            ..Default::default()
        };
        assert_eq!(
            article.to_markdown(),
            "# Chips\n\n*A tale of two fabs*\n\n---\n\nBody text.\n\n---\n🔗 https://example.com/chips\n"
        );
    }

    #[test]
    fn test_ordinal_suffixes() {
        let at = |d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
        assert_eq!(format_ordinal_date(at(1)), "Jan 1st 2024");
        assert_eq!(format_ordinal_date(at(2)), "Jan 2nd 2024");
        assert_eq!(format_ordinal_date(at(3)), "Jan 3rd 2024");
        assert_eq!(format_ordinal_date(at(11)), "Jan 11th 2024");
        assert_eq!(format_ordinal_date(at(12)), "Jan 12th 2024");
        assert_eq!(format_ordinal_date(at(22)), "Jan 22nd 2024");
    }

    #[test]
    fn test_compact_date_and_missing_date() {
        let item = FeedItem::new("t", "d", "https://example.com/a")
            .with_published(Utc.with_ymd_and_hms(2024, 3, 7, 9, 0, 0).unwrap());
        assert_eq!(item.compact_date(), "07.03.24");
        assert_eq!(FeedItem::new("t", "d", "l").formatted_date(), "");
    }

    #[test]
    fn test_search_text_is_cleaned() {
        let item = FeedItem::new("  AI and\nChina ", "\tA long\x1b[1m read", "l");
        assert_eq!(item.search_text(), "AI and China A long read");
    }

    #[test]
    fn test_article_json_omits_empty_fields() {
        let article = Article {
            title: "Title".into(),
            content: "Body".into(),
            url: "https://example.com/a".into(),
            ..Article::default()
        };
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "Title", "content": "Body", "url": "https://example.com/a"})
        );
    }

    #[test]
    fn test_has_content() {
        let mut article = Article::default();
        assert!(!article.has_content());
        article.content = "  \n ".into();
        assert!(!article.has_content());
        article.content = "text".into();
        assert!(article.has_content());
    }
}
