//! Fuzzy filtering of section listings.
//!
//! A query is split into whitespace-separated tokens; an item matches when every
//! token is an in-order character subsequence of its lower-cased
//! `title + " " + description`. The empty query matches everything.

use crate::article::FeedItem;

/// What a browse query means once normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query<'a> {
    /// Blank after trimming: every item is shown.
    All,
    /// Digits only: a 1-based position in the full listing, not a filter.
    Jump(usize),
    /// Whitespace-separated fuzzy tokens.
    Fuzzy(&'a str),
}

impl<'a> Query<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::All;
        }
        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            // Absurdly long digit strings saturate and land out of range.
            return Self::Jump(trimmed.parse().unwrap_or(usize::MAX));
        }
        Self::Fuzzy(trimmed)
    }
}

/// True when every token of `query` is a subsequence of lower-cased `text`.
pub fn matches(text: &str, query: &str) -> bool {
    let text = text.to_lowercase();
    query
        .to_lowercase()
        .split_whitespace()
        .all(|token| is_subsequence(&text, token))
}

/// Single left-to-right scan: each token character must appear after the previous one.
fn is_subsequence(text: &str, token: &str) -> bool {
    let mut wanted = token.chars().peekable();
    for c in text.chars() {
        match wanted.peek() {
            Some(&w) if w == c => {
                wanted.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    wanted.peek().is_none()
}

/// Indices into `items` that survive `query`, in listing order.
///
/// Jump queries keep every item; moving the cursor is the caller's job.
pub fn filter_indices(items: &[FeedItem], query: &str) -> Vec<usize> {
    match Query::parse(query) {
        Query::All | Query::Jump(_) => (0..items.len()).collect(),
        Query::Fuzzy(q) => items
            .iter()
            .enumerate()
            .filter(|(_, item)| matches(&item.search_text(), q))
            .map(|(i, _)| i)
            .collect(),
    }
}
