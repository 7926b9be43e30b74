//! Integration tests for the article cache lifecycle: round trip, expiry,
//! purge, and the orchestrator serving from cache.
//!
//! Each test uses its own temporary directory.

use broadsheet::article::{Article, Section};
use broadsheet::cache::{cache_ttl, ArticleCache};
use broadsheet::error::FetchError;
use broadsheet::fetch::FetchOrchestrator;
use broadsheet::source::ArticleSource;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn article(url: &str) -> Article {
    Article {
        overtitle: "Finance | Markets".to_string(),
        title: "Bond yields".to_string(),
        subtitle: "Why they matter".to_string(),
        date_line: "Jan 2nd 2024".to_string(),
        content: "Yields rose.\n\nThen they fell.".to_string(),
        url: url.to_string(),
        debug_artifact_path: None,
    }
}

fn entry_count(cache: &ArticleCache) -> usize {
    std::fs::read_dir(cache.dir())
        .map(|entries| entries.flatten().count())
        .unwrap_or(0)
}

// ============================================================================
// Round trip and expiry
// ============================================================================

#[test]
fn test_save_then_load_returns_identical_article() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArticleCache::new(dir.path().join("cache"));
    let original = article("https://example.com/bonds");

    cache.save(&original).unwrap();

    assert_eq!(cache.load("https://example.com/bonds"), Some(original));
    assert_eq!(cache.load("https://example.com/other"), None);
}

#[test]
fn test_expired_entry_is_a_miss_and_removed() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArticleCache::new(dir.path());
    let url = "https://example.com/old";
    let saved_at = Utc::now() - cache_ttl() * 2;

    cache.save_at(&article(url), saved_at).unwrap();
    assert!(cache.entry_path(url).exists());

    assert_eq!(cache.load(url), None);
    assert!(!cache.entry_path(url).exists());
}

#[test]
fn test_fresh_entry_survives_until_ttl() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArticleCache::new(dir.path());
    let url = "https://example.com/fresh";
    let saved_at = Utc::now();

    cache.save_at(&article(url), saved_at).unwrap();

    let almost = saved_at + cache_ttl() - Duration::seconds(1);
    assert!(cache.load_at(url, almost).is_some());
    let after = saved_at + cache_ttl() + Duration::seconds(1);
    assert!(cache.load_at(url, after).is_none());
}

#[test]
fn test_resave_replaces_entry() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArticleCache::new(dir.path());
    let url = "https://example.com/edit";

    cache.save(&article(url)).unwrap();
    let mut updated = article(url);
    updated.title = "Bond yields, revised".to_string();
    cache.save(&updated).unwrap();

    assert_eq!(cache.load(url).map(|a| a.title), Some(updated.title));
    assert_eq!(entry_count(&cache), 1);
}

// ============================================================================
// Purge
// ============================================================================

#[test]
fn test_purge_removes_only_expired_and_corrupt_entries() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArticleCache::new(dir.path());
    let now = Utc::now();

    cache.save_at(&article("https://example.com/keep"), now).unwrap();
    cache
        .save_at(&article("https://example.com/stale-1"), now - Duration::hours(2))
        .unwrap();
    cache
        .save_at(&article("https://example.com/stale-2"), now - Duration::days(3))
        .unwrap();
    std::fs::write(cache.entry_path("https://example.com/garbage"), b"{not json").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"left alone").unwrap();

    assert_eq!(cache.purge_expired_at(now), 3);
    assert!(cache.load_at("https://example.com/keep", now).is_some());
    assert!(dir.path().join("notes.txt").exists());
    assert_eq!(cache.purge_expired_at(now), 0);
}

#[test]
fn test_purge_of_missing_directory_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArticleCache::new(dir.path().join("never-created"));
    assert_eq!(cache.purge_expired(), 0);
}

// ============================================================================
// Orchestrator and cache together
// ============================================================================

struct Counting {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ArticleSource for Counting {
    async fn section(&self, _name: &str) -> Result<Section, FetchError> {
        Ok(Section::default())
    }

    async fn article(&self, url: &str) -> Result<Article, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(article(url))
    }
}

#[tokio::test]
async fn test_second_fetch_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(Counting {
        calls: AtomicUsize::new(0),
    });
    let orchestrator =
        FetchOrchestrator::new(source.clone()).with_cache(ArticleCache::new(dir.path()));

    let first = orchestrator.fetch_article("https://example.com/bonds").await.unwrap();
    let second = orchestrator.fetch_article("https://example.com/bonds").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_expired_entries_are_swept_on_first_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArticleCache::new(dir.path());
    cache
        .save_at(&article("https://example.com/ancient"), Utc::now() - Duration::days(1))
        .unwrap();
    let source = Arc::new(Counting {
        calls: AtomicUsize::new(0),
    });
    let orchestrator = FetchOrchestrator::new(source).with_cache(cache.clone());

    orchestrator.fetch_article("https://example.com/new").await.unwrap();

    assert!(!cache.entry_path("https://example.com/ancient").exists());
    assert!(cache.entry_path("https://example.com/new").exists());
}
