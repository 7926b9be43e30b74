//! Live source: section listings from RSS, article bodies through the reader proxy.

use super::reader_proxy::{parse_reader_output, read_limited_text, ContentError, ReaderProxy};
use super::{sections, ArticleSource, MAX_SECTION_ITEMS};
use crate::article::{Article, FeedItem, Section};
use crate::error::FetchError;
use lru::LruCache;
use reqwest::redirect::Policy;
use secrecy::SecretString;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_FEED_BASE: &str = "https://www.economist.com";

const FEED_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
/// Listings younger than this are served from memory.
const LISTING_TTL: Duration = Duration::from_secs(5 * 60);
const LISTING_CACHE_SLOTS: usize = 16;

const USER_AGENT: &str = concat!("broadsheet/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Default)]
pub struct HttpSourceOptions {
    /// Site root; sections live at `<base>/<path>/rss.xml`.
    pub feed_base_url: Option<String>,
    /// Reader proxy base; defaults to the public proxy.
    pub reader_base_url: Option<String>,
    pub api_key: Option<SecretString>,
}

pub struct HttpSource {
    client: reqwest::Client,
    feed_base: String,
    reader: ReaderProxy,
    listings: Mutex<LruCache<String, (Instant, Section)>>,
}

/// At most three hops, and no loops.
fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }
        if attempt
            .previous()
            .iter()
            .any(|prev| prev.as_str() == attempt.url().as_str())
        {
            return attempt.error("Redirect loop detected");
        }
        attempt.follow()
    })
}

impl HttpSource {
    pub fn new(options: HttpSourceOptions) -> Result<Self, ContentError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(redirect_policy())
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(30))
            .build()?;

        let reader = ReaderProxy::new(
            client.clone(),
            options.reader_base_url.as_deref(),
            options.api_key,
        )?;
        let feed_base = options
            .feed_base_url
            .as_deref()
            .unwrap_or(DEFAULT_FEED_BASE)
            .trim_end_matches('/')
            .to_string();
        let slots = NonZeroUsize::new(LISTING_CACHE_SLOTS).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            client,
            feed_base,
            reader,
            listings: Mutex::new(LruCache::new(slots)),
        })
    }

    fn cached_listing(&self, path: &str) -> Option<Section> {
        let mut listings = self.listings.lock().ok()?;
        match listings.get(path) {
            Some((at, section)) if at.elapsed() < LISTING_TTL => Some(section.clone()),
            Some(_) => {
                listings.pop(path);
                None
            }
            None => None,
        }
    }

    fn remember_listing(&self, path: String, section: &Section) {
        if let Ok(mut listings) = self.listings.lock() {
            listings.put(path, (Instant::now(), section.clone()));
        }
    }

    async fn fetch_feed(&self, url: &str) -> Result<String, ContentError> {
        let response = tokio::time::timeout(FEED_TIMEOUT, self.client.get(url).send())
            .await
            .map_err(|_| ContentError::Timeout)??;
        if !response.status().is_success() {
            return Err(ContentError::HttpStatus(response.status().as_u16()));
        }
        read_limited_text(response, MAX_FEED_SIZE).await
    }
}

/// Parses an RSS/Atom document into a titled listing capped at [`MAX_SECTION_ITEMS`].
pub(crate) fn parse_listing(bytes: &[u8], fallback_title: &str) -> Result<Section, FetchError> {
    let feed = feed_rs::parser::parse(bytes)
        .map_err(|e| FetchError::Transport(format!("invalid feed: {e}")))?;

    let title = feed
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback_title.to_string());

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry.links.first().map(|l| l.href.clone())?;
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());
            let description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();
            let mut item = FeedItem::new(title, description, link);
            if let Some(at) = entry.published.or(entry.updated) {
                item = item.with_published(at);
            }
            Some(item)
        })
        .take(MAX_SECTION_ITEMS)
        .collect();

    Ok(Section { title, items })
}

/// Maps proxy failures onto the user-facing taxonomy.
fn classify(err: ContentError) -> FetchError {
    match err {
        ContentError::HttpStatus(402) => FetchError::Paywall,
        ContentError::HttpStatus(401 | 403) => {
            FetchError::User("not authenticated - set api_key in config.toml".to_string())
        }
        ContentError::InvalidUrl => FetchError::User("refusing to fetch that link".to_string()),
        other => FetchError::transport(other),
    }
}

#[async_trait::async_trait]
impl ArticleSource for HttpSource {
    async fn section(&self, name: &str) -> Result<Section, FetchError> {
        let path = sections::resolve(name);
        if let Some(section) = self.cached_listing(&path) {
            tracing::debug!(section = %path, "Serving section listing from memory");
            return Ok(section);
        }

        let url = format!("{}/{}/rss.xml", self.feed_base, path);
        tracing::debug!(url = %url, "Fetching section feed");
        let body = self.fetch_feed(&url).await.map_err(|e| match e {
            ContentError::HttpStatus(404) => FetchError::User(format!("unknown section: {name}")),
            other => FetchError::transport(other),
        })?;

        let section = parse_listing(body.as_bytes(), name)?;
        self.remember_listing(path, &section);
        Ok(section)
    }

    async fn article(&self, url: &str) -> Result<Article, FetchError> {
        let raw = self.reader.fetch_markdown(url).await.map_err(classify)?;
        Ok(parse_reader_output(url, &raw))
    }
}
