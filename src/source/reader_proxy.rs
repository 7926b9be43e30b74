use crate::article::Article;
use crate::util::validate_article_url;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_READER_BASE: &str = "https://r.jina.ai";

const MAX_CONTENT_SIZE: usize = 5 * 1024 * 1024; // 5MB
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_RETRIES: u32 = 3;

/// CSS selectors for the article body, most specific first.
const TARGET_SELECTORS: &str =
    "article, .article__body, .entry-content, .post-content, main .content, main";

/// Below this many bytes the selector probably missed and we retry without it.
const MIN_CONTENT_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Request timed out after 20s")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error("Invalid article URL")]
    InvalidUrl,
    #[error("Insecure reader base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
}

impl ContentError {
    /// Transient failures worth another attempt.
    fn is_retryable(&self) -> bool {
        match self {
            ContentError::Timeout | ContentError::Network(_) => true,
            ContentError::HttpStatus(status) => *status >= 500 || *status == 429,
            ContentError::ResponseTooLarge(_)
            | ContentError::InvalidUtf8
            | ContentError::InvalidUrl
            | ContentError::InsecureBaseUrl => false,
        }
    }
}

/// Client for a reader proxy that turns an article page into markdown.
///
/// Requests go to `<base>/<article url>`. The API key, when configured, is only
/// attached for the official proxy host so a custom base never sees it.
#[derive(Clone)]
pub(crate) struct ReaderProxy {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    retry_base: Duration,
}

impl ReaderProxy {
    pub(crate) fn new(
        client: reqwest::Client,
        base_url: Option<&str>,
        api_key: Option<SecretString>,
    ) -> Result<Self, ContentError> {
        let base = base_url
            .unwrap_or(DEFAULT_READER_BASE)
            .trim_end_matches('/')
            .to_string();

        if !base.starts_with("https://") {
            let is_localhost =
                base.starts_with("http://127.0.0.1") || base.starts_with("http://localhost");
            if !is_localhost {
                tracing::error!(base_url = %base, "Rejecting non-HTTPS reader base URL");
                return Err(ContentError::InsecureBaseUrl);
            }
            tracing::warn!(base_url = %base, "Using non-HTTPS reader base URL (localhost only)");
        }

        Ok(Self {
            client,
            base_url: base,
            api_key,
            retry_base: Duration::from_secs(1),
        })
    }

    #[cfg(test)]
    fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    fn is_official(&self) -> bool {
        self.base_url == DEFAULT_READER_BASE
    }

    /// Fetches the markdown rendition of `url`.
    pub(crate) async fn fetch_markdown(&self, url: &str) -> Result<String, ContentError> {
        let parsed = validate_article_url(url).map_err(|_| ContentError::InvalidUrl)?;
        let proxied = format!("{}/{}", self.base_url, parsed.as_str());

        let content = self.fetch_with_retry(&proxied, true).await?;
        if content.len() >= MIN_CONTENT_LEN {
            return Ok(strip_boilerplate(&content));
        }

        tracing::debug!(
            content_len = content.len(),
            "Target selector returned minimal content, retrying without selector"
        );
        let content = self.fetch_with_retry(&proxied, false).await?;
        Ok(strip_boilerplate(&content))
    }

    /// Exponential backoff on transient errors: base, 2×base, 4×base.
    async fn fetch_with_retry(&self, proxied: &str, use_selector: bool) -> Result<String, ContentError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(proxied, use_selector).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    let delay = self.retry_base * (1u32 << attempt);
                    tracing::debug!(
                        error = %e,
                        retry = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying reader fetch after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, proxied: &str, use_selector: bool) -> Result<String, ContentError> {
        let mut request = self.client.get(proxied);
        if use_selector {
            request = request.header("X-Target-Selector", TARGET_SELECTORS);
        }
        if let Some(key) = &self.api_key {
            if self.is_official() {
                request = request.header("Authorization", format!("Bearer {}", key.expose_secret()));
            } else {
                tracing::debug!("Skipping API key for custom reader base URL");
            }
        }

        let response = tokio::time::timeout(REQUEST_TIMEOUT, request.send())
            .await
            .map_err(|_| ContentError::Timeout)??;

        if !response.status().is_success() {
            return Err(ContentError::HttpStatus(response.status().as_u16()));
        }

        read_limited_text(response, MAX_CONTENT_SIZE).await
    }
}

/// Splits the proxy's metadata preamble from the markdown body.
///
/// The proxy answers with `Title:`, `URL Source:` and `Published Time:` lines,
/// then `Markdown Content:` followed by the body. Output without a preamble is
/// treated as all body.
pub(crate) fn parse_reader_output(url: &str, raw: &str) -> Article {
    let mut article = Article {
        url: url.to_string(),
        ..Article::default()
    };

    let Some(marker) = raw.find("Markdown Content:") else {
        article.content = raw.trim().to_string();
        return article;
    };

    for line in raw[..marker].lines() {
        if let Some(title) = line.strip_prefix("Title:") {
            article.title = title.trim().to_string();
        } else if let Some(published) = line.strip_prefix("Published Time:") {
            article.date_line = format_published(published.trim());
        }
    }

    let body = raw[marker + "Markdown Content:".len()..].trim();
    let (subtitle, body) = split_subtitle(body, &article.title);
    article.subtitle = subtitle;
    article.content = body.to_string();
    article
}

fn format_published(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .or_else(|_| chrono::DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.format("%b %-d %Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Pulls a leading title heading and the standfirst out of the body.
fn split_subtitle<'a>(body: &'a str, title: &str) -> (String, &'a str) {
    let mut rest = body;
    if let Some(first) = rest.lines().next() {
        let heading = first.trim_start_matches('#').trim();
        if first.starts_with('#') && (title.is_empty() || heading == title) {
            rest = rest[first.len()..].trim_start();
        }
    }
    match rest.lines().next() {
        Some(line) if line.starts_with("## ") => {
            let subtitle = line.trim_start_matches('#').trim().to_string();
            (subtitle, rest[line.len()..].trim_start())
        }
        _ => (String::new(), rest),
    }
}

/// Drops navigation and comment scaffolding the proxy leaves in.
fn strip_boilerplate(content: &str) -> String {
    content
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !(trimmed.starts_with("[Skip to content]")
                || trimmed == "Menu"
                || trimmed == "Loading Comments..."
                || trimmed == "Write a Comment..."
                || trimmed.starts_with("Email (Required)"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) async fn read_limited_text(response: reqwest::Response, limit: usize) -> Result<String, ContentError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ContentError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ContentError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| ContentError::InvalidUtf8)
}
