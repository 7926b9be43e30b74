//! Client-side article fetch policy.
//!
//! [`FetchOrchestrator::fetch_article`] is the one entry point the rest of the
//! crate uses to obtain an article. In order it tries:
//!
//! 1. the article cache (skipped in debug mode)
//! 2. the fetch daemon, starting it and retrying once if nothing answers
//! 3. the source directly
//!
//! A daemon that is missing, refusing or silent is a path choice, never an
//! error the caller sees. Errors the daemon does report are returned as-is.

use crate::article::Article;
use crate::cache::ArticleCache;
use crate::daemon::{DaemonClient, DaemonLauncher};
use crate::error::FetchError;
use crate::source::ArticleSource;
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

/// Budget for one fetch through the daemon.
pub const DAEMON_FETCH_TIMEOUT: Duration = Duration::from_secs(45);
/// How long to wait for a freshly started daemon.
pub const READY_WINDOW: Duration = Duration::from_secs(2);
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Bypass the cache and ask the session for a diagnostic artifact.
    pub debug: bool,
}

struct DaemonRoute {
    client: DaemonClient,
    launcher: Option<Arc<dyn DaemonLauncher>>,
}

pub struct FetchOrchestrator {
    cache: Option<ArticleCache>,
    daemon: Option<DaemonRoute>,
    direct: Arc<dyn ArticleSource>,
    options: FetchOptions,
    purge_once: Once,
    fetch_timeout: Duration,
    ready_window: Duration,
    ready_interval: Duration,
}

impl FetchOrchestrator {
    /// Orchestrator that fetches straight from `direct`, with no cache or daemon.
    pub fn new(direct: Arc<dyn ArticleSource>) -> Self {
        Self {
            cache: None,
            daemon: None,
            direct,
            options: FetchOptions::default(),
            purge_once: Once::new(),
            fetch_timeout: DAEMON_FETCH_TIMEOUT,
            ready_window: READY_WINDOW,
            ready_interval: READY_POLL_INTERVAL,
        }
    }

    pub fn with_cache(mut self, cache: ArticleCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Routes fetches through the daemon; `launcher` starts one when none answers.
    pub fn with_daemon(
        mut self,
        client: DaemonClient,
        launcher: Option<Arc<dyn DaemonLauncher>>,
    ) -> Self {
        self.daemon = Some(DaemonRoute { client, launcher });
        self
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Overrides the daemon fetch timeout and readiness polling.
    pub fn with_timeouts(mut self, fetch: Duration, ready_window: Duration, interval: Duration) -> Self {
        self.fetch_timeout = fetch;
        self.ready_window = ready_window;
        self.ready_interval = interval;
        self
    }

    pub async fn fetch_article(&self, url: &str) -> Result<Article, FetchError> {
        tracing::debug!(url = %url, debug = self.options.debug, "Fetching article");

        if !self.options.debug {
            if let Some(cache) = &self.cache {
                self.purge_once.call_once(|| {
                    cache.purge_expired();
                });
                if let Some(article) = cache.load(url) {
                    tracing::debug!(url = %url, "Cache hit");
                    return validate(article, url);
                }
            }
        }

        let article = match self.fetch_via_daemon(url).await {
            Ok(article) => article,
            Err(FetchError::NotRunning) => {
                tracing::debug!(url = %url, "Daemon unavailable, fetching directly");
                self.direct.article(url).await?
            }
            Err(e) => return Err(e),
        };

        let article = validate(article, url)?;
        self.store(&article);
        Ok(article)
    }

    async fn fetch_via_daemon(&self, url: &str) -> Result<Article, FetchError> {
        let Some(route) = &self.daemon else {
            return Err(FetchError::NotRunning);
        };
        let debug = self.options.debug;
        let started = Instant::now();

        match route.client.fetch(url, debug, self.fetch_timeout).await {
            Err(FetchError::NotRunning) => {}
            other => {
                tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Daemon replied");
                return other;
            }
        }

        let Some(launcher) = &route.launcher else {
            return Err(FetchError::NotRunning);
        };
        tracing::debug!("Daemon not running, starting it in the background");
        if let Err(e) = launcher.launch() {
            tracing::warn!(error = %e, "Failed to start fetch daemon");
            return Err(FetchError::NotRunning);
        }

        if !route
            .client
            .wait_until_ready(self.ready_window, self.ready_interval)
            .await
        {
            tracing::debug!("Daemon not ready after wait");
            return Err(FetchError::NotRunning);
        }

        tracing::debug!("Daemon ready, retrying fetch");
        route.client.fetch(url, debug, self.fetch_timeout).await
    }

    fn store(&self, article: &Article) {
        if self.options.debug {
            return;
        }
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save(article) {
                tracing::warn!(url = %article.url, error = %e, "Cache write failed");
            }
        }
    }
}

/// Empty bodies become a content-missing error. `url` is always the link that
/// was asked for, never a canonical form the source reported, so cache
/// entries are keyed on what later lookups use.
fn validate(mut article: Article, url: &str) -> Result<Article, FetchError> {
    if !article.has_content() {
        return Err(FetchError::content_missing());
    }
    if article.url != url {
        tracing::debug!(requested = %url, reported = %article.url, "Keeping requested URL");
        article.url = url.to_string();
    }
    Ok(article)
}
