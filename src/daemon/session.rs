//! The daemon's one warm fetching session.

use crate::article::Article;
use crate::error::FetchError;
use crate::source::ArticleSource;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

struct SessionState {
    source: Option<Arc<dyn ArticleSource>>,
    fetches: u64,
}

/// Owns the expensive fetching resource for the daemon's lifetime.
///
/// The resource cannot run two fetches at once, so every call to
/// [`fetch`](Self::fetch) holds the session lock for its full duration.
/// Overlapping callers queue on the lock in arrival order.
pub struct FetchSession {
    state: Mutex<SessionState>,
    artifact_dir: PathBuf,
}

impl FetchSession {
    /// `artifact_dir` receives diagnostic dumps for debug fetches.
    pub fn new(source: Arc<dyn ArticleSource>, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(SessionState {
                source: Some(source),
                fetches: 0,
            }),
            artifact_dir: artifact_dir.into(),
        }
    }

    pub async fn fetch(&self, url: &str, debug: bool) -> Result<Article, FetchError> {
        let mut state = self.state.lock().await;
        let source = state
            .source
            .clone()
            .ok_or_else(|| FetchError::Transport("fetch session closed".to_string()))?;
        state.fetches += 1;

        let started = std::time::Instant::now();
        let result = source.article(url).await;
        tracing::debug!(
            url = %url,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Session fetch finished"
        );

        let mut article = result?;
        if debug {
            article.debug_artifact_path = self.write_artifact(&article).await;
        }
        Ok(article)
    }

    /// Number of fetches served so far.
    pub async fn fetch_count(&self) -> u64 {
        self.state.lock().await.fetches
    }

    /// Waits for any in-flight fetch, then releases the resource.
    ///
    /// Later fetches fail with a transport error.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if state.source.take().is_some() {
            tracing::info!(fetches = state.fetches, "Fetch session closed");
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.source.is_none()
    }

    async fn write_artifact(&self, article: &Article) -> Option<String> {
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let path = self.artifact_dir.join(format!("debug-{stamp}.json"));
        let write = async {
            tokio::fs::create_dir_all(&self.artifact_dir).await?;
            let bytes = serde_json::to_vec_pretty(article).map_err(std::io::Error::other)?;
            tokio::fs::write(&path, bytes).await
        };
        match write.await {
            Ok(()) => Some(path.display().to_string()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to write debug artifact");
                None
            }
        }
    }
}
