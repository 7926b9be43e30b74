//! Runs the effects the reducer returns.
//!
//! Each load is its own task. The only way a task touches UI state is by
//! sending one completion event back on the channel.

use super::helpers::catch_task_panic;
use crate::app::{AppEvent, Effect};
use crate::fetch::FetchOrchestrator;
use crate::source::ArticleSource;
use crate::util::validate_article_url;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

pub struct Scheduler {
    source: Arc<dyn ArticleSource>,
    fetcher: Arc<FetchOrchestrator>,
    tx: mpsc::Sender<AppEvent>,
}

impl Scheduler {
    pub fn new(
        source: Arc<dyn ArticleSource>,
        fetcher: Arc<FetchOrchestrator>,
        tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        Self {
            source,
            fetcher,
            tx,
        }
    }

    /// Starts `effect`. Returns `false` when it asks the loop to stop.
    pub fn dispatch(&self, effect: Effect) -> bool {
        match effect {
            Effect::Quit => return false,
            Effect::LoadSection { section } => self.spawn_section_load(section),
            Effect::FetchArticle { url } => self.spawn_article_fetch(url),
            Effect::OpenInBrowser { url } => open_in_browser(url),
        }
        true
    }

    fn spawn_section_load(&self, section: String) {
        let source = self.source.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = match catch_task_panic(source.section(&section)).await {
                Ok(result) => AppEvent::SectionLoaded {
                    token: section,
                    result,
                },
                Err(error) => AppEvent::TaskPanicked {
                    task: "section",
                    token: section,
                    error,
                },
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, event = "SectionLoaded", "Channel send failed (receiver dropped)");
            }
        });
    }

    fn spawn_article_fetch(&self, url: String) {
        let fetcher = self.fetcher.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let event = match catch_task_panic(fetcher.fetch_article(&url)).await {
                Ok(result) => AppEvent::ArticleLoaded {
                    token: url,
                    result,
                    elapsed: started.elapsed(),
                },
                Err(error) => AppEvent::TaskPanicked {
                    task: "article",
                    token: url,
                    error,
                },
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, event = "ArticleLoaded", "Channel send failed (receiver dropped)");
            }
        });
    }
}

/// Hands the URL to the system browser off the event loop.
fn open_in_browser(url: String) {
    if let Err(e) = validate_article_url(&url) {
        tracing::warn!(url = %url, error = %e, "Refusing to open URL");
        return;
    }
    tokio::task::spawn_blocking(move || {
        if let Err(e) = open::that(&url) {
            tracing::warn!(url = %url, error = %e, "Failed to open browser");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FixtureSource;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_section_load_reports_with_token() {
        let source: Arc<dyn ArticleSource> = Arc::new(FixtureSource::new());
        let fetcher = Arc::new(FetchOrchestrator::new(source.clone()));
        let (tx, mut rx) = mpsc::channel(4);
        let scheduler = Scheduler::new(source, fetcher, tx);

        assert!(scheduler.dispatch(Effect::LoadSection {
            section: "leaders".into()
        }));
        match rx.recv().await {
            Some(AppEvent::SectionLoaded { token, result }) => {
                assert_eq!(token, "leaders");
                assert!(!result.unwrap().items.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_quit_stops_the_loop() {
        let source: Arc<dyn ArticleSource> = Arc::new(FixtureSource::new());
        let fetcher = Arc::new(FetchOrchestrator::new(source.clone()));
        let (tx, _rx) = mpsc::channel(1);
        let scheduler = Scheduler::new(source, fetcher, tx);
        assert!(!scheduler.dispatch(Effect::Quit));
    }
}
