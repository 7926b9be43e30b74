//! Completion events from background tasks.

use crate::app::{App, AppEvent};
use crate::error::FetchError;
use std::time::Duration;

pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::SectionLoaded { token, result } => {
            app.apply_section(&token, result);
        }
        AppEvent::ArticleLoaded {
            token,
            result,
            elapsed,
        } => {
            app.apply_article(&token, result, elapsed);
        }
        AppEvent::TaskPanicked { task, token, error } => {
            tracing::error!(task, token = %token, error = %error, "Background task panicked");
            // The result will never arrive, so fail the request it was for.
            // Token matching applies exactly as for a real result.
            let error = FetchError::Transport(format!("{task} task failed: {error}"));
            match task {
                "section" => {
                    app.apply_section(&token, Err(error));
                }
                _ => {
                    app.apply_article(&token, Err(error), Duration::ZERO);
                }
            }
        }
    }
}
