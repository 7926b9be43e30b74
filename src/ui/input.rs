//! Keyboard handling for the browse and article views.

use crate::app::{App, ArticleState, Effect, Mode};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Routes a key press to the handler for the current mode.
pub(super) fn handle_key(app: &mut App, key: KeyEvent) -> Option<Effect> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Effect::Quit);
    }
    match app.mode {
        Mode::Browse => handle_browse_key(app, key),
        Mode::Article => handle_article_key(app, key),
    }
}

/// Browse: typing goes to the search query, so only non-printing keys and
/// `q` on an empty query act as commands.
fn handle_browse_key(app: &mut App, key: KeyEvent) -> Option<Effect> {
    match key.code {
        KeyCode::Esc => {
            if app.query.is_empty() {
                return Some(Effect::Quit);
            }
            app.clear_query();
        }
        KeyCode::Enter => return app.select(),
        KeyCode::Backspace => app.pop_query_char(),
        KeyCode::Up => app.move_cursor(-1),
        KeyCode::Down => app.move_cursor(1),
        KeyCode::Left | KeyCode::PageUp => app.page(-1),
        KeyCode::Right | KeyCode::PageDown => app.page(1),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Tab => return Some(app.step_section(1)),
        KeyCode::BackTab => return Some(app.step_section(-1)),
        KeyCode::Char('q') if app.query.is_empty() => return Some(Effect::Quit),
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            app.push_query_char(c);
        }
        _ => {}
    }
    None
}

fn handle_article_key(app: &mut App, key: KeyEvent) -> Option<Effect> {
    match key.code {
        KeyCode::Char('q') => return Some(Effect::Quit),
        KeyCode::Char('b') | KeyCode::Left | KeyCode::Esc | KeyCode::Backspace => app.back(),
        KeyCode::Char('c') => app.toggle_columns(),
        KeyCode::Char('o') => {
            let url = match &app.article {
                ArticleState::Ready { article, .. } => article.url.clone(),
                ArticleState::Loading { item } => item.link.clone(),
                _ => app.selected_item().map(|i| i.link.clone()).unwrap_or_default(),
            };
            if !url.is_empty() {
                return Some(Effect::OpenInBrowser { url });
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.scroll_by(-1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_by(1),
        KeyCode::PageUp => app.scroll_page(-1),
        KeyCode::PageDown | KeyCode::Char(' ') => app.scroll_page(1),
        KeyCode::Home | KeyCode::Char('g') => app.scroll_home(),
        KeyCode::End | KeyCode::Char('G') => app.scroll_end(),
        _ => {}
    }
    None
}
