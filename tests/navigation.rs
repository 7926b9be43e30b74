//! Integration tests for navigation: the reducer driven by key presses and
//! completion events, stale-result rejection and cursor/viewport bounds.

use broadsheet::app::{App, AppEvent, ArticleState, Effect, Mode};
use broadsheet::article::{Article, FeedItem, Section};
use broadsheet::error::FetchError;
use broadsheet::layout;
use broadsheet::search;
use broadsheet::theme::ThemeVariant;
use broadsheet::ui::{update, Msg};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::time::Duration;

fn key(code: KeyCode) -> Msg {
    Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn section(title: &str, titles: &[&str]) -> Section {
    Section {
        title: title.to_string(),
        items: titles
            .iter()
            .map(|t| FeedItem::new(*t, "", format!("https://example.com/{}", t.replace(' ', "-"))))
            .collect(),
    }
}

fn loaded(event: AppEvent) -> Msg {
    Msg::App(event)
}

fn app_on(name: &str, titles: &[&str]) -> App {
    let mut app = App::new(ThemeVariant::Plain.palette());
    update(&mut app, Msg::Resize { width: 80, height: 24 });
    let Effect::LoadSection { section: token } = app.request_section(name) else {
        panic!("expected a section load");
    };
    update(
        &mut app,
        loaded(AppEvent::SectionLoaded {
            token,
            result: Ok(section(name, titles)),
        }),
    );
    app
}

fn article(url: &str, title: &str) -> Article {
    Article {
        title: title.to_string(),
        content: "Paragraph one.\n\nParagraph two.".to_string(),
        url: url.to_string(),
        ..Default::default()
    }
}

fn titles(app: &App) -> Vec<String> {
    app.filtered
        .iter()
        .map(|&i| app.all_items[i].title.clone())
        .collect()
}

// ============================================================================
// Worked examples
// ============================================================================

#[test]
fn test_fuzzy_query_keeps_only_subsequence_matches() {
    let mut app = app_on("leaders", &["AI and China", "Baking bread"]);
    for c in "ai chn".chars() {
        update(&mut app, key(KeyCode::Char(c)));
    }
    assert_eq!(titles(&app), vec!["AI and China".to_string()]);
    assert_eq!(app.cursor, 0);

    update(&mut app, key(KeyCode::Esc));
    assert_eq!(app.query, "");
    assert_eq!(titles(&app).len(), 2);
    assert!(!app.should_quit);
}

#[test]
fn test_two_short_items_fit_an_80x24_terminal() {
    let items = vec![
        FeedItem::new("First", "", "https://example.com/1"),
        FeedItem::new("Second", "", "https://example.com/2"),
    ];
    let headlines = layout::HeadlineLayout::new(layout::content_width(80), items.len());
    let heights: Vec<usize> = items.iter().map(|i| headlines.row_height(i)).collect();
    assert_eq!(heights[0], heights[1]);

    let window = layout::list_window(&heights, 0, 0, 24, 2, true);
    assert!(window.count >= 2);
    assert!(!window.show_position);
    assert_eq!(window, layout::list_window(&heights, 0, 0, 24, 2, true));
}

#[test]
fn test_late_section_result_never_replaces_newer_request() {
    let mut app = app_on("leaders", &["Leader one"]);

    let business = app.request_section("business");
    let finance = app.request_section("finance");
    assert_eq!(business, Effect::LoadSection { section: "business".into() });
    assert_eq!(finance, Effect::LoadSection { section: "finance".into() });

    update(
        &mut app,
        loaded(AppEvent::SectionLoaded {
            token: "business".into(),
            result: Ok(section("Business", &["Business story"])),
        }),
    );
    assert_eq!(titles(&app), vec!["Leader one".to_string()]);
    assert_eq!(app.pending_section.as_deref(), Some("finance"));

    update(
        &mut app,
        loaded(AppEvent::SectionLoaded {
            token: "finance".into(),
            result: Ok(section("Finance", &["Finance story"])),
        }),
    );
    assert_eq!(app.section, "finance");
    assert_eq!(app.section_title, "Finance");
    assert_eq!(titles(&app), vec!["Finance story".to_string()]);
    assert_eq!(app.pending_section, None);
}

#[test]
fn test_rapid_tabs_chain_from_the_pending_section() {
    let mut app = app_on("leaders", &["Leader one"]);
    let first = update(&mut app, key(KeyCode::Tab));
    let second = update(&mut app, key(KeyCode::Tab));
    let (Some(Effect::LoadSection { section: a }), Some(Effect::LoadSection { section: b })) =
        (first, second)
    else {
        panic!("tab should request a section");
    };
    assert_ne!(a, b);
    assert_eq!(app.pending_section.as_deref(), Some(b.as_str()));
}

// ============================================================================
// Article stale rejection
// ============================================================================

#[test]
fn test_article_result_for_abandoned_url_is_ignored() {
    let mut app = app_on("leaders", &["Story A", "Story B"]);

    let Some(Effect::FetchArticle { url: url_a }) = update(&mut app, key(KeyCode::Enter)) else {
        panic!("enter should fetch");
    };
    update(&mut app, key(KeyCode::Char('b')));
    assert_eq!(app.mode, Mode::Browse);

    update(&mut app, key(KeyCode::Down));
    let Some(Effect::FetchArticle { url: url_b }) = update(&mut app, key(KeyCode::Enter)) else {
        panic!("enter should fetch");
    };
    assert_ne!(url_a, url_b);

    update(
        &mut app,
        loaded(AppEvent::ArticleLoaded {
            token: url_a.clone(),
            result: Ok(article(&url_a, "Story A")),
            elapsed: Duration::from_millis(5),
        }),
    );
    assert!(app.article.is_loading());
    assert_eq!(app.pending_article.as_deref(), Some(url_b.as_str()));

    update(
        &mut app,
        loaded(AppEvent::ArticleLoaded {
            token: url_b.clone(),
            result: Ok(article(&url_b, "Story B")),
            elapsed: Duration::from_millis(5),
        }),
    );
    assert_eq!(app.current_article().map(|a| a.title.as_str()), Some("Story B"));
    assert!(app.timings.fetch.is_some());
}

#[test]
fn test_panic_from_abandoned_fetch_keeps_newer_request() {
    let mut app = app_on("leaders", &["Story A", "Story B"]);

    let Some(Effect::FetchArticle { url: url_a }) = update(&mut app, key(KeyCode::Enter)) else {
        panic!("enter should fetch");
    };
    update(&mut app, key(KeyCode::Char('b')));
    update(&mut app, key(KeyCode::Down));
    let Some(Effect::FetchArticle { url: url_b }) = update(&mut app, key(KeyCode::Enter)) else {
        panic!("enter should fetch");
    };

    update(
        &mut app,
        loaded(AppEvent::TaskPanicked {
            task: "article",
            token: url_a,
            error: "boom".into(),
        }),
    );
    assert!(app.article.is_loading());
    assert_eq!(app.pending_article.as_deref(), Some(url_b.as_str()));

    update(
        &mut app,
        loaded(AppEvent::ArticleLoaded {
            token: url_b.clone(),
            result: Ok(article(&url_b, "Story B")),
            elapsed: Duration::from_millis(5),
        }),
    );
    assert_eq!(app.current_article().map(|a| a.title.as_str()), Some("Story B"));
}

#[test]
fn test_panic_from_superseded_section_load_is_ignored() {
    let mut app = app_on("leaders", &["Leader one"]);
    app.request_section("business");
    app.request_section("finance");

    update(
        &mut app,
        loaded(AppEvent::TaskPanicked {
            task: "section",
            token: "business".into(),
            error: "boom".into(),
        }),
    );
    assert_eq!(app.pending_section.as_deref(), Some("finance"));
    assert!(app.section_error.is_none());

    update(
        &mut app,
        loaded(AppEvent::TaskPanicked {
            task: "section",
            token: "finance".into(),
            error: "boom".into(),
        }),
    );
    assert_eq!(app.pending_section, None);
    assert!(app.section_error.is_some());
    assert_eq!(titles(&app), vec!["Leader one".to_string()]);
}

#[test]
fn test_result_after_back_leaves_browse_untouched() {
    let mut app = app_on("leaders", &["Story A"]);
    let Some(Effect::FetchArticle { url }) = update(&mut app, key(KeyCode::Enter)) else {
        panic!("enter should fetch");
    };
    update(&mut app, key(KeyCode::Esc));

    update(
        &mut app,
        loaded(AppEvent::ArticleLoaded {
            token: url.clone(),
            result: Ok(article(&url, "Story A")),
            elapsed: Duration::ZERO,
        }),
    );
    assert_eq!(app.mode, Mode::Browse);
    assert!(matches!(app.article, ArticleState::Idle));
}

#[test]
fn test_failed_fetch_shows_error_state() {
    let mut app = app_on("leaders", &["Story A"]);
    let Some(Effect::FetchArticle { url }) = update(&mut app, key(KeyCode::Enter)) else {
        panic!("enter should fetch");
    };
    update(
        &mut app,
        loaded(AppEvent::ArticleLoaded {
            token: url,
            result: Err(FetchError::Paywall),
            elapsed: Duration::ZERO,
        }),
    );
    match &app.article {
        ArticleState::Failed { error } => assert!(error.is_user_actionable()),
        other => panic!("expected failure, got {other:?}"),
    }
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Debug, Clone)]
enum Nav {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Type(char),
    Backspace,
    Resize(u16, u16),
}

fn nav() -> impl Strategy<Value = Nav> {
    prop_oneof![
        Just(Nav::Up),
        Just(Nav::Down),
        Just(Nav::PageUp),
        Just(Nav::PageDown),
        Just(Nav::Home),
        Just(Nav::End),
        prop::sample::select(vec!['a', 'e', 'o', 's', 't', '1', '3', ' ']).prop_map(Nav::Type),
        Just(Nav::Backspace),
        (20u16..200, 8u16..60).prop_map(|(w, h)| Nav::Resize(w, h)),
    ]
}

fn to_msg(step: &Nav) -> Msg {
    match step {
        Nav::Up => key(KeyCode::Up),
        Nav::Down => key(KeyCode::Down),
        Nav::PageUp => key(KeyCode::PageUp),
        Nav::PageDown => key(KeyCode::PageDown),
        Nav::Home => key(KeyCode::Home),
        Nav::End => key(KeyCode::End),
        Nav::Type(c) => key(KeyCode::Char(*c)),
        Nav::Backspace => key(KeyCode::Backspace),
        Nav::Resize(width, height) => Msg::Resize {
            width: *width,
            height: *height,
        },
    }
}

proptest! {
    #[test]
    fn prop_cursor_stays_inside_the_window(
        words in prop::collection::vec("[a-z]{2,9}( [a-z]{2,9}){0,12}", 0..40),
        steps in prop::collection::vec(nav(), 0..60),
    ) {
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let mut app = app_on("leaders", &refs);

        for step in &steps {
            update(&mut app, to_msg(step));
            prop_assert_eq!(app.mode, Mode::Browse);

            if app.filtered.is_empty() {
                prop_assert_eq!(app.cursor, 0);
                continue;
            }
            prop_assert!(app.cursor < app.filtered.len());
            let window = app.list_window();
            prop_assert!(app.viewport_start <= app.cursor);
            prop_assert!(app.cursor < window.start + window.count);
        }
    }

    #[test]
    fn prop_filter_is_deterministic(
        words in prop::collection::vec("[a-z ]{0,30}", 0..20),
        query in "[a-z ]{0,8}",
    ) {
        let items: Vec<FeedItem> = words
            .iter()
            .enumerate()
            .map(|(i, w)| FeedItem::new(w.clone(), "", format!("https://example.com/{i}")))
            .collect();
        prop_assert_eq!(
            search::filter_indices(&items, &query),
            search::filter_indices(&items, &query)
        );
    }
}
