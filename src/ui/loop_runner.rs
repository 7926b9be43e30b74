//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, completion events from background tasks and
//! process signals. Every input becomes a [`Msg`] for the reducer; any effect
//! it returns goes to the [`Scheduler`].

use crate::app::{App, AppEvent, Effect};
use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use tokio::sync::mpsc;

use super::effects::Scheduler;
use super::render::render;
use super::update::{update, Msg};

/// Runs the interactive reader until the user quits or a signal arrives.
///
/// `initial` is dispatched once the terminal is ready, normally the load of
/// the starting section. The terminal is restored on every exit path,
/// including panics.
pub async fn run(
    app: &mut App,
    scheduler: Scheduler,
    mut event_rx: mpsc::Receiver<AppEvent>,
    initial: Effect,
) -> Result<()> {
    install_panic_hook();
    let mut screen = Screen::enter().context("failed to set up terminal")?;
    let mut input = EventStream::new();
    let mut signals = Signals::new()?;

    if let Ok(size) = screen.terminal.size() {
        update(
            app,
            Msg::Resize {
                width: size.width,
                height: size.height,
            },
        );
    }

    let mut running = scheduler.dispatch(initial);
    while running {
        while let Ok(event) = event_rx.try_recv() {
            update(app, Msg::App(event));
        }
        if app.needs_redraw {
            screen.terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        let msg = tokio::select! {
            biased;

            name = signals.recv() => {
                tracing::info!(signal = name, "Shutting down on signal");
                break;
            }

            next = input.next() => match next {
                Some(Ok(Event::Key(key))) => Msg::Key(key),
                Some(Ok(Event::Resize(width, height))) => Msg::Resize { width, height },
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Terminal event stream error");
                    continue;
                }
                None => break,
            },

            Some(event) = event_rx.recv() => Msg::App(event),
        };

        app.needs_redraw = true;
        if let Some(effect) = update(app, msg) {
            running = scheduler.dispatch(effect);
        }
    }

    screen.leave()
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        previous(info);
    }));
}

/// Raw mode plus the alternate screen, undone on [`leave`](Self::leave) or drop.
struct Screen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl Screen {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            terminal,
            active: true,
        })
    }

    fn leave(mut self) -> Result<()> {
        self.active = false;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        if self.active {
            let _ = disable_raw_mode();
            let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
            let _ = self.terminal.show_cursor();
        }
    }
}

/// SIGTERM and SIGINT as one stream of signal names.
struct Signals {
    #[cfg(unix)]
    term: tokio::signal::unix::Signal,
    #[cfg(unix)]
    int: tokio::signal::unix::Signal,
}

impl Signals {
    #[cfg(unix)]
    fn new() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            term: signal(SignalKind::terminate())?,
            int: signal(SignalKind::interrupt())?,
        })
    }

    #[cfg(not(unix))]
    fn new() -> Result<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.term.recv() => "SIGTERM",
            _ = self.int.recv() => "SIGINT",
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> &'static str {
        std::future::pending().await
    }
}
