//! The reducer: one message in, state updated, at most one effect out.
//!
//! Everything here is synchronous, so navigation can be tested by feeding
//! messages without a terminal or a runtime.

use super::{events, input};
use crate::app::{App, AppEvent, Effect};
use crossterm::event::KeyEvent;

#[derive(Debug)]
pub enum Msg {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    App(AppEvent),
}

impl From<AppEvent> for Msg {
    fn from(event: AppEvent) -> Self {
        Self::App(event)
    }
}

pub fn update(app: &mut App, msg: Msg) -> Option<Effect> {
    match msg {
        Msg::Key(key) => input::handle_key(app, key),
        Msg::Resize { width, height } => {
            app.resize(width as usize, height as usize);
            None
        }
        Msg::App(event) => {
            events::handle_app_event(app, event);
            None
        }
    }
}
