//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `update` - The reducer: `(App, Msg) -> Option<Effect>`
//! - `input` - Keyboard handling for browse and article modes
//! - `events` - Completion events from background tasks
//! - `effects` - Scheduler that runs effects as independent tasks
//! - `loop_runner` - Main event loop and terminal management
//! - `render` - View rendering dispatch
//! - `browse` - Section listing view
//! - `reader` - Article layout and view
//! - `hints` - Width-aware help lines
//! - `helpers` - Shared line and task utilities

mod browse;
mod effects;
mod events;
pub mod helpers;
pub mod hints;
mod input;
mod loop_runner;
pub mod reader;
mod render;
mod update;

// Re-export the public API
pub use browse::browse_lines;
pub use effects::Scheduler;
pub use loop_runner::run;
pub use update::{update, Msg};
