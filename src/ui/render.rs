//! Frame rendering, dispatched on the current mode.

use crate::app::{App, Mode};
use ratatui::{layout::Alignment, widgets::Paragraph, Frame};

use super::{browse, reader};

/// Below this the layout cannot fit a header, one row and the help.
pub(super) const MIN_WIDTH: u16 = 20;
pub(super) const MIN_HEIGHT: u16 = 8;

pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        f.render_widget(Paragraph::new("Too small").alignment(Alignment::Center), area);
        return;
    }

    match app.mode {
        Mode::Browse => browse::render(f, app, area),
        Mode::Article => reader::render(f, app, area),
    }
}
