pub mod alerts;
pub mod detail;
pub mod drivers;
pub mod notifications;
pub mod status_bar;

use dw_widgets::{Block, BorderType, Borders};

use crate::theme;

/// Rounded panel frame, highlighted when focused.
pub fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let border_style = if focused {
        theme::panel_border_focused()
    } else {
        theme::panel_border_style()
    };
    Block::new()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(theme::panel_bg())
        .border_style(border_style)
}
