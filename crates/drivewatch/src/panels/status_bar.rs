use dw_core::geometry::Rect;
use dw_render::frame::Frame;
use dw_widgets::Widget;
use dw_widgets::status_line::{StatusItem, StatusLine};

use crate::theme;

/// Counts shown in the top bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub alerts: usize,
    pub open: usize,
    pub unread: usize,
}

pub fn render(frame: &mut Frame, area: Rect, dataset: &str, counts: Counts, filter: &str, clock: &str) {
    let name = if dataset.is_empty() { "drivewatch" } else { dataset };
    let alerts = format!("{} alerts", counts.alerts);
    let open = format!("{} open", counts.open);
    let unread = format!("{} unread", counts.unread);
    let filter = format!("filter: {filter}");

    StatusLine::new()
        .style(theme::status_bar_style())
        .separator("  ")
        .left(StatusItem::text(name))
        .center(StatusItem::text(&alerts))
        .center(StatusItem::text(&open))
        .center(StatusItem::text(&unread))
        .center(StatusItem::text(&filter))
        .right(StatusItem::text(clock))
        .render(area, frame);
}
