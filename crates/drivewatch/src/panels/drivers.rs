use std::cell::RefCell;

use dw_core::geometry::Rect;
use dw_render::frame::{Frame, HitId};
use dw_render::style::Style;
use dw_widgets::StatefulWidget;
use dw_widgets::virtual_list::{VirtualList, VirtualListState};

use crate::api::DriverSummary;
use crate::domain::DriverStatus;
use crate::theme;

pub const HIT_ID: HitId = HitId(2);

fn status_style(status: DriverStatus) -> Style {
    match status {
        DriverStatus::Active => theme::acknowledged(),
        DriverStatus::OffDuty => theme::muted(),
        DriverStatus::Suspended => theme::error(),
    }
}

fn draw_driver(summary: &DriverSummary, _index: usize, area: Rect, frame: &mut Frame, selected: bool) {
    let max_x = area.right();
    let d = &summary.driver;
    let marker = if selected { ">" } else { " " };
    frame.print_text(area.x, area.y, marker, theme::panel_border_focused(), max_x);
    frame.print_text(area.x + 1, area.y, &d.name, Style::new(), max_x);
    frame.print_text(area.x + 22, area.y, &d.vehicle, theme::secondary(), max_x);
    frame.print_text(area.x + 32, area.y, d.status.label(), status_style(d.status), max_x);
    let open = match summary.open_alerts {
        0 => "no open alerts".to_owned(),
        1 => "1 open alert".to_owned(),
        n => format!("{n} open alerts"),
    };
    let open_style = if summary.open_alerts == 0 {
        theme::muted()
    } else {
        theme::unread()
    };
    frame.print_text(area.x + 44, area.y, &open, open_style, max_x);
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    drivers: &[DriverSummary],
    state: &RefCell<VirtualListState>,
    focused: bool,
) {
    let title = format!(" Drivers ({}) ", drivers.len());
    let list = VirtualList::from_fn(drivers, draw_driver)
        .block(super::panel_block(&title, focused))
        .highlight_style(theme::selection())
        .scrollbar_style(theme::scrollbar())
        .hit_id(HIT_ID);
    list.render(area, frame, &mut state.borrow_mut());
}
