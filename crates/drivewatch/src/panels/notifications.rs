use std::cell::RefCell;

use dw_core::geometry::Rect;
use dw_render::frame::{Frame, HitId};
use dw_render::style::Style;
use dw_widgets::StatefulWidget;
use dw_widgets::virtual_list::{VirtualList, VirtualListState};

use crate::domain::{Notification, display_time};
use crate::theme;

pub const HIT_ID: HitId = HitId(3);
pub const ROW_HEIGHT: u16 = 2;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    notifications: &[Notification],
    unread: usize,
    state: &RefCell<VirtualListState>,
    focused: bool,
) {
    let title = format!(" Notifications ({unread} unread) ");
    let list = VirtualList::from_fn(
        notifications,
        |note: &Notification, _index: usize, area: Rect, frame: &mut Frame, selected: bool| {
            let max_x = area.right();
            let marker = if selected { ">" } else { " " };
            frame.print_text(area.x, area.y, marker, theme::panel_border_focused(), max_x);
            let (dot, title_style) = if note.read {
                (" ", Style::new())
            } else {
                ("*", theme::unread())
            };
            let x = frame.print_text(area.x + 1, area.y, dot, theme::unread(), max_x);
            frame.print_text(x + 1, area.y, &note.title, title_style, max_x);
            if area.height > 1 {
                let when = display_time(&note.created_at);
                let x = frame.print_text(area.x + 3, area.y + 1, &when, theme::muted(), max_x);
                frame.print_text(x + 2, area.y + 1, &note.body, theme::secondary(), max_x);
            }
        },
    )
    .row_height(ROW_HEIGHT)
    .block(super::panel_block(&title, focused))
    .highlight_style(theme::selection())
    .scrollbar_style(theme::scrollbar())
    .hit_id(HIT_ID);
    list.render(area, frame, &mut state.borrow_mut());
}
