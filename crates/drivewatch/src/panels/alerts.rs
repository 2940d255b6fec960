use std::cell::RefCell;
use std::collections::HashMap;

use dw_core::geometry::Rect;
use dw_render::frame::{Frame, HitId};
use dw_render::style::Style;
use dw_widgets::virtual_list::{RowRenderer, VirtualList, VirtualListState};
use dw_widgets::StatefulWidget;

use crate::domain::{DriverId, SafetyAlert, Severity, display_time};
use crate::theme;

pub const HIT_ID: HitId = HitId(1);

/// Draws one alert across up to four lines: headline, time and place,
/// notes, id.
pub struct AlertRow<'a> {
    pub driver_names: &'a HashMap<DriverId, String>,
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "CRIT",
        Severity::Warning => "WARN",
        Severity::Info => "INFO",
    }
}

impl RowRenderer<SafetyAlert> for AlertRow<'_> {
    fn render_row(
        &self,
        alert: &SafetyAlert,
        _index: usize,
        area: Rect,
        frame: &mut Frame,
        selected: bool,
    ) {
        let max_x = area.right();
        let marker = if selected { ">" } else { " " };
        let mut x = frame.print_text(area.x, area.y, marker, theme::panel_border_focused(), max_x);
        x = frame.print_text(x, area.y, severity_tag(alert.severity), theme::severity(alert.severity), max_x);
        x = frame.print_text(x + 1, area.y, alert.kind.label(), theme::severity(alert.severity), max_x);
        let driver = self
            .driver_names
            .get(&alert.driver_id)
            .map_or_else(|| format!("driver #{}", alert.driver_id), Clone::clone);
        x = frame.print_text(x + 2, area.y, &driver, Style::new(), max_x);
        if area.height == 1 {
            let state = if alert.acknowledged { "ack" } else { "" };
            frame.print_text(x + 2, area.y, state, theme::acknowledged(), max_x);
            return;
        }

        let y = area.y + 1;
        let when = display_time(&alert.occurred_at);
        let mut x = frame.print_text(area.x + 6, y, &when, theme::muted(), max_x);
        x = frame.print_text(x + 2, y, &alert.location, theme::secondary(), max_x);
        if alert.acknowledged {
            frame.print_text(x + 2, y, "acknowledged", theme::acknowledged(), max_x);
        } else {
            frame.print_text(x + 2, y, "open", theme::unread(), max_x);
        }

        if area.height > 2 && !alert.notes.is_empty() {
            frame.print_text(area.x + 6, area.y + 2, &alert.notes, theme::secondary(), max_x);
        }
        if area.height > 3 {
            frame.print_text(area.x + 6, area.y + 3, &format!("#{}", alert.id), theme::muted(), max_x);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn render(
    frame: &mut Frame,
    area: Rect,
    alerts: &[SafetyAlert],
    driver_names: &HashMap<DriverId, String>,
    row_height: u16,
    title: &str,
    state: &RefCell<VirtualListState>,
    focused: bool,
) {
    let list = VirtualList::new(alerts, AlertRow { driver_names })
        .row_height(row_height)
        .block(super::panel_block(title, focused))
        .highlight_style(theme::selection())
        .scrollbar_style(theme::scrollbar())
        .hit_id(HIT_ID);
    list.render(area, frame, &mut state.borrow_mut());

    if alerts.is_empty() {
        let inner = super::panel_block(title, focused).inner(area);
        let max_x = inner.right();
        frame.print_text(inner.x + 1, inner.y, "No alerts match the filter", theme::muted(), max_x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventKind;

    fn alert(id: u64, acknowledged: bool) -> SafetyAlert {
        SafetyAlert {
            id,
            driver_id: 1,
            kind: EventKind::Alcohol,
            severity: Severity::Critical,
            occurred_at: "2024-05-01T06:00:00Z".to_owned(),
            location: "Depot".to_owned(),
            notes: "breath test 0.4".to_owned(),
            acknowledged,
        }
    }

    fn draw(row_height: u16, alert: &SafetyAlert, names: &HashMap<DriverId, String>) -> Vec<String> {
        let mut frame = Frame::offscreen(60, row_height);
        AlertRow { driver_names: names }.render_row(
            alert,
            0,
            Rect::new(0, 0, 60, row_height),
            &mut frame,
            true,
        );
        frame.buffer.lines()
    }

    #[test]
    fn two_line_row_shows_time_and_state() {
        let names = HashMap::from([(1, "Ada".to_owned())]);
        let lines = draw(2, &alert(4, false), &names);
        assert_eq!(lines[0], ">CRIT Alcohol  Ada");
        assert_eq!(lines[1], "      2024-05-01 06:00  Depot  open");
    }

    #[test]
    fn tall_row_adds_notes_and_id() {
        let lines = draw(4, &alert(4, true), &HashMap::new());
        assert!(lines[0].ends_with("driver #1"));
        assert!(lines[1].ends_with("acknowledged"));
        assert_eq!(lines[2].trim(), "breath test 0.4");
        assert_eq!(lines[3].trim(), "#4");
    }

    #[test]
    fn empty_list_shows_placeholder() {
        let mut frame = Frame::new(40, 6);
        let state = RefCell::new(VirtualListState::new());
        let area = frame.area();
        render(&mut frame, area, &[], &HashMap::new(), 2, " Alerts ", &state, true);
        assert!(frame.buffer.row_text(1).contains("No alerts match the filter"));
    }
}
