use dw_core::geometry::Rect;
use dw_render::frame::Frame;
use dw_widgets::{Line, Paragraph, Span, Widget};

use crate::domain::{Driver, SafetyAlert, display_time};
use crate::theme;

fn field<'a>(label: &'a str, value: impl Into<String>) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, theme::muted()),
        Span::raw(value.into()),
    ])
}

pub fn render(frame: &mut Frame, area: Rect, alert: Option<&SafetyAlert>, driver: Option<&Driver>) {
    let block = super::panel_block(" Detail ", false);
    let Some(alert) = alert else {
        Paragraph::new(["Select an alert to see its details."])
            .block(block)
            .style(theme::muted())
            .wrap(true)
            .render(area, frame);
        return;
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(alert.kind.label(), theme::severity(alert.severity).bold()),
            Span::raw("  "),
            Span::styled(alert.severity.label(), theme::severity(alert.severity)),
        ]),
        Line::from(""),
        field("Alert     ", format!("#{}", alert.id)),
        field("When      ", display_time(&alert.occurred_at)),
        field("Where     ", alert.location.clone()),
    ];
    match driver {
        Some(d) => {
            lines.push(field("Driver    ", d.name.clone()));
            lines.push(field("Vehicle   ", d.vehicle.clone()));
            lines.push(field("License   ", d.license_number.clone()));
            lines.push(field("Phone     ", d.phone.clone()));
            lines.push(field("Duty      ", d.status.label()));
        }
        None => lines.push(field("Driver    ", format!("#{} (unknown)", alert.driver_id))),
    }
    lines.push(Line::from(""));
    lines.push(if alert.acknowledged {
        Line::from(Span::styled("Acknowledged", theme::acknowledged()))
    } else {
        Line::from(Span::styled("Open: press Enter to acknowledge", theme::unread()))
    });
    if !alert.notes.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(alert.notes.as_str()));
    }

    Paragraph::new(lines).block(block).wrap(true).render(area, frame);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DriverStatus, EventKind, Severity};

    #[test]
    fn shows_alert_and_driver_fields() {
        let alert = SafetyAlert {
            id: 12,
            driver_id: 3,
            kind: EventKind::PhoneUse,
            severity: Severity::Warning,
            occurred_at: "2024-05-01T06:30:00Z".to_owned(),
            location: "Harbor bridge".to_owned(),
            notes: String::new(),
            acknowledged: false,
        };
        let driver = Driver {
            id: 3,
            name: "Chen Wei".to_owned(),
            vehicle: "TRK-103".to_owned(),
            license_number: "DL1".to_owned(),
            status: DriverStatus::Active,
            phone: "555".to_owned(),
        };
        let mut frame = Frame::new(44, 16);
        let area = frame.area();
        render(&mut frame, area, Some(&alert), Some(&driver));
        let text = frame.buffer.lines().join("\n");
        assert!(text.contains("Phone use  warning"));
        assert!(text.contains("When      2024-05-01 06:30"));
        assert!(text.contains("Driver    Chen Wei"));
        assert!(text.contains("press Enter to acknowledge"));
    }

    #[test]
    fn placeholder_without_selection() {
        let mut frame = Frame::new(44, 6);
        let area = frame.area();
        render(&mut frame, area, None, None);
        assert!(frame.buffer.row_text(1).contains("Select an alert"));
    }
}
