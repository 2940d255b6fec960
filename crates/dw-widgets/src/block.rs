#![forbid(unsafe_code)]

use dw_core::geometry::Rect;
use dw_render::cell::Cell;
use dw_render::frame::Frame;
use dw_render::style::Style;
use unicode_width::UnicodeWidthStr;

use crate::Widget;
use crate::borders::{BorderType, Borders};

/// A widget that draws a block with optional borders and a title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block<'a> {
    borders: Borders,
    border_style: Style,
    border_type: BorderType,
    title: Option<&'a str>,
    title_alignment: Alignment,
    style: Style,
}

/// Text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl<'a> Block<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A block with all borders enabled.
    #[must_use]
    pub fn bordered() -> Self {
        Self::default().borders(Borders::ALL)
    }

    #[must_use]
    pub fn borders(mut self, borders: Borders) -> Self {
        self.borders = borders;
        self
    }

    #[must_use]
    pub fn border_style(mut self, style: Style) -> Self {
        self.border_style = style;
        self
    }

    #[must_use]
    pub fn border_type(mut self, border_type: BorderType) -> Self {
        self.border_type = border_type;
        self
    }

    /// Title drawn over the top border.
    #[must_use]
    pub fn title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }

    #[must_use]
    pub fn title_alignment(mut self, alignment: Alignment) -> Self {
        self.title_alignment = alignment;
        self
    }

    /// Style applied to the whole block area before borders are drawn.
    #[must_use]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// The area inside the borders.
    #[must_use]
    pub fn inner(&self, area: Rect) -> Rect {
        let mut inner = area;
        if self.borders.contains(Borders::LEFT) {
            inner.x = inner.x.saturating_add(1);
            inner.width = inner.width.saturating_sub(1);
        }
        if self.borders.contains(Borders::TOP) {
            inner.y = inner.y.saturating_add(1);
            inner.height = inner.height.saturating_sub(1);
        }
        if self.borders.contains(Borders::RIGHT) {
            inner.width = inner.width.saturating_sub(1);
        }
        if self.borders.contains(Borders::BOTTOM) {
            inner.height = inner.height.saturating_sub(1);
        }
        inner
    }

    fn border_cell(&self, c: char) -> Cell {
        let mut cell = Cell::from_char(c);
        self.style.patch(self.border_style).apply_to(&mut cell);
        cell
    }

    fn render_borders(&self, area: Rect, frame: &mut Frame) {
        let set = self.border_type.to_border_set();
        let buf = &mut frame.buffer;

        if self.borders.contains(Borders::LEFT) {
            for y in area.top()..area.bottom() {
                buf.set(area.x, y, self.border_cell(set.vertical));
            }
        }
        if self.borders.contains(Borders::RIGHT) {
            let x = area.right() - 1;
            for y in area.top()..area.bottom() {
                buf.set(x, y, self.border_cell(set.vertical));
            }
        }
        if self.borders.contains(Borders::TOP) {
            for x in area.left()..area.right() {
                buf.set(x, area.y, self.border_cell(set.horizontal));
            }
        }
        if self.borders.contains(Borders::BOTTOM) {
            let y = area.bottom() - 1;
            for x in area.left()..area.right() {
                buf.set(x, y, self.border_cell(set.horizontal));
            }
        }

        // Corners last so they overwrite the edges.
        if self.borders.contains(Borders::LEFT | Borders::TOP) {
            buf.set(area.x, area.y, self.border_cell(set.top_left));
        }
        if self.borders.contains(Borders::RIGHT | Borders::TOP) {
            buf.set(area.right() - 1, area.y, self.border_cell(set.top_right));
        }
        if self.borders.contains(Borders::LEFT | Borders::BOTTOM) {
            buf.set(area.x, area.bottom() - 1, self.border_cell(set.bottom_left));
        }
        if self.borders.contains(Borders::RIGHT | Borders::BOTTOM) {
            buf.set(
                area.right() - 1,
                area.bottom() - 1,
                self.border_cell(set.bottom_right),
            );
        }
    }

    fn render_title(&self, area: Rect, frame: &mut Frame) {
        let Some(title) = self.title else {
            return;
        };
        if !self.borders.contains(Borders::TOP) || area.width < 3 {
            return;
        }
        let available = usize::from(area.width - 2);
        let display = title.width().min(available) as u16;
        let x = match self.title_alignment {
            Alignment::Left => area.x + 1,
            Alignment::Center => area.x + 1 + (available as u16 - display) / 2,
            // One border cell of padding before the corner, when it fits.
            Alignment::Right => (area.right() - 2).saturating_sub(display).max(area.x + 1),
        };
        let max_x = area.right() - 1;
        frame.print_text(x, area.y, title, self.border_style, max_x);
    }
}

impl Widget for Block<'_> {
    fn render(&self, area: Rect, frame: &mut Frame) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "widget_render",
            widget = "Block",
            x = area.x,
            y = area.y,
            w = area.width,
            h = area.height
        )
        .entered();

        if area.is_empty() {
            return;
        }
        frame.buffer.set_style(area, self.style);
        self.render_borders(area, frame);
        self.render_title(area, frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_with_all_borders() {
        let block = Block::bordered();
        assert_eq!(block.inner(Rect::new(0, 0, 10, 10)), Rect::new(1, 1, 8, 8));
    }

    #[test]
    fn inner_with_no_borders() {
        let area = Rect::new(0, 0, 10, 10);
        assert_eq!(Block::new().inner(area), area);
    }

    #[test]
    fn inner_with_partial_borders() {
        let block = Block::new().borders(Borders::TOP | Borders::LEFT);
        assert_eq!(block.inner(Rect::new(0, 0, 10, 10)), Rect::new(1, 1, 9, 9));
    }

    #[test]
    fn render_empty_area() {
        let mut frame = Frame::new(1, 1);
        Block::bordered().render(Rect::new(0, 0, 0, 0), &mut frame);
        assert_eq!(frame.buffer.row_text(0), "");
    }

    #[test]
    fn render_square_borders() {
        let mut frame = Frame::new(5, 3);
        Block::bordered().render(Rect::new(0, 0, 5, 3), &mut frame);
        assert_eq!(frame.buffer.lines(), vec!["┌───┐", "│   │", "└───┘"]);
    }

    #[test]
    fn render_title_left_and_right() {
        let mut frame = Frame::new(10, 2);
        Block::bordered()
            .border_type(BorderType::Ascii)
            .title("Alerts")
            .render(Rect::new(0, 0, 10, 2), &mut frame);
        assert_eq!(frame.buffer.row_text(0), "+Alerts--+");

        let mut frame = Frame::new(10, 2);
        Block::bordered()
            .border_type(BorderType::Ascii)
            .title("ab")
            .title_alignment(Alignment::Right)
            .render(Rect::new(0, 0, 10, 2), &mut frame);
        assert_eq!(frame.buffer.row_text(0), "+-----ab-+");
    }

    #[test]
    fn long_title_is_truncated_inside_corners() {
        let mut frame = Frame::new(6, 2);
        Block::bordered()
            .border_type(BorderType::Ascii)
            .title("Notifications")
            .render(Rect::new(0, 0, 6, 2), &mut frame);
        assert_eq!(frame.buffer.row_text(0), "+Noti+");
    }

    #[test]
    fn right_title_filling_the_edge_stays_inside_corners() {
        let mut frame = Frame::new(6, 2);
        Block::bordered()
            .border_type(BorderType::Ascii)
            .title("abcd")
            .title_alignment(Alignment::Right)
            .render(Rect::new(0, 0, 6, 2), &mut frame);
        assert_eq!(frame.buffer.row_text(0), "+abcd+");

        let mut frame = Frame::new(12, 2);
        Block::bordered()
            .border_type(BorderType::Ascii)
            .title("ab")
            .title_alignment(Alignment::Right)
            .render(Rect::new(2, 0, 10, 2), &mut frame);
        assert_eq!(frame.buffer.row_text(0), "  +-----ab-+");
    }

    #[test]
    fn centered_title() {
        let mut frame = Frame::new(8, 2);
        Block::bordered()
            .border_type(BorderType::Ascii)
            .title("ok")
            .title_alignment(Alignment::Center)
            .render(Rect::new(0, 0, 8, 2), &mut frame);
        assert_eq!(frame.buffer.row_text(0), "+--ok--+");
    }
}
