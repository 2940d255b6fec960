#![forbid(unsafe_code)]

//! Single-row status bar with left, center, and right groups.
//!
//! Items are joined with a separator. When space runs out the right group
//! wins, then the left; the center group is dropped first.

use dw_core::geometry::Rect;
use dw_render::cell::Cell;
use dw_render::frame::Frame;
use dw_render::style::Style;
use unicode_width::UnicodeWidthStr;

use crate::Widget;

/// One entry in a [`StatusLine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusItem<'a> {
    Text(&'a str),
    /// Rendered as `[key] action`.
    KeyHint { key: &'a str, action: &'a str },
}

impl<'a> StatusItem<'a> {
    #[must_use]
    pub const fn text(text: &'a str) -> Self {
        Self::Text(text)
    }

    #[must_use]
    pub const fn key_hint(key: &'a str, action: &'a str) -> Self {
        Self::KeyHint { key, action }
    }

    fn rendered(&self) -> String {
        match self {
            StatusItem::Text(text) => (*text).to_owned(),
            StatusItem::KeyHint { key, action } => format!("[{key}] {action}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusLine<'a> {
    left: Vec<StatusItem<'a>>,
    center: Vec<StatusItem<'a>>,
    right: Vec<StatusItem<'a>>,
    style: Style,
    separator: &'a str,
}

impl<'a> StatusLine<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            separator: " ",
            ..Self::default()
        }
    }

    #[must_use]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn separator(mut self, separator: &'a str) -> Self {
        self.separator = separator;
        self
    }

    #[must_use]
    pub fn left(mut self, item: StatusItem<'a>) -> Self {
        self.left.push(item);
        self
    }

    #[must_use]
    pub fn center(mut self, item: StatusItem<'a>) -> Self {
        self.center.push(item);
        self
    }

    #[must_use]
    pub fn right(mut self, item: StatusItem<'a>) -> Self {
        self.right.push(item);
        self
    }

    fn join(&self, items: &[StatusItem<'_>]) -> String {
        items
            .iter()
            .map(StatusItem::rendered)
            .collect::<Vec<_>>()
            .join(self.separator)
    }
}

impl Widget for StatusLine<'_> {
    fn render(&self, area: Rect, frame: &mut Frame) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "widget_render",
            widget = "StatusLine",
            x = area.x,
            y = area.y,
            w = area.width,
            h = area.height
        )
        .entered();

        if area.is_empty() {
            return;
        }
        let Some(row) = area.row(0) else {
            return;
        };
        let mut blank = Cell::from_char(' ');
        self.style.apply_to(&mut blank);
        frame.buffer.fill(row, blank);

        let width = usize::from(row.width);
        let left = self.join(&self.left);
        let center = self.join(&self.center);
        let right = self.join(&self.right);
        let (lw, cw, rw) = (left.width(), center.width(), right.width());

        let right_x = row.right().saturating_sub(rw.min(width) as u16).max(row.x);
        if rw > 0 {
            frame.print_text(right_x, row.y, &right, self.style, row.right());
        }
        let left_end = frame.print_text(row.x, row.y, &left, self.style, right_x);

        if cw > 0 {
            let cx = row.x + (width.saturating_sub(cw) / 2) as u16;
            let fits = (cx > left_end && cx + (cw as u16) < right_x) || (lw == 0 && rw == 0);
            if fits {
                frame.print_text(cx, row.y, &center, self.style, right_x);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(bar: &StatusLine<'_>, width: u16) -> String {
        let mut frame = Frame::new(width, 1);
        bar.render(Rect::new(0, 0, width, 1), &mut frame);
        frame.buffer.row_text(0)
    }

    #[test]
    fn groups_are_placed_left_center_right() {
        let bar = StatusLine::new()
            .left(StatusItem::text("L"))
            .center(StatusItem::text("C"))
            .right(StatusItem::text("R"));
        assert_eq!(render(&bar, 9), "L   C   R");
    }

    #[test]
    fn key_hints_and_separator() {
        let bar = StatusLine::new()
            .separator(" | ")
            .left(StatusItem::key_hint("q", "Quit"))
            .left(StatusItem::key_hint("j/k", "Nav"));
        assert_eq!(render(&bar, 30), "[q] Quit | [j/k] Nav");
    }

    #[test]
    fn center_dropped_when_crowded() {
        let bar = StatusLine::new()
            .left(StatusItem::text("left-side"))
            .center(StatusItem::text("middle"))
            .right(StatusItem::text("right"));
        assert_eq!(render(&bar, 16), "left-side  right");
    }

    #[test]
    fn center_keeps_a_gap_before_right() {
        let fits = StatusLine::new()
            .center(StatusItem::text("CCC"))
            .right(StatusItem::text("RR"));
        assert_eq!(render(&fits, 8), "  CCC RR");

        let touches = StatusLine::new()
            .center(StatusItem::text("CCCC"))
            .right(StatusItem::text("RR"));
        let row = render(&touches, 8);
        assert!(row.ends_with("RR"));
        assert!(!row.contains('C'));
    }

    #[test]
    fn right_group_wins_over_left() {
        let bar = StatusLine::new()
            .left(StatusItem::text("abcdefgh"))
            .right(StatusItem::text("xyz"));
        assert_eq!(render(&bar, 6), "abcxyz");
    }
}
