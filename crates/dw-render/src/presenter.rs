#![forbid(unsafe_code)]

//! ANSI presentation.
//!
//! [`Presenter`] keeps the last presented buffer and writes only the cells
//! that changed. A size change (or the first frame) repaints everything.

use std::io::{self, Write};

use crossterm::style::{
    Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::{cursor, queue, terminal};

use crate::buffer::Buffer;
use crate::cell::{Cell, PackedRgba, StyleFlags};

/// Diffing ANSI writer over any `Write`.
#[derive(Debug)]
pub struct Presenter<W: Write> {
    out: W,
    previous: Option<Buffer>,
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            previous: None,
        }
    }

    /// Forget the last frame so the next present repaints fully.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write the cells of `buffer` that differ from the last presented frame.
    ///
    /// Returns the number of cells written.
    pub fn present(&mut self, buffer: &Buffer, cursor: Option<(u16, u16)>) -> io::Result<usize> {
        let full = self
            .previous
            .as_ref()
            .is_none_or(|prev| prev.width() != buffer.width() || prev.height() != buffer.height());
        if full {
            queue!(self.out, terminal::Clear(terminal::ClearType::All))?;
        }

        let mut written = 0;
        let mut pen: Option<Cell> = None;
        let mut at: Option<(u16, u16)> = None;
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                let Some(cell) = buffer.get(x, y) else {
                    continue;
                };
                if cell.content.is_continuation() {
                    continue;
                }
                let unchanged = !full
                    && self
                        .previous
                        .as_ref()
                        .and_then(|prev| prev.get(x, y))
                        .is_some_and(|old| old == cell);
                if unchanged {
                    continue;
                }

                if at != Some((x, y)) {
                    queue!(self.out, cursor::MoveTo(x, y))?;
                }
                if pen.is_none_or(|p| p.fg != cell.fg || p.bg != cell.bg || p.attrs != cell.attrs)
                {
                    self.write_pen(cell)?;
                    pen = Some(*cell);
                }
                queue!(self.out, Print(cell.symbol()))?;
                let advance = if buffer.get(x + 1, y).is_some_and(|c| c.content.is_continuation()) {
                    2
                } else {
                    1
                };
                at = Some((x.saturating_add(advance), y));
                written += 1;
            }
        }

        queue!(self.out, SetAttribute(Attribute::Reset))?;
        match cursor {
            Some((x, y)) => queue!(self.out, cursor::MoveTo(x, y), cursor::Show)?,
            None => queue!(self.out, cursor::Hide)?,
        }
        self.out.flush()?;

        #[cfg(feature = "tracing")]
        tracing::trace!(written, full, "frame presented");

        self.previous = Some(buffer.clone());
        Ok(written)
    }

    fn write_pen(&mut self, cell: &Cell) -> io::Result<()> {
        queue!(
            self.out,
            SetAttribute(Attribute::Reset),
            SetForegroundColor(to_color(cell.fg)),
            SetBackgroundColor(to_color(cell.bg)),
        )?;
        for (flag, attr) in [
            (StyleFlags::BOLD, Attribute::Bold),
            (StyleFlags::DIM, Attribute::Dim),
            (StyleFlags::ITALIC, Attribute::Italic),
            (StyleFlags::UNDERLINE, Attribute::Underlined),
            (StyleFlags::REVERSE, Attribute::Reverse),
            (StyleFlags::STRIKETHROUGH, Attribute::CrossedOut),
        ] {
            if cell.attrs.contains(flag) {
                queue!(self.out, SetAttribute(attr))?;
            }
        }
        Ok(())
    }
}

fn to_color(color: PackedRgba) -> Color {
    if color.is_transparent() {
        Color::Reset
    } else {
        Color::Rgb {
            r: color.r(),
            g: color.g(),
            b: color.b(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dw_core::geometry::Rect;

    fn buffer_with(text: &str) -> Buffer {
        let mut buf = Buffer::new(8, 1);
        for (x, ch) in text.chars().enumerate() {
            buf.set(x as u16, 0, Cell::from_char(ch));
        }
        buf
    }

    #[test]
    fn first_present_writes_every_cell() {
        let mut presenter = Presenter::new(Vec::new());
        let written = presenter.present(&buffer_with("alert"), None).unwrap();
        assert_eq!(written, 8);
        let out = String::from_utf8_lossy(presenter.writer()).into_owned();
        assert!(out.contains('a'));
        assert!(out.contains('t'));
    }

    #[test]
    fn unchanged_frame_writes_nothing() {
        let mut presenter = Presenter::new(Vec::new());
        let buf = buffer_with("alert");
        presenter.present(&buf, None).unwrap();
        assert_eq!(presenter.present(&buf, None).unwrap(), 0);
    }

    #[test]
    fn only_changed_cells_are_written() {
        let mut presenter = Presenter::new(Vec::new());
        presenter.present(&buffer_with("alert"), None).unwrap();
        assert_eq!(presenter.present(&buffer_with("alarm"), None).unwrap(), 2);
    }

    #[test]
    fn resize_forces_full_repaint() {
        let mut presenter = Presenter::new(Vec::new());
        presenter.present(&buffer_with("x"), None).unwrap();
        let mut bigger = Buffer::new(4, 2);
        bigger.fill(Rect::from_size(4, 2), Cell::from_char('y'));
        assert_eq!(presenter.present(&bigger, None).unwrap(), 8);
    }

    #[test]
    fn invalidate_repaints() {
        let mut presenter = Presenter::new(Vec::new());
        let buf = buffer_with("ok");
        presenter.present(&buf, None).unwrap();
        presenter.invalidate();
        assert_eq!(presenter.present(&buf, None).unwrap(), 8);
    }

    #[test]
    fn transparent_maps_to_reset() {
        assert_eq!(to_color(PackedRgba::TRANSPARENT), Color::Reset);
        assert_eq!(
            to_color(PackedRgba::rgb(1, 2, 3)),
            Color::Rgb { r: 1, g: 2, b: 3 }
        );
    }
}
