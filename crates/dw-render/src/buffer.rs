#![forbid(unsafe_code)]

//! A rectangular grid of cells with a scissor stack.
//!
//! Writes through [`Buffer::set`] are dropped when they fall outside the
//! buffer or outside the innermost scissor rect. Widgets never need to
//! bounds-check their own output.

use dw_core::geometry::Rect;

use crate::cell::Cell;
use crate::style::Style;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    scissor: Vec<Rect>,
}

impl Buffer {
    /// A blank buffer. Zero dimensions are allowed and hold no cells.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); usize::from(width) * usize::from(height)],
            scissor: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[must_use]
    pub const fn area(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        let i = self.index(x, y)?;
        Some(&mut self.cells[i])
    }

    /// The rect writes are currently clipped to.
    #[must_use]
    pub fn current_scissor(&self) -> Rect {
        self.scissor.last().copied().unwrap_or_else(|| self.area())
    }

    /// Narrow the writable region to `rect` (intersected with the current one).
    pub fn push_scissor(&mut self, rect: Rect) {
        let clipped = self.current_scissor().intersection(&rect);
        self.scissor.push(clipped);
    }

    pub fn pop_scissor(&mut self) {
        self.scissor.pop();
    }

    /// Write a cell, honoring bounds and the scissor.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if !self.current_scissor().contains(x, y) {
            return;
        }
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// Fill a rect with copies of `cell`.
    pub fn fill(&mut self, rect: Rect, cell: Cell) {
        let rect = self.current_scissor().intersection(&rect);
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                self.set(x, y, cell);
            }
        }
    }

    /// Apply a style to every cell in `rect`, keeping content.
    pub fn set_style(&mut self, rect: Rect, style: Style) {
        if style.is_empty() {
            return;
        }
        let rect = self.current_scissor().intersection(&rect);
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                if let Some(cell) = self.get_mut(x, y) {
                    style.apply_to(cell);
                }
            }
        }
    }

    /// Reset every cell to blank.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Copy `height` rows of `src`, starting at `src_y`, so that they land
    /// at `(dst_x, dst_y)` in this buffer.
    ///
    /// Rows or columns that fall outside either buffer (or the scissor) are
    /// skipped.
    pub fn copy_rows_from(
        &mut self,
        src: &Buffer,
        src_y: u16,
        height: u16,
        dst_x: u16,
        dst_y: u16,
    ) {
        for row in 0..height {
            let Some(sy) = src_y.checked_add(row) else {
                break;
            };
            let Some(dy) = dst_y.checked_add(row) else {
                break;
            };
            if sy >= src.height {
                break;
            }
            for sx in 0..src.width {
                let Some(dx) = dst_x.checked_add(sx) else {
                    break;
                };
                if let Some(cell) = src.get(sx, sy) {
                    self.set(dx, dy, *cell);
                }
            }
        }
    }

    /// Text of one row with trailing blanks trimmed. Out of range rows are empty.
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let mut line: String = (0..self.width)
            .filter_map(|x| self.get(x, y))
            .filter(|cell| !cell.content.is_continuation())
            .map(Cell::symbol)
            .collect();
        line.truncate(line.trim_end().len());
        line
    }

    /// Every row as text, for snapshot-style assertions.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        (0..self.height).map(|y| self.row_text(y)).collect()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::PackedRgba;

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut buf = Buffer::new(3, 2);
        buf.set(5, 5, Cell::from_char('x'));
        assert!(buf.cells().iter().all(|c| *c == Cell::default()));
        assert!(buf.get(3, 0).is_none());
    }

    #[test]
    fn zero_sized_buffer_is_usable() {
        let mut buf = Buffer::new(0, 0);
        buf.set(0, 0, Cell::from_char('x'));
        buf.fill(Rect::from_size(4, 4), Cell::from_char('y'));
        assert!(buf.lines().is_empty());
    }

    #[test]
    fn scissor_clips_and_nests() {
        let mut buf = Buffer::new(5, 5);
        buf.push_scissor(Rect::new(1, 1, 3, 3));
        buf.push_scissor(Rect::new(2, 0, 5, 5));
        assert_eq!(buf.current_scissor(), Rect::new(2, 1, 2, 3));
        buf.fill(buf.area(), Cell::from_char('#'));
        buf.pop_scissor();
        buf.pop_scissor();
        assert_eq!(buf.row_text(0), "");
        assert_eq!(buf.row_text(1), "  ##");
        assert_eq!(buf.row_text(4), "");
    }

    #[test]
    fn set_style_keeps_content() {
        let mut buf = Buffer::new(2, 1);
        buf.set(0, 0, Cell::from_char('a'));
        buf.set_style(buf.area(), Style::new().bg(PackedRgba::BLACK));
        let cell = buf.get(0, 0).copied().unwrap_or_default();
        assert_eq!(cell.content.as_char(), Some('a'));
        assert_eq!(cell.bg, PackedRgba::BLACK);
    }

    #[test]
    fn copy_rows_offsets_source_and_destination() {
        let mut src = Buffer::new(2, 4);
        for (y, ch) in ['a', 'b', 'c', 'd'].into_iter().enumerate() {
            src.fill(Rect::new(0, y as u16, 2, 1), Cell::from_char(ch));
        }
        let mut dst = Buffer::new(4, 3);
        dst.copy_rows_from(&src, 1, 3, 1, 0);
        assert_eq!(dst.lines(), vec![" bb", " cc", " dd"]);
    }

    #[test]
    fn copy_rows_stops_at_source_end() {
        let src = Buffer::new(2, 1);
        let mut dst = Buffer::new(2, 3);
        dst.fill(dst.area(), Cell::from_char('z'));
        dst.copy_rows_from(&src, 0, 3, 0, 0);
        assert_eq!(dst.lines(), vec!["", "zz", "zz"]);
    }
}
