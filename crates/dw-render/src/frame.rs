#![forbid(unsafe_code)]

//! Frame = buffer + hit grid + cursor for one render pass.
//!
//! A [`Frame`] is handed to `Model::view`. Widgets draw into
//! [`Frame::buffer`] and register clickable regions in the hit grid so the
//! model can map later mouse events back to what was drawn.
//!
//! ```
//! use dw_core::geometry::Rect;
//! use dw_render::frame::{Frame, HitId, HitRegion};
//! use dw_render::style::Style;
//!
//! let mut frame = Frame::new(10, 2);
//! frame.print_text(0, 0, "alerts", Style::new(), 10);
//! frame.register_hit(Rect::new(0, 0, 6, 1), HitId(7), HitRegion::Content, 3);
//! assert_eq!(frame.buffer.row_text(0), "alerts");
//! assert_eq!(frame.hit_test(2, 0), Some((HitId(7), HitRegion::Content, 3)));
//! ```

use dw_core::geometry::Rect;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::buffer::Buffer;
use crate::cell::{Cell, CellContent};
use crate::style::Style;

/// Identifier for a clickable region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HitId(pub u32);

impl HitId {
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }
}

/// Opaque data attached to a hit cell (a row index, a scrollbar part, ...).
pub type HitData = u64;

/// Regions within a widget for mouse interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HitRegion {
    #[default]
    None,
    /// Main content area.
    Content,
    /// Widget border area.
    Border,
    /// Scrollbar track or thumb.
    Scrollbar,
    /// Clickable button.
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitCell {
    pub widget_id: Option<HitId>,
    pub region: HitRegion,
    pub data: HitData,
}

/// Maps screen positions to the widget that drew them.
#[derive(Debug, Clone)]
pub struct HitGrid {
    width: u16,
    height: u16,
    cells: Vec<HitCell>,
}

impl HitGrid {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![HitCell::default(); usize::from(width) * usize::from(height)],
        }
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&HitCell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Register every cell of `rect` (clipped to the grid).
    pub fn register(&mut self, rect: Rect, widget_id: HitId, region: HitRegion, data: HitData) {
        let rect = Rect::from_size(self.width, self.height).intersection(&rect);
        if rect.is_empty() {
            return;
        }
        let hit = HitCell {
            widget_id: Some(widget_id),
            region,
            data,
        };
        let width = usize::from(self.width);
        for y in rect.top()..rect.bottom() {
            let row_start = usize::from(y) * width;
            let start = row_start + usize::from(rect.x);
            let end = row_start + usize::from(rect.right());
            self.cells[start..end].fill(hit);
        }
    }

    #[must_use]
    pub fn hit_test(&self, x: u16, y: u16) -> Option<(HitId, HitRegion, HitData)> {
        self.get(x, y)
            .and_then(|cell| cell.widget_id.map(|id| (id, cell.region, cell.data)))
    }

    /// All hits inside `rect`, in row-major order.
    #[must_use]
    pub fn hits_in(&self, rect: Rect) -> Vec<(HitId, HitRegion, HitData)> {
        let rect = Rect::from_size(self.width, self.height).intersection(&rect);
        let mut hits = Vec::new();
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                if let Some(hit) = self.hit_test(x, y) {
                    hits.push(hit);
                }
            }
        }
        hits
    }

    pub fn clear(&mut self) {
        self.cells.fill(HitCell::default());
    }
}

/// Render target for one pass.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The cell grid.
    pub buffer: Buffer,
    /// Hit grid; `None` for offscreen frames that never receive input.
    pub hit_grid: Option<HitGrid>,
    /// Cursor position, relative to the buffer.
    pub cursor_position: Option<(u16, u16)>,
    pub cursor_visible: bool,
}

impl Frame {
    /// A frame with a hit grid covering the whole buffer.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            buffer: Buffer::new(width, height),
            hit_grid: Some(HitGrid::new(width, height)),
            cursor_position: None,
            cursor_visible: false,
        }
    }

    /// A frame without hit testing, used as a scratch canvas.
    #[must_use]
    pub fn offscreen(width: u16, height: u16) -> Self {
        Self {
            buffer: Buffer::new(width, height),
            hit_grid: None,
            cursor_position: None,
            cursor_visible: false,
        }
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.buffer.width()
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.buffer.height()
    }

    #[must_use]
    pub fn area(&self) -> Rect {
        self.buffer.area()
    }

    pub fn set_cursor(&mut self, position: Option<(u16, u16)>) {
        self.cursor_position = position;
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }

    /// Draw `text` starting at `(x, y)`, stopping before column `max_x`.
    ///
    /// The style is layered over whatever the target cells already hold.
    /// A wide grapheme that would straddle `max_x` is not drawn. Returns
    /// the column after the last drawn grapheme.
    pub fn print_text(&mut self, x: u16, y: u16, text: &str, style: Style, max_x: u16) -> u16 {
        let mut cx = x;
        for grapheme in text.graphemes(true) {
            let width = UnicodeWidthStr::width(grapheme);
            if width == 0 {
                continue;
            }
            let Ok(width) = u16::try_from(width) else {
                break;
            };
            if cx >= max_x || cx.saturating_add(width) > max_x {
                break;
            }
            let Some(ch) = grapheme.chars().next() else {
                continue;
            };

            let mut cell = self.buffer.get(cx, y).copied().unwrap_or_default();
            cell.content = CellContent::Char(ch);
            style.apply_to(&mut cell);
            self.buffer.set(cx, y, cell);
            for dx in 1..width {
                let mut tail = Cell::continuation();
                tail.fg = cell.fg;
                tail.bg = cell.bg;
                self.buffer.set(cx + dx, y, tail);
            }

            cx = cx.saturating_add(width);
        }
        cx
    }

    /// Register a hit region, clipped to the current scissor.
    pub fn register_hit(&mut self, rect: Rect, id: HitId, region: HitRegion, data: HitData) {
        let clipped = self.buffer.current_scissor().intersection(&rect);
        if let Some(grid) = self.hit_grid.as_mut() {
            grid.register(clipped, id, region, data);
        }
    }

    /// Register a plain content region with no extra data.
    pub fn register_hit_region(&mut self, rect: Rect, id: HitId) {
        self.register_hit(rect, id, HitRegion::Content, 0);
    }

    #[must_use]
    pub fn hit_test(&self, x: u16, y: u16) -> Option<(HitId, HitRegion, HitData)> {
        self.hit_grid.as_ref().and_then(|g| g.hit_test(x, y))
    }
}
