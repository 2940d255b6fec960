#![forbid(unsafe_code)]

//! Windowed list for large sequences of fixed-height rows.
//!
//! [`VirtualList`] renders only the rows that intersect its viewport. The
//! scrollable extent is still `len * row_height`, so the scrollbar reflects
//! the whole sequence while the cost of a frame depends only on how many
//! rows fit on screen.
//!
//! The scroll offset lives in a [`ScrollSource`] owned by
//! [`VirtualListState`]. The state subscribes to it for its whole lifetime
//! and recomputes the [`VisibleWindow`] on every change, so the window is
//! always current when the next frame asks for it.
//!
//! # Rendering
//!
//! Rows of the window are drawn into an offscreen strip, row `k` at strip
//! line `k * row_height`, each clipped to its own slot. The strip lines
//! from `scroll - pixel_offset` onward are then copied into the viewport.
//! The result is the same, cell for cell, as drawing every row into a
//! canvas of the full content height and cutting out the viewport.
//!
//! # Viewport height
//!
//! The viewport is `floor(height / row_height)` whole rows tall. When the
//! inner area is not a multiple of the row height the leftover bottom
//! lines stay blank. Scrolled to the end, the last row then sits flush
//! with the viewport bottom and the window never needs more than
//! `visible + 1` rows.
//!
//! # Example
//!
//! ```
//! use dw_core::geometry::Rect;
//! use dw_render::frame::Frame;
//! use dw_widgets::StatefulWidget;
//! use dw_widgets::virtual_list::{VirtualList, VirtualListState};
//!
//! let items: Vec<String> = (0..1_000).map(|i| format!("alert {i}")).collect();
//! let list = VirtualList::from_fn(&items, |item: &String, _, area: Rect, frame: &mut Frame, _| {
//!     frame.print_text(area.x, area.y, item, Default::default(), area.right());
//! })
//! .show_scrollbar(false);
//!
//! let mut state = VirtualListState::new();
//! let mut frame = Frame::new(12, 3);
//! list.render(Rect::new(0, 0, 12, 3), &mut frame, &mut state);
//! state.scroll_by(500);
//! list.render(Rect::new(0, 0, 12, 3), &mut frame, &mut state);
//! assert_eq!(frame.buffer.row_text(0), "alert 500");
//! assert_eq!(state.window().range(), 500..504);
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use dw_core::event::{MouseButton, MouseEvent, MouseEventKind};
use dw_core::geometry::Rect;
use dw_render::frame::{Frame, HitData, HitId, HitRegion};
use dw_render::style::Style;

use crate::StatefulWidget;
use crate::Widget;
use crate::block::Block;
use crate::mouse::MouseResult;
use crate::scroll::{ScrollSource, ScrollSubscription};
use crate::scrollbar::{Scrollbar, ScrollbarSide, ScrollbarState};
use crate::window::{VisibleWindow, Windowing};

/// Lines moved per mouse wheel notch.
pub const WHEEL_LINES: i64 = 3;

/// Draws one item into its row slot.
///
/// `area` is exactly one row tall (`row_height` lines) and writes outside
/// it are clipped. The list calls this once per item in the visible window
/// and never for any other item.
pub trait RowRenderer<T> {
    fn render_row(&self, item: &T, index: usize, area: Rect, frame: &mut Frame, selected: bool);
}

impl<T, F> RowRenderer<T> for F
where
    F: Fn(&T, usize, Rect, &mut Frame, bool),
{
    fn render_row(&self, item: &T, index: usize, area: Rect, frame: &mut Frame, selected: bool) {
        self(item, index, area, frame, selected);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ListLayout {
    windowing: Windowing,
    len: usize,
}

/// Scroll and selection state of a [`VirtualList`].
pub struct VirtualListState {
    scroll: ScrollSource,
    layout: Rc<Cell<Option<ListLayout>>>,
    window: Rc<Cell<VisibleWindow>>,
    selected: Option<usize>,
    reveal_pending: bool,
    viewport: Rect,
    scrollbar_area: Option<Rect>,
    _subscription: ScrollSubscription,
}

impl fmt::Debug for VirtualListState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualListState")
            .field("offset", &self.scroll.offset())
            .field("window", &self.window.get())
            .field("selected", &self.selected)
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

impl Default for VirtualListState {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualListState {
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(ScrollSource::default())
    }

    /// State driven by an existing scroll source.
    #[must_use]
    pub fn with_source(scroll: ScrollSource) -> Self {
        let layout: Rc<Cell<Option<ListLayout>>> = Rc::new(Cell::new(None));
        let window = Rc::new(Cell::new(VisibleWindow::EMPTY));

        let subscription = {
            let layout = Rc::clone(&layout);
            let window = Rc::clone(&window);
            scroll.subscribe(move |event| {
                if let Some(l) = layout.get() {
                    window.set(l.windowing.window(event.offset, l.len));
                }
            })
        };

        Self {
            scroll,
            layout,
            window,
            selected: None,
            reveal_pending: false,
            viewport: Rect::default(),
            scrollbar_area: None,
            _subscription: subscription,
        }
    }

    /// Handle to the offset this state listens to.
    #[must_use]
    pub fn scroll_source(&self) -> &ScrollSource {
        &self.scroll
    }

    /// Current scroll offset in lines.
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.scroll.offset()
    }

    /// Window computed for the current offset and the last layout.
    #[must_use]
    pub fn window(&self) -> VisibleWindow {
        self.window.get()
    }

    /// Viewport the list was last rendered into.
    #[must_use]
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Scroll by `delta` lines, clamped to the content once a layout is known.
    pub fn scroll_by(&mut self, delta: i64) {
        let target = self.scroll.offset().saturating_add(delta);
        self.set_offset(target);
    }

    pub fn scroll_to(&mut self, offset: i64) {
        self.set_offset(offset);
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index;
        self.reveal_selected();
    }

    pub fn select_next(&mut self, len: usize) {
        let next = match (len, self.selected) {
            (0, _) => None,
            (_, Some(i)) => Some((i + 1).min(len - 1)),
            (_, None) => Some(0),
        };
        self.select(next);
    }

    pub fn select_prev(&mut self) {
        let prev = self.selected.map_or(0, |i| i.saturating_sub(1));
        self.select(Some(prev));
    }

    pub fn select_first(&mut self) {
        self.select(Some(0));
    }

    pub fn select_last(&mut self, len: usize) {
        self.select(len.checked_sub(1));
    }

    /// Move down one viewport.
    pub fn page_down(&mut self, len: usize) {
        let (rows, lines) = self.page_size();
        if let Some(i) = self.selected
            && len > 0
        {
            self.selected = Some(i.saturating_add(rows).min(len - 1));
        }
        self.scroll_by(lines);
        self.reveal_selected();
    }

    /// Move up one viewport.
    pub fn page_up(&mut self) {
        let (rows, lines) = self.page_size();
        if let Some(i) = self.selected {
            self.selected = Some(i.saturating_sub(rows));
        }
        self.scroll_by(-lines);
        self.reveal_selected();
    }

    /// Item under screen row `y` in the last rendered viewport.
    #[must_use]
    pub fn row_at(&self, y: u16) -> Option<usize> {
        let layout = self.layout.get()?;
        if y < self.viewport.top() || y >= self.viewport.bottom() {
            return None;
        }
        let rel = u32::from(y - self.viewport.y);
        layout.windowing.row_at(self.scroll.offset(), rel, layout.len)
    }

    /// Apply a mouse event.
    ///
    /// `hit` is the frame's hit test at the event position, when the caller
    /// has one. Without it the last rendered geometry is used.
    pub fn handle_mouse(
        &mut self,
        event: &MouseEvent,
        hit: Option<(HitId, HitRegion, HitData)>,
        expected_id: HitId,
        len: usize,
    ) -> MouseResult {
        match event.kind {
            MouseEventKind::ScrollUp if self.viewport.contains(event.x, event.y) => {
                self.scroll_by(-WHEEL_LINES);
                MouseResult::Scrolled
            }
            MouseEventKind::ScrollDown if self.viewport.contains(event.x, event.y) => {
                self.scroll_by(WHEEL_LINES);
                MouseResult::Scrolled
            }
            MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Drag(MouseButton::Left) => {
                let hit = hit.or_else(|| self.geometric_hit(event, expected_id));
                match hit {
                    Some((id, HitRegion::Scrollbar, _)) if id == expected_id => {
                        self.drag_scrollbar(event, hit, expected_id)
                    }
                    Some((id, HitRegion::Content, data)) if id == expected_id => {
                        if !matches!(event.kind, MouseEventKind::Down(_)) {
                            return MouseResult::Ignored;
                        }
                        let Ok(index) = usize::try_from(data) else {
                            return MouseResult::Ignored;
                        };
                        if index >= len {
                            return MouseResult::Ignored;
                        }
                        if self.selected == Some(index) {
                            MouseResult::Activated(index)
                        } else {
                            self.select(Some(index));
                            MouseResult::Selected(index)
                        }
                    }
                    _ => MouseResult::Ignored,
                }
            }
            _ => MouseResult::Ignored,
        }
    }

    /// Record the layout of a render pass and bring offset and selection
    /// in line with it.
    pub fn relayout(&mut self, windowing: Windowing, len: usize) {
        self.layout.set(Some(ListLayout { windowing, len }));

        self.selected = match self.selected {
            Some(_) if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => None,
        };

        let mut target = windowing.clamp_offset(self.scroll.offset(), len);
        if self.reveal_pending {
            if let Some(i) = self.selected {
                target = windowing.offset_revealing(target as i64, i, len);
            }
            self.reveal_pending = false;
        }
        self.scroll.set(target as i64);
        // The offset may be unchanged while the layout is not.
        self.window.set(windowing.window(self.scroll.offset(), len));
    }

    fn set_offset(&mut self, raw: i64) {
        let offset = match self.layout.get() {
            Some(l) => l.windowing.clamp_offset(raw, l.len) as i64,
            None => raw,
        };
        self.scroll.set(offset);
    }

    fn reveal_selected(&mut self) {
        let (Some(index), Some(layout)) = (self.selected, self.layout.get()) else {
            self.reveal_pending = self.selected.is_some();
            return;
        };
        if index >= layout.len {
            // The list grew since the last layout; finish on the next one.
            self.reveal_pending = true;
            return;
        }
        let target = layout
            .windowing
            .offset_revealing(self.scroll.offset(), index, layout.len);
        self.scroll.set(target as i64);
        self.reveal_pending = false;
    }

    fn page_size(&self) -> (usize, i64) {
        match self.layout.get() {
            Some(l) => (
                l.windowing.visible_rows() as usize,
                l.windowing.viewport_extent() as i64,
            ),
            None => (1, 1),
        }
    }

    fn geometric_hit(
        &self,
        event: &MouseEvent,
        expected_id: HitId,
    ) -> Option<(HitId, HitRegion, HitData)> {
        if let Some(bar) = self.scrollbar_area
            && bar.contains(event.x, event.y)
        {
            return Some((
                expected_id,
                HitRegion::Scrollbar,
                u64::from(event.y - bar.y),
            ));
        }
        if !self.viewport.contains(event.x, event.y) {
            return None;
        }
        let index = self.row_at(event.y)?;
        Some((expected_id, HitRegion::Content, index as HitData))
    }

    fn drag_scrollbar(
        &mut self,
        event: &MouseEvent,
        hit: Option<(HitId, HitRegion, HitData)>,
        expected_id: HitId,
    ) -> MouseResult {
        let Some(layout) = self.layout.get() else {
            return MouseResult::Ignored;
        };
        let viewport = u64::from(self.viewport.height);
        let mut bar = ScrollbarState::new(
            layout.windowing.content_extent(layout.len),
            layout.windowing.clamp_offset(self.scroll.offset(), layout.len),
            viewport,
        );
        let result = bar.handle_mouse(event, hit, expected_id);
        if result == MouseResult::Scrolled {
            self.set_offset(i64::try_from(bar.position).unwrap_or(i64::MAX));
        }
        result
    }
}

/// A list widget that renders only the rows in view.
pub struct VirtualList<'a, T, R> {
    items: &'a [T],
    renderer: R,
    row_height: u16,
    block: Option<Block<'a>>,
    style: Style,
    highlight_style: Style,
    show_scrollbar: bool,
    scrollbar_style: Style,
    hit_id: Option<HitId>,
}

impl<T, R> fmt::Debug for VirtualList<'_, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualList")
            .field("items", &self.items.len())
            .field("row_height", &self.row_height)
            .field("show_scrollbar", &self.show_scrollbar)
            .field("hit_id", &self.hit_id)
            .finish_non_exhaustive()
    }
}

impl<'a, T, R: RowRenderer<T>> VirtualList<'a, T, R> {
    #[must_use]
    pub fn new(items: &'a [T], renderer: R) -> Self {
        Self {
            items,
            renderer,
            row_height: 1,
            block: None,
            style: Style::new(),
            highlight_style: Style::new(),
            show_scrollbar: true,
            scrollbar_style: Style::new(),
            hit_id: None,
        }
    }

    /// Lines per row.
    #[must_use]
    pub fn row_height(mut self, lines: u16) -> Self {
        self.row_height = lines;
        self
    }

    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    #[must_use]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Style layered over the selected row before it is drawn.
    #[must_use]
    pub fn highlight_style(mut self, style: Style) -> Self {
        self.highlight_style = style;
        self
    }

    #[must_use]
    pub fn show_scrollbar(mut self, show: bool) -> Self {
        self.show_scrollbar = show;
        self
    }

    #[must_use]
    pub fn scrollbar_style(mut self, style: Style) -> Self {
        self.scrollbar_style = style;
        self
    }

    /// Register row and scrollbar hit regions under `id`.
    #[must_use]
    pub fn hit_id(mut self, id: HitId) -> Self {
        self.hit_id = Some(id);
        self
    }
}

impl<'a, T, F> VirtualList<'a, T, F>
where
    F: Fn(&T, usize, Rect, &mut Frame, bool),
{
    /// List drawn by a closure.
    #[must_use]
    pub fn from_fn(items: &'a [T], renderer: F) -> Self {
        Self::new(items, renderer)
    }
}

impl<T, R: RowRenderer<T>> VirtualList<'_, T, R> {
    fn render_strip(
        &self,
        window: VisibleWindow,
        width: u16,
        strip_height: u16,
        selected: Option<usize>,
    ) -> Frame {
        let mut strip = Frame::offscreen(width, strip_height);
        strip.buffer.set_style(strip.area(), self.style);
        for (k, index) in window.range().enumerate() {
            let Some(item) = self.items.get(index) else {
                break;
            };
            let y = (k as u16).saturating_mul(self.row_height);
            let slot = Rect::new(0, y, width, self.row_height);
            let is_selected = selected == Some(index);
            strip.buffer.push_scissor(slot);
            if is_selected {
                strip.buffer.set_style(slot, self.highlight_style);
            }
            self.renderer
                .render_row(item, index, slot, &mut strip, is_selected);
            strip.buffer.pop_scissor();
        }
        strip
    }

    fn register_row_hits(
        &self,
        frame: &mut Frame,
        id: HitId,
        content: Rect,
        window: VisibleWindow,
        scroll: u64,
        view_height: u16,
    ) {
        let row_height = u64::from(self.row_height);
        let view_end = scroll + u64::from(view_height);
        for (k, index) in window.range().enumerate() {
            let top = window.pixel_offset + k as u64 * row_height;
            let bottom = top + row_height;
            let visible_top = top.max(scroll);
            let visible_bottom = bottom.min(view_end);
            if visible_top >= visible_bottom {
                continue;
            }
            let y = content.y + (visible_top - scroll) as u16;
            let height = (visible_bottom - visible_top) as u16;
            frame.register_hit(
                Rect::new(content.x, y, content.width, height),
                id,
                HitRegion::Content,
                index as HitData,
            );
        }
    }
}

impl<T, R: RowRenderer<T>> StatefulWidget for VirtualList<'_, T, R> {
    type State = VirtualListState;

    fn render(&self, area: Rect, frame: &mut Frame, state: &mut Self::State) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "widget_render",
            widget = "VirtualList",
            x = area.x,
            y = area.y,
            w = area.width,
            h = area.height,
            items = self.items.len()
        )
        .entered();

        if area.is_empty() {
            return;
        }
        frame.buffer.set_style(area, self.style);
        let inner = match &self.block {
            Some(block) => {
                block.render(area, frame);
                block.inner(area)
            }
            None => area,
        };
        if inner.is_empty() {
            return;
        }

        let windowing =
            match Windowing::for_viewport(u32::from(self.row_height), u32::from(inner.height)) {
                Ok(windowing) => windowing,
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %_err, "virtual list not rendered");
                    return;
                }
            };

        let len = self.items.len();
        let needs_scrollbar = self.show_scrollbar
            && windowing.content_extent(len) > u64::from(inner.height)
            && inner.width > 1;
        let (content, bar_strip) = if needs_scrollbar {
            let (content, bar) = inner.split_right(1);
            (content, Some(bar))
        } else {
            (inner, None)
        };

        let view_height = windowing.viewport_extent().min(u64::from(inner.height)) as u16;
        let viewport = Rect::new(content.x, content.y, content.width, view_height);
        state.viewport = viewport;
        state.scrollbar_area = bar_strip.map(|bar| Rect::new(bar.x, bar.y, 1, view_height));
        state.relayout(windowing, len);

        let window = state.window();
        let scroll = windowing.clamp_offset(state.offset(), len);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            start = window.start,
            end = window.end,
            scroll,
            "virtual list window"
        );

        if !window.is_empty() {
            let strip_lines = window.len() as u64 * u64::from(self.row_height);
            let Ok(strip_height) = u16::try_from(strip_lines) else {
                #[cfg(feature = "tracing")]
                tracing::warn!(strip_lines, "virtual list window too tall to render");
                return;
            };
            let strip = self.render_strip(window, content.width, strip_height, state.selected);
            let intra = window.intra_row_offset(scroll) as u16;
            frame.buffer.push_scissor(viewport);
            frame
                .buffer
                .copy_rows_from(&strip.buffer, intra, view_height, content.x, content.y);
            frame.buffer.pop_scissor();

            if let Some(id) = self.hit_id {
                self.register_row_hits(frame, id, content, window, scroll, view_height);
            }
        }

        if let Some(bar_area) = state.scrollbar_area {
            let mut bar_state = ScrollbarState::new(
                windowing.content_extent(len),
                scroll,
                u64::from(view_height),
            );
            let mut scrollbar = Scrollbar::new(ScrollbarSide::Right)
                .thumb_style(self.scrollbar_style)
                .track_style(self.scrollbar_style);
            if let Some(id) = self.hit_id {
                scrollbar = scrollbar.hit_id(id);
            }
            scrollbar.render(bar_area, frame, &mut bar_state);
        }
    }
}
