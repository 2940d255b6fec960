#![forbid(unsafe_code)]

//! Windowing arithmetic for fixed-height rows.
//!
//! Given a scroll offset, a uniform row height, and how many rows fit in the
//! viewport, [`Windowing::window`] computes the contiguous slice of a list
//! that must be materialized, together with the vertical translation that
//! puts that slice at its true position inside the (mostly virtual) content.
//!
//! Everything here is a pure function of its inputs and runs in O(1); it
//! never looks at the items themselves. Offsets are terminal lines.
//!
//! # Clamping
//!
//! Scroll offsets arrive from input handling and may transiently fall
//! outside the content (negative after an overshooting wheel burst, or past
//! the end after the list shrinks). They are clamped into
//! `[0, max_scroll_offset(len)]` instead of rejected. Zero row height and
//! zero visible rows have no meaningful window; [`Windowing::new`] refuses
//! them so the mistake surfaces where the list is configured.
//!
//! # Example
//!
//! ```
//! use dw_widgets::window::Windowing;
//!
//! let windowing = Windowing::new(40, 5).unwrap();
//! let window = windowing.window(205, 100);
//! assert_eq!(window.range(), 5..11);
//! assert_eq!(window.pixel_offset, 200);
//! ```

use std::num::NonZeroU32;
use std::ops::Range;

/// Invalid windowing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WindowingError {
    #[error("row height must be at least one line")]
    ZeroRowHeight,
    #[error("visible row count must be at least one")]
    ZeroVisibleRows,
}

/// The materialized slice `[start, end)` and its translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VisibleWindow {
    /// First index to render (inclusive).
    pub start: usize,
    /// One past the last index to render.
    pub end: usize,
    /// Content-space line at which `start` begins (`start * row_height`).
    pub pixel_offset: u64,
}

impl VisibleWindow {
    /// The window of an empty list.
    pub const EMPTY: Self = Self {
        start: 0,
        end: 0,
        pixel_offset: 0,
    };

    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    /// Lines of the first row hidden above the viewport at `scroll_offset`.
    #[must_use]
    pub const fn intra_row_offset(&self, scroll_offset: u64) -> u64 {
        scroll_offset.saturating_sub(self.pixel_offset)
    }
}

/// Windowing parameters for one list layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Windowing {
    row_height: NonZeroU32,
    visible_rows: NonZeroU32,
}

impl Windowing {
    /// Parameters for rows of `row_height` lines with `visible_rows` on screen.
    pub fn new(row_height: u32, visible_rows: u32) -> Result<Self, WindowingError> {
        Ok(Self {
            row_height: NonZeroU32::new(row_height).ok_or(WindowingError::ZeroRowHeight)?,
            visible_rows: NonZeroU32::new(visible_rows).ok_or(WindowingError::ZeroVisibleRows)?,
        })
    }

    /// Parameters for a viewport `viewport_height` lines tall.
    ///
    /// Only whole rows count as visible; a viewport shorter than one row
    /// still shows one.
    pub fn for_viewport(row_height: u32, viewport_height: u32) -> Result<Self, WindowingError> {
        let rows = viewport_height.checked_div(row_height).unwrap_or(0).max(1);
        Self::new(row_height, rows)
    }

    #[inline]
    #[must_use]
    pub const fn row_height(&self) -> u32 {
        self.row_height.get()
    }

    #[inline]
    #[must_use]
    pub const fn visible_rows(&self) -> u32 {
        self.visible_rows.get()
    }

    /// Total scrollable extent of `len` rows.
    #[must_use]
    pub fn content_extent(&self, len: usize) -> u64 {
        (len as u64).saturating_mul(u64::from(self.row_height()))
    }

    /// Lines the viewport shows when fully populated.
    #[must_use]
    pub fn viewport_extent(&self) -> u64 {
        u64::from(self.visible_rows()) * u64::from(self.row_height())
    }

    /// Largest offset at which the last row is still the bottom visible row.
    #[must_use]
    pub fn max_scroll_offset(&self, len: usize) -> u64 {
        (len as u64)
            .saturating_sub(u64::from(self.visible_rows()))
            .saturating_mul(u64::from(self.row_height()))
    }

    /// Clamp a reported offset into `[0, max_scroll_offset(len)]`.
    #[must_use]
    pub fn clamp_offset(&self, offset: i64, len: usize) -> u64 {
        u64::try_from(offset)
            .unwrap_or(0)
            .min(self.max_scroll_offset(len))
    }

    /// The slice of a `len`-item list to render at `scroll_offset`.
    #[must_use]
    pub fn window(&self, scroll_offset: i64, len: usize) -> VisibleWindow {
        if len == 0 {
            return VisibleWindow::EMPTY;
        }
        let row_height = u64::from(self.row_height());
        let offset = self.clamp_offset(scroll_offset, len);

        let start = usize::try_from(offset / row_height)
            .unwrap_or(usize::MAX)
            .min(len);
        let span = usize::try_from(self.visible_rows())
            .unwrap_or(usize::MAX)
            .saturating_add(1);
        let end = start.saturating_add(span).min(len);

        VisibleWindow {
            start,
            end,
            pixel_offset: start as u64 * row_height,
        }
    }

    /// Item under viewport line `y` when scrolled to `scroll_offset`.
    #[must_use]
    pub fn row_at(&self, scroll_offset: i64, y: u32, len: usize) -> Option<usize> {
        if u64::from(y) >= self.viewport_extent() {
            return None;
        }
        let line = self.clamp_offset(scroll_offset, len) + u64::from(y);
        let index = usize::try_from(line / u64::from(self.row_height())).ok()?;
        (index < len).then_some(index)
    }

    /// The offset closest to `current` at which row `index` is fully visible.
    #[must_use]
    pub fn offset_revealing(&self, current: i64, index: usize, len: usize) -> u64 {
        let current = self.clamp_offset(current, len);
        if index >= len {
            return current;
        }
        let top = index as u64 * u64::from(self.row_height());
        let bottom = top + u64::from(self.row_height());
        let target = if top < current {
            top
        } else if bottom > current + self.viewport_extent() {
            bottom - self.viewport_extent()
        } else {
            current
        };
        target.min(self.max_scroll_offset(len))
    }
}
