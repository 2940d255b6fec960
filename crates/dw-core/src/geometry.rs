#![forbid(unsafe_code)]

//! Cell-space geometry primitives.
//!
//! All coordinates are terminal cells with the origin at the top-left
//! corner. Arithmetic saturates so a rectangle never wraps past `u16::MAX`.

/// A width/height pair in cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    /// Width in columns.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An axis-aligned rectangle in cell space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left column.
    pub x: u16,
    /// Top row.
    pub y: u16,
    /// Width in columns.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle anchored at the origin.
    #[must_use]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Whether the rectangle covers no cells.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of cells covered.
    #[must_use]
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    #[inline]
    #[must_use]
    pub const fn left(&self) -> u16 {
        self.x
    }

    #[inline]
    #[must_use]
    pub const fn top(&self) -> u16 {
        self.y
    }

    /// One past the last column.
    #[inline]
    #[must_use]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// One past the last row.
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether the cell `(x, y)` lies inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Overlap of two rectangles. Empty (at `self`'s origin) when disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return Rect::new(self.x, self.y, 0, 0);
        }
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Shrink by `margin` cells on every side.
    #[must_use]
    pub fn inner(&self, margin: u16) -> Rect {
        let double = margin.saturating_mul(2);
        Rect::new(
            self.x.saturating_add(margin),
            self.y.saturating_add(margin),
            self.width.saturating_sub(double),
            self.height.saturating_sub(double),
        )
    }

    /// Split off `width` columns from the right edge.
    ///
    /// Returns `(remaining, strip)`. The strip is clamped to the available width.
    #[must_use]
    pub fn split_right(&self, width: u16) -> (Rect, Rect) {
        let w = width.min(self.width);
        let remaining = Rect::new(self.x, self.y, self.width - w, self.height);
        let strip = Rect::new(self.right() - w, self.y, w, self.height);
        (remaining, strip)
    }

    /// A single row of this rectangle, if `offset` is inside it.
    #[must_use]
    pub fn row(&self, offset: u16) -> Option<Rect> {
        (offset < self.height)
            .then(|| Rect::new(self.x, self.y.saturating_add(offset), self.width, 1))
    }
}
