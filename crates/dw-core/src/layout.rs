#![forbid(unsafe_code)]

//! One-dimensional flex layout.
//!
//! [`Flex`] splits a [`Rect`] along one axis according to a list of
//! [`Constraint`]s. Every returned rect lies inside the parent and the sizes
//! never sum past the available space.
//!
//! # Example
//!
//! ```
//! use dw_core::geometry::Rect;
//! use dw_core::layout::{Constraint, Flex};
//!
//! let rows = Flex::vertical()
//!     .constraints([Constraint::Fixed(1), Constraint::Fill, Constraint::Fixed(1)])
//!     .split(Rect::from_size(80, 24));
//! assert_eq!(rows[1].height, 22);
//! ```

use crate::geometry::Rect;

/// Split axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Stack top to bottom.
    #[default]
    Vertical,
    /// Stack left to right.
    Horizontal,
}

/// Size request for one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// Exactly this many cells (less only if space runs out).
    Fixed(u16),
    /// A share of the total, in percent.
    Percentage(f32),
    /// At least this many cells, growing into leftover space.
    Min(u16),
    /// Whatever is left, shared with other growable segments.
    Fill,
}

impl Constraint {
    fn base(self, total: u16) -> u16 {
        match self {
            Constraint::Fixed(n) | Constraint::Min(n) => n,
            Constraint::Percentage(p) => {
                let p = p.clamp(0.0, 100.0);
                (f32::from(total) * p / 100.0).floor() as u16
            }
            Constraint::Fill => 0,
        }
    }

    fn grows(self) -> bool {
        matches!(self, Constraint::Min(_) | Constraint::Fill)
    }
}

/// A flex splitter.
#[derive(Debug, Clone, Default)]
pub struct Flex {
    direction: Direction,
    constraints: Vec<Constraint>,
}

impl Flex {
    #[must_use]
    pub fn vertical() -> Self {
        Self {
            direction: Direction::Vertical,
            constraints: Vec::new(),
        }
    }

    #[must_use]
    pub fn horizontal() -> Self {
        Self {
            direction: Direction::Horizontal,
            constraints: Vec::new(),
        }
    }

    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn constraints(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints = constraints.into_iter().collect();
        self
    }

    /// Split `area` into one rect per constraint.
    #[must_use]
    pub fn split(&self, area: Rect) -> Vec<Rect> {
        let total = match self.direction {
            Direction::Vertical => area.height,
            Direction::Horizontal => area.width,
        };
        let sizes = self.solve(total);

        let mut cursor = match self.direction {
            Direction::Vertical => area.y,
            Direction::Horizontal => area.x,
        };
        sizes
            .into_iter()
            .map(|size| {
                let rect = match self.direction {
                    Direction::Vertical => Rect::new(area.x, cursor, area.width, size),
                    Direction::Horizontal => Rect::new(cursor, area.y, size, area.height),
                };
                cursor = cursor.saturating_add(size);
                rect
            })
            .collect()
    }

    fn solve(&self, total: u16) -> Vec<u16> {
        let mut remaining = total;
        let mut sizes: Vec<u16> = self
            .constraints
            .iter()
            .map(|c| {
                let size = c.base(total).min(remaining);
                remaining -= size;
                size
            })
            .collect();

        let growable: Vec<usize> = self
            .constraints
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.grows().then_some(i))
            .collect();
        if remaining == 0 || growable.is_empty() {
            return sizes;
        }

        let count = growable.len() as u16;
        let share = remaining / count;
        let mut extra = remaining % count;
        for &i in &growable {
            sizes[i] += share;
        }
        // Remainder goes to the last growable segments.
        for &i in growable.iter().rev() {
            if extra == 0 {
                break;
            }
            sizes[i] += 1;
            extra -= 1;
        }
        sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_fill_fixed() {
        let rects = Flex::vertical()
            .constraints([Constraint::Fixed(1), Constraint::Fill, Constraint::Fixed(1)])
            .split(Rect::new(0, 0, 10, 10));
        assert_eq!(rects[0], Rect::new(0, 0, 10, 1));
        assert_eq!(rects[1], Rect::new(0, 1, 10, 8));
        assert_eq!(rects[2], Rect::new(0, 9, 10, 1));
    }

    #[test]
    fn percentage_and_min_share_width() {
        let rects = Flex::horizontal()
            .constraints([Constraint::Percentage(60.0), Constraint::Min(10)])
            .split(Rect::new(0, 0, 100, 5));
        assert_eq!(rects[0].width, 60);
        assert_eq!(rects[1].x, 60);
        assert_eq!(rects[1].width, 40);
    }

    #[test]
    fn overcommitted_fixed_is_truncated() {
        let rects = Flex::vertical()
            .constraints([Constraint::Fixed(4), Constraint::Fixed(4)])
            .split(Rect::new(0, 0, 3, 6));
        assert_eq!(rects[0].height, 4);
        assert_eq!(rects[1].height, 2);
    }

    #[test]
    fn fill_remainder_goes_last() {
        let rects = Flex::horizontal()
            .constraints([Constraint::Fill, Constraint::Fill])
            .split(Rect::new(0, 0, 5, 1));
        assert_eq!(rects[0].width, 2);
        assert_eq!(rects[1].width, 3);
    }

    #[test]
    fn empty_constraints_empty_output() {
        assert!(Flex::vertical().split(Rect::new(0, 0, 5, 5)).is_empty());
    }
}
