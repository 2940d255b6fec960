//! Property-based invariant tests for the flex splitter.
//!
//! 1. Allocated sizes never exceed available space.
//! 2. Rect count matches constraint count.
//! 3. All rects fit within the parent area.
//! 4. Segments are contiguous and ordered.
//! 5. A growable segment absorbs all leftover space.

use dw_core::geometry::Rect;
use dw_core::layout::{Constraint, Direction, Flex};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn constraint_strategy() -> impl Strategy<Value = Constraint> {
    prop_oneof![
        (0u16..=200).prop_map(Constraint::Fixed),
        (0.0f32..=100.0).prop_map(Constraint::Percentage),
        (0u16..=200).prop_map(Constraint::Min),
        Just(Constraint::Fill),
    ]
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Horizontal), Just(Direction::Vertical)]
}

fn area_strategy() -> impl Strategy<Value = Rect> {
    (0u16..=50, 0u16..=50, 0u16..=300, 0u16..=120).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn axis_len(direction: Direction, rect: Rect) -> u16 {
    match direction {
        Direction::Vertical => rect.height,
        Direction::Horizontal => rect.width,
    }
}

proptest! {
    #[test]
    fn sum_never_exceeds_available(
        constraints in proptest::collection::vec(constraint_strategy(), 0..8),
        area in area_strategy(),
        direction in direction_strategy(),
    ) {
        let rects = Flex::vertical().direction(direction).constraints(constraints.clone()).split(area);
        prop_assert_eq!(rects.len(), constraints.len());
        let sum: u32 = rects.iter().map(|r| u32::from(axis_len(direction, *r))).sum();
        prop_assert!(sum <= u32::from(axis_len(direction, area)));
    }

    #[test]
    fn rects_fit_inside_parent(
        constraints in proptest::collection::vec(constraint_strategy(), 1..8),
        area in area_strategy(),
        direction in direction_strategy(),
    ) {
        let rects = Flex::vertical().direction(direction).constraints(constraints).split(area);
        for r in rects {
            prop_assert!(r.x >= area.x && r.right() <= area.right());
            prop_assert!(r.y >= area.y && r.bottom() <= area.bottom());
        }
    }

    #[test]
    fn segments_are_contiguous(
        constraints in proptest::collection::vec(constraint_strategy(), 2..8),
        area in area_strategy(),
    ) {
        let rects = Flex::vertical().constraints(constraints).split(area);
        for pair in rects.windows(2) {
            prop_assert_eq!(pair[0].bottom(), pair[1].y);
        }
    }

    #[test]
    fn fill_absorbs_leftover(
        fixed in proptest::collection::vec(0u16..=20, 0..5),
        area in area_strategy(),
    ) {
        let mut constraints: Vec<Constraint> = fixed.iter().copied().map(Constraint::Fixed).collect();
        constraints.push(Constraint::Fill);
        let rects = Flex::horizontal().constraints(constraints).split(area);
        let sum: u32 = rects.iter().map(|r| u32::from(r.width)).sum();
        prop_assert_eq!(sum, u32::from(area.width));
    }
}
