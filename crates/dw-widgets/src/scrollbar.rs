#![forbid(unsafe_code)]

//! Vertical scrollbar.
//!
//! Positions are in terminal lines, the same unit as a list's scroll
//! offset, so a virtual list can hand its offset straight through.

use dw_core::event::{MouseButton, MouseEvent, MouseEventKind};
use dw_core::geometry::Rect;
use dw_render::frame::{Frame, HitData, HitId, HitRegion};
use dw_render::style::Style;

use crate::StatefulWidget;
use crate::mouse::MouseResult;

/// Which edge of the area the bar is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollbarSide {
    #[default]
    Right,
    Left,
}

/// Hit data part for track (background).
pub const SCROLLBAR_PART_TRACK: u64 = 0;
/// Hit data part for thumb.
pub const SCROLLBAR_PART_THUMB: u64 = 1;

const PART_SHIFT: u32 = 56;
const POSITION_MASK: u64 = (1 << PART_SHIFT) - 1;

fn encode_hit(part: u64, track_pos: u64) -> HitData {
    (part << PART_SHIFT) | (track_pos & POSITION_MASK)
}

fn decode_hit(data: HitData) -> (u64, u64) {
    (data >> PART_SHIFT, data & POSITION_MASK)
}

/// A widget to display a vertical scrollbar.
#[derive(Debug, Clone, Default)]
pub struct Scrollbar<'a> {
    side: ScrollbarSide,
    thumb_style: Style,
    track_style: Style,
    track_symbol: Option<&'a str>,
    thumb_symbol: Option<&'a str>,
    hit_id: Option<HitId>,
}

impl<'a> Scrollbar<'a> {
    #[must_use]
    pub fn new(side: ScrollbarSide) -> Self {
        Self {
            side,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn thumb_style(mut self, style: Style) -> Self {
        self.thumb_style = style;
        self
    }

    #[must_use]
    pub fn track_style(mut self, style: Style) -> Self {
        self.track_style = style;
        self
    }

    /// Set custom symbols for the track and thumb.
    #[must_use]
    pub fn symbols(mut self, track: &'a str, thumb: &'a str) -> Self {
        self.track_symbol = Some(track);
        self.thumb_symbol = Some(thumb);
        self
    }

    /// Set a hit ID for mouse interaction.
    #[must_use]
    pub fn hit_id(mut self, id: HitId) -> Self {
        self.hit_id = Some(id);
        self
    }
}

/// Content and viewport extents for a [`Scrollbar`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollbarState {
    /// Total scrollable lines.
    pub content_length: u64,
    /// Current scroll offset in lines.
    pub position: u64,
    /// Lines visible in the viewport.
    pub viewport_length: u64,
}

impl ScrollbarState {
    #[must_use]
    pub fn new(content_length: u64, position: u64, viewport_length: u64) -> Self {
        Self {
            content_length,
            position,
            viewport_length,
        }
    }

    #[must_use]
    pub fn max_position(&self) -> u64 {
        self.content_length.saturating_sub(self.viewport_length)
    }

    /// Thumb `(offset, size)` within a track of `track_len` cells.
    #[must_use]
    pub fn thumb(&self, track_len: u64) -> (u64, u64) {
        if track_len == 0 || self.content_length == 0 {
            return (0, 0);
        }
        let size = (track_len * self.viewport_length.min(self.content_length))
            .div_ceil(self.content_length)
            .clamp(1, track_len);
        let max_pos = self.max_position();
        let available = track_len - size;
        let offset = if max_pos == 0 {
            0
        } else {
            let pos = u128::from(self.position.min(max_pos));
            ((pos * u128::from(available) + u128::from(max_pos) / 2) / u128::from(max_pos)) as u64
        };
        (offset, size)
    }

    /// Handle a press or drag on the scrollbar.
    ///
    /// Hit data encodes `(part << 56) | track_position`. The track is
    /// assumed to be `viewport_length` cells long, which holds when the bar
    /// is drawn beside its viewport.
    pub fn handle_mouse(
        &mut self,
        event: &MouseEvent,
        hit: Option<(HitId, HitRegion, HitData)>,
        expected_id: HitId,
    ) -> MouseResult {
        let pressed = matches!(
            event.kind,
            MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Drag(MouseButton::Left)
        );
        if !pressed {
            return MouseResult::Ignored;
        }
        let Some((id, HitRegion::Scrollbar, data)) = hit else {
            return MouseResult::Ignored;
        };
        if id != expected_id {
            return MouseResult::Ignored;
        }
        let (part, track_pos) = decode_hit(data);
        if !matches!(part, SCROLLBAR_PART_TRACK | SCROLLBAR_PART_THUMB) {
            return MouseResult::Ignored;
        }

        let max_pos = self.max_position();
        let denom = self.viewport_length.max(1).saturating_sub(1).max(1);
        let clamped = track_pos.min(denom);
        self.position = if max_pos == 0 {
            0
        } else {
            let num = u128::from(clamped) * u128::from(max_pos);
            ((num + u128::from(denom) / 2) / u128::from(denom)) as u64
        };
        MouseResult::Scrolled
    }
}

impl StatefulWidget for Scrollbar<'_> {
    type State = ScrollbarState;

    fn render(&self, area: Rect, frame: &mut Frame, state: &mut Self::State) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "widget_render",
            widget = "Scrollbar",
            x = area.x,
            y = area.y,
            w = area.width,
            h = area.height
        )
        .entered();

        if area.is_empty() || state.content_length == 0 {
            return;
        }

        let track_len = u64::from(area.height);
        let (thumb_offset, thumb_size) = state.thumb(track_len);
        let track_char = self.track_symbol.unwrap_or("│");
        let thumb_char = self.thumb_symbol.unwrap_or("█");
        let x = match self.side {
            ScrollbarSide::Right => area.right() - 1,
            ScrollbarSide::Left => area.left(),
        };

        for i in 0..area.height {
            let pos = u64::from(i);
            let is_thumb = pos >= thumb_offset && pos < thumb_offset + thumb_size;
            let (symbol, style, part) = if is_thumb {
                (thumb_char, self.thumb_style, SCROLLBAR_PART_THUMB)
            } else {
                (track_char, self.track_style, SCROLLBAR_PART_TRACK)
            };
            let y = area.y + i;
            frame.print_text(x, y, symbol, style, x + 1);
            if let Some(id) = self.hit_id {
                frame.register_hit(
                    Rect::new(x, y, 1, 1),
                    id,
                    HitRegion::Scrollbar,
                    encode_hit(part, pos),
                );
            }
        }
    }
}
