#![forbid(unsafe_code)]

//! Terminal cells.
//!
//! A [`Cell`] is one grid position: its content, colors, and attributes.
//! Wide characters occupy a leading `Char` cell followed by
//! [`CellContent::Continuation`] cells.

use bitflags::bitflags;

/// An RGBA color packed into a `u32` (`0xRRGGBBAA`).
///
/// Alpha 0 means "terminal default" and is emitted as a color reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PackedRgba(pub u32);

impl PackedRgba {
    /// The terminal's default color.
    pub const TRANSPARENT: Self = Self(0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// An opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32)
    }

    #[inline]
    #[must_use]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    #[must_use]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    #[must_use]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    #[must_use]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.a() == 0
    }
}

bitflags! {
    /// Visual text attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const ITALIC = 1 << 2;
        const UNDERLINE = 1 << 3;
        const REVERSE = 1 << 4;
        const STRIKETHROUGH = 1 << 5;
    }
}

/// What a cell displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CellContent {
    /// Nothing drawn; presented as a space.
    #[default]
    Empty,
    /// A single character.
    Char(char),
    /// Trailing half of a wide character to the left.
    Continuation,
}

impl CellContent {
    /// The displayed character, if this cell leads one.
    #[must_use]
    pub const fn as_char(self) -> Option<char> {
        match self {
            CellContent::Char(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_continuation(self) -> bool {
        matches!(self, CellContent::Continuation)
    }
}

/// One grid position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Cell {
    pub content: CellContent,
    pub fg: PackedRgba,
    pub bg: PackedRgba,
    pub attrs: StyleFlags,
}

impl Cell {
    #[must_use]
    pub const fn from_char(c: char) -> Self {
        Self {
            content: CellContent::Char(c),
            fg: PackedRgba::TRANSPARENT,
            bg: PackedRgba::TRANSPARENT,
            attrs: StyleFlags::empty(),
        }
    }

    #[must_use]
    pub const fn continuation() -> Self {
        Self {
            content: CellContent::Continuation,
            fg: PackedRgba::TRANSPARENT,
            bg: PackedRgba::TRANSPARENT,
            attrs: StyleFlags::empty(),
        }
    }

    #[must_use]
    pub const fn with_fg(mut self, fg: PackedRgba) -> Self {
        self.fg = fg;
        self
    }

    #[must_use]
    pub const fn with_bg(mut self, bg: PackedRgba) -> Self {
        self.bg = bg;
        self
    }

    #[must_use]
    pub const fn with_attrs(mut self, attrs: StyleFlags) -> Self {
        self.attrs = attrs;
        self
    }

    /// Character used when presenting this cell.
    #[must_use]
    pub fn symbol(&self) -> char {
        match self.content {
            CellContent::Char(c) => c,
            CellContent::Empty | CellContent::Continuation => ' ',
        }
    }
}
