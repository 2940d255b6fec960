#![forbid(unsafe_code)]

//! Render kernel: cells, styles, buffers, frames, and ANSI presentation.
//!
//! Nothing in this crate knows about widgets or the event loop. Widgets
//! write into a [`frame::Frame`]. The runtime hands the finished buffer to a
//! [`presenter::Presenter`].

pub mod buffer;
pub mod cell;
pub mod frame;
pub mod presenter;
pub mod style;

pub use buffer::Buffer;
pub use cell::{Cell, CellContent, PackedRgba, StyleFlags};
pub use frame::{Frame, HitData, HitGrid, HitId, HitRegion};
pub use presenter::Presenter;
pub use style::Style;
