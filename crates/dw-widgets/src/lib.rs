#![forbid(unsafe_code)]

//! Widgets for drivewatch.
//!
//! Widgets draw into a [`Frame`] inside a given [`Rect`]. Stateless ones
//! implement [`Widget`]; ones that keep scroll or selection across frames
//! implement [`StatefulWidget`] and take their state by `&mut`.
//!
//! The centrepiece is [`virtual_list::VirtualList`], built from three
//! layers that can be used on their own:
//!
//! - [`window`]: pure windowing arithmetic.
//! - [`scroll`]: a shared scroll offset with change listeners.
//! - [`virtual_list`]: the viewport that ties them to rendering.

pub mod block;
pub mod borders;
pub mod mouse;
pub mod paragraph;
pub mod scroll;
pub mod scrollbar;
pub mod status_line;
pub mod virtual_list;
pub mod window;

use dw_core::geometry::Rect;
use dw_render::frame::Frame;

pub use block::{Alignment, Block};
pub use borders::{BorderType, Borders};
pub use mouse::MouseResult;
pub use paragraph::{Line, Paragraph, Span};
pub use scroll::{ScrollEvent, ScrollSource, ScrollSubscription};
pub use scrollbar::{Scrollbar, ScrollbarSide, ScrollbarState};
pub use status_line::{StatusItem, StatusLine};
pub use virtual_list::{RowRenderer, VirtualList, VirtualListState};
pub use window::{VisibleWindow, Windowing, WindowingError};

/// A widget that renders from its own configuration alone.
pub trait Widget {
    fn render(&self, area: Rect, frame: &mut Frame);
}

/// A widget whose rendering reads and updates external state.
pub trait StatefulWidget {
    type State;

    fn render(&self, area: Rect, frame: &mut Frame, state: &mut Self::State);
}
