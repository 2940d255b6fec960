#![forbid(unsafe_code)]

//! Core: geometry, layout, input events, and terminal lifecycle.

pub mod event;
pub mod geometry;
pub mod layout;
pub mod terminal_session;

pub use event::{
    Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton, MouseEvent, MouseEventKind,
};
pub use geometry::{Rect, Size};
