#![forbid(unsafe_code)]

//! Canonical input events.
//!
//! The runtime never hands crossterm types to application code. Terminal
//! events are converted once, in [`Event::from_crossterm`], and everything
//! above this crate matches on these types instead.

use bitflags::bitflags;
use crossterm::event as ct;

/// A terminal input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key press, repeat, or release.
    Key(KeyEvent),
    /// A mouse button, motion, or wheel event.
    Mouse(MouseEvent),
    /// The terminal was resized.
    Resize {
        /// New width in columns.
        width: u16,
        /// New height in rows.
        height: u16,
    },
    /// Pasted text (bracketed paste).
    Paste(String),
    /// Terminal focus gained (`true`) or lost (`false`).
    Focus(bool),
    /// Runtime tick.
    Tick,
}

bitflags! {
    /// Keyboard modifier state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// Logical key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    BackTab,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    F(u8),
    Null,
}

/// Press, repeat, or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A plain key press without modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether this is the given character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        self.code == KeyCode::Char(c)
    }

    #[must_use]
    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// What the mouse did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Down(MouseButton),
    Up(MouseButton),
    Drag(MouseButton),
    Moved,
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
}

/// A mouse event at a cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub x: u16,
    pub y: u16,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    #[must_use]
    pub const fn new(kind: MouseEventKind, x: u16, y: u16) -> Self {
        Self {
            kind,
            x,
            y,
            modifiers: Modifiers::empty(),
        }
    }
}

// ---------------------------------------------------------------------------
// crossterm conversion
// ---------------------------------------------------------------------------

impl Event {
    /// Convert a crossterm event. Returns `None` for keys with no mapping.
    #[must_use]
    pub fn from_crossterm(event: ct::Event) -> Option<Self> {
        match event {
            ct::Event::Key(key) => convert_key(key).map(Event::Key),
            ct::Event::Mouse(mouse) => Some(Event::Mouse(convert_mouse(mouse))),
            ct::Event::Resize(width, height) => Some(Event::Resize { width, height }),
            ct::Event::Paste(text) => Some(Event::Paste(text)),
            ct::Event::FocusGained => Some(Event::Focus(true)),
            ct::Event::FocusLost => Some(Event::Focus(false)),
        }
    }
}

fn convert_modifiers(m: ct::KeyModifiers) -> Modifiers {
    let mut out = Modifiers::empty();
    if m.contains(ct::KeyModifiers::SHIFT) {
        out |= Modifiers::SHIFT;
    }
    if m.contains(ct::KeyModifiers::CONTROL) {
        out |= Modifiers::CTRL;
    }
    if m.contains(ct::KeyModifiers::ALT) {
        out |= Modifiers::ALT;
    }
    if m.contains(ct::KeyModifiers::SUPER) {
        out |= Modifiers::SUPER;
    }
    out
}

fn convert_key(key: ct::KeyEvent) -> Option<KeyEvent> {
    let code = match key.code {
        ct::KeyCode::Char(c) => KeyCode::Char(c),
        ct::KeyCode::Enter => KeyCode::Enter,
        ct::KeyCode::Esc => KeyCode::Escape,
        ct::KeyCode::Backspace => KeyCode::Backspace,
        ct::KeyCode::Tab => KeyCode::Tab,
        ct::KeyCode::BackTab => KeyCode::BackTab,
        ct::KeyCode::Delete => KeyCode::Delete,
        ct::KeyCode::Insert => KeyCode::Insert,
        ct::KeyCode::Home => KeyCode::Home,
        ct::KeyCode::End => KeyCode::End,
        ct::KeyCode::PageUp => KeyCode::PageUp,
        ct::KeyCode::PageDown => KeyCode::PageDown,
        ct::KeyCode::Up => KeyCode::Up,
        ct::KeyCode::Down => KeyCode::Down,
        ct::KeyCode::Left => KeyCode::Left,
        ct::KeyCode::Right => KeyCode::Right,
        ct::KeyCode::F(n) => KeyCode::F(n),
        ct::KeyCode::Null => KeyCode::Null,
        _ => return None,
    };
    let kind = match key.kind {
        ct::KeyEventKind::Press => KeyEventKind::Press,
        ct::KeyEventKind::Repeat => KeyEventKind::Repeat,
        ct::KeyEventKind::Release => KeyEventKind::Release,
    };
    Some(KeyEvent {
        code,
        modifiers: convert_modifiers(key.modifiers),
        kind,
    })
}

fn convert_button(button: ct::MouseButton) -> MouseButton {
    match button {
        ct::MouseButton::Left => MouseButton::Left,
        ct::MouseButton::Right => MouseButton::Right,
        ct::MouseButton::Middle => MouseButton::Middle,
    }
}

fn convert_mouse(mouse: ct::MouseEvent) -> MouseEvent {
    let kind = match mouse.kind {
        ct::MouseEventKind::Down(b) => MouseEventKind::Down(convert_button(b)),
        ct::MouseEventKind::Up(b) => MouseEventKind::Up(convert_button(b)),
        ct::MouseEventKind::Drag(b) => MouseEventKind::Drag(convert_button(b)),
        ct::MouseEventKind::Moved => MouseEventKind::Moved,
        ct::MouseEventKind::ScrollUp => MouseEventKind::ScrollUp,
        ct::MouseEventKind::ScrollDown => MouseEventKind::ScrollDown,
        ct::MouseEventKind::ScrollLeft => MouseEventKind::ScrollLeft,
        ct::MouseEventKind::ScrollRight => MouseEventKind::ScrollRight,
    };
    MouseEvent {
        kind,
        x: mouse.column,
        y: mouse.row,
        modifiers: convert_modifiers(mouse.modifiers),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_char_converts() {
        let ct_key = ct::KeyEvent::new(ct::KeyCode::Char('q'), ct::KeyModifiers::CONTROL);
        let event = Event::from_crossterm(ct::Event::Key(ct_key));
        let Some(Event::Key(key)) = event else {
            panic!("expected key event, got {event:?}");
        };
        assert!(key.is_char('q'));
        assert!(key.ctrl());
        assert_eq!(key.kind, KeyEventKind::Press);
    }

    #[test]
    fn unmapped_key_is_dropped() {
        let ct_key = ct::KeyEvent::new(ct::KeyCode::CapsLock, ct::KeyModifiers::NONE);
        assert_eq!(Event::from_crossterm(ct::Event::Key(ct_key)), None);
    }

    #[test]
    fn mouse_scroll_converts_position() {
        let ct_mouse = ct::MouseEvent {
            kind: ct::MouseEventKind::ScrollDown,
            column: 7,
            row: 3,
            modifiers: ct::KeyModifiers::NONE,
        };
        assert_eq!(
            Event::from_crossterm(ct::Event::Mouse(ct_mouse)),
            Some(Event::Mouse(MouseEvent::new(MouseEventKind::ScrollDown, 7, 3)))
        );
    }

    #[test]
    fn resize_converts() {
        assert_eq!(
            Event::from_crossterm(ct::Event::Resize(120, 40)),
            Some(Event::Resize {
                width: 120,
                height: 40
            })
        );
    }

    #[test]
    fn modifiers_combine() {
        let m = convert_modifiers(ct::KeyModifiers::SHIFT | ct::KeyModifiers::ALT);
        assert!(m.contains(Modifiers::SHIFT | Modifiers::ALT));
        assert!(!m.contains(Modifiers::CTRL));
    }
}
