#![forbid(unsafe_code)]

//! Terminal lifecycle guard.
//!
//! [`TerminalSession`] enters raw mode and the requested terminal features
//! on construction and restores the terminal on drop, including when the
//! program unwinds from a panic.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{cursor, event as ct, execute, terminal};

use crate::event::Event;

/// Which terminal features to enable for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Switch to the alternate screen.
    pub alternate_screen: bool,
    /// Report mouse events.
    pub mouse_capture: bool,
    /// Enable bracketed paste.
    pub bracketed_paste: bool,
    /// Report focus changes.
    pub focus_events: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            alternate_screen: true,
            mouse_capture: false,
            bracketed_paste: true,
            focus_events: false,
        }
    }
}

/// RAII guard over terminal modes.
#[derive(Debug)]
pub struct TerminalSession {
    options: SessionOptions,
}

impl TerminalSession {
    /// Enter raw mode and enable the requested features.
    pub fn new(options: SessionOptions) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        // Construct first so a failure below still restores raw mode on drop.
        let session = Self { options };

        let mut out = io::stdout();
        if options.alternate_screen {
            execute!(out, terminal::EnterAlternateScreen)?;
        }
        if options.mouse_capture {
            execute!(out, ct::EnableMouseCapture)?;
        }
        if options.bracketed_paste {
            execute!(out, ct::EnableBracketedPaste)?;
        }
        if options.focus_events {
            execute!(out, ct::EnableFocusChange)?;
        }
        execute!(out, cursor::Hide)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(?options, "terminal session started");

        Ok(session)
    }

    #[must_use]
    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// Current terminal size as `(width, height)`.
    pub fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Wait up to `timeout` for an input event.
    pub fn poll_event(&self, timeout: Duration) -> io::Result<bool> {
        ct::poll(timeout)
    }

    /// Read one event. Unmapped events yield `None`.
    pub fn read_event(&self) -> io::Result<Option<Event>> {
        Ok(Event::from_crossterm(ct::read()?))
    }

    fn restore(&self) -> io::Result<()> {
        let mut out = io::stdout();
        if self.options.focus_events {
            execute!(out, ct::DisableFocusChange)?;
        }
        if self.options.bracketed_paste {
            execute!(out, ct::DisableBracketedPaste)?;
        }
        if self.options.mouse_capture {
            execute!(out, ct::DisableMouseCapture)?;
        }
        if self.options.alternate_screen {
            execute!(out, terminal::LeaveAlternateScreen)?;
        }
        execute!(out, cursor::Show)?;
        out.flush()?;
        terminal::disable_raw_mode()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        // Nothing useful can be done with a failure here.
        let _ = self.restore();
        #[cfg(feature = "tracing")]
        tracing::debug!("terminal session restored");
    }
}
