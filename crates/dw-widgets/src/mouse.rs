//! Shared mouse event result type for widget mouse handling.

/// Result of processing a mouse event on a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseResult {
    /// Event not relevant to this widget.
    Ignored,
    /// Selection moved to the given row.
    Selected(usize),
    /// Row clicked while already selected.
    Activated(usize),
    /// Scroll offset changed.
    Scrolled,
}

impl MouseResult {
    #[must_use]
    pub const fn is_consumed(self) -> bool {
        !matches!(self, MouseResult::Ignored)
    }
}
