#![forbid(unsafe_code)]

//! Scroll position with change listeners.
//!
//! A [`ScrollSource`] holds the scroll offset of one viewport. Input
//! handling writes to it. Anything that derives state from the offset (the
//! visible window, a "scrolled to bottom" flag, a position readout)
//! subscribes and is called back on every change.
//!
//! Listening is passive: callbacks see a [`ScrollEvent`] by shared
//! reference and cannot veto or rewrite the change. Each subscription is
//! scoped by its [`ScrollSubscription`] guard; once the guard is dropped
//! the callback is never invoked again, however the owner was torn down.
//!
//! Handles are `Rc`-based and single-threaded. Cloning a source yields
//! another handle to the same offset and listener list.
//!
//! # Re-entrancy
//!
//! No borrow is held while listeners run, so a listener may call
//! [`ScrollSource::set`]. The nested change notifies every listener
//! before the outer notification continues, which means listeners later
//! in the list see the nested event first. Recursion ends once a `set`
//! leaves the value unchanged.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Delivered to listeners after the offset changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollEvent {
    /// Offset before the change.
    pub previous: i64,
    /// Offset after the change.
    pub offset: i64,
}

impl ScrollEvent {
    /// Signed distance moved; positive means scrolled down.
    #[must_use]
    pub const fn delta(&self) -> i64 {
        self.offset.saturating_sub(self.previous)
    }
}

type ListenerRc = Rc<dyn Fn(&ScrollEvent)>;
type ListenerWeak = Weak<dyn Fn(&ScrollEvent)>;

struct Inner {
    offset: i64,
    version: u64,
    // Weak so a dropped guard releases the callback without touching the source.
    listeners: Vec<ListenerWeak>,
}

/// Shared scroll offset of one viewport.
#[derive(Clone)]
pub struct ScrollSource {
    inner: Rc<RefCell<Inner>>,
}

impl fmt::Debug for ScrollSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ScrollSource")
            .field("offset", &inner.offset)
            .field("version", &inner.version)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl Default for ScrollSource {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ScrollSource {
    #[must_use]
    pub fn new(offset: i64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                offset,
                version: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Current offset, exactly as last set (unclamped).
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.inner.borrow().offset
    }

    /// Bumped once per effective change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Set the offset. Setting the current value notifies nobody.
    pub fn set(&self, offset: i64) {
        let event = {
            let mut inner = self.inner.borrow_mut();
            if inner.offset == offset {
                return;
            }
            let previous = inner.offset;
            inner.offset = offset;
            inner.version += 1;
            ScrollEvent { previous, offset }
        };
        self.notify(&event);
    }

    /// Move the offset by `delta` lines (saturating).
    pub fn scroll_by(&self, delta: i64) {
        let offset = self.offset().saturating_add(delta);
        self.set(offset);
    }

    /// Register `listener`; it runs after every change until the guard drops.
    pub fn subscribe(&self, listener: impl Fn(&ScrollEvent) + 'static) -> ScrollSubscription {
        let strong: ListenerRc = Rc::new(listener);
        self.inner
            .borrow_mut()
            .listeners
            .push(Rc::downgrade(&strong));
        ScrollSubscription { _listener: strong }
    }

    /// Registered listeners, including released ones not yet pruned.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Listeners whose guard is still alive.
    #[must_use]
    pub fn live_listener_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    fn notify(&self, event: &ScrollEvent) {
        // Collect first so no borrow is held while listeners run.
        let listeners: Vec<ListenerRc> = {
            let mut inner = self.inner.borrow_mut();
            inner.listeners.retain(|w| w.strong_count() > 0);
            inner.listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in &listeners {
            listener(event);
        }
    }
}

/// RAII guard for one scroll listener.
#[must_use = "dropping the subscription immediately unsubscribes the listener"]
pub struct ScrollSubscription {
    _listener: ListenerRc,
}

impl fmt::Debug for ScrollSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollSubscription").finish_non_exhaustive()
    }
}
