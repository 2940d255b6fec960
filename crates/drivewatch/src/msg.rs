use dw_core::event::{Event, KeyEvent, MouseEvent};

use crate::domain::SafetyAlert;
use crate::screen::ActiveScreen;

#[derive(Debug)]
pub enum Msg {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize { width: u16, height: u16 },
    /// A line from the alert feed.
    AlertReceived(SafetyAlert),
    SwitchScreen(ActiveScreen),
    /// Result of a background save: the dataset path or the error text.
    Saved(Result<String, String>),
    Tick,
    Noop,
}

impl From<Event> for Msg {
    fn from(event: Event) -> Self {
        match event {
            Event::Key(key) => Msg::Key(key),
            Event::Mouse(mouse) => Msg::Mouse(mouse),
            Event::Resize { width, height } => Msg::Resize { width, height },
            Event::Tick => Msg::Tick,
            _ => Msg::Noop,
        }
    }
}
