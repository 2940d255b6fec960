//! The same input sequence always yields the same model and frame.

use dw_core::event::{Event, KeyCode, KeyEvent};
use dw_render::frame::Frame;
use dw_render::style::Style;
use dw_runtime::{Cmd, Model, ProgramSimulator};
use proptest::prelude::*;

#[derive(Default)]
struct Typist {
    text: String,
    ticks: u32,
}

enum Msg {
    Key(KeyCode),
    Tick,
    Other,
}

impl From<Event> for Msg {
    fn from(event: Event) -> Self {
        match event {
            Event::Key(k) => Msg::Key(k.code),
            Event::Tick => Msg::Tick,
            _ => Msg::Other,
        }
    }
}

impl Model for Typist {
    type Message = Msg;

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::Key(KeyCode::Char(c)) => self.text.push(c),
            Msg::Key(KeyCode::Backspace) => {
                self.text.pop();
            }
            Msg::Key(KeyCode::Enter) => return Cmd::task(|| Msg::Tick),
            Msg::Tick => self.ticks += 1,
            Msg::Key(_) | Msg::Other => {}
        }
        Cmd::none()
    }

    fn view(&self, frame: &mut Frame) {
        let width = frame.width();
        frame.print_text(0, 0, &self.text, Style::new(), width);
        frame.print_text(0, 1, &self.ticks.to_string(), Style::new(), width);
    }
}

fn event_strategy() -> impl Strategy<Value = Event> {
    prop_oneof![
        proptest::char::range('a', 'z').prop_map(|c| Event::Key(KeyEvent::new(KeyCode::Char(c)))),
        Just(Event::Key(KeyEvent::new(KeyCode::Backspace))),
        Just(Event::Key(KeyEvent::new(KeyCode::Enter))),
        Just(Event::Tick),
        Just(Event::Focus(false)),
    ]
}

fn run(events: &[Event]) -> (Vec<String>, String, u32) {
    let mut sim = ProgramSimulator::new(Typist::default());
    sim.init();
    sim.inject_events(events.iter().cloned());
    let lines = sim.capture_frame(40, 2).lines();
    let model = sim.model();
    (lines, model.text.clone(), model.ticks)
}

proptest! {
    #[test]
    fn replay_is_deterministic(events in proptest::collection::vec(event_strategy(), 0..60)) {
        prop_assert_eq!(run(&events), run(&events));
    }

    #[test]
    fn enter_and_tick_both_count(events in proptest::collection::vec(event_strategy(), 0..60)) {
        let expected = events
            .iter()
            .filter(|e| matches!(e, Event::Tick | Event::Key(KeyEvent { code: KeyCode::Enter, .. })))
            .count() as u32;
        let (_, _, ticks) = run(&events);
        prop_assert_eq!(ticks, expected);
    }
}
