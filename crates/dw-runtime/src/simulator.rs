#![forbid(unsafe_code)]

//! Headless program driver for tests.
//!
//! [`ProgramSimulator`] runs a [`Model`] without a terminal. Messages and
//! events go straight into `update`, tasks run synchronously on the calling
//! thread, and frames are captured into in-memory buffers. Two simulators fed
//! the same inputs produce the same frames.

use std::time::Duration;

use dw_core::event::Event;
use dw_render::buffer::Buffer;
use dw_render::frame::Frame;

use crate::program::{Cmd, Model};
use crate::subscription::SubId;

/// Drives a model the way [`crate::Program`] does, minus the terminal.
pub struct ProgramSimulator<M: Model> {
    model: M,
    running: bool,
    tick_rate: Option<Duration>,
    logs: Vec<String>,
    last_frame: Option<Frame>,
    subscription_ids: Vec<SubId>,
}

impl<M: Model> ProgramSimulator<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            running: true,
            tick_rate: None,
            logs: Vec::new(),
            last_frame: None,
            subscription_ids: Vec::new(),
        }
    }

    /// Run `Model::init` and execute its command.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute_cmd(cmd);
        self.refresh_subscriptions();
    }

    /// Deliver one message. Ignored once the model has quit.
    pub fn send(&mut self, msg: M::Message) {
        if !self.running {
            return;
        }
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
        self.refresh_subscriptions();
    }

    /// Deliver a terminal event through the model's `From<Event>` conversion.
    pub fn inject_event(&mut self, event: Event) {
        self.send(M::Message::from(event));
    }

    pub fn inject_events(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.inject_event(event);
        }
    }

    /// Render the model into a fresh `width` x `height` frame.
    pub fn capture_frame(&mut self, width: u16, height: u16) -> &Buffer {
        let mut frame = Frame::new(width.max(1), height.max(1));
        self.model.view(&mut frame);
        &self.last_frame.insert(frame).buffer
    }

    /// The most recently captured frame, hit grid included.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Lines emitted through `Cmd::Log`, in order.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// The interval set by the last `Cmd::Tick`, if any.
    pub fn tick_rate(&self) -> Option<Duration> {
        self.tick_rate
    }

    /// Ids of the subscriptions the model currently declares. They are not
    /// started; tests feed their messages with [`Self::send`].
    pub fn active_subscription_ids(&self) -> &[SubId] {
        &self.subscription_ids
    }

    fn refresh_subscriptions(&mut self) {
        self.subscription_ids = self.model.subscriptions().iter().map(|s| s.id()).collect();
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.running = false,
            Cmd::Msg(m) => {
                let cmd = self.model.update(m);
                self.execute_cmd(cmd);
            }
            Cmd::Batch(cmds) => {
                for c in cmds {
                    self.execute_cmd(c);
                }
            }
            Cmd::Sequence(cmds) => {
                for c in cmds {
                    self.execute_cmd(c);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Tick(d) => self.tick_rate = Some(d),
            Cmd::Log(text) => self.logs.push(text),
            Cmd::Task(f) => {
                let msg = f();
                let cmd = self.model.update(msg);
                self.execute_cmd(cmd);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::{Every, Subscription};
    use dw_render::style::Style;

    #[derive(Default)]
    struct Echo {
        lines: Vec<String>,
        polling: bool,
    }

    enum EchoMsg {
        Line(String),
        TogglePoll,
        Ignored,
    }

    impl From<Event> for EchoMsg {
        fn from(event: Event) -> Self {
            match event {
                Event::Paste(text) => EchoMsg::Line(text),
                _ => EchoMsg::Ignored,
            }
        }
    }

    impl Model for Echo {
        type Message = EchoMsg;

        fn init(&mut self) -> Cmd<EchoMsg> {
            Cmd::batch(vec![Cmd::tick(Duration::from_millis(250)), Cmd::log("ready")])
        }

        fn update(&mut self, msg: EchoMsg) -> Cmd<EchoMsg> {
            match msg {
                EchoMsg::Line(text) => self.lines.push(text),
                EchoMsg::TogglePoll => self.polling = !self.polling,
                EchoMsg::Ignored => {}
            }
            Cmd::none()
        }

        fn view(&self, frame: &mut Frame) {
            for (y, line) in self.lines.iter().enumerate() {
                let width = frame.width();
                frame.print_text(0, y as u16, line, Style::new(), width);
            }
        }

        fn subscriptions(&self) -> Vec<Box<dyn Subscription<EchoMsg>>> {
            if self.polling {
                vec![Box::new(Every::new(Duration::from_secs(1), || EchoMsg::Ignored))]
            } else {
                vec![]
            }
        }
    }

    #[test]
    fn init_applies_tick_and_log() {
        let mut sim = ProgramSimulator::new(Echo::default());
        sim.init();
        assert_eq!(sim.tick_rate(), Some(Duration::from_millis(250)));
        assert_eq!(sim.logs(), ["ready"]);
    }

    #[test]
    fn events_reach_view() {
        let mut sim = ProgramSimulator::new(Echo::default());
        sim.inject_events([Event::Paste("alpha".into()), Event::Tick, Event::Paste("beta".into())]);
        let buf = sim.capture_frame(10, 3);
        assert_eq!(buf.lines(), ["alpha", "beta", ""]);
        assert!(sim.last_frame().is_some_and(|f| f.hit_grid.is_some()));
    }

    #[test]
    fn declared_subscriptions_follow_model() {
        let mut sim = ProgramSimulator::new(Echo::default());
        sim.init();
        assert!(sim.active_subscription_ids().is_empty());
        sim.send(EchoMsg::TogglePoll);
        assert_eq!(sim.active_subscription_ids().len(), 1);
        sim.send(EchoMsg::TogglePoll);
        assert!(sim.active_subscription_ids().is_empty());
    }
}
