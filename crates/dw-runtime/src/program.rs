#![forbid(unsafe_code)]

//! Elm-style runtime for terminal applications.
//!
//! State lives in a [`Model`]. Terminal events are converted into the
//! model's message type and fed to [`Model::update`], which returns a
//! [`Cmd`] describing side effects. After every batch of updates the model
//! is drawn with [`Model::view`] and the diff is presented.
//!
//! # Example
//!
//! ```
//! use dw_core::event::Event;
//! use dw_render::frame::Frame;
//! use dw_render::style::Style;
//! use dw_runtime::{Cmd, Model, ProgramSimulator};
//!
//! struct Counter(i32);
//!
//! enum Msg {
//!     Up,
//!     Quit,
//!     Other,
//! }
//!
//! impl From<Event> for Msg {
//!     fn from(event: Event) -> Self {
//!         match event {
//!             Event::Key(k) if k.is_char('+') => Msg::Up,
//!             Event::Key(k) if k.is_char('q') => Msg::Quit,
//!             _ => Msg::Other,
//!         }
//!     }
//! }
//!
//! impl Model for Counter {
//!     type Message = Msg;
//!
//!     fn update(&mut self, msg: Msg) -> Cmd<Msg> {
//!         match msg {
//!             Msg::Up => self.0 += 1,
//!             Msg::Quit => return Cmd::quit(),
//!             Msg::Other => {}
//!         }
//!         Cmd::none()
//!     }
//!
//!     fn view(&self, frame: &mut Frame) {
//!         let text = self.0.to_string();
//!         frame.print_text(0, 0, &text, Style::new(), frame.width());
//!     }
//! }
//!
//! let mut sim = ProgramSimulator::new(Counter(0));
//! sim.init();
//! sim.send(Msg::Up);
//! assert_eq!(sim.capture_frame(4, 1).row_text(0), "1");
//! ```

use std::io::{self, Stdout, Write};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use dw_core::event::Event;
use dw_core::terminal_session::{SessionOptions, TerminalSession};
use dw_render::frame::Frame;
use dw_render::presenter::Presenter;
use tracing::{debug, debug_span, info, info_span};

use crate::subscription::{Subscription, SubscriptionManager};

/// Application state and behavior.
pub trait Model: Sized {
    /// Messages that drive [`Model::update`]. Terminal events convert into it.
    type Message: From<Event> + Send + 'static;

    /// Called once before the first frame.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    fn view(&self, frame: &mut Frame);

    /// Subscriptions the model wants running. Re-read after every update;
    /// ones that disappear are stopped.
    fn subscriptions(&self) -> Vec<Box<dyn Subscription<Self::Message>>> {
        vec![]
    }
}

/// Side effects requested by `init` or `update`.
#[derive(Default)]
pub enum Cmd<M> {
    #[default]
    None,
    Quit,
    /// Run every command.
    Batch(Vec<Cmd<M>>),
    /// Run commands in order, stopping early after a quit.
    Sequence(Vec<Cmd<M>>),
    /// Feed a message straight back into `update`.
    Msg(M),
    /// Deliver `Event::Tick` at this interval from now on.
    Tick(Duration),
    /// Emit a line through the log subscriber.
    Log(String),
    /// Run a blocking closure on a worker thread; its result is the next message.
    Task(Box<dyn FnOnce() -> M + Send>),
}

impl<M: std::fmt::Debug> std::fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Quit => write!(f, "Quit"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Sequence(cmds) => f.debug_tuple("Sequence").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Tick(d) => f.debug_tuple("Tick").field(d).finish(),
            Self::Log(s) => f.debug_tuple("Log").field(s).finish(),
            Self::Task(_) => write!(f, "Task(...)"),
        }
    }
}

impl<M> Cmd<M> {
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    #[inline]
    pub fn quit() -> Self {
        Self::Quit
    }

    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    #[inline]
    pub fn log(msg: impl Into<String>) -> Self {
        Self::Log(msg.into())
    }

    /// Collapses empty and single-element batches.
    pub fn batch(cmds: Vec<Self>) -> Self {
        Self::collapse(cmds, Self::Batch)
    }

    /// Collapses empty and single-element sequences.
    pub fn sequence(cmds: Vec<Self>) -> Self {
        Self::collapse(cmds, Self::Sequence)
    }

    #[inline]
    pub fn tick(duration: Duration) -> Self {
        Self::Tick(duration)
    }

    pub fn task<F>(f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(Box::new(f))
    }

    fn collapse(mut cmds: Vec<Self>, wrap: fn(Vec<Self>) -> Self) -> Self {
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or_default(),
            _ => wrap(cmds),
        }
    }
}

/// Terminal modes and loop timing for a [`Program`].
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    /// Draw on the alternate screen.
    pub alternate_screen: bool,
    /// Input poll timeout when no tick is scheduled.
    pub poll_timeout: Duration,
    pub mouse: bool,
    pub bracketed_paste: bool,
    pub focus_reporting: bool,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            alternate_screen: false,
            poll_timeout: Duration::from_millis(100),
            mouse: false,
            bracketed_paste: true,
            focus_reporting: false,
        }
    }
}

impl ProgramConfig {
    /// Alternate-screen configuration for full-window dashboards.
    pub fn fullscreen() -> Self {
        Self {
            alternate_screen: true,
            ..Default::default()
        }
    }

    pub fn with_mouse(mut self) -> Self {
        self.mouse = true;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }
}

/// Runs a [`Model`] against a real terminal.
pub struct Program<M: Model, W: Write = Stdout> {
    model: M,
    presenter: Presenter<W>,
    /// Owns raw mode and input capture; restores the terminal on drop.
    session: TerminalSession,
    running: bool,
    tick_rate: Option<Duration>,
    last_tick: Instant,
    dirty: bool,
    width: u16,
    height: u16,
    poll_timeout: Duration,
    subscriptions: SubscriptionManager<M::Message>,
    task_sender: mpsc::Sender<M::Message>,
    task_receiver: mpsc::Receiver<M::Message>,
    /// Running `Cmd::Task` threads, joined once finished.
    task_handles: Vec<JoinHandle<()>>,
}

impl<M: Model> Program<M, Stdout> {
    pub fn new(model: M) -> io::Result<Self> {
        Self::with_config(model, ProgramConfig::default())
    }

    pub fn with_config(model: M, config: ProgramConfig) -> io::Result<Self> {
        let session = TerminalSession::new(SessionOptions {
            alternate_screen: config.alternate_screen,
            mouse_capture: config.mouse,
            bracketed_paste: config.bracketed_paste,
            focus_events: config.focus_reporting,
        })?;

        let (width, height) = session.size().unwrap_or((80, 24));
        let (task_sender, task_receiver) = mpsc::channel();

        Ok(Self {
            model,
            presenter: Presenter::new(io::stdout()),
            session,
            running: true,
            tick_rate: None,
            last_tick: Instant::now(),
            dirty: true,
            width: width.max(1),
            height: height.max(1),
            poll_timeout: config.poll_timeout,
            subscriptions: SubscriptionManager::new(),
            task_sender,
            task_receiver,
            task_handles: Vec::new(),
        })
    }
}

impl<M: Model, W: Write> Program<M, W> {
    /// Run until the model quits. The terminal is restored when the
    /// program is dropped.
    pub fn run(&mut self) -> io::Result<()> {
        let result = self.run_event_loop();
        self.subscriptions.stop_all();
        self.reap_finished_tasks();
        result
    }

    fn run_event_loop(&mut self) -> io::Result<()> {
        let cmd = self.model.init();
        self.execute_cmd(cmd)?;
        self.reconcile_subscriptions();
        self.render_frame()?;

        while self.running {
            let timeout = self.effective_timeout();
            if self.session.poll_event(timeout)? {
                loop {
                    if let Some(event) = self.session.read_event()? {
                        self.handle_event(event)?;
                    }
                    if !self.running || !self.session.poll_event(Duration::ZERO)? {
                        break;
                    }
                }
            }

            self.process_subscription_messages()?;
            self.process_task_results()?;
            self.reap_finished_tasks();

            if self.should_tick() {
                self.dispatch(Event::Tick.into())?;
            }

            if self.dirty && self.running {
                self.render_frame()?;
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        if let Event::Resize { width, height } = event {
            debug!(width, height, "resize");
            self.width = width.max(1);
            self.height = height.max(1);
            self.presenter.invalidate();
        }
        self.dispatch(M::Message::from(event))?;
        self.reconcile_subscriptions();
        Ok(())
    }

    fn dispatch(&mut self, msg: M::Message) -> io::Result<()> {
        let cmd = self.model.update(msg);
        self.dirty = true;
        self.execute_cmd(cmd)
    }

    fn reconcile_subscriptions(&mut self) {
        let subs = self.model.subscriptions();
        self.subscriptions.reconcile(subs);
    }

    fn process_subscription_messages(&mut self) -> io::Result<()> {
        let messages = self.subscriptions.drain_messages();
        let any = !messages.is_empty();
        for msg in messages {
            self.dispatch(msg)?;
        }
        if any {
            self.reconcile_subscriptions();
        }
        Ok(())
    }

    fn process_task_results(&mut self) -> io::Result<()> {
        let mut any = false;
        while let Ok(msg) = self.task_receiver.try_recv() {
            any = true;
            self.dispatch(msg)?;
        }
        if any {
            self.reconcile_subscriptions();
        }
        Ok(())
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) -> io::Result<()> {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.running = false,
            Cmd::Msg(m) => self.dispatch(m)?,
            Cmd::Batch(cmds) => {
                for c in cmds {
                    self.execute_cmd(c)?;
                }
            }
            Cmd::Sequence(cmds) => {
                for c in cmds {
                    self.execute_cmd(c)?;
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Tick(duration) => {
                self.tick_rate = Some(duration);
                self.last_tick = Instant::now();
            }
            Cmd::Log(text) => info!(target: "dw_runtime::log", "{}", text.trim_end()),
            Cmd::Task(f) => {
                let sender = self.task_sender.clone();
                let handle = std::thread::spawn(move || {
                    let _ = sender.send(f());
                });
                self.task_handles.push(handle);
            }
        }
        Ok(())
    }

    fn reap_finished_tasks(&mut self) {
        let (finished, running): (Vec<_>, Vec<_>) = self
            .task_handles
            .drain(..)
            .partition(JoinHandle::is_finished);
        self.task_handles = running;
        for handle in finished {
            if handle.join().is_err() {
                debug!("background task panicked");
            }
        }
    }

    fn render_frame(&mut self) -> io::Result<()> {
        let _frame_span =
            info_span!("render_frame", width = self.width, height = self.height).entered();

        let mut frame = Frame::new(self.width, self.height);
        {
            let _view_span = debug_span!("model_view").entered();
            self.model.view(&mut frame);
        }
        let cursor = frame
            .cursor_visible
            .then_some(frame.cursor_position)
            .flatten();
        let written = {
            let _present_span = debug_span!("frame_present").entered();
            self.presenter.present(&frame.buffer, cursor)?
        };
        debug!(cells = written, "frame presented");
        self.dirty = false;
        Ok(())
    }

    fn effective_timeout(&self) -> Duration {
        match self.tick_rate {
            Some(rate) => rate.saturating_sub(self.last_tick.elapsed()),
            None => self.poll_timeout,
        }
    }

    fn should_tick(&mut self) -> bool {
        if let Some(rate) = self.tick_rate
            && self.last_tick.elapsed() >= rate
        {
            self.last_tick = Instant::now();
            return true;
        }
        false
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

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn request_redraw(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::ProgramSimulator;

    #[derive(Debug)]
    enum TestMsg {
        Push(i32),
        Sequence,
        SequenceWithQuit,
        Batch,
        Event,
    }

    impl From<Event> for TestMsg {
        fn from(_event: Event) -> Self {
            TestMsg::Event
        }
    }

    #[derive(Default)]
    struct TraceModel {
        trace: Vec<i32>,
        events: usize,
    }

    impl Model for TraceModel {
        type Message = TestMsg;

        fn update(&mut self, msg: TestMsg) -> Cmd<TestMsg> {
            match msg {
                TestMsg::Push(n) => {
                    self.trace.push(n);
                    Cmd::none()
                }
                TestMsg::Sequence => Cmd::sequence(vec![
                    Cmd::msg(TestMsg::Push(1)),
                    Cmd::msg(TestMsg::Push(2)),
                    Cmd::msg(TestMsg::Push(3)),
                ]),
                TestMsg::SequenceWithQuit => Cmd::sequence(vec![
                    Cmd::msg(TestMsg::Push(1)),
                    Cmd::quit(),
                    Cmd::msg(TestMsg::Push(2)),
                ]),
                TestMsg::Batch => Cmd::batch(vec![
                    Cmd::msg(TestMsg::Push(10)),
                    Cmd::task(|| TestMsg::Push(20)),
                    Cmd::log("batched"),
                ]),
                TestMsg::Event => {
                    self.events += 1;
                    Cmd::none()
                }
            }
        }

        fn view(&self, _frame: &mut Frame) {}
    }

    // ------------------------------------------------------------------
    // Cmd constructors
    // ------------------------------------------------------------------

    #[test]
    fn batch_collapses() {
        assert!(matches!(Cmd::<TestMsg>::batch(vec![]), Cmd::None));
        assert!(matches!(Cmd::batch(vec![Cmd::<TestMsg>::quit()]), Cmd::Quit));
        assert!(matches!(
            Cmd::<TestMsg>::batch(vec![Cmd::none(), Cmd::quit()]),
            Cmd::Batch(v) if v.len() == 2
        ));
        assert!(matches!(Cmd::<TestMsg>::sequence(vec![]), Cmd::None));
    }

    #[test]
    fn cmd_debug_format() {
        let cmd: Cmd<TestMsg> = Cmd::task(|| TestMsg::Push(0));
        assert_eq!(format!("{cmd:?}"), "Task(...)");
        assert_eq!(format!("{:?}", Cmd::<TestMsg>::tick(Duration::from_secs(1))), "Tick(1s)");
    }

    #[test]
    fn model_subscriptions_default_empty() {
        assert!(TraceModel::default().subscriptions().is_empty());
    }

    // ------------------------------------------------------------------
    // Config
    // ------------------------------------------------------------------

    #[test]
    fn program_config_builders() {
        let config = ProgramConfig::default();
        assert!(!config.alternate_screen);
        assert!(!config.mouse);
        assert_eq!(config.poll_timeout, Duration::from_millis(100));

        let config = ProgramConfig::fullscreen()
            .with_mouse()
            .with_poll_timeout(Duration::from_millis(25));
        assert!(config.alternate_screen);
        assert!(config.mouse);
        assert_eq!(config.poll_timeout, Duration::from_millis(25));
    }

    // ------------------------------------------------------------------
    // Command execution (through the simulator)
    // ------------------------------------------------------------------

    #[test]
    fn sequence_executes_in_order() {
        let mut sim = ProgramSimulator::new(TraceModel::default());
        sim.init();
        sim.send(TestMsg::Sequence);
        assert_eq!(sim.model().trace, vec![1, 2, 3]);
    }

    #[test]
    fn sequence_stops_on_quit() {
        let mut sim = ProgramSimulator::new(TraceModel::default());
        sim.send(TestMsg::SequenceWithQuit);
        assert_eq!(sim.model().trace, vec![1]);
        assert!(!sim.is_running());
    }

    #[test]
    fn batch_runs_tasks_and_logs() {
        let mut sim = ProgramSimulator::new(TraceModel::default());
        sim.send(TestMsg::Batch);
        assert_eq!(sim.model().trace, vec![10, 20]);
        assert_eq!(sim.logs(), ["batched"]);
    }

    #[test]
    fn events_convert_into_messages() {
        let mut sim = ProgramSimulator::new(TraceModel::default());
        sim.inject_event(Event::Tick);
        sim.inject_event(Event::Focus(true));
        assert_eq!(sim.model().events, 2);
    }
}
