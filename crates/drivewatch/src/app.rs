use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use dw_core::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent};
use dw_core::geometry::Rect;
use dw_core::layout::{Constraint, Flex};
use dw_render::cell::Cell;
use dw_render::frame::{Frame, HitGrid};
use dw_runtime::{Cmd, Every, Model, Subscription};
use dw_widgets::status_line::{StatusItem, StatusLine};
use dw_widgets::{MouseResult, VirtualListState, Widget};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, info, warn};

use crate::api::{self, DriverSummary};
use crate::domain::{AlertId, DriverId, EventKind, Notification, SafetyAlert};
use crate::feed::AlertFeed;
use crate::msg::Msg;
use crate::panels::{self, status_bar::Counts};
use crate::screen::ActiveScreen;
use crate::store::{AlertQuery, DatasetSaver, MemoryStore, SafetyStore};
use crate::theme;

/// Dashboard settings that come from configuration.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Persist changes here after every mutation.
    pub data_path: Option<PathBuf>,
    pub feed: Option<PathBuf>,
    pub alert_row_height: u16,
}

pub struct DriveWatch {
    store: MemoryStore,
    options: AppOptions,
    saver: Option<DatasetSaver>,
    pub screen: ActiveScreen,
    pub filter: AlertQuery,
    pub alerts: Vec<SafetyAlert>,
    pub drivers: Vec<DriverSummary>,
    pub notifications: Vec<Notification>,
    driver_names: HashMap<DriverId, String>,
    counts: Counts,
    pub alert_list: RefCell<VirtualListState>,
    pub driver_list: RefCell<VirtualListState>,
    pub notification_list: RefCell<VirtualListState>,
    /// Last status message, shown in the key-hint line.
    pub flash: Option<String>,
    clock: String,
    /// Hit regions of the last drawn frame; mouse events resolve against it.
    hits: RefCell<Option<HitGrid>>,
}

impl DriveWatch {
    pub fn new(store: MemoryStore, options: AppOptions) -> Self {
        let saver = options.data_path.clone().map(DatasetSaver::new);
        let mut app = Self {
            store,
            saver,
            options: AppOptions {
                alert_row_height: options.alert_row_height.max(1),
                ..options
            },
            screen: ActiveScreen::Alerts,
            filter: AlertQuery::default(),
            alerts: Vec::new(),
            drivers: Vec::new(),
            notifications: Vec::new(),
            driver_names: HashMap::new(),
            counts: Counts::default(),
            alert_list: RefCell::new(VirtualListState::new()),
            driver_list: RefCell::new(VirtualListState::new()),
            notification_list: RefCell::new(VirtualListState::new()),
            flash: None,
            clock: clock_now(),
            hits: RefCell::new(None),
        };
        app.refresh();
        for (list, len) in [
            (&app.alert_list, app.alerts.len()),
            (&app.driver_list, app.drivers.len()),
            (&app.notification_list, app.notifications.len()),
        ] {
            if len > 0 {
                list.borrow_mut().select(Some(0));
            }
        }
        app
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn selected_alert(&self) -> Option<&SafetyAlert> {
        let index = self.alert_list.borrow().selected()?;
        self.alerts.get(index)
    }

    pub fn selected_notification(&self) -> Option<&Notification> {
        let index = self.notification_list.borrow().selected()?;
        self.notifications.get(index)
    }

    pub fn selected_driver(&self) -> Option<&DriverSummary> {
        let index = self.driver_list.borrow().selected()?;
        self.drivers.get(index)
    }

    /// Re-read every collection from the store.
    fn refresh(&mut self) {
        self.alerts = self.store.alerts(&self.filter);
        self.drivers = api::list_drivers(&self.store).data.unwrap_or_default();
        self.notifications = self.store.notifications();
        self.driver_names = self
            .drivers
            .iter()
            .map(|s| (s.driver.id, s.driver.name.clone()))
            .collect();
        self.counts = Counts {
            alerts: self.store.alerts(&AlertQuery::default()).len(),
            open: self
                .store
                .alerts(&AlertQuery {
                    unacknowledged_only: true,
                    ..AlertQuery::default()
                })
                .len(),
            unread: self.store.unread_count(),
        };
    }

    fn set_filter(&mut self, filter: AlertQuery) {
        self.filter = filter;
        self.refresh();
        let mut list = self.alert_list.borrow_mut();
        list.scroll_to(0);
        list.select((!self.alerts.is_empty()).then_some(0));
        debug!(?filter, matches = self.alerts.len(), "alert filter changed");
    }

    pub fn filter_label(&self) -> String {
        let mut parts = Vec::new();
        if let Some(kind) = self.filter.kind {
            parts.push(kind.label().to_owned());
        }
        if self.filter.unacknowledged_only {
            parts.push("open".to_owned());
        }
        if let Some(id) = self.filter.driver_id {
            let name = self.driver_names.get(&id).cloned();
            parts.push(name.unwrap_or_else(|| format!("driver #{id}")));
        }
        if parts.is_empty() {
            "all".to_owned()
        } else {
            parts.join(", ")
        }
    }

    /// Queue a background save of the dataset when one is configured.
    fn persist(&mut self) -> Cmd<Msg> {
        let Some(saver) = self.saver.as_mut() else {
            return Cmd::none();
        };
        let pending = saver.snapshot(self.store.dataset());
        Cmd::task(move || {
            Msg::Saved(
                pending
                    .write()
                    .map(|_| pending.path().display().to_string())
                    .map_err(|err| err.to_string()),
            )
        })
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    fn acknowledge(&mut self, id: AlertId) -> Cmd<Msg> {
        let env = api::acknowledge_alert(&mut self.store, id);
        if !env.success {
            self.flash = env.error;
            return Cmd::none();
        }
        self.flash = Some(format!("Alert #{id} acknowledged"));
        self.refresh();
        self.persist()
    }

    fn delete(&mut self, id: AlertId) -> Cmd<Msg> {
        let env = api::delete_alert(&mut self.store, id);
        if !env.success {
            self.flash = env.error;
            return Cmd::none();
        }
        self.flash = Some(format!("Alert #{id} deleted"));
        self.refresh();
        self.persist()
    }

    fn mark_read(&mut self, index: usize) -> Cmd<Msg> {
        let Some(id) = self.notifications.get(index).map(|n| n.id) else {
            return Cmd::none();
        };
        let env = api::mark_notification_read(&mut self.store, id);
        if !env.success {
            self.flash = env.error;
            return Cmd::none();
        }
        self.refresh();
        self.persist()
    }

    fn mark_all_read(&mut self) -> Cmd<Msg> {
        let changed = self.store.mark_all_read();
        self.flash = Some(format!("{changed} notifications marked read"));
        if changed == 0 {
            return Cmd::none();
        }
        self.refresh();
        self.persist()
    }

    /// Show the alert a notification points to.
    fn open_linked_alert(&mut self, alert_id: AlertId) {
        self.set_filter(AlertQuery::default());
        match self.alerts.iter().position(|a| a.id == alert_id) {
            Some(index) => {
                self.alert_list.borrow_mut().select(Some(index));
                self.screen = ActiveScreen::Alerts;
            }
            None => self.flash = Some(format!("Alert #{alert_id} no longer exists")),
        }
    }

    fn cycle_kind_filter(&mut self) {
        let kind = match self.filter.kind {
            None => Some(EventKind::KNOWN[0]),
            Some(k) => EventKind::KNOWN
                .iter()
                .position(|&x| x == k)
                .and_then(|i| EventKind::KNOWN.get(i + 1).copied()),
        };
        self.set_filter(AlertQuery { kind, ..self.filter });
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) -> Cmd<Msg> {
        if key.kind != KeyEventKind::Press {
            return Cmd::none();
        }

        match key.code {
            KeyCode::Char('q') if !key.ctrl() => return Cmd::quit(),
            KeyCode::Char('c' | 'C') if key.ctrl() => return Cmd::quit(),
            KeyCode::Tab => return Cmd::msg(Msg::SwitchScreen(self.screen.next())),
            KeyCode::BackTab => return Cmd::msg(Msg::SwitchScreen(self.screen.prev())),
            KeyCode::Char(ch) => {
                if let Some(screen) = ActiveScreen::from_number_key(ch) {
                    return Cmd::msg(Msg::SwitchScreen(screen));
                }
            }
            _ => {}
        }

        let (list, len) = match self.screen {
            ActiveScreen::Alerts => (&self.alert_list, self.alerts.len()),
            ActiveScreen::Drivers => (&self.driver_list, self.drivers.len()),
            ActiveScreen::Notifications => (&self.notification_list, self.notifications.len()),
        };
        {
            let mut list = list.borrow_mut();
            let moved = match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    list.select_next(len);
                    true
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    list.select_prev();
                    true
                }
                KeyCode::PageDown => {
                    list.page_down(len);
                    true
                }
                KeyCode::PageUp => {
                    list.page_up();
                    true
                }
                KeyCode::Char('g') | KeyCode::Home => {
                    list.select_first();
                    true
                }
                KeyCode::Char('G') | KeyCode::End => {
                    list.select_last(len);
                    true
                }
                _ => false,
            };
            if moved {
                return Cmd::none();
            }
        }

        match self.screen {
            ActiveScreen::Alerts => self.handle_alert_key(key),
            ActiveScreen::Drivers => self.handle_driver_key(key),
            ActiveScreen::Notifications => self.handle_notification_key(key),
        }
    }

    fn handle_alert_key(&mut self, key: KeyEvent) -> Cmd<Msg> {
        let selected = self.selected_alert().map(|a| a.id);
        match key.code {
            KeyCode::Enter | KeyCode::Char('a') => match selected {
                Some(id) => self.acknowledge(id),
                None => Cmd::none(),
            },
            KeyCode::Char('x') | KeyCode::Delete => match selected {
                Some(id) => self.delete(id),
                None => Cmd::none(),
            },
            KeyCode::Char('f') => {
                self.cycle_kind_filter();
                Cmd::none()
            }
            KeyCode::Char('u') => {
                self.set_filter(AlertQuery {
                    unacknowledged_only: !self.filter.unacknowledged_only,
                    ..self.filter
                });
                Cmd::none()
            }
            KeyCode::Char('c') => {
                self.set_filter(AlertQuery::default());
                Cmd::none()
            }
            _ => Cmd::none(),
        }
    }

    fn handle_driver_key(&mut self, key: KeyEvent) -> Cmd<Msg> {
        if key.code != KeyCode::Enter {
            return Cmd::none();
        }
        let Some(id) = self.selected_driver().map(|d| d.driver.id) else {
            return Cmd::none();
        };
        self.set_filter(AlertQuery {
            driver_id: Some(id),
            ..AlertQuery::default()
        });
        Cmd::msg(Msg::SwitchScreen(ActiveScreen::Alerts))
    }

    fn handle_notification_key(&mut self, key: KeyEvent) -> Cmd<Msg> {
        let selected = self.notification_list.borrow().selected();
        match key.code {
            KeyCode::Enter | KeyCode::Char('m') => match selected {
                Some(index) => self.mark_read(index),
                None => Cmd::none(),
            },
            KeyCode::Char('M') => self.mark_all_read(),
            KeyCode::Char('o') => {
                if let Some(alert_id) = self.selected_notification().and_then(|n| n.alert_id) {
                    self.open_linked_alert(alert_id);
                }
                Cmd::none()
            }
            _ => Cmd::none(),
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Cmd<Msg> {
        let (list, id, len) = match self.screen {
            ActiveScreen::Alerts => (&self.alert_list, panels::alerts::HIT_ID, self.alerts.len()),
            ActiveScreen::Drivers => {
                (&self.driver_list, panels::drivers::HIT_ID, self.drivers.len())
            }
            ActiveScreen::Notifications => (
                &self.notification_list,
                panels::notifications::HIT_ID,
                self.notifications.len(),
            ),
        };
        let hit = self
            .hits
            .borrow()
            .as_ref()
            .and_then(|grid| grid.hit_test(mouse.x, mouse.y));
        let result = list.borrow_mut().handle_mouse(&mouse, hit, id, len);
        match result {
            MouseResult::Activated(index) => self.activate(index),
            MouseResult::Selected(_) | MouseResult::Scrolled | MouseResult::Ignored => Cmd::none(),
        }
    }

    /// Click on an already selected row.
    fn activate(&mut self, index: usize) -> Cmd<Msg> {
        match self.screen {
            ActiveScreen::Alerts => match self.alerts.get(index).map(|a| a.id) {
                Some(id) => self.acknowledge(id),
                None => Cmd::none(),
            },
            ActiveScreen::Drivers => self.handle_driver_key(KeyEvent::new(KeyCode::Enter)),
            ActiveScreen::Notifications => self.mark_read(index),
        }
    }

    fn receive_alert(&mut self, alert: SafetyAlert) -> Cmd<Msg> {
        let stored = self.store.insert_alert(alert);
        info!(alert_id = stored.id, kind = ?stored.kind, "alert received from feed");
        let driver = self
            .driver_names
            .get(&stored.driver_id)
            .cloned()
            .unwrap_or_else(|| format!("driver #{}", stored.driver_id));
        self.flash = Some(format!("New {} alert: {driver}", stored.kind.label()));
        // Newest first: an insertion above the selection would shift it.
        let selected_id = self.selected_alert().map(|a| a.id);
        self.refresh();
        if let Some(id) = selected_id
            && let Some(index) = self.alerts.iter().position(|a| a.id == id)
        {
            self.alert_list.borrow_mut().select(Some(index));
        }
        self.persist()
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    fn key_hints(&self) -> Vec<StatusItem<'static>> {
        let mut hints = vec![
            StatusItem::key_hint("Tab", "Screen"),
            StatusItem::key_hint("j/k", "Move"),
        ];
        match self.screen {
            ActiveScreen::Alerts => hints.extend([
                StatusItem::key_hint("Enter", "Ack"),
                StatusItem::key_hint("x", "Delete"),
                StatusItem::key_hint("f", "Kind"),
                StatusItem::key_hint("u", "Open only"),
            ]),
            ActiveScreen::Drivers => hints.push(StatusItem::key_hint("Enter", "Alerts")),
            ActiveScreen::Notifications => hints.extend([
                StatusItem::key_hint("m", "Read"),
                StatusItem::key_hint("M", "All read"),
                StatusItem::key_hint("o", "Open alert"),
            ]),
        }
        hints
    }

    fn render_alerts(&self, frame: &mut Frame, area: Rect) {
        let columns = Flex::horizontal()
            .constraints([Constraint::Percentage(62.0), Constraint::Min(24)])
            .split(area);
        let title = format!(" Alerts ({}) ", self.alerts.len());
        panels::alerts::render(
            frame,
            columns[0],
            &self.alerts,
            &self.driver_names,
            self.options.alert_row_height,
            &title,
            &self.alert_list,
            true,
        );
        let alert = self.selected_alert();
        let driver = alert.and_then(|a| self.store.driver(a.driver_id).ok());
        panels::detail::render(frame, columns[1], alert, driver.as_ref());
    }
}

fn clock_now() -> String {
    let format = format_description!("[hour]:[minute]:[second] UTC");
    OffsetDateTime::now_utc().format(&format).unwrap_or_default()
}

impl Model for DriveWatch {
    type Message = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        info!(
            dataset = self.store.name(),
            alerts = self.counts.alerts,
            drivers = self.drivers.len(),
            "dashboard started"
        );
        Cmd::none()
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::Mouse(mouse) => self.handle_mouse(mouse),
            Msg::Resize { .. } => Cmd::none(),
            Msg::AlertReceived(alert) => self.receive_alert(alert),
            Msg::SwitchScreen(screen) => {
                self.screen = screen;
                Cmd::none()
            }
            Msg::Saved(Ok(path)) => {
                debug!(path, "dataset persisted");
                Cmd::none()
            }
            Msg::Saved(Err(err)) => {
                warn!(%err, "dataset save failed");
                self.flash = Some(format!("Save failed: {err}"));
                Cmd::none()
            }
            Msg::Tick => {
                self.clock = clock_now();
                Cmd::none()
            }
            Msg::Noop => Cmd::none(),
        }
    }

    fn view(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.buffer.fill(
            area,
            Cell::from_char(' ')
                .with_bg(theme::palette::BG_DEEP)
                .with_fg(theme::palette::FG_PRIMARY),
        );

        // Status bar (1), content (fill), key hints (1)
        let outer = Flex::vertical()
            .constraints([Constraint::Fixed(1), Constraint::Min(3), Constraint::Fixed(1)])
            .split(area);

        panels::status_bar::render(
            frame,
            outer[0],
            self.store.name(),
            self.counts,
            &self.filter_label(),
            &self.clock,
        );

        match self.screen {
            ActiveScreen::Alerts => self.render_alerts(frame, outer[1]),
            ActiveScreen::Drivers => {
                panels::drivers::render(frame, outer[1], &self.drivers, &self.driver_list, true);
            }
            ActiveScreen::Notifications => panels::notifications::render(
                frame,
                outer[1],
                &self.notifications,
                self.counts.unread,
                &self.notification_list,
                true,
            ),
        }

        let screen_label = format!("[{}] {}", self.screen.number(), self.screen.label());
        let mut hints = StatusLine::new()
            .style(theme::status_bar_style())
            .separator("  ");
        for hint in self.key_hints() {
            hints = hints.left(hint);
        }
        let center = self.flash.as_deref().unwrap_or(&screen_label);
        hints
            .center(StatusItem::text(center))
            .right(StatusItem::key_hint("q", "Quit"))
            .render(outer[2], frame);

        self.hits.replace(frame.hit_grid.clone());
    }

    fn subscriptions(&self) -> Vec<Box<dyn Subscription<Msg>>> {
        let mut subs: Vec<Box<dyn Subscription<Msg>>> =
            vec![Box::new(Every::new(Duration::from_secs(1), || Msg::Tick))];
        if let Some(path) = &self.options.feed {
            subs.push(Box::new(AlertFeed::new(path.clone())));
        }
        subs
    }
}

