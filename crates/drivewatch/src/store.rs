//! Safety data store.
//!
//! [`SafetyStore`] is the CRUD surface the handlers and screens use.
//! [`MemoryStore`] keeps a [`Dataset`] in memory and persists it as a JSON
//! document.

use std::cmp::Reverse;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::NamedTempFile;

use time::macros::datetime;
use tracing::{debug, info};

use crate::domain::{
    AlertId, Dataset, Driver, DriverId, DriverStatus, EventKind, NewNotification, Notification,
    NotificationId, SafetyAlert, Severity, format_rfc3339, now_rfc3339,
};
use crate::error::{Error, Result};

/// Filter for [`SafetyStore::alerts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertQuery {
    pub kind: Option<EventKind>,
    pub unacknowledged_only: bool,
    pub driver_id: Option<DriverId>,
}

impl AlertQuery {
    pub fn matches(&self, alert: &SafetyAlert) -> bool {
        self.kind.is_none_or(|k| alert.kind == k)
            && !(self.unacknowledged_only && alert.acknowledged)
            && self.driver_id.is_none_or(|d| alert.driver_id == d)
    }
}

pub trait SafetyStore {
    /// Display name of the loaded dataset.
    fn name(&self) -> &str;

    fn drivers(&self) -> Vec<Driver>;
    fn driver(&self, id: DriverId) -> Result<Driver>;
    fn upsert_driver(&mut self, driver: Driver) -> Driver;

    /// Matching alerts, newest first.
    fn alerts(&self, query: &AlertQuery) -> Vec<SafetyAlert>;
    fn alert(&self, id: AlertId) -> Result<SafetyAlert>;
    /// Store an alert. An id of 0, or one already taken, is replaced by a
    /// fresh id. Critical alerts also raise a notification.
    fn insert_alert(&mut self, alert: SafetyAlert) -> SafetyAlert;
    fn acknowledge_alert(&mut self, id: AlertId) -> Result<SafetyAlert>;
    fn delete_alert(&mut self, id: AlertId) -> Result<SafetyAlert>;

    /// All notifications, newest first.
    fn notifications(&self) -> Vec<Notification>;
    fn unread_count(&self) -> usize;
    fn create_notification(&mut self, new: NewNotification) -> Notification;
    fn mark_notification_read(&mut self, id: NotificationId) -> Result<Notification>;
    /// Returns how many notifications changed.
    fn mark_all_read(&mut self) -> usize;

    fn open_alert_count(&self, driver_id: DriverId) -> usize {
        self.alerts(&AlertQuery {
            unacknowledged_only: true,
            driver_id: Some(driver_id),
            ..AlertQuery::default()
        })
        .len()
    }
}

/// Write `data` as pretty JSON.
///
/// The document goes to a temporary file next to `path` that is then
/// renamed over it, so readers see either the old or the new file.
pub fn save_dataset(data: &Dataset, path: &Path) -> Result<()> {
    let io_err = |source: std::io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let text = serde_json::to_string_pretty(data).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(text.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|err| io_err(err.error))?;
    info!(path = %path.display(), "dataset saved");
    Ok(())
}

/// Orders background saves of one dataset file.
///
/// Each [`snapshot`](Self::snapshot) takes the next generation. Pending
/// saves write one at a time, and one older than what is already on disk
/// is dropped.
#[derive(Debug)]
pub struct DatasetSaver {
    path: PathBuf,
    generation: u64,
    written: Arc<Mutex<u64>>,
}

impl DatasetSaver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            generation: 0,
            written: Arc::new(Mutex::new(0)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&mut self, data: &Dataset) -> PendingSave {
        self.generation += 1;
        PendingSave {
            path: self.path.clone(),
            generation: self.generation,
            data: data.clone(),
            written: Arc::clone(&self.written),
        }
    }
}

/// A dataset snapshot waiting to be written.
#[derive(Debug)]
pub struct PendingSave {
    path: PathBuf,
    generation: u64,
    data: Dataset,
    written: Arc<Mutex<u64>>,
}

impl PendingSave {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the snapshot unless a newer one already reached disk.
    /// Returns whether the file was written.
    pub fn write(&self) -> Result<bool> {
        let mut written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
        if self.generation <= *written {
            debug!(
                path = %self.path.display(),
                generation = self.generation,
                latest = *written,
                "stale dataset snapshot dropped"
            );
            return Ok(false);
        }
        save_dataset(&self.data, &self.path)?;
        *written = self.generation;
        Ok(true)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Dataset,
}

impl MemoryStore {
    pub fn new(data: Dataset) -> Self {
        Self { data }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut data: Dataset = serde_json::from_str(&text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if data.name.is_empty() {
            data.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        info!(
            path = %path.display(),
            drivers = data.drivers.len(),
            alerts = data.alerts.len(),
            notifications = data.notifications.len(),
            "dataset loaded"
        );
        Ok(Self { data })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_dataset(&self.data, path)
    }

    /// A deterministic fleet with `alerts` generated safety events.
    pub fn demo(alerts: usize) -> Self {
        const NAMES: [&str; 12] = [
            "Amara Okafor",
            "Bjorn Lindqvist",
            "Chen Wei",
            "Dana Morales",
            "Emeka Eze",
            "Fatima Haddad",
            "Giulia Russo",
            "Hiro Tanaka",
            "Ines Duarte",
            "Jonas Weber",
            "Kofi Mensah",
            "Lena Novak",
        ];
        const PLACES: [&str; 6] = [
            "Route 9 northbound",
            "Depot A yard",
            "Harbor bridge",
            "Ring road exit 14",
            "Airport cargo gate",
            "Mill street",
        ];

        let mut store = Self::new(Dataset {
            name: "demo fleet".to_owned(),
            ..Dataset::default()
        });
        for (i, name) in NAMES.iter().enumerate() {
            let id = i as DriverId + 1;
            store.data.drivers.push(Driver {
                id,
                name: (*name).to_owned(),
                vehicle: format!("TRK-{:03}", 100 + id),
                license_number: format!("DL{:07}", 4_200_000 + id * 37),
                status: match i % 5 {
                    3 => DriverStatus::OffDuty,
                    4 if i > 5 => DriverStatus::Suspended,
                    _ => DriverStatus::Active,
                },
                phone: format!("+1-555-01{:02}", id),
            });
        }

        let base = datetime!(2024-05-01 06:00 UTC);
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for n in 0..alerts {
            seed = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let pick = (seed >> 33) as usize;
            let kind = EventKind::KNOWN[pick % EventKind::KNOWN.len()];
            let at = base + time::Duration::minutes(n as i64 * 7 + (pick % 5) as i64);
            let alert = SafetyAlert {
                id: n as AlertId + 1,
                driver_id: (pick / 7 % NAMES.len()) as DriverId + 1,
                kind,
                severity: kind.default_severity(),
                occurred_at: format_rfc3339(at),
                location: PLACES[pick / 3 % PLACES.len()].to_owned(),
                notes: String::new(),
                acknowledged: n + 20 < alerts && pick % 3 != 0,
            };
            let stored = store.insert_alert(alert);
            if stored.severity == Severity::Critical
                && let Some(note) = store.data.notifications.last_mut()
            {
                note.created_at = stored.occurred_at;
                note.read = n + 20 < alerts;
            }
        }
        store
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    fn next_alert_id(&self) -> AlertId {
        self.data.alerts.iter().map(|a| a.id).max().unwrap_or(0) + 1
    }

    fn next_notification_id(&self) -> NotificationId {
        self.data.notifications.iter().map(|n| n.id).max().unwrap_or(0) + 1
    }

    fn driver_name(&self, id: DriverId) -> String {
        self.data
            .drivers
            .iter()
            .find(|d| d.id == id)
            .map_or_else(|| format!("driver #{id}"), |d| d.name.clone())
    }

    fn alert_mut(&mut self, id: AlertId) -> Result<&mut SafetyAlert> {
        self.data
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::not_found("alert", id))
    }
}

impl SafetyStore for MemoryStore {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn drivers(&self) -> Vec<Driver> {
        let mut drivers = self.data.drivers.clone();
        drivers.sort_by(|a, b| a.name.cmp(&b.name));
        drivers
    }

    fn driver(&self, id: DriverId) -> Result<Driver> {
        self.data
            .drivers
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found("driver", id))
    }

    fn upsert_driver(&mut self, driver: Driver) -> Driver {
        match self.data.drivers.iter_mut().find(|d| d.id == driver.id) {
            Some(existing) => {
                debug!(driver_id = driver.id, "driver updated");
                *existing = driver.clone();
            }
            None => {
                debug!(driver_id = driver.id, "driver added");
                self.data.drivers.push(driver.clone());
            }
        }
        driver
    }

    fn alerts(&self, query: &AlertQuery) -> Vec<SafetyAlert> {
        let mut alerts: Vec<SafetyAlert> = self
            .data
            .alerts
            .iter()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        // Unparsable timestamps sort after every real one.
        alerts.sort_by_cached_key(|a| Reverse((a.occurred_at_time(), a.id)));
        alerts
    }

    fn alert(&self, id: AlertId) -> Result<SafetyAlert> {
        self.data
            .alerts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found("alert", id))
    }

    fn insert_alert(&mut self, mut alert: SafetyAlert) -> SafetyAlert {
        if alert.id == 0 || self.data.alerts.iter().any(|a| a.id == alert.id) {
            alert.id = self.next_alert_id();
        }
        if alert.occurred_at.is_empty() {
            alert.occurred_at = now_rfc3339();
        }
        debug!(alert_id = alert.id, kind = ?alert.kind, "alert stored");
        self.data.alerts.push(alert.clone());

        if alert.severity == Severity::Critical {
            let body = if alert.location.is_empty() {
                self.driver_name(alert.driver_id)
            } else {
                format!("{} at {}", self.driver_name(alert.driver_id), alert.location)
            };
            self.create_notification(NewNotification {
                alert_id: Some(alert.id),
                title: format!("Critical: {}", alert.kind.label()),
                body,
            });
        }
        alert
    }

    fn acknowledge_alert(&mut self, id: AlertId) -> Result<SafetyAlert> {
        let alert = self.alert_mut(id)?;
        alert.acknowledged = true;
        let alert = alert.clone();
        info!(alert_id = id, "alert acknowledged");
        Ok(alert)
    }

    fn delete_alert(&mut self, id: AlertId) -> Result<SafetyAlert> {
        let pos = self
            .data
            .alerts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| Error::not_found("alert", id))?;
        let removed = self.data.alerts.remove(pos);
        for note in &mut self.data.notifications {
            if note.alert_id == Some(id) {
                note.alert_id = None;
            }
        }
        info!(alert_id = id, "alert deleted");
        Ok(removed)
    }

    fn notifications(&self) -> Vec<Notification> {
        let mut notes = self.data.notifications.clone();
        notes.sort_by(|a, b| b.id.cmp(&a.id));
        notes
    }

    fn unread_count(&self) -> usize {
        self.data.notifications.iter().filter(|n| !n.read).count()
    }

    fn create_notification(&mut self, new: NewNotification) -> Notification {
        let note = Notification {
            id: self.next_notification_id(),
            alert_id: new.alert_id,
            title: new.title,
            body: new.body,
            created_at: now_rfc3339(),
            read: false,
        };
        debug!(notification_id = note.id, "notification created");
        self.data.notifications.push(note.clone());
        note
    }

    fn mark_notification_read(&mut self, id: NotificationId) -> Result<Notification> {
        let note = self
            .data
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::not_found("notification", id))?;
        note.read = true;
        debug!(notification_id = id, "notification read");
        Ok(note.clone())
    }

    fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for note in self.data.notifications.iter_mut().filter(|n| !n.read) {
            note.read = true;
            changed += 1;
        }
        debug!(changed, "notifications marked read");
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(id: AlertId, driver_id: DriverId, kind: EventKind, at: &str) -> SafetyAlert {
        SafetyAlert {
            id,
            driver_id,
            kind,
            severity: kind.default_severity(),
            occurred_at: at.to_owned(),
            location: "Depot".to_owned(),
            notes: String::new(),
            acknowledged: false,
        }
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new(Dataset {
            name: "test".to_owned(),
            drivers: vec![Driver {
                id: 1,
                name: "Ada".to_owned(),
                vehicle: "TRK-1".to_owned(),
                license_number: String::new(),
                status: DriverStatus::Active,
                phone: String::new(),
            }],
            ..Dataset::default()
        });
        store.insert_alert(alert(1, 1, EventKind::Smoking, "2024-01-01T08:00:00Z"));
        store.insert_alert(alert(2, 2, EventKind::Speeding, "2024-01-01T09:00:00Z"));
        store.insert_alert(alert(3, 1, EventKind::Seatbelt, "2024-01-01T07:00:00Z"));
        store
    }

    // ------------------------------------------------------------------
    // Alerts
    // ------------------------------------------------------------------

    #[test]
    fn alerts_newest_first() {
        let ids: Vec<_> = store().alerts(&AlertQuery::default()).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn newest_first_compares_instants_not_text() {
        let mut store = MemoryStore::new(Dataset::default());
        for (id, at) in [
            (1, "2024-01-01T09:00:00Z"),
            (2, "2024-01-01T10:00:00+02:00"),
            (3, "2024-01-01T08:30:00.500Z"),
            (4, "2024-01-01T08:30:00Z"),
            (5, "not a time"),
        ] {
            store.insert_alert(alert(id, 1, EventKind::Smoking, at));
        }
        let ids: Vec<_> = store.alerts(&AlertQuery::default()).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3, 4, 2, 5]);
    }

    #[test]
    fn query_filters_combine() {
        let mut store = store();
        store.acknowledge_alert(1).expect("ack");
        let q = AlertQuery {
            unacknowledged_only: true,
            driver_id: Some(1),
            ..AlertQuery::default()
        };
        let ids: Vec<_> = store.alerts(&q).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3]);

        let q = AlertQuery {
            kind: Some(EventKind::Speeding),
            ..AlertQuery::default()
        };
        assert_eq!(store.alerts(&q).len(), 1);
        assert_eq!(store.open_alert_count(1), 1);
    }

    #[test]
    fn duplicate_or_zero_id_gets_fresh_id() {
        let mut store = store();
        let a = store.insert_alert(alert(2, 1, EventKind::Smoking, "2024-01-02T00:00:00Z"));
        assert_eq!(a.id, 4);
        let b = store.insert_alert(alert(0, 1, EventKind::Smoking, ""));
        assert_eq!(b.id, 5);
        assert!(!b.occurred_at.is_empty());
    }

    #[test]
    fn critical_alert_raises_linked_notification() {
        let mut store = store();
        assert_eq!(store.unread_count(), 0);
        let a = store.insert_alert(alert(9, 1, EventKind::Alcohol, "2024-01-03T00:00:00Z"));
        let notes = store.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].alert_id, Some(a.id));
        assert_eq!(notes[0].title, "Critical: Alcohol");
        assert_eq!(notes[0].body, "Ada at Depot");
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn delete_unlinks_notifications() {
        let mut store = store();
        store.insert_alert(alert(9, 1, EventKind::Drowsiness, "2024-01-03T00:00:00Z"));
        let removed = store.delete_alert(9).expect("delete");
        assert_eq!(removed.id, 9);
        assert!(matches!(store.alert(9), Err(Error::NotFound { resource: "alert", id: 9 })));
        assert_eq!(store.notifications()[0].alert_id, None);
    }

    #[test]
    fn missing_alert_is_not_found() {
        let mut store = store();
        assert!(matches!(store.acknowledge_alert(42), Err(Error::NotFound { .. })));
        assert!(matches!(store.delete_alert(42), Err(Error::NotFound { .. })));
    }

    // ------------------------------------------------------------------
    // Drivers and notifications
    // ------------------------------------------------------------------

    #[test]
    fn upsert_replaces_or_adds() {
        let mut store = store();
        let mut ada = store.driver(1).expect("driver");
        ada.status = DriverStatus::Suspended;
        store.upsert_driver(ada);
        assert_eq!(store.driver(1).expect("driver").status, DriverStatus::Suspended);

        store.upsert_driver(Driver {
            id: 7,
            name: "Bo".to_owned(),
            vehicle: String::new(),
            license_number: String::new(),
            status: DriverStatus::OffDuty,
            phone: String::new(),
        });
        let names: Vec<_> = store.drivers().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Ada", "Bo"]);
    }

    #[test]
    fn mark_read_single_and_all() {
        let mut store = store();
        let first = store.create_notification(NewNotification {
            alert_id: None,
            title: "one".to_owned(),
            body: String::new(),
        });
        store.create_notification(NewNotification {
            alert_id: None,
            title: "two".to_owned(),
            body: String::new(),
        });
        assert!(store.mark_notification_read(first.id).expect("read").read);
        assert_eq!(store.unread_count(), 1);
        assert_eq!(store.mark_all_read(), 1);
        assert_eq!(store.mark_all_read(), 0);
        assert!(store.mark_notification_read(99).is_err());
    }

    // ------------------------------------------------------------------
    // Saving
    // ------------------------------------------------------------------

    fn saved_ids(path: &Path) -> Vec<AlertId> {
        let mut ids: Vec<_> = MemoryStore::load(path)
            .expect("reload")
            .alerts(&AlertQuery {
                unacknowledged_only: true,
                ..AlertQuery::default()
            })
            .iter()
            .map(|a| a.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn older_snapshot_never_overwrites_newer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fleet.json");
        let mut saver = DatasetSaver::new(&path);
        let mut store = store();

        store.acknowledge_alert(1).expect("ack");
        let first = saver.snapshot(store.dataset());
        store.acknowledge_alert(2).expect("ack");
        let second = saver.snapshot(store.dataset());

        assert!(second.write().expect("write"));
        assert!(!first.write().expect("write"));
        assert_eq!(saved_ids(&path), vec![3]);
    }

    #[test]
    fn snapshots_written_in_order_all_land() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fleet.json");
        let mut saver = DatasetSaver::new(&path);
        let mut store = store();

        let first = saver.snapshot(store.dataset());
        assert!(first.write().expect("write"));
        assert_eq!(saved_ids(&path), vec![1, 2, 3]);
        store.acknowledge_alert(3).expect("ack");
        let second = saver.snapshot(store.dataset());
        assert!(second.write().expect("write"));
        assert_eq!(saved_ids(&path), vec![1, 2]);
    }

    #[test]
    fn concurrent_saves_keep_the_latest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fleet.json");
        let mut saver = DatasetSaver::new(&path);
        let mut store = store();
        let mut pending = Vec::new();
        for id in 1..=3 {
            store.acknowledge_alert(id).expect("ack");
            pending.push(saver.snapshot(store.dataset()));
        }
        let handles: Vec<_> = pending
            .into_iter()
            .rev()
            .map(|save| std::thread::spawn(move || save.write().expect("write")))
            .collect();
        for handle in handles {
            handle.join().expect("join");
        }
        assert!(saved_ids(&path).is_empty());
    }

    #[test]
    fn save_replaces_file_without_leftovers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fleet.json");
        fs::write(&path, "stale").expect("write");
        save_dataset(store().dataset(), &path).expect("save");
        assert_eq!(MemoryStore::load(&path).expect("load").dataset(), store().dataset());
        let entries = fs::read_dir(dir.path()).expect("read dir").count();
        assert_eq!(entries, 1);
    }

    // ------------------------------------------------------------------
    // Demo data
    // ------------------------------------------------------------------

    #[test]
    fn demo_is_deterministic() {
        let a = MemoryStore::demo(200);
        let b = MemoryStore::demo(200);
        assert_eq!(a.dataset(), b.dataset());
        assert_eq!(a.alerts(&AlertQuery::default()).len(), 200);
        assert_eq!(a.drivers().len(), 12);
    }

    #[test]
    fn demo_keeps_recent_alerts_open() {
        let store = MemoryStore::demo(100);
        let open = store.alerts(&AlertQuery {
            unacknowledged_only: true,
            ..AlertQuery::default()
        });
        assert!(open.len() >= 20);
        assert!(store.notifications().iter().all(|n| n.alert_id.is_some()));
    }
}
