//! Domain types: drivers, safety alerts, and notifications.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, macros::format_description};

pub type DriverId = u64;
pub type AlertId = u64;
pub type NotificationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    #[default]
    Active,
    OffDuty,
    Suspended,
}

impl DriverStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OffDuty => "off duty",
            Self::Suspended => "suspended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    #[serde(default)]
    pub vehicle: String,
    #[serde(default)]
    pub license_number: String,
    #[serde(default)]
    pub status: DriverStatus,
    #[serde(default)]
    pub phone: String,
}

/// What a safety event detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Alcohol,
    Drowsiness,
    PhoneUse,
    Smoking,
    Distraction,
    Seatbelt,
    Speeding,
    #[serde(other)]
    Unknown,
}

impl EventKind {
    pub const KNOWN: [Self; 7] = [
        Self::Alcohol,
        Self::Drowsiness,
        Self::PhoneUse,
        Self::Smoking,
        Self::Distraction,
        Self::Seatbelt,
        Self::Speeding,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Alcohol => "Alcohol",
            Self::Drowsiness => "Drowsiness",
            Self::PhoneUse => "Phone use",
            Self::Smoking => "Smoking",
            Self::Distraction => "Distraction",
            Self::Seatbelt => "Seatbelt",
            Self::Speeding => "Speeding",
            Self::Unknown => "Unknown",
        }
    }

    /// Severity assumed when an alert arrives without one.
    pub fn default_severity(self) -> Severity {
        match self {
            Self::Alcohol | Self::Drowsiness => Severity::Critical,
            Self::PhoneUse | Self::Distraction | Self::Speeding => Severity::Warning,
            Self::Smoking | Self::Seatbelt | Self::Unknown => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AlertRecord")]
pub struct SafetyAlert {
    pub id: AlertId,
    pub driver_id: DriverId,
    pub kind: EventKind,
    pub severity: Severity,
    /// RFC 3339 timestamp.
    pub occurred_at: String,
    pub location: String,
    pub notes: String,
    pub acknowledged: bool,
}

impl SafetyAlert {
    /// `occurred_at` as an instant, or `None` when it is not RFC 3339.
    pub fn occurred_at_time(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.occurred_at, &Rfc3339).ok()
    }
}

/// Wire shape of an alert, where severity may be omitted.
#[derive(Deserialize)]
struct AlertRecord {
    id: AlertId,
    driver_id: DriverId,
    kind: EventKind,
    #[serde(default)]
    severity: Option<Severity>,
    #[serde(default)]
    occurred_at: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    acknowledged: bool,
}

impl From<AlertRecord> for SafetyAlert {
    fn from(r: AlertRecord) -> Self {
        Self {
            id: r.id,
            driver_id: r.driver_id,
            kind: r.kind,
            severity: r.severity.unwrap_or_else(|| r.kind.default_severity()),
            occurred_at: r.occurred_at,
            location: r.location,
            notes: r.notes,
            acknowledged: r.acknowledged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(default)]
    pub alert_id: Option<AlertId>,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub read: bool,
}

/// A notification before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub alert_id: Option<AlertId>,
    pub title: String,
    pub body: String,
}

/// The document the store loads and saves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub name: String,
    pub drivers: Vec<Driver>,
    pub alerts: Vec<SafetyAlert>,
    pub notifications: Vec<Notification>,
}

pub fn now_rfc3339() -> String {
    format_rfc3339(OffsetDateTime::now_utc())
}

pub fn format_rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_default()
}

/// `YYYY-MM-DD HH:MM` for an RFC 3339 timestamp, or the input unchanged
/// when it does not parse.
pub fn display_time(rfc3339: &str) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    OffsetDateTime::parse(rfc3339, &Rfc3339)
        .ok()
        .and_then(|at| at.format(&format).ok())
        .unwrap_or_else(|| rfc3339.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_default_severities() {
        assert_eq!(EventKind::Alcohol.default_severity(), Severity::Critical);
        assert_eq!(EventKind::Drowsiness.default_severity(), Severity::Critical);
        assert_eq!(EventKind::PhoneUse.default_severity(), Severity::Warning);
        assert_eq!(EventKind::Speeding.default_severity(), Severity::Warning);
        assert_eq!(EventKind::Seatbelt.default_severity(), Severity::Info);
    }

    #[test]
    fn alert_without_severity_uses_kind_default() {
        let alert: SafetyAlert =
            serde_json::from_str(r#"{"id":1,"driver_id":2,"kind":"alcohol"}"#).expect("parse");
        assert_eq!(alert.severity, Severity::Critical);
        assert!(!alert.acknowledged);
        assert_eq!(alert.occurred_at, "");
    }

    #[test]
    fn explicit_severity_wins() {
        let alert: SafetyAlert = serde_json::from_str(
            r#"{"id":1,"driver_id":2,"kind":"alcohol","severity":"info"}"#,
        )
        .expect("parse");
        assert_eq!(alert.severity, Severity::Info);
    }

    #[test]
    fn unrecognised_kind_is_unknown() {
        let alert: SafetyAlert =
            serde_json::from_str(r#"{"id":1,"driver_id":2,"kind":"teleporting"}"#).expect("parse");
        assert_eq!(alert.kind, EventKind::Unknown);
        assert_eq!(alert.severity, Severity::Info);
    }

    #[test]
    fn alert_serializes_snake_case() {
        let alert = SafetyAlert {
            id: 3,
            driver_id: 1,
            kind: EventKind::PhoneUse,
            severity: Severity::Warning,
            occurred_at: String::new(),
            location: String::new(),
            notes: String::new(),
            acknowledged: false,
        };
        let json = serde_json::to_value(&alert).expect("serialize");
        assert_eq!(json["kind"], "phone_use");
        assert_eq!(json["severity"], "warning");
    }

    #[test]
    fn dataset_fields_default() {
        let data: Dataset = serde_json::from_str(r#"{"drivers":[]}"#).expect("parse");
        assert!(data.alerts.is_empty());
        assert!(data.notifications.is_empty());
    }

    #[test]
    fn occurred_at_parses_offsets() {
        let mut alert: SafetyAlert =
            serde_json::from_str(r#"{"id":1,"driver_id":2,"kind":"alcohol"}"#).expect("parse");
        assert_eq!(alert.occurred_at_time(), None);
        alert.occurred_at = "2024-01-01T10:00:00+02:00".to_owned();
        let at = alert.occurred_at_time().expect("rfc3339");
        assert_eq!(at.to_offset(time::UtcOffset::UTC).hour(), 8);
    }

    #[test]
    fn display_time_formats_and_falls_back() {
        assert_eq!(display_time("2024-03-05T07:09:00Z"), "2024-03-05 07:09");
        assert_eq!(display_time("yesterday"), "yesterday");
    }
}
