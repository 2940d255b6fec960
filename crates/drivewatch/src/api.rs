//! Store handlers whose results are wrapped in a JSON envelope.
//!
//! Every handler returns an [`Envelope`]. Store failures never escape raw:
//! they become `success: false` with the error text, and are logged.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{AlertId, Driver, DriverId, Notification, NotificationId, SafetyAlert};
use crate::error::Result;
use crate::store::{AlertQuery, SafetyStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    fn from_result(op: &'static str, result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => {
                warn!(op, %err, "handler failed");
                Self::err(err.to_string())
            }
        }
    }
}

impl<T: Serialize> Envelope<T> {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|err| {
            warn!(%err, "envelope serialization failed");
            r#"{"success":false,"data":null,"error":"serialization failed"}"#.to_owned()
        })
    }
}

/// A driver with the number of alerts still awaiting acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverSummary {
    #[serde(flatten)]
    pub driver: Driver,
    pub open_alerts: usize,
}

pub fn list_alerts(store: &dyn SafetyStore, query: &AlertQuery) -> Envelope<Vec<SafetyAlert>> {
    Envelope::ok(store.alerts(query))
}

pub fn get_alert(store: &dyn SafetyStore, id: AlertId) -> Envelope<SafetyAlert> {
    Envelope::from_result("get_alert", store.alert(id))
}

pub fn acknowledge_alert(store: &mut dyn SafetyStore, id: AlertId) -> Envelope<SafetyAlert> {
    Envelope::from_result("acknowledge_alert", store.acknowledge_alert(id))
}

pub fn delete_alert(store: &mut dyn SafetyStore, id: AlertId) -> Envelope<SafetyAlert> {
    Envelope::from_result("delete_alert", store.delete_alert(id))
}

pub fn list_drivers(store: &dyn SafetyStore) -> Envelope<Vec<DriverSummary>> {
    let drivers = store
        .drivers()
        .into_iter()
        .map(|driver| DriverSummary {
            open_alerts: store.open_alert_count(driver.id),
            driver,
        })
        .collect();
    Envelope::ok(drivers)
}

pub fn get_driver(store: &dyn SafetyStore, id: DriverId) -> Envelope<DriverSummary> {
    let result = store.driver(id).map(|driver| DriverSummary {
        open_alerts: store.open_alert_count(id),
        driver,
    });
    Envelope::from_result("get_driver", result)
}

pub fn list_notifications(store: &dyn SafetyStore) -> Envelope<Vec<Notification>> {
    Envelope::ok(store.notifications())
}

pub fn mark_notification_read(
    store: &mut dyn SafetyStore,
    id: NotificationId,
) -> Envelope<Notification> {
    Envelope::from_result(
        "mark_notification_read",
        store.mark_notification_read(id),
    )
}
