//! Status listeners notified by the decision engine
//!
//! Notifications are delivered synchronously while the engine is mid
//! operation. Implementations must return quickly and must not call back
//! into the engine.

use crate::repository::AlarmStatus;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Observer of panel state changes
pub trait StatusListener: Send + Sync {
    fn on_alarm_status_changed(&self, status: AlarmStatus);
    fn on_cat_detected(&self, detected: bool);
    fn on_sensor_state_changed(&self);
}

/// Writes every notification to the tracing subscriber
#[derive(Debug, Default)]
pub struct LoggingListener;

impl StatusListener for LoggingListener {
    fn on_alarm_status_changed(&self, status: AlarmStatus) {
        match status {
            AlarmStatus::Alarm => warn!(status = %status, "{}", status.description()),
            _ => info!(status = %status, "{}", status.description()),
        }
    }

    fn on_cat_detected(&self, detected: bool) {
        if detected {
            info!("Cat detected on camera");
        } else {
            debug!("No cat on camera");
        }
    }

    fn on_sensor_state_changed(&self) {
        debug!("Sensor states reset");
    }
}

/// Panel events for broadcasting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelEvent {
    AlarmStatusChanged {
        status: AlarmStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    CatDetected {
        detected: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    SensorStateChanged {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Forwards notifications onto a broadcast channel
pub struct BroadcastListener {
    event_tx: broadcast::Sender<PanelEvent>,
}

impl BroadcastListener {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity);
        Self { event_tx }
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.event_tx.subscribe()
    }

    fn send(&self, event: PanelEvent) {
        // no subscribers is not an error
        let _ = self.event_tx.send(event);
    }
}

impl StatusListener for BroadcastListener {
    fn on_alarm_status_changed(&self, status: AlarmStatus) {
        self.send(PanelEvent::AlarmStatusChanged {
            status,
            timestamp: chrono::Utc::now(),
        });
    }

    fn on_cat_detected(&self, detected: bool) {
        self.send(PanelEvent::CatDetected {
            detected,
            timestamp: chrono::Utc::now(),
        });
    }

    fn on_sensor_state_changed(&self) {
        self.send(PanelEvent::SensorStateChanged {
            timestamp: chrono::Utc::now(),
        });
    }
}
