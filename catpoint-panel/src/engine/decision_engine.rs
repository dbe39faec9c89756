//! Alarm decision engine
//!
//! Turns sensor edges, camera frames and arming changes into an alarm
//! status. Every decision reads the store, recomputes, and writes back; the
//! engine keeps no copy of alarm, arming or sensor state apart from the
//! transient cat-presence flag.

use crate::engine::cat_detector::{CameraImage, CatClassifier, ClassifierError};
use crate::listener::StatusListener;
use crate::repository::{AlarmStatus, ArmingStatus, RepositoryError, Sensor, StateStore};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Threshold passed to the classifier, in percent
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 50.0;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Sensor is not registered: {0}")]
    UnknownSensor(Uuid),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
}

/// Engine behind the single lock multi-threaded hosts must share
pub type SharedEngine = Arc<Mutex<AlarmDecisionEngine>>;

/// Decision engine that owns the alarm transition rules
pub struct AlarmDecisionEngine {
    store: Arc<dyn StateStore>,
    classifier: Arc<dyn CatClassifier>,
    listeners: Vec<Arc<dyn StatusListener>>,
    cat_detected: bool,
    confidence_threshold: f32,
}

impl AlarmDecisionEngine {
    /// Create a new decision engine
    pub fn new(store: Arc<dyn StateStore>, classifier: Arc<dyn CatClassifier>) -> Self {
        Self {
            store,
            classifier,
            listeners: Vec::new(),
            cat_detected: false,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, confidence_threshold: f32) -> Self {
        self.confidence_threshold = confidence_threshold;
        self
    }

    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    /// Register a listener. Adding the same handle twice has no effect.
    pub fn add_status_listener(&mut self, listener: Arc<dyn StatusListener>) {
        if !self.listeners.iter().any(|l| same_listener(l, &listener)) {
            self.listeners.push(listener);
        }
    }

    pub fn remove_status_listener(&mut self, listener: &Arc<dyn StatusListener>) {
        self.listeners.retain(|l| !same_listener(l, listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Result of the most recent image classification
    pub fn cat_detected(&self) -> bool {
        self.cat_detected
    }

    pub fn alarm_status(&self) -> Result<AlarmStatus, EngineError> {
        Ok(self.store.alarm_status()?)
    }

    pub fn arming_status(&self) -> Result<ArmingStatus, EngineError> {
        Ok(self.store.arming_status()?)
    }

    /// Sensors in display order
    pub fn sensors(&self) -> Result<Vec<Sensor>, EngineError> {
        let mut sensors = self.store.sensors()?;
        crate::repository::sensor::sort_for_display(&mut sensors);
        Ok(sensors)
    }

    pub fn add_sensor(&mut self, sensor: Sensor) -> Result<(), EngineError> {
        debug!(sensor_id = %sensor.id(), name = sensor.name(), "Adding sensor");
        self.store.add_sensor(sensor)?;
        Ok(())
    }

    pub fn remove_sensor(&mut self, sensor: &Sensor) -> Result<(), EngineError> {
        debug!(sensor_id = %sensor.id(), "Removing sensor");
        self.store.remove_sensor(sensor)?;
        Ok(())
    }

    /// Change the activation status of a registered sensor.
    ///
    /// The trigger for an inactive→active or active→inactive edge runs
    /// before the new flag is written. The flag is written even when it does
    /// not change.
    pub fn change_sensor_activation(&mut self, sensor: &Sensor, active: bool) -> Result<(), EngineError> {
        let stored = self
            .store
            .sensors()?
            .into_iter()
            .find(|s| s.id() == sensor.id())
            .ok_or(EngineError::UnknownSensor(sensor.id()))?;

        match (stored.is_active(), active) {
            (false, true) => self.handle_sensor_activated()?,
            (true, false) => self.handle_sensor_deactivated()?,
            _ => debug!(sensor_id = %sensor.id(), active, "Sensor activation unchanged"),
        }

        self.store.update_sensor(&sensor.with_active(active))?;
        Ok(())
    }

    /// Classify a camera frame and apply the cat-detection rule.
    ///
    /// A classifier failure is returned before any state is touched.
    pub fn process_image(&mut self, image: &CameraImage) -> Result<bool, EngineError> {
        let cat = self.classifier.contains_cat(image, self.confidence_threshold)?;
        self.handle_cat_detected(cat)?;
        Ok(cat)
    }

    /// Change the arming status. Every sensor is reset to inactive.
    pub fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), EngineError> {
        if status == ArmingStatus::Disarmed {
            self.set_alarm_status(AlarmStatus::NoAlarm)?;
        } else if self.cat_detected {
            self.set_alarm_status(AlarmStatus::Alarm)?;
        }

        for sensor in self.store.sensors()? {
            self.store.update_sensor(&sensor.with_active(false))?;
        }

        self.store.set_arming_status(status)?;
        info!(arming = %status, "Arming status changed");

        self.listeners.iter().for_each(|l| l.on_sensor_state_changed());
        Ok(())
    }

    /// Write the alarm status and notify every listener
    pub fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), EngineError> {
        self.store.set_alarm_status(status)?;
        info!(status = %status, "Alarm status set");

        self.listeners.iter().for_each(|l| l.on_alarm_status_changed(status));
        Ok(())
    }

    fn handle_sensor_activated(&mut self) -> Result<(), EngineError> {
        let arming = self.store.arming_status()?;
        let alarm = self.store.alarm_status()?;
        if arming == ArmingStatus::Disarmed || alarm == AlarmStatus::Alarm {
            return Ok(());
        }

        let next = match alarm {
            AlarmStatus::NoAlarm => AlarmStatus::PendingAlarm,
            AlarmStatus::PendingAlarm => AlarmStatus::Alarm,
            AlarmStatus::Alarm => return Ok(()),
        };
        debug!(from = %alarm, to = %next, "Sensor activated");
        self.set_alarm_status(next)
    }

    fn handle_sensor_deactivated(&mut self) -> Result<(), EngineError> {
        if self.store.arming_status()? == ArmingStatus::Disarmed {
            return Ok(());
        }

        let alarm = self.store.alarm_status()?;
        let next = match alarm {
            AlarmStatus::PendingAlarm => AlarmStatus::NoAlarm,
            AlarmStatus::Alarm => AlarmStatus::PendingAlarm,
            AlarmStatus::NoAlarm => return Ok(()),
        };
        debug!(from = %alarm, to = %next, "Sensor deactivated");
        self.set_alarm_status(next)
    }

    fn handle_cat_detected(&mut self, cat: bool) -> Result<(), EngineError> {
        self.cat_detected = cat;

        if cat && self.store.arming_status()? == ArmingStatus::ArmedHome {
            self.set_alarm_status(AlarmStatus::Alarm)?;
        } else if !cat {
            // the arming mode is not consulted here
            let active = self.store.sensors()?.iter().filter(|s| s.is_active()).count();
            if active == 0 {
                self.set_alarm_status(AlarmStatus::NoAlarm)?;
            } else {
                debug!(active, "No cat, but sensors remain active");
            }
        }

        self.listeners.iter().for_each(|l| l.on_cat_detected(cat));
        Ok(())
    }
}

fn same_listener(a: &Arc<dyn StatusListener>, b: &Arc<dyn StatusListener>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
