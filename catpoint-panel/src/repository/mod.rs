//! State store for the security panel
//!
//! The store owns the canonical alarm status, arming status and sensor
//! collection. The decision engine reads and writes through [`StateStore`]
//! and never keeps its own copy.

pub mod sensor;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

pub use sensor::{AlarmStatus, ArmingStatus, Sensor, SensorType};

/// Default sensor capacity, matching the four slots on the physical panel
pub const DEFAULT_MAX_SENSORS: usize = 4;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Sensor not found: {0}")]
    SensorNotFound(Uuid),
    #[error("Sensor capacity of {0} reached")]
    CapacityExceeded(usize),
    #[error("Repository lock poisoned")]
    Poisoned,
}

/// Storage contract consumed by the decision engine
pub trait StateStore: Send + Sync {
    fn alarm_status(&self) -> Result<AlarmStatus, RepositoryError>;
    fn set_alarm_status(&self, status: AlarmStatus) -> Result<(), RepositoryError>;
    fn arming_status(&self) -> Result<ArmingStatus, RepositoryError>;
    fn set_arming_status(&self, status: ArmingStatus) -> Result<(), RepositoryError>;
    fn sensors(&self) -> Result<Vec<Sensor>, RepositoryError>;
    fn add_sensor(&self, sensor: Sensor) -> Result<(), RepositoryError>;
    fn remove_sensor(&self, sensor: &Sensor) -> Result<(), RepositoryError>;
    /// Persist a sensor's mutated active flag
    fn update_sensor(&self, sensor: &Sensor) -> Result<(), RepositoryError>;
}

#[derive(Debug, Default)]
struct PanelState {
    alarm_status: AlarmStatus,
    arming_status: ArmingStatus,
    sensors: HashMap<Uuid, Sensor>,
}

/// In-process store used by the console and tests
pub struct InMemoryRepository {
    state: Mutex<PanelState>,
    max_sensors: usize,
}

impl InMemoryRepository {
    /// Create an empty store: no alarm, disarmed, no sensors
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SENSORS)
    }

    pub fn with_capacity(max_sensors: usize) -> Self {
        Self {
            state: Mutex::new(PanelState::default()),
            max_sensors,
        }
    }

    /// Seed the arming status without going through the engine
    pub fn with_arming_status(self, status: ArmingStatus) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.arming_status = status;
        }
        self
    }

    pub fn max_sensors(&self) -> usize {
        self.max_sensors
    }

    fn lock(&self) -> Result<MutexGuard<'_, PanelState>, RepositoryError> {
        self.state.lock().map_err(|_| RepositoryError::Poisoned)
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for InMemoryRepository {
    fn alarm_status(&self) -> Result<AlarmStatus, RepositoryError> {
        Ok(self.lock()?.alarm_status)
    }

    fn set_alarm_status(&self, status: AlarmStatus) -> Result<(), RepositoryError> {
        self.lock()?.alarm_status = status;
        Ok(())
    }

    fn arming_status(&self) -> Result<ArmingStatus, RepositoryError> {
        Ok(self.lock()?.arming_status)
    }

    fn set_arming_status(&self, status: ArmingStatus) -> Result<(), RepositoryError> {
        self.lock()?.arming_status = status;
        Ok(())
    }

    fn sensors(&self) -> Result<Vec<Sensor>, RepositoryError> {
        Ok(self.lock()?.sensors.values().cloned().collect())
    }

    fn add_sensor(&self, sensor: Sensor) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if !state.sensors.contains_key(&sensor.id()) && state.sensors.len() >= self.max_sensors {
            return Err(RepositoryError::CapacityExceeded(self.max_sensors));
        }
        state.sensors.insert(sensor.id(), sensor);
        Ok(())
    }

    fn remove_sensor(&self, sensor: &Sensor) -> Result<(), RepositoryError> {
        self.lock()?.sensors.remove(&sensor.id());
        Ok(())
    }

    fn update_sensor(&self, sensor: &Sensor) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        match state.sensors.get_mut(&sensor.id()) {
            Some(stored) => {
                *stored = sensor.clone();
                Ok(())
            }
            None => Err(RepositoryError::SensorNotFound(sensor.id())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.alarm_status().unwrap(), AlarmStatus::NoAlarm);
        assert_eq!(repo.arming_status().unwrap(), ArmingStatus::Disarmed);
        assert!(repo.sensors().unwrap().is_empty());
        assert_eq!(repo.max_sensors(), DEFAULT_MAX_SENSORS);
    }

    #[test]
    fn test_add_update_remove() {
        let repo = InMemoryRepository::new();
        let sensor = Sensor::new("Garage", SensorType::Door);
        repo.add_sensor(sensor.clone()).unwrap();

        repo.update_sensor(&sensor.with_active(true)).unwrap();
        let stored = repo.sensors().unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].is_active());

        repo.remove_sensor(&sensor).unwrap();
        assert!(repo.sensors().unwrap().is_empty());

        // removing twice is fine
        repo.remove_sensor(&sensor).unwrap();
    }

    #[test]
    fn test_update_unknown_sensor() {
        let repo = InMemoryRepository::new();
        let sensor = Sensor::new("Ghost", SensorType::Motion);
        match repo.update_sensor(&sensor) {
            Err(RepositoryError::SensorNotFound(id)) => assert_eq!(id, sensor.id()),
            other => panic!("expected SensorNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_capacity() {
        let repo = InMemoryRepository::with_capacity(2);
        let first = Sensor::new("One", SensorType::Door);
        repo.add_sensor(first.clone()).unwrap();
        repo.add_sensor(Sensor::new("Two", SensorType::Window)).unwrap();

        assert!(matches!(
            repo.add_sensor(Sensor::new("Three", SensorType::Motion)),
            Err(RepositoryError::CapacityExceeded(2))
        ));

        // re-adding a known sensor replaces it rather than counting twice
        repo.add_sensor(first.with_active(true)).unwrap();
        assert_eq!(repo.sensors().unwrap().len(), 2);
    }

    #[test]
    fn test_seeded_arming_status() {
        let repo = InMemoryRepository::new().with_arming_status(ArmingStatus::ArmedAway);
        assert_eq!(repo.arming_status().unwrap(), ArmingStatus::ArmedAway);
    }
}
