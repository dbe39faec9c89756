//! Sensor and status types shared by the store and the decision engine

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Current alert level of the panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmStatus {
    #[default]
    NoAlarm,
    PendingAlarm,
    Alarm,
}

impl AlarmStatus {
    pub fn description(&self) -> &'static str {
        match self {
            AlarmStatus::NoAlarm => "Cool and Good",
            AlarmStatus::PendingAlarm => "I'm in Danger...",
            AlarmStatus::Alarm => "Awooga!",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmStatus::NoAlarm => "NO_ALARM",
            AlarmStatus::PendingAlarm => "PENDING_ALARM",
            AlarmStatus::Alarm => "ALARM",
        }
    }
}

impl fmt::Display for AlarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlarmStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NO_ALARM" => Ok(AlarmStatus::NoAlarm),
            "PENDING_ALARM" => Ok(AlarmStatus::PendingAlarm),
            "ALARM" => Ok(AlarmStatus::Alarm),
            _ => Err(ParseStatusError::new("alarm status", s)),
        }
    }
}

/// Operator-selected monitoring mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArmingStatus {
    #[default]
    Disarmed,
    ArmedHome,
    ArmedAway,
}

impl ArmingStatus {
    pub fn description(&self) -> &'static str {
        match self {
            ArmingStatus::Disarmed => "Disarmed",
            ArmingStatus::ArmedHome => "Armed - At Home",
            ArmingStatus::ArmedAway => "Armed - Away",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArmingStatus::Disarmed => "DISARMED",
            ArmingStatus::ArmedHome => "ARMED_HOME",
            ArmingStatus::ArmedAway => "ARMED_AWAY",
        }
    }

    pub fn is_armed(&self) -> bool {
        !matches!(self, ArmingStatus::Disarmed)
    }
}

impl fmt::Display for ArmingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArmingStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DISARMED" => Ok(ArmingStatus::Disarmed),
            "ARMED_HOME" => Ok(ArmingStatus::ArmedHome),
            "ARMED_AWAY" => Ok(ArmingStatus::ArmedAway),
            _ => Err(ParseStatusError::new("arming status", s)),
        }
    }
}

/// Kind of physical sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorType {
    Door,
    Window,
    Motion,
}

impl SensorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Door => "DOOR",
            SensorType::Window => "WINDOW",
            SensorType::Motion => "MOTION",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DOOR" => Ok(SensorType::Door),
            "WINDOW" => Ok(SensorType::Window),
            "MOTION" => Ok(SensorType::Motion),
            _ => Err(ParseStatusError::new("sensor type", s)),
        }
    }
}

/// A binary-state input device
///
/// Identity is the id alone: two sensors with the same id compare equal even
/// if their names or active flags differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    id: Uuid,
    name: String,
    sensor_type: SensorType,
    active: bool,
}

impl Sensor {
    /// Create an inactive sensor with a fresh id
    pub fn new(name: impl Into<String>, sensor_type: SensorType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            sensor_type,
            active: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Copy of this sensor with a different active flag.
    ///
    /// Only the decision engine and the store should flip the flag; callers
    /// go through `AlarmDecisionEngine::change_sensor_activation`.
    pub(crate) fn with_active(&self, active: bool) -> Self {
        Self {
            active,
            ..self.clone()
        }
    }
}

impl PartialEq for Sensor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Sensor {}

impl Hash for Sensor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Display ordering: name, then type name, then id
pub fn display_order(a: &Sensor, b: &Sensor) -> Ordering {
    a.name
        .cmp(&b.name)
        .then_with(|| a.sensor_type.as_str().cmp(b.sensor_type.as_str()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort sensors in place for display
pub fn sort_for_display(sensors: &mut [Sensor]) {
    sensors.sort_by(display_order);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_by_id() {
        let sensor = Sensor::new("Front Door", SensorType::Door);
        let toggled = sensor.with_active(true);
        assert_eq!(sensor, toggled);
        assert!(toggled.is_active());

        let other = Sensor::new("Front Door", SensorType::Door);
        assert_ne!(sensor, other);
    }

    #[test]
    fn test_display_order() {
        let kitchen = Sensor::new("Kitchen", SensorType::Window);
        let back_window = Sensor::new("Back", SensorType::Window);
        let back_door = Sensor::new("Back", SensorType::Door);
        let back_motion = Sensor::new("Back", SensorType::Motion);

        let mut sensors = vec![kitchen.clone(), back_window.clone(), back_motion.clone(), back_door.clone()];
        sort_for_display(&mut sensors);

        assert_eq!(sensors, vec![back_door, back_motion, back_window, kitchen]);
    }

    #[test]
    fn test_display_order_falls_back_to_id() {
        let a = Sensor::new("Hall", SensorType::Motion);
        let b = Sensor::new("Hall", SensorType::Motion);
        let expected = a.id().cmp(&b.id());
        assert_eq!(display_order(&a, &b), expected);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("no_alarm".parse::<AlarmStatus>().unwrap(), AlarmStatus::NoAlarm);
        assert_eq!("ARMED_HOME".parse::<ArmingStatus>().unwrap(), ArmingStatus::ArmedHome);
        assert_eq!(" window ".parse::<SensorType>().unwrap(), SensorType::Window);
        assert!("armed".parse::<ArmingStatus>().is_err());
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&AlarmStatus::PendingAlarm).unwrap();
        assert_eq!(json, "\"PENDING_ALARM\"");
        let parsed: ArmingStatus = serde_json::from_str("\"ARMED_AWAY\"").unwrap();
        assert_eq!(parsed, ArmingStatus::ArmedAway);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(AlarmStatus::Alarm.description(), "Awooga!");
        assert_eq!(ArmingStatus::ArmedHome.description(), "Armed - At Home");
        assert!(!ArmingStatus::Disarmed.is_armed());
        assert!(ArmingStatus::ArmedAway.is_armed());
    }
}
