//! Catpoint Panel - home security panel simulator
//!
//! The core is [`AlarmDecisionEngine`], which turns sensor activations,
//! camera frames and arming changes into an alarm status. State lives in a
//! [`repository::StateStore`]; cat detection is delegated to an
//! [`engine::CatClassifier`]; changes fan out to
//! [`listener::StatusListener`]s.

pub mod config;
pub mod console;
pub mod engine;
pub mod listener;
pub mod logging;
pub mod repository;

/// Re-export commonly used types
pub use config::Config;
pub use engine::{AlarmDecisionEngine, EngineError, SharedEngine};
pub use repository::{AlarmStatus, ArmingStatus, InMemoryRepository, Sensor, SensorType};
