//! Core decision engine module

pub mod cat_detector;
pub mod decision_engine;

pub use cat_detector::{CameraImage, CatClassifier, ClassifierError, HeuristicCatClassifier};
pub use decision_engine::{AlarmDecisionEngine, EngineError, SharedEngine, DEFAULT_CONFIDENCE_THRESHOLD};
