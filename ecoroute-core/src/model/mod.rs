//! Data model for counter observations

pub mod observation;
pub mod traffic;

pub use observation::{ArcObservation, SensorReading};
pub use traffic::TrafficState;
