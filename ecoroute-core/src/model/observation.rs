//! Cleaned per-arc, per-hour counter observation

use chrono::NaiveDateTime;

use super::TrafficState;
use crate::features::emissions::VehicleClass;
use crate::loading::geo_shape::GeoShape;
use crate::{ArcId, NodeId};

#[derive(Debug, Clone)]
pub struct ArcObservation {
    pub arc_id: ArcId,
    pub label: String,
    /// Counting hour in UTC, `None` when the source value could not be parsed
    pub timestamp: Option<NaiveDateTime>,
    /// Vehicles per hour
    pub flow: f64,
    /// Occupancy rate in percent
    pub occupancy: f64,
    pub state: TrafficState,
    pub upstream: NodeId,
    pub downstream: NodeId,
    pub shape: GeoShape,
    /// Polyline length in kilometres
    pub distance_km: f64,
    pub vehicle_class: VehicleClass,
    /// Estimated emission in grams of CO2
    pub emission_g: f64,
}

/// A single sensor reading used by the arc feature model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub flow: f64,
    pub occupancy: f64,
    pub hour: u32,
    /// Monday = 0
    pub weekday: u32,
    pub month: u32,
}
