// Re-export key components
pub use crate::cost::training::{TrainingConfig, TrainingReport, train};
pub use crate::cost::{
    ArcFeatureModel, ArcPrediction, CostModel, CostSource, CostWeights, TrafficFactors,
};
pub use crate::features::FeatureSpec;
pub use crate::learning::{load_json, save_json};
pub use crate::loading::{
    GeoShape, PipelineConfig, WeatherTable, load_observations, read_weather, write_cleaned,
};
pub use crate::model::{ArcObservation, SensorReading, TrafficState};
pub use crate::network::{ArcCost, CostGraph, EdgeAggregation, read_arc_costs, write_arc_costs};
pub use crate::routing::{Route, SnappedRoute, route_between_points, shortest_path};

// Core identifiers
pub use crate::ArcId;
pub use crate::Error;
pub use crate::NodeId;
