//! Reading counter exports and weather records into cleaned observations,
//! plus the pipeline configuration.

mod config;
pub mod counts;
pub mod geo_shape;
pub mod parse;
pub mod weather;

pub use config::PipelineConfig;
pub use counts::{CleaningStats, load_observations, write_cleaned};
pub use geo_shape::GeoShape;
pub use weather::{WeatherTable, read_weather, write_weather};
