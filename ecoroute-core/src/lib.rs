//! Traffic-aware arc cost estimation and shortest-cost routing over a road network.
//!
//! The pipeline reads permanent road counter data, derives per-arc distance and
//! CO2 emission, learns regression models over sensor readings and builds an
//! undirected cost graph that answers shortest-path queries.

pub mod cost;
pub mod error;
pub mod features;
pub mod learning;
pub mod loading;
pub mod model;
pub mod network;
pub mod prelude;
pub mod routing;

pub use error::Error;

/// External identifier of a network node (counter network junction)
pub type NodeId = i64;
/// External identifier of a road arc
pub type ArcId = i64;
