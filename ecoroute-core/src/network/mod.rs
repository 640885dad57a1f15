//! Undirected cost graph built from the per-arc cost table

pub mod arc_costs;
pub mod components;
pub mod graph;

pub use arc_costs::{ArcCost, read_arc_costs, write_arc_costs};
pub use components::{ArcEdge, ArcNode, EdgeAggregation};
pub use graph::CostGraph;
