//! Cost graph components - junction nodes and priced arcs

use geo::{LineString, Point};
use serde::{Deserialize, Serialize};

use crate::{ArcId, NodeId};

/// Road junction, identified by the counter network node id
#[derive(Debug, Clone)]
pub struct ArcNode {
    pub id: NodeId,
    /// Node coordinates (lon, lat)
    pub geometry: Point<f64>,
}

/// Road segment between two junctions
#[derive(Debug, Clone)]
pub struct ArcEdge {
    pub arc_id: ArcId,
    pub label: String,
    /// Composite cost, the routing weight
    pub cost: f64,
    pub distance_km: f64,
    pub emission_g: f64,
    /// Node the geometry starts at
    pub upstream: NodeId,
    pub geometry: LineString<f64>,
    /// Number of arc rows merged into this edge
    pub samples: usize,
}

impl ArcEdge {
    /// Geometry oriented to start at `from`
    pub fn geometry_from(&self, from: NodeId) -> LineString<f64> {
        if from == self.upstream {
            self.geometry.clone()
        } else {
            let mut coords = self.geometry.0.clone();
            coords.reverse();
            LineString::new(coords)
        }
    }
}

/// How repeated arcs between the same pair of nodes collapse into one edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeAggregation {
    /// Average cost, distance and emission; first geometry
    #[default]
    Mean,
    /// Last row wins
    Last,
    /// Cheapest row wins
    Min,
}
