use geo::{Coord, LineString, Point};
use log::debug;
use serde::Serialize;

use super::dijkstra::dijkstra;
use crate::network::CostGraph;
use crate::{ArcId, Error, NodeId};

/// One traversed edge, geometry oriented in the direction of travel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLeg {
    pub arc_id: ArcId,
    pub label: String,
    pub from: NodeId,
    pub to: NodeId,
    pub cost: f64,
    pub distance_km: f64,
    pub emission_g: f64,
    /// Arc cost rows merged into this edge
    pub samples: usize,
    #[serde(skip)]
    pub geometry: LineString<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub nodes: Vec<NodeId>,
    pub legs: Vec<RouteLeg>,
    pub total_cost: f64,
    pub total_distance_km: f64,
    pub total_emission_g: f64,
    /// Route polyline, shared junction points kept once
    #[serde(skip)]
    pub points: Vec<Coord<f64>>,
}

impl Route {
    pub fn hops(&self) -> usize {
        self.legs.len()
    }
}

/// Route between two coordinates, each snapped to its nearest junction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnappedRoute {
    pub source: NodeId,
    /// Distance from the requested start to `source`, in metres
    pub source_offset_m: f64,
    pub target: NodeId,
    pub target_offset_m: f64,
    pub route: Option<Route>,
}

/// Least-cost route between two junctions. `Ok(None)` when they lie in
/// different components.
///
/// # Errors
///
/// Returns `UnknownNode` if either id is not in the graph.
pub fn shortest_path(
    graph: &CostGraph,
    source: NodeId,
    target: NodeId,
) -> Result<Option<Route>, Error> {
    let source_idx = graph
        .node_index(source)
        .ok_or(Error::UnknownNode(source))?;
    let target_idx = graph
        .node_index(target)
        .ok_or(Error::UnknownNode(target))?;

    let tree = dijkstra(graph, source_idx, Some(target_idx));
    let Some((nodes, edges)) = tree.path_to(target_idx) else {
        debug!("No path between nodes {source} and {target}");
        return Ok(None);
    };

    let inner = graph.graph();
    let node_ids: Vec<NodeId> = nodes.iter().map(|&idx| inner[idx].id).collect();

    let mut legs = Vec::with_capacity(edges.len());
    for (pair, &edge_idx) in node_ids.windows(2).zip(&edges) {
        let edge = &inner[edge_idx];
        legs.push(RouteLeg {
            arc_id: edge.arc_id,
            label: edge.label.clone(),
            from: pair[0],
            to: pair[1],
            cost: edge.cost,
            distance_km: edge.distance_km,
            emission_g: edge.emission_g,
            samples: edge.samples,
            geometry: edge.geometry_from(pair[0]),
        });
    }

    let mut points: Vec<Coord<f64>> = Vec::new();
    if legs.is_empty() {
        points.push(inner[source_idx].geometry.into());
    }
    for leg in &legs {
        let skip = usize::from(!points.is_empty());
        points.extend(leg.geometry.0.iter().skip(skip).copied());
    }

    Ok(Some(Route {
        nodes: node_ids,
        total_cost: tree.cost(target_idx).unwrap_or_default(),
        total_distance_km: legs.iter().map(|l| l.distance_km).sum(),
        total_emission_g: legs.iter().map(|l| l.emission_g).sum(),
        legs,
        points,
    }))
}

/// # Errors
///
/// Returns `NoPointsFound` on an empty graph.
pub fn route_between_points(
    graph: &CostGraph,
    from: Point<f64>,
    to: Point<f64>,
) -> Result<SnappedRoute, Error> {
    let (source, source_offset_m) = graph.nearest_node(from)?;
    let (target, target_offset_m) = graph.nearest_node(to)?;
    debug!(
        "Snapped start to node {source} ({source_offset_m:.0} m), end to node {target} ({target_offset_m:.0} m)"
    );
    Ok(SnappedRoute {
        source,
        source_offset_m,
        target,
        target_offset_m,
        route: shortest_path(graph, source, target)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::EdgeAggregation;
    use crate::network::graph::tests::{arc, sample_arcs};

    #[test]
    fn route_follows_cheapest_edges() {
        let graph = CostGraph::from_arcs(&sample_arcs(), EdgeAggregation::Mean);
        let route = shortest_path(&graph, 3, 1).unwrap().unwrap();

        assert_eq!(route.nodes, vec![3, 2, 1]);
        assert_eq!(route.hops(), 2);
        assert_eq!(route.total_cost, 3.0);
        assert_eq!(route.legs[0].arc_id, 2);
        // travelled against the stored orientation
        assert_eq!(route.points.first().copied(), Some(Coord { x: 2.2, y: 48.0 }));
        assert_eq!(route.points.last().copied(), Some(Coord { x: 2.0, y: 48.0 }));
        assert_eq!(route.points.len(), 3);
        let expected_km = route.legs[0].distance_km + route.legs[1].distance_km;
        assert!((route.total_distance_km - expected_km).abs() < 1e-12);
    }

    #[test]
    fn same_node_is_an_empty_route() {
        let graph = CostGraph::from_arcs(&sample_arcs(), EdgeAggregation::Mean);
        let route = shortest_path(&graph, 2, 2).unwrap().unwrap();
        assert_eq!(route.nodes, vec![2]);
        assert_eq!(route.total_cost, 0.0);
        assert_eq!(route.points, vec![Coord { x: 2.1, y: 48.0 }]);
    }

    #[test]
    fn disconnected_and_unknown_nodes() {
        let graph = CostGraph::from_arcs(&sample_arcs(), EdgeAggregation::Mean);
        assert_eq!(shortest_path(&graph, 1, 8).unwrap(), None);
        assert!(matches!(
            shortest_path(&graph, 1, 99),
            Err(Error::UnknownNode(99))
        ));
    }

    #[test]
    fn zero_cost_edges_are_routable() {
        let arcs = vec![
            arc(1, 1, 2, 0.0, "[[2.0, 48.0], [2.1, 48.0]]"),
            arc(2, 2, 3, 0.0, "[[2.1, 48.0], [2.2, 48.0]]"),
        ];
        let graph = CostGraph::from_arcs(&arcs, EdgeAggregation::Mean);
        let route = shortest_path(&graph, 1, 3).unwrap().unwrap();
        assert_eq!(route.nodes, vec![1, 2, 3]);
        assert_eq!(route.total_cost, 0.0);
    }

    #[test]
    fn routes_between_coordinates() {
        let graph = CostGraph::from_arcs(&sample_arcs(), EdgeAggregation::Mean);
        let snapped =
            route_between_points(&graph, Point::new(2.001, 48.001), Point::new(2.199, 48.0))
                .unwrap();
        assert_eq!((snapped.source, snapped.target), (1, 3));
        assert!(snapped.source_offset_m > 0.0);
        assert_eq!(snapped.route.unwrap().nodes, vec![1, 2, 3]);
    }
}
