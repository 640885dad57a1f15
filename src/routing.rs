use std::path::Path;

use ecoroute_core::prelude::*;
use geo::Point;
use log::info;
use serde::Serialize;

/// How the route endpoints are chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endpoints {
    Nodes { from: NodeId, to: NodeId },
    Points { from: Point<f64>, to: Point<f64> },
    Random { seed: u64 },
}

#[derive(Debug, Serialize)]
pub struct RouteSummary {
    pub from: NodeId,
    pub to: NodeId,
    pub found: bool,
    /// Node ids along the route, empty when unreachable
    pub nodes: Vec<NodeId>,
    pub total_cost: Option<f64>,
    pub total_distance_km: Option<f64>,
    pub total_emission_g: Option<f64>,
}

/// Parses a `[lat, lon]` pair from the command line into a point
///
/// # Errors
///
/// Returns an error unless exactly two in-range values are given.
pub fn lat_lon(values: &[f64]) -> Result<Point<f64>, Error> {
    match values {
        [lat, lon] if (-90.0..=90.0).contains(lat) && (-180.0..=180.0).contains(lon) => {
            Ok(Point::new(*lon, *lat))
        }
        _ => Err(Error::ConfigError(format!(
            "expected LAT LON within range, got {values:?}"
        ))),
    }
}

/// Builds the cost graph from an arc cost table and routes between the
/// chosen endpoints, optionally writing the legs as GeoJSON.
///
/// # Errors
///
/// Returns an error if the table cannot be read, an endpoint is unknown,
/// or the GeoJSON file cannot be written.
pub fn route(
    arc_costs: &Path,
    aggregation: EdgeAggregation,
    endpoints: Endpoints,
    geojson: Option<&Path>,
) -> Result<RouteSummary, Error> {
    let arcs = read_arc_costs(arc_costs)?;
    let graph = CostGraph::from_arcs(&arcs, aggregation);

    let (from, to, found) = match endpoints {
        Endpoints::Nodes { from, to } => (from, to, shortest_path(&graph, from, to)?),
        Endpoints::Points { from, to } => {
            let snapped = route_between_points(&graph, from, to)?;
            info!(
                "Snapped start to node {} ({:.0} m), end to node {} ({:.0} m)",
                snapped.source, snapped.source_offset_m, snapped.target, snapped.target_offset_m
            );
            (snapped.source, snapped.target, snapped.route)
        }
        Endpoints::Random { seed } => {
            let (from, to) = graph.random_connected_pair(seed)?;
            info!("Random pair with seed {seed}: {from} -> {to}");
            (from, to, shortest_path(&graph, from, to)?)
        }
    };

    let Some(found) = found else {
        log::warn!("No path between nodes {from} and {to}");
        return Ok(RouteSummary {
            from,
            to,
            found: false,
            nodes: Vec::new(),
            total_cost: None,
            total_distance_km: None,
            total_emission_g: None,
        });
    };

    if let Some(path) = geojson {
        std::fs::write(path, found.to_geojson_string()?)?;
        info!("Wrote route GeoJSON to {}", path.display());
    }

    Ok(RouteSummary {
        from,
        to,
        found: true,
        total_cost: Some(found.total_cost),
        total_distance_km: Some(found.total_distance_km),
        total_emission_g: Some(found.total_emission_g),
        nodes: found.nodes,
    })
}
