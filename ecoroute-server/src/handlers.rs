use axum::Json;
use axum::extract::State;
use ecoroute_core::NodeId;
use ecoroute_core::loading::parse::parse_id;
use ecoroute_core::model::SensorReading;
use ecoroute_core::routing::{Route, route_between_points, shortest_path};
use geo::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ApiError;
use crate::state::AppState;

const FLOW_KEY: &str = "Debit_Horaire";
const OCCUPANCY_KEY: &str = "Taux d'occupation";

const REQUIRED_KEYS: [&str; 7] = [
    FLOW_KEY,
    OCCUPANCY_KEY,
    "Hour",
    "Weekday",
    "Month",
    "start_node",
    "end_node",
];

const NO_PATH: &str = "No path found between the provided nodes.";

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "nodes": state.graph.node_count(),
        "arcs": state.graph.edge_count(),
    }))
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predicted_distance: f64,
    pub predicted_emission: f64,
    pub routing_start_node: Value,
    pub routing_end_node: Value,
    pub optimized_path: Vec<NodeId>,
    pub total_route_cost: Option<f64>,
    #[serde(rename = "total_estimated_CO2")]
    pub total_estimated_co2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_error: Option<String>,
}

/// Predicts arc distance and emission for a sensor reading and routes
/// between two junctions.
///
/// The CO2 estimate applies the predicted per-arc emission to every hop of
/// the route.
pub async fn predict(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Value::Object(input) = body else {
        return Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !input.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Missing keys in input: {}",
            key_list(&missing)
        )));
    }

    let reading = SensorReading {
        flow: number(&input, FLOW_KEY)?,
        occupancy: number(&input, OCCUPANCY_KEY)?,
        hour: whole_number(&input, "Hour")?,
        weekday: whole_number(&input, "Weekday")?,
        month: whole_number(&input, "Month")?,
    };
    let prediction = state.arc_model.predict(&reading)?;

    let start = input.get("start_node").cloned().unwrap_or(Value::Null);
    let end = input.get("end_node").cloned().unwrap_or(Value::Null);

    let route = match (node_id(&start), node_id(&end)) {
        (Some(source), Some(target)) => {
            let graph = state.graph.clone();
            tokio::task::spawn_blocking(move || shortest_path(&graph, source, target)).await?
        }
        _ => Err(ecoroute_core::Error::InvalidData(
            "node identifiers must be integers".to_string(),
        )),
    };

    let mut response = PredictResponse {
        predicted_distance: prediction.distance_km,
        predicted_emission: prediction.emission_g,
        routing_start_node: start,
        routing_end_node: end,
        optimized_path: Vec::new(),
        total_route_cost: None,
        total_estimated_co2: None,
        route_error: None,
    };

    match route {
        Ok(Some(route)) => {
            #[allow(clippy::cast_precision_loss)]
            let hops = route.hops() as f64;
            response.total_estimated_co2 = Some(prediction.emission_g * hops);
            response.total_route_cost = Some(route.total_cost);
            response.optimized_path = route.nodes;
        }
        Ok(None) => response.route_error = Some(NO_PATH.to_string()),
        Err(err) => {
            tracing::debug!("Routing failed: {err}");
            response.route_error = Some(format!("{NO_PATH} {err}"));
        }
    }

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    /// `[lat, lon]`
    pub start: [f64; 2],
    /// `[lat, lon]`
    pub end: [f64; 2],
    #[serde(default)]
    pub geojson: bool,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub start_node: NodeId,
    pub end_node: NodeId,
    /// Route polyline as `[lat, lon]` pairs, empty when unreachable
    pub route: Vec<[f64; 2]>,
    pub nodes: Vec<NodeId>,
    pub total_cost: Option<f64>,
    pub total_distance_km: Option<f64>,
    pub total_emission_g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geojson: Option<Value>,
}

/// Least-cost route between two coordinates snapped to the network
pub async fn route(
    State(state): State<AppState>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ApiError> {
    let from = lat_lon_point(request.start, "start")?;
    let to = lat_lon_point(request.end, "end")?;

    let graph = state.graph.clone();
    let snapped = tokio::task::spawn_blocking(move || route_between_points(&graph, from, to))
        .await??;

    let mut response = RouteResponse {
        start_node: snapped.source,
        end_node: snapped.target,
        route: Vec::new(),
        nodes: Vec::new(),
        total_cost: None,
        total_distance_km: None,
        total_emission_g: None,
        geojson: None,
    };

    if let Some(found) = snapped.route {
        if request.geojson {
            response.geojson = Some(route_geojson(&found)?);
        }
        response.route = found.points.iter().map(|c| [c.y, c.x]).collect();
        response.total_cost = Some(found.total_cost);
        response.total_distance_km = Some(found.total_distance_km);
        response.total_emission_g = Some(found.total_emission_g);
        response.nodes = found.nodes;
    }

    Ok(Json(response))
}

fn route_geojson(route: &Route) -> Result<Value, ApiError> {
    let collection = route.to_geojson()?;
    serde_json::to_value(collection).map_err(|e| ApiError::Internal(e.to_string()))
}

fn lat_lon_point([lat, lon]: [f64; 2], name: &str) -> Result<Point<f64>, ApiError> {
    if !(lat.is_finite() && (-90.0..=90.0).contains(&lat)) {
        return Err(ApiError::BadRequest(format!(
            "Invalid latitude for '{name}': {lat}"
        )));
    }
    if !(lon.is_finite() && (-180.0..=180.0).contains(&lon)) {
        return Err(ApiError::BadRequest(format!(
            "Invalid longitude for '{name}': {lon}"
        )));
    }
    Ok(Point::new(lon, lat))
}

/// Renders keys the way the legacy client expects: `['Hour', "Taux d'occupation"]`
fn key_list(keys: &[&str]) -> String {
    let quoted: Vec<String> = keys
        .iter()
        .map(|key| {
            if key.contains('\'') {
                format!("\"{key}\"")
            } else {
                format!("'{key}'")
            }
        })
        .collect();
    format!("[{}]", quoted.join(", "))
}

fn number(input: &Map<String, Value>, key: &str) -> Result<f64, ApiError> {
    let value = match input.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid value for '{key}': expected a number")))
}

fn whole_number(input: &Map<String, Value>, key: &str) -> Result<u32, ApiError> {
    let value = number(input, key)?;
    if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(ApiError::BadRequest(format!(
            "Invalid value for '{key}': expected a non-negative integer"
        )));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = value as u32;
    Ok(whole)
}

fn node_id(value: &Value) -> Option<NodeId> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(|f| parse_id(&f.to_string()))),
        Value::String(s) => parse_id(s),
        _ => None,
    }
}
