use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use ecoroute_core::cost::ArcFeatureModel;
use ecoroute_core::features::sensor_features;
use ecoroute_core::learning::{ForestParams, Matrix, save_json};
use ecoroute_core::loading::GeoShape;
use ecoroute_core::model::SensorReading;
use ecoroute_core::network::{ArcCost, CostGraph, EdgeAggregation, write_arc_costs};
use ecoroute_server::{AppState, ServerConfig, app};
use serde_json::{Value, json};
use tower::ServiceExt;

fn arc(arc_id: i64, upstream: i64, downstream: i64, cost: f64, shape: &str) -> ArcCost {
    let shape = GeoShape::parse(shape).unwrap();
    ArcCost {
        arc_id,
        label: format!("arc {arc_id}"),
        upstream,
        downstream,
        distance_km: shape.length_km(),
        emission_g: 100.0,
        shape,
        cost,
    }
}

fn arcs() -> Vec<ArcCost> {
    vec![
        arc(1, 1, 2, 1.0, "[[2.0, 48.0], [2.1, 48.0]]"),
        arc(2, 2, 3, 1.0, "[[2.1, 48.0], [2.2, 48.0]]"),
        arc(3, 1, 3, 5.0, "[[2.0, 48.0], [2.1, 48.1], [2.2, 48.0]]"),
        arc(4, 7, 8, 1.0, "[[3.0, 49.0], [3.1, 49.0]]"),
    ]
}

fn arc_model() -> ArcFeatureModel {
    let readings: Vec<SensorReading> = (0..30)
        .map(|i| SensorReading {
            flow: f64::from(i * 50),
            occupancy: f64::from(i),
            hour: i % 24,
            weekday: i % 7,
            month: 1 + i % 12,
        })
        .collect();
    let rows: Vec<[f64; 5]> = readings.iter().map(sensor_features).collect();
    let x = Matrix::from_rows(&rows).unwrap();
    let distance = vec![0.5; readings.len()];
    let emission = vec![90.0; readings.len()];

    let mut model = ArcFeatureModel::new(ForestParams {
        n_estimators: 5,
        ..ForestParams::default()
    });
    model.fit(&x, &distance, &emission).unwrap();
    model
}

fn test_app() -> axum::Router {
    let graph = CostGraph::from_arcs(&arcs(), EdgeAggregation::Mean);
    app(AppState::new(graph, arc_model()), &ServerConfig::default())
}

async fn post_json(path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn predict_body() -> Value {
    json!({
        "Debit_Horaire": 420.0,
        "Taux d'occupation": 8.5,
        "Hour": 8,
        "Weekday": 1,
        "Month": 3,
        "start_node": 1,
        "end_node": 3,
    })
}

#[tokio::test]
async fn health_reports_graph_size() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "ok", "nodes": 5, "arcs": 4}));
}

#[tokio::test]
async fn predict_returns_prediction_and_route() {
    let (status, body) = post_json("/predict", predict_body()).await;
    assert_eq!(status, StatusCode::OK);

    assert!((body["predicted_distance"].as_f64().unwrap() - 0.5).abs() < 1e-9);
    assert!((body["predicted_emission"].as_f64().unwrap() - 90.0).abs() < 1e-9);
    assert_eq!(body["routing_start_node"], json!(1));
    assert_eq!(body["optimized_path"], json!([1, 2, 3]));
    assert_eq!(body["total_route_cost"], json!(2.0));
    assert!((body["total_estimated_CO2"].as_f64().unwrap() - 180.0).abs() < 1e-9);
    assert!(body.get("route_error").is_none());
}

#[tokio::test]
async fn predict_reports_missing_keys() {
    let mut input = predict_body();
    let object = input.as_object_mut().unwrap();
    object.remove("Taux d'occupation");
    object.remove("end_node");

    let (status, body) = post_json("/predict", input).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Missing keys in input: [\"Taux d'occupation\", 'end_node']")
    );
}

#[tokio::test]
async fn predict_rejects_non_numeric_features() {
    let mut input = predict_body();
    input["Debit_Horaire"] = json!("lots");
    let (status, body) = post_json("/predict", input).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Debit_Horaire"));
}

#[tokio::test]
async fn predict_without_path_keeps_prediction() {
    let mut input = predict_body();
    input["end_node"] = json!("8");
    let (status, body) = post_json("/predict", input).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["optimized_path"], json!([]));
    assert_eq!(body["total_estimated_CO2"], Value::Null);
    assert_eq!(
        body["route_error"],
        json!("No path found between the provided nodes.")
    );

    let mut unknown = predict_body();
    unknown["start_node"] = json!(999);
    let (status, body) = post_json("/predict", unknown).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["optimized_path"], json!([]));
    assert!(body["route_error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn route_between_coordinates() {
    let (status, body) = post_json(
        "/route",
        json!({"start": [48.0, 2.001], "end": [48.0, 2.199], "geojson": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["start_node"], json!(1));
    assert_eq!(body["end_node"], json!(3));
    assert_eq!(body["nodes"], json!([1, 2, 3]));
    assert_eq!(body["route"][0], json!([48.0, 2.0]));
    assert_eq!(body["route"].as_array().unwrap().len(), 3);
    assert_eq!(body["geojson"]["type"], json!("FeatureCollection"));
}

#[tokio::test]
async fn route_rejects_out_of_range_coordinates() {
    let (status, _) = post_json("/route", json!({"start": [120.0, 2.0], "end": [48.0, 2.2]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreachable_route_is_empty() {
    let (status, body) = post_json("/route", json!({"start": [48.0, 2.0], "end": [49.0, 3.1]})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["route"], json!([]));
    assert_eq!(body["total_cost"], Value::Null);
    assert!(body.get("geojson").is_none());
}

#[tokio::test]
async fn state_loads_from_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        arc_costs_path: dir.path().join("couts_arcs.csv"),
        arc_model_path: dir.path().join("arc_model.json"),
        ..ServerConfig::default()
    };
    write_arc_costs(&config.arc_costs_path, &arcs()).unwrap();
    save_json(&config.arc_model_path, &arc_model()).unwrap();

    let state = AppState::load(&config).unwrap();
    assert_eq!(state.graph.node_count(), 5);
    assert_eq!(state.graph.edge_count(), 4);
}
