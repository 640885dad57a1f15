use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use geo::{Coord, Point};

use ecoroute_core::learning::{BoostingParams, GradientBoosting, Matrix, Regressor};
use ecoroute_core::loading::GeoShape;
use ecoroute_core::network::{ArcCost, CostGraph, EdgeAggregation};
use ecoroute_core::routing::{route_between_points, shortest_path};

const SIDE: i64 = 60;

#[allow(clippy::cast_precision_loss)]
fn node_coord(id: i64) -> Coord<f64> {
    Coord {
        x: 2.25 + (id % SIDE) as f64 * 0.002,
        y: 48.8 + (id / SIDE) as f64 * 0.002,
    }
}

/// Square lattice with deterministic, uneven costs
fn grid_arcs() -> Vec<ArcCost> {
    let mut arcs = Vec::new();
    for id in 0..SIDE * SIDE {
        let mut neighbours = Vec::new();
        if id % SIDE + 1 < SIDE {
            neighbours.push(id + 1);
        }
        if id / SIDE + 1 < SIDE {
            neighbours.push(id + SIDE);
        }
        for next in neighbours {
            let Ok(shape) = GeoShape::from_coords(vec![node_coord(id), node_coord(next)]) else {
                continue;
            };
            #[allow(clippy::cast_precision_loss)]
            let cost = 1.0 + ((id * 31 + next * 17) % 13) as f64;
            arcs.push(ArcCost {
                arc_id: arcs.len() as i64,
                label: String::new(),
                upstream: id,
                downstream: next,
                distance_km: shape.length_km(),
                emission_g: cost * 10.0,
                shape,
                cost,
            });
        }
    }
    arcs
}

fn routing_benchmark(c: &mut Criterion) {
    let arcs = grid_arcs();
    c.bench_function("build_cost_graph", |b| {
        b.iter(|| CostGraph::from_arcs(black_box(&arcs), EdgeAggregation::Mean));
    });

    let graph = CostGraph::from_arcs(&arcs, EdgeAggregation::Mean);
    c.bench_function("shortest_path_corner_to_corner", |b| {
        b.iter(|| shortest_path(&graph, black_box(0), black_box(SIDE * SIDE - 1)));
    });

    let from = Point::new(2.2511, 48.8013);
    let to = Point::new(2.3589, 48.9093);
    c.bench_function("route_between_points", |b| {
        b.iter(|| route_between_points(&graph, black_box(from), black_box(to)));
    });
}

fn boosting_benchmark(c: &mut Criterion) {
    let rows: Vec<[f64; 4]> = (0..2000)
        .map(|i| {
            let v = f64::from(i);
            [v % 24.0, v % 7.0, (v * 0.37).sin(), (v * 0.11).cos()]
        })
        .collect();
    let y: Vec<f64> = rows.iter().map(|r| r[0] * 2.0 + r[2] * 10.0 - r[1]).collect();
    let Ok(x) = Matrix::from_rows(&rows) else {
        return;
    };

    c.bench_function("fit_gradient_boosting", |b| {
        b.iter(|| {
            let mut model = GradientBoosting::new(BoostingParams {
                n_estimators: 20,
                max_depth: 6,
                ..BoostingParams::default()
            });
            model.fit(black_box(&x), black_box(&y))
        });
    });
}

criterion_group!(benches, routing_benchmark, boosting_benchmark);
criterion_main!(benches);
