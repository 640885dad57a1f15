pub mod dijkstra;
pub mod route;
mod to_geojson;

pub use dijkstra::{SearchTree, dijkstra};
pub use route::{Route, RouteLeg, SnappedRoute, route_between_points, shortest_path};
