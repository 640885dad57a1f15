use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use super::route::{Route, RouteLeg};
use crate::Error;

impl Route {
    /// One `LineString` feature per leg, in travel order, with the route
    /// totals as a `summary` member of the collection
    ///
    /// # Errors
    ///
    /// Returns an error if a feature cannot be assembled.
    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        let features = self
            .legs
            .iter()
            .enumerate()
            .map(|(idx, leg)| leg_feature(idx, leg))
            .collect::<Result<Vec<_>, _>>()?;

        let summary = json!({
            "nodes": self.nodes,
            "hops": self.hops(),
            "total_cost": self.total_cost,
            "total_distance_km": self.total_distance_km,
            "total_emission_g": self.total_emission_g,
        });
        let mut foreign_members = serde_json::Map::new();
        foreign_members.insert("summary".to_string(), summary);

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: Some(foreign_members),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the collection cannot be serialized.
    pub fn to_geojson_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson()?).map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}

fn leg_feature(leg_idx: usize, leg: &RouteLeg) -> Result<Feature, Error> {
    let geometry = Geometry::new(GeoJsonValue::from(&leg.geometry));

    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "leg_index": leg_idx,
            "arc_id": leg.arc_id,
            "label": leg.label,
            "from_node": leg.from,
            "to_node": leg.to,
            "cost": leg.cost,
            "distance_km": leg.distance_km,
            "emission_g": leg.emission_g,
            "samples": leg.samples,
        }
    });

    serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}
