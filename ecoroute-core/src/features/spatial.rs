use geo::{Distance, Euclidean, Point};

use crate::loading::geo_shape::GeoShape;

/// Endpoint features of an arc geometry, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialFeatures {
    /// Straight-line distance between the first and last points
    pub euclid_dist: f64,
    pub start_lon: f64,
    pub start_lat: f64,
    pub end_lon: f64,
    pub end_lat: f64,
}

impl From<&GeoShape> for SpatialFeatures {
    fn from(shape: &GeoShape) -> Self {
        let start = shape.first();
        let end = shape.last();
        Self {
            euclid_dist: Euclidean.distance(Point::from(start), Point::from(end)),
            start_lon: start.x,
            start_lat: start.y,
            end_lon: end.x,
            end_lat: end.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_features() {
        let shape = GeoShape::parse("[[2.0, 48.0], [2.5, 48.2], [2.3, 48.4]]").unwrap();
        let features = SpatialFeatures::from(&shape);
        assert_eq!(features.start_lon, 2.0);
        assert_eq!(features.end_lat, 48.4);
        assert!((features.euclid_dist - 0.5).abs() < 1e-9);
    }
}
