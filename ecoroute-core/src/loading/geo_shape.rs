//! Parsing of the `geo_shape` column.
//!
//! Counter exports carry the arc geometry as a loosely formatted string, e.g.
//! `{coordinates: [[2.35, 48.85], [2.36, 48.86]], type: LineString}` with
//! unquoted keys, sometimes proper GeoJSON and sometimes just the coordinate
//! list. Coordinates are always `[lon, lat]`.

use std::sync::LazyLock;

use geo::{Coord, Haversine, Length, LineString};
use regex::Regex;
use serde_json::Value;

use crate::Error;

static TYPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""?type"?\s*:\s*"?([A-Za-z]+)"?"#).expect("geometry type pattern is valid")
});

static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][-+]?\d+)?").expect("number pattern is valid")
});

/// Cleaned arc geometry
#[derive(Debug, Clone, PartialEq)]
pub struct GeoShape {
    /// Geometry type as declared in the source string (`LineString`, ...)
    pub kind: Option<String>,
    /// Polyline in `[lon, lat]` order, at least two points
    pub line: LineString<f64>,
}

impl GeoShape {
    /// Parses a raw `geo_shape` value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGeometry`] when no coordinate list can be
    /// recovered, it holds fewer than two points, or a coordinate is not a
    /// finite longitude/latitude.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let raw = raw.trim().trim_matches('"').trim();
        if raw.is_empty() {
            return Err(Error::InvalidGeometry("empty geometry".to_string()));
        }

        let kind = TYPE_PATTERN
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        let body = coordinate_body(raw);
        let coords = match serde_json::from_str::<Value>(body) {
            Ok(value) => {
                let mut coords = Vec::new();
                collect_coords(&value, &mut coords);
                coords
            }
            Err(_) => coords_from_numbers(body)?,
        };

        validate_coords(&coords)?;
        Ok(Self {
            kind,
            line: LineString::new(coords),
        })
    }

    /// # Errors
    ///
    /// Same geometry checks as [`GeoShape::parse`].
    pub fn from_coords(coords: Vec<Coord<f64>>) -> Result<Self, Error> {
        validate_coords(&coords)?;
        Ok(Self {
            kind: Some("LineString".to_string()),
            line: LineString::new(coords),
        })
    }

    pub fn first(&self) -> Coord<f64> {
        self.line.0[0]
    }

    pub fn last(&self) -> Coord<f64> {
        self.line.0[self.line.0.len() - 1]
    }

    /// Great-circle length of the polyline in kilometres
    pub fn length_km(&self) -> f64 {
        Haversine.length(&self.line) / 1000.0
    }

    /// Serializes the coordinates as a `[[lon, lat], ...]` JSON list
    pub fn to_json_coords(&self) -> String {
        let pairs: Vec<[f64; 2]> = self.line.0.iter().map(|c| [c.x, c.y]).collect();
        serde_json::to_string(&pairs).unwrap_or_else(|_| "[]".to_string())
    }
}

fn validate_coords(coords: &[Coord<f64>]) -> Result<(), Error> {
    if coords.len() < 2 {
        return Err(Error::InvalidGeometry(format!(
            "expected at least 2 points, found {}",
            coords.len()
        )));
    }
    if let Some(bad) = coords.iter().find(|c| {
        !c.x.is_finite() || !c.y.is_finite() || c.x.abs() > 180.0 || c.y.abs() > 90.0
    }) {
        return Err(Error::InvalidGeometry(format!(
            "coordinate out of range: [{}, {}]",
            bad.x, bad.y
        )));
    }
    Ok(())
}

/// Narrows the raw string to the coordinate list when it is wrapped in an
/// object with a `coordinates` key.
fn coordinate_body(raw: &str) -> &str {
    let Some(key_pos) = raw.find("coordinates") else {
        return raw;
    };
    let rest = &raw[key_pos..];
    match (rest.find('['), rest.rfind(']')) {
        (Some(open), Some(close)) if open < close => &rest[open..=close],
        _ => rest,
    }
}

/// Walks nested arrays and keeps every innermost numeric pair. Nested
/// multi-part geometries flatten into a single polyline.
fn collect_coords(value: &Value, out: &mut Vec<Coord<f64>>) {
    let Value::Array(items) = value else {
        return;
    };

    if items.len() >= 2 && items.iter().all(Value::is_number) {
        if let (Some(x), Some(y)) = (items[0].as_f64(), items[1].as_f64()) {
            out.push(Coord { x, y });
        }
        return;
    }

    for item in items {
        collect_coords(item, out);
    }
}

fn coords_from_numbers(body: &str) -> Result<Vec<Coord<f64>>, Error> {
    let numbers: Vec<f64> = NUMBER_PATTERN
        .find_iter(body)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    if numbers.len() % 2 != 0 {
        return Err(Error::InvalidGeometry(format!(
            "odd number of coordinate values ({})",
            numbers.len()
        )));
    }

    Ok(numbers
        .chunks_exact(2)
        .map(|pair| Coord {
            x: pair[0],
            y: pair[1],
        })
        .collect())
}
