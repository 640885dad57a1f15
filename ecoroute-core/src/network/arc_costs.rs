//! Per-arc cost table, the hand-off between training and routing

use std::fs::File;
use std::path::Path;

use geo::Coord;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::loading::geo_shape::GeoShape;
use crate::{ArcId, Error, NodeId};

#[derive(Debug, Clone, PartialEq)]
pub struct ArcCost {
    pub arc_id: ArcId,
    pub label: String,
    pub upstream: NodeId,
    pub downstream: NodeId,
    /// Oriented from the upstream to the downstream node
    pub shape: GeoShape,
    pub distance_km: f64,
    pub emission_g: f64,
    pub cost: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArcCostRow {
    #[serde(rename = "Identifiant arc")]
    arc_id: ArcId,
    #[serde(rename = "Libelle")]
    label: String,
    #[serde(rename = "Identifiant noeud amont")]
    upstream: NodeId,
    #[serde(rename = "Identifiant noeud aval")]
    downstream: NodeId,
    start_lon: f64,
    start_lat: f64,
    end_lon: f64,
    end_lat: f64,
    distance_km: f64,
    emission_g: f64,
    cost: f64,
    #[serde(default)]
    geo_shape: String,
}

impl From<&ArcCost> for ArcCostRow {
    fn from(arc: &ArcCost) -> Self {
        let start = arc.shape.first();
        let end = arc.shape.last();
        Self {
            arc_id: arc.arc_id,
            label: arc.label.clone(),
            upstream: arc.upstream,
            downstream: arc.downstream,
            start_lon: start.x,
            start_lat: start.y,
            end_lon: end.x,
            end_lat: end.y,
            distance_km: arc.distance_km,
            emission_g: arc.emission_g,
            cost: arc.cost,
            geo_shape: arc.shape.to_json_coords(),
        }
    }
}

impl TryFrom<ArcCostRow> for ArcCost {
    type Error = Error;

    fn try_from(row: ArcCostRow) -> Result<Self, Self::Error> {
        // without a stored polyline the endpoints stand in for the geometry
        let shape = if row.geo_shape.trim().is_empty() {
            GeoShape::from_coords(vec![
                Coord {
                    x: row.start_lon,
                    y: row.start_lat,
                },
                Coord {
                    x: row.end_lon,
                    y: row.end_lat,
                },
            ])?
        } else {
            GeoShape::parse(&row.geo_shape)?
        };
        Ok(Self {
            arc_id: row.arc_id,
            label: row.label,
            upstream: row.upstream,
            downstream: row.downstream,
            shape,
            distance_km: row.distance_km,
            emission_g: row.emission_g,
            cost: row.cost,
        })
    }
}

/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_arc_costs(path: &Path, arcs: &[ArcCost]) -> Result<(), Error> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(path)?;
    for arc in arcs {
        writer.serialize(ArcCostRow::from(arc))?;
    }
    writer.flush()?;
    info!("Wrote {} arc costs to {}", arcs.len(), path.display());
    Ok(())
}

/// Reads an arc cost table, skipping rows that do not deserialize or
/// whose geometry is invalid
///
/// # Errors
///
/// Returns an error if the file cannot be opened.
pub fn read_arc_costs(path: &Path) -> Result<Vec<ArcCost>, Error> {
    let file = File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        )
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut skipped = 0usize;
    let mut arcs = Vec::new();
    for row in reader.deserialize::<ArcCostRow>() {
        match row.map_err(Error::from).and_then(ArcCost::try_from) {
            Ok(arc) => arcs.push(arc),
            Err(e) => {
                log::debug!("Skipping arc cost row: {e}");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {skipped} unreadable arc cost rows in {}", path.display());
    }
    info!("Read {} arc costs from {}", arcs.len(), path.display());
    Ok(arcs)
}
