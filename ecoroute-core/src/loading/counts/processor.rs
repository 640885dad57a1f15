use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use super::raw_types::RawCountRecord;
use crate::features::emissions::co2_emission;
use crate::loading::geo_shape::GeoShape;
use crate::loading::parse::{parse_id, parse_number, parse_timestamp};
use crate::model::{ArcObservation, TrafficState};

/// Reason a raw row was not turned into an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingField,
    InvalidNumber,
    InvalidGeometry,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    pub total: usize,
    pub kept: usize,
    /// Rows the CSV reader could not deserialize, e.g. non UTF-8 text
    pub unreadable_rows: usize,
    pub missing_fields: usize,
    pub invalid_numbers: usize,
    pub invalid_geometries: usize,
    /// Kept rows whose timestamp could not be parsed
    pub unparsed_timestamps: usize,
}

impl CleaningStats {
    fn record(&mut self, outcome: &Result<ArcObservation, DropReason>) {
        self.total += 1;
        match outcome {
            Ok(observation) => {
                self.kept += 1;
                if observation.timestamp.is_none() {
                    self.unparsed_timestamps += 1;
                }
            }
            Err(DropReason::MissingField) => self.missing_fields += 1,
            Err(DropReason::InvalidNumber) => self.invalid_numbers += 1,
            Err(DropReason::InvalidGeometry) => self.invalid_geometries += 1,
        }
    }
}

/// Cleans one raw row and derives its distance and emission
///
/// # Errors
///
/// Returns the reason the row has to be dropped.
pub fn clean_record(raw: &RawCountRecord) -> Result<ArcObservation, DropReason> {
    if raw.has_missing_fields() {
        return Err(DropReason::MissingField);
    }

    let arc_id = parse_id(&raw.arc_id).ok_or(DropReason::InvalidNumber)?;
    let upstream = parse_id(&raw.upstream_node).ok_or(DropReason::InvalidNumber)?;
    let downstream = parse_id(&raw.downstream_node).ok_or(DropReason::InvalidNumber)?;
    let flow = parse_number(&raw.flow).ok_or(DropReason::InvalidNumber)?;
    let occupancy = parse_number(&raw.occupancy).ok_or(DropReason::InvalidNumber)?;

    let shape = GeoShape::parse(&raw.geo_shape).map_err(|e| {
        debug!("Arc {arc_id}: {e}");
        DropReason::InvalidGeometry
    })?;

    let distance_km = shape.length_km();
    let (vehicle_class, emission_g) = co2_emission(flow, distance_km);

    Ok(ArcObservation {
        arc_id,
        label: raw.label.trim().to_string(),
        timestamp: parse_timestamp(&raw.counted_at),
        flow,
        occupancy,
        state: TrafficState::from_label(&raw.state),
        upstream,
        downstream,
        shape,
        distance_km,
        vehicle_class,
        emission_g,
    })
}

/// Cleans raw rows in parallel chunks, keeping the input order
pub fn process_counts(
    raw: &[RawCountRecord],
    chunk_size: usize,
) -> (Vec<ArcObservation>, CleaningStats) {
    let chunk_size = chunk_size.max(1);
    info!(
        "Cleaning {} counter rows in chunks of {chunk_size} on {} threads",
        raw.len(),
        rayon::current_num_threads()
    );

    let outcomes: Vec<Vec<Result<ArcObservation, DropReason>>> = raw
        .par_chunks(chunk_size)
        .map(|chunk| chunk.iter().map(clean_record).collect())
        .collect();

    let mut stats = CleaningStats::default();
    let mut observations = Vec::with_capacity(raw.len());
    for outcome in outcomes.into_iter().flatten() {
        stats.record(&outcome);
        if let Ok(observation) = outcome {
            observations.push(observation);
        }
    }

    let dropped = stats.total - stats.kept;
    if dropped > 0 {
        warn!(
            "Dropped {dropped} of {} rows ({} with missing fields, {} with invalid numbers, {} with invalid geometry)",
            stats.total, stats.missing_fields, stats.invalid_numbers, stats.invalid_geometries
        );
    }
    if stats.unparsed_timestamps > 0 {
        warn!(
            "{} counting timestamps could not be parsed",
            stats.unparsed_timestamps
        );
    }

    (observations, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::emissions::VehicleClass;

    fn raw(flow: &str, shape: &str) -> RawCountRecord {
        RawCountRecord {
            arc_id: "101".to_string(),
            label: "Quai de la Rapee".to_string(),
            counted_at: "2024-01-15T08:00:00+01:00".to_string(),
            flow: flow.to_string(),
            occupancy: "12.5".to_string(),
            state: "Pré-saturé".to_string(),
            upstream_node: "1".to_string(),
            downstream_node: "2".to_string(),
            geo_shape: shape.to_string(),
        }
    }

    #[test]
    fn cleans_and_enriches() {
        let observation = clean_record(&raw(
            "620",
            "{coordinates: [[2.0, 48.0], [2.0, 48.01]], type: LineString}",
        ))
        .unwrap();

        assert_eq!(observation.arc_id, 101);
        assert_eq!(observation.state, TrafficState::PreSature);
        assert_eq!(observation.vehicle_class, VehicleClass::PetrolCar);
        assert!((observation.distance_km - 1.112).abs() < 0.01);
        assert!((observation.emission_g - 180.0 * observation.distance_km).abs() < 1e-9);
        assert!(observation.timestamp.is_some());
    }

    #[test]
    fn reports_drop_reasons() {
        let mut missing = raw("620", "[[2.0, 48.0], [2.0, 48.01]]");
        missing.label.clear();
        assert_eq!(clean_record(&missing).unwrap_err(), DropReason::MissingField);

        assert_eq!(
            clean_record(&raw("many", "[[2.0, 48.0], [2.0, 48.01]]")).unwrap_err(),
            DropReason::InvalidNumber
        );
        assert_eq!(
            clean_record(&raw("620", "[[2.0, 48.0]]")).unwrap_err(),
            DropReason::InvalidGeometry
        );
        assert_eq!(
            clean_record(&raw(
                "620",
                "{coordinates: [[2.0, 48.0], [1e999, 48.0]], type: LineString}"
            ))
            .unwrap_err(),
            DropReason::InvalidGeometry
        );
    }

    #[test]
    fn missing_timestamp_is_kept() {
        let mut record = raw("620", "[[2.0, 48.0], [2.0, 48.01]]");
        record.counted_at.clear();
        let observation = clean_record(&record).unwrap();
        assert!(observation.timestamp.is_none());
    }

    #[test]
    fn parallel_processing_keeps_order() {
        let rows: Vec<RawCountRecord> = (0..25)
            .map(|i| {
                let mut record = raw("100", "[[2.0, 48.0], [2.0, 48.01]]");
                record.arc_id = i.to_string();
                if i % 5 == 0 {
                    record.geo_shape.clear();
                }
                record
            })
            .collect();

        let (observations, stats) = process_counts(&rows, 4);
        assert_eq!(stats.total, 25);
        assert_eq!(stats.kept, 20);
        assert_eq!(stats.missing_fields, 5);

        let ids: Vec<i64> = observations.iter().map(|o| o.arc_id).collect();
        let expected: Vec<i64> = (0..25).filter(|i| i % 5 != 0).collect();
        assert_eq!(ids, expected);
    }
}
