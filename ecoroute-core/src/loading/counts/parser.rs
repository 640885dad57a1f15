use std::fs::File;
use std::path::Path;

use log::{debug, info, warn};

use super::processor::{CleaningStats, process_counts};
use super::raw_types::{CleanedCountRow, RawCountRecord};
use crate::Error;
use crate::loading::parse::TIMESTAMP_FORMAT;
use crate::model::ArcObservation;

fn open(path: &Path) -> Result<File, Error> {
    File::open(path).map_err(|e| {
        Error::IoError(std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        ))
    })
}

/// Rows of the file and the number of rows that could not be deserialized
fn read_records(path: &Path) -> Result<(Vec<RawCountRecord>, usize), Error> {
    let file = open(path)?;
    let mut records = Vec::new();
    let mut unreadable = 0;
    for row in csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file)
        .deserialize::<RawCountRecord>()
    {
        match row {
            Ok(record) => records.push(record),
            Err(e) => {
                debug!("Skipping counter row: {e}");
                unreadable += 1;
            }
        }
    }

    info!("Read {} counter rows from {}", records.len(), path.display());
    if unreadable > 0 {
        warn!(
            "Skipped {unreadable} unreadable rows in {} (is the file UTF-8?)",
            path.display()
        );
    }
    Ok((records, unreadable))
}

/// Reads every row of a `;`-delimited counter file.
/// Rows that cannot be deserialized are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the file cannot be opened.
pub fn read_count_records(path: &Path) -> Result<Vec<RawCountRecord>, Error> {
    read_records(path).map(|(records, _)| records)
}

/// Reads and cleans a raw or already cleaned counter file
///
/// # Errors
///
/// Returns an error if the file cannot be opened.
pub fn load_observations(
    path: &Path,
    chunk_size: usize,
) -> Result<(Vec<ArcObservation>, CleaningStats), Error> {
    let (records, unreadable) = read_records(path)?;
    let (observations, mut stats) = process_counts(&records, chunk_size);
    stats.total += unreadable;
    stats.unreadable_rows = unreadable;
    Ok((observations, stats))
}

/// Writes observations in the cleaned counter format
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_cleaned(path: &Path, observations: &[ArcObservation]) -> Result<(), Error> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(path)?;

    for observation in observations {
        writer.serialize(CleanedCountRow {
            arc_id: observation.arc_id,
            label: &observation.label,
            counted_at: observation
                .timestamp
                .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
            flow: observation.flow,
            occupancy: observation.occupancy,
            state: observation.state.label(),
            upstream_node: observation.upstream,
            downstream_node: observation.downstream,
            geo_shape: observation.shape.to_json_coords(),
            geo_type: observation.shape.kind.as_deref().unwrap_or_default(),
            distance_arc: observation.distance_km,
            emission_co2: observation.emission_g,
        })?;
    }

    writer.flush()?;
    info!(
        "Wrote {} cleaned rows to {}",
        observations.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::model::TrafficState;

    const RAW_EXPORT: &str = "\
Identifiant arc;Libelle;Date et heure de comptage;Débit horaire;Taux d'occupation;Etat trafic;Identifiant noeud amont;Libelle noeud amont;Identifiant noeud aval;Etat arc;geo_shape
101;Quai A;2024-01-15T08:00:00+01:00;620;12.5;Pré-saturé;1;N1;2;Ouvert;\"{coordinates: [[2.0, 48.0], [2.0, 48.01]], type: LineString}\"
102;Quai B;2024-01-15T08:00:00+01:00;;3.0;Fluide;2;N2;3;Ouvert;\"{coordinates: [[2.0, 48.01], [2.01, 48.01]], type: LineString}\"
103;Quai C;2024-01-15T09:00:00+01:00;40;1.0;Saturé;2;N2;3;Ouvert;\"{coordinates: [[2.0, 48.01], [2.01, 48.01]], type: LineString}\"
";

    #[test]
    fn reads_raw_export_and_round_trips_cleaned_file() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        input.write_all(RAW_EXPORT.as_bytes()).unwrap();

        let (observations, stats) = load_observations(input.path(), 2).unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.kept, 2);
        assert_eq!(observations[0].flow, 620.0);
        assert_eq!(observations[1].state, TrafficState::Sature);

        let output = tempfile::NamedTempFile::new().unwrap();
        write_cleaned(output.path(), &observations).unwrap();

        let (again, stats) = load_observations(output.path(), 2).unwrap();
        assert_eq!(stats.kept, 2);
        assert_eq!(again[0].arc_id, 101);
        assert_eq!(again[0].timestamp, observations[0].timestamp);
        assert_eq!(again[1].shape.line.0.len(), observations[1].shape.line.0.len());
        assert!((again[1].shape.last().x - observations[1].shape.last().x).abs() < 1e-12);
        assert!((again[0].distance_km - observations[0].distance_km).abs() < 1e-6);
    }

    #[test]
    fn unreadable_rows_are_skipped_and_counted() {
        let mut bytes = RAW_EXPORT.as_bytes().to_vec();
        // Latin-1 encoded label
        bytes.extend_from_slice(
            b"104;Quai d'Orl\xe9ans;2024-01-15T10:00:00+01:00;300;4.0;Fluide;3;N3;4;Ouvert;\"[[2.01, 48.01], [2.02, 48.01]]\"\n",
        );
        let mut input = tempfile::NamedTempFile::new().unwrap();
        input.write_all(&bytes).unwrap();

        let records = read_count_records(input.path()).unwrap();
        assert_eq!(records.len(), 3);

        let (observations, stats) = load_observations(input.path(), 2).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(stats.unreadable_rows, 1);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.kept, 2);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_count_records(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }
}
