//! Daily weather station records.
//!
//! Only the columns used as model features are kept. The quality-flag and
//! secondary wind columns of the source file are ignored on read.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::parse::{parse_compact_date, parse_number};
use crate::Error;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawWeatherRecord {
    #[serde(rename = "AAAAMMJJ")]
    pub date: String,
    #[serde(rename = "RR")]
    pub precipitation: String,
    #[serde(rename = "TN")]
    pub temp_min: String,
    #[serde(rename = "TX")]
    pub temp_max: String,
    #[serde(rename = "TM")]
    pub temp_mean: String,
    #[serde(rename = "FF2M")]
    pub wind_speed: String,
    #[serde(rename = "FXI2")]
    pub wind_gust: String,
    #[serde(rename = "DXI2")]
    pub gust_direction: String,
    #[serde(rename = "HXI2")]
    pub gust_hour: String,
}

/// Weather summary for one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyWeather {
    #[serde(rename = "AAAAMMJJ", serialize_with = "serialize_compact_date")]
    pub date: NaiveDate,
    #[serde(rename = "RR")]
    pub precipitation: f64,
    #[serde(rename = "TN")]
    pub temp_min: f64,
    #[serde(rename = "TX")]
    pub temp_max: f64,
    #[serde(rename = "TM")]
    pub temp_mean: f64,
    #[serde(rename = "FF2M")]
    pub wind_speed: f64,
    #[serde(rename = "FXI2")]
    pub wind_gust: f64,
    #[serde(rename = "DXI2")]
    pub gust_direction: f64,
    #[serde(rename = "HXI2")]
    pub gust_hour: f64,
}

impl DailyWeather {
    pub const FEATURE_NAMES: [&'static str; 8] = [
        "precip",
        "temp_min",
        "temp_max",
        "temp_mean",
        "wind_speed",
        "wind_gust",
        "gust_dir",
        "humidex",
    ];

    pub fn to_array(&self) -> [f64; 8] {
        [
            self.precipitation,
            self.temp_min,
            self.temp_max,
            self.temp_mean,
            self.wind_speed,
            self.wind_gust,
            self.gust_direction,
            self.gust_hour,
        ]
    }
}

fn serialize_compact_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&date.format("%Y%m%d").to_string())
}

impl TryFrom<&RawWeatherRecord> for DailyWeather {
    type Error = ();

    fn try_from(raw: &RawWeatherRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            date: parse_compact_date(&raw.date).ok_or(())?,
            precipitation: parse_number(&raw.precipitation).ok_or(())?,
            temp_min: parse_number(&raw.temp_min).ok_or(())?,
            temp_max: parse_number(&raw.temp_max).ok_or(())?,
            temp_mean: parse_number(&raw.temp_mean).ok_or(())?,
            wind_speed: parse_number(&raw.wind_speed).ok_or(())?,
            wind_gust: parse_number(&raw.wind_gust).ok_or(())?,
            gust_direction: parse_number(&raw.gust_direction).ok_or(())?,
            gust_hour: parse_number(&raw.gust_hour).ok_or(())?,
        })
    }
}

/// Weather records indexed by date
#[derive(Debug, Clone, Default)]
pub struct WeatherTable {
    days: BTreeMap<NaiveDate, DailyWeather>,
}

impl WeatherTable {
    pub fn new(rows: impl IntoIterator<Item = DailyWeather>) -> Self {
        Self {
            days: rows.into_iter().map(|row| (row.date, row)).collect(),
        }
    }

    pub fn for_date(&self, date: NaiveDate) -> Option<&DailyWeather> {
        self.days.get(&date)
    }

    pub fn first(&self) -> Option<&DailyWeather> {
        self.days.values().next()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &DailyWeather> {
        self.days.values()
    }
}

/// Reads a `;`-delimited station file and drops incomplete days
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not valid CSV.
pub fn read_weather(path: &Path) -> Result<WeatherTable, Error> {
    let file = File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        )
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut total = 0usize;
    let rows: Vec<DailyWeather> = reader
        .deserialize::<RawWeatherRecord>()
        .filter_map(Result::ok)
        .inspect(|_| total += 1)
        .filter_map(|raw| DailyWeather::try_from(&raw).ok())
        .collect();

    if rows.len() < total {
        warn!(
            "Dropped {} of {total} weather rows with missing values",
            total - rows.len()
        );
    }
    info!("Loaded {} days of weather from {}", rows.len(), path.display());

    Ok(WeatherTable::new(rows))
}

/// Writes the cleaned weather table
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_weather(path: &Path, table: &WeatherTable) -> Result<(), Error> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(path)?;
    for row in table.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const STATION_FILE: &str = "\
NUM_POSTE;AAAAMMJJ;RR;QRR;TN;TX;TM;FF2M;FXI2;DXI2;HXI2;DG
75114001;20240101;1.2;1;3.4;9.1;6.2;3.1;12.0;250;1430;0
75114001;20240102;;1;2.0;8.0;5.0;2.5;10.0;240;1100;0
75114001;20240103;0.0;1;1.5;7.5;4.4;4.0;15.5;270;900;0
";

    #[test]
    fn drops_incomplete_days() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(STATION_FILE.as_bytes()).unwrap();

        let table = read_weather(file.path()).unwrap();
        assert_eq!(table.len(), 2);

        let day = table
            .for_date(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
            .unwrap();
        assert_eq!(day.wind_gust, 15.5);
        assert!(
            table
                .for_date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
                .is_none()
        );
    }

    #[test]
    fn cleaned_file_reads_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(STATION_FILE.as_bytes()).unwrap();
        let table = read_weather(file.path()).unwrap();

        let out = tempfile::NamedTempFile::new().unwrap();
        write_weather(out.path(), &table).unwrap();
        let again = read_weather(out.path()).unwrap();

        assert_eq!(again.rows().collect::<Vec<_>>(), table.rows().collect::<Vec<_>>());
    }
}
