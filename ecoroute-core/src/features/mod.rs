//! Feature engineering over cleaned counter observations

pub mod emissions;
pub mod spatial;
pub mod temporal;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::cost::ResolvedFactors;
use crate::learning::Matrix;
use crate::loading::weather::{DailyWeather, WeatherTable};
use crate::model::{ArcObservation, SensorReading};

use spatial::SpatialFeatures;
use temporal::{CyclicTime, fill_time_parts};

/// `[flow, occupancy, hour, weekday, month]`
pub fn sensor_features(reading: &SensorReading) -> [f64; 5] {
    [
        reading.flow,
        reading.occupancy,
        f64::from(reading.hour),
        f64::from(reading.weekday),
        f64::from(reading.month),
    ]
}

/// Sensor readings of every observation, missing timestamps filled forward
pub fn sensor_readings(observations: &[ArcObservation]) -> Vec<SensorReading> {
    let timestamps: Vec<_> = observations.iter().map(|o| o.timestamp).collect();
    observations
        .iter()
        .zip(fill_time_parts(&timestamps))
        .map(|(o, parts)| SensorReading {
            flow: o.flow,
            occupancy: o.occupancy,
            hour: parts.hour,
            weekday: parts.weekday,
            month: parts.month,
        })
        .collect()
}

/// # Errors
///
/// Returns an error if there are no observations.
pub fn sensor_matrix(observations: &[ArcObservation]) -> Result<Matrix, Error> {
    let rows: Vec<[f64; 5]> = sensor_readings(observations)
        .iter()
        .map(sensor_features)
        .collect();
    if rows.is_empty() {
        return Err(Error::EmptyDataset("no observations to build features from"));
    }
    Matrix::from_rows(&rows)
}

/// Layout of the cost model feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub include_weather: bool,
}

impl FeatureSpec {
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = vec![
            "flow",
            "occupancy",
            "state_factor",
            "euclid_dist",
            "sin_hour",
            "cos_hour",
            "sin_weekday",
            "cos_weekday",
            "sin_month",
            "cos_month",
        ];
        if self.include_weather {
            names.extend(DailyWeather::FEATURE_NAMES);
        }
        names.extend([
            "occ_x_hour",
            "occ_x_state",
            "start_lon",
            "start_lat",
            "end_lon",
            "end_lat",
        ]);
        names
    }

    pub fn width(&self) -> usize {
        self.names().len()
    }

    /// Builds the cost model feature matrix.
    ///
    /// Weather is joined on the counting date; rows without a matching day
    /// reuse the previous row's weather, leading rows the first day on record.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no observations, or weather is enabled
    /// and the table is missing or empty.
    pub fn build(
        &self,
        observations: &[ArcObservation],
        factors: &ResolvedFactors,
        weather: Option<&WeatherTable>,
    ) -> Result<Matrix, Error> {
        if observations.is_empty() {
            return Err(Error::EmptyDataset("no observations to build features from"));
        }
        let weather = if self.include_weather {
            match weather {
                Some(table) if !table.is_empty() => Some(table),
                _ => return Err(Error::EmptyDataset("weather features need weather data")),
            }
        } else {
            None
        };

        let timestamps: Vec<_> = observations.iter().map(|o| o.timestamp).collect();
        let time_parts = fill_time_parts(&timestamps);

        let width = self.width();
        let mut data = Vec::with_capacity(observations.len() * width);
        let mut last_weather: Option<&DailyWeather> = None;

        for (observation, parts) in observations.iter().zip(time_parts) {
            let state_factor = factors.factor(observation.state);
            let cyclic = CyclicTime::from(parts);
            let spatial = SpatialFeatures::from(&observation.shape);

            data.extend([
                observation.flow,
                observation.occupancy,
                state_factor,
                spatial.euclid_dist,
            ]);
            data.extend(cyclic.to_array());

            if let Some(table) = weather {
                let matched = observation
                    .timestamp
                    .and_then(|ts| table.for_date(ts.date()));
                let day = matched.or(last_weather).or_else(|| table.first());
                if matched.is_some() {
                    last_weather = matched;
                }
                if let Some(day) = day {
                    data.extend(day.to_array());
                }
            }

            data.extend([
                observation.occupancy * cyclic.sin_hour,
                observation.occupancy * state_factor,
                spatial.start_lon,
                spatial.start_lat,
                spatial.end_lon,
                spatial.end_lat,
            ]);
        }

        Matrix::new(data, observations.len(), width)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::features::emissions::co2_emission;
    use crate::loading::geo_shape::GeoShape;
    use crate::model::TrafficState;

    pub(crate) fn observation(
        arc_id: i64,
        upstream: i64,
        downstream: i64,
        flow: f64,
        state: TrafficState,
        shape: &str,
        day: Option<u32>,
    ) -> ArcObservation {
        let shape = GeoShape::parse(shape).unwrap();
        let distance_km = shape.length_km();
        let (vehicle_class, emission_g) = co2_emission(flow, distance_km);
        ArcObservation {
            arc_id,
            label: format!("arc {arc_id}"),
            timestamp: day.map(|d| {
                NaiveDate::from_ymd_opt(2024, 1, d)
                    .unwrap()
                    .and_hms_opt(8, 0, 0)
                    .unwrap()
            }),
            flow,
            occupancy: flow / 100.0,
            state,
            upstream,
            downstream,
            shape,
            distance_km,
            vehicle_class,
            emission_g,
        }
    }

    fn weather_day(day: u32, precipitation: f64) -> DailyWeather {
        DailyWeather {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            precipitation,
            temp_min: 1.0,
            temp_max: 8.0,
            temp_mean: 4.0,
            wind_speed: 3.0,
            wind_gust: 9.0,
            gust_direction: 180.0,
            gust_hour: 1200.0,
        }
    }

    #[test]
    fn sensor_matrix_uses_filled_time() {
        let observations = vec![
            observation(1, 1, 2, 300.0, TrafficState::Fluide, "[[2.0, 48.0], [2.1, 48.0]]", None),
            observation(2, 2, 3, 900.0, TrafficState::Fluide, "[[2.1, 48.0], [2.2, 48.0]]", Some(2)),
        ];
        let x = sensor_matrix(&observations).unwrap();
        // 2024-01-02 is a Tuesday
        assert_eq!(x.row(0), &[300.0, 3.0, 8.0, 1.0, 1.0]);
        assert_eq!(x.row(1), &[900.0, 9.0, 8.0, 1.0, 1.0]);
    }

    #[test]
    fn feature_layout_matches_names() {
        let observations = vec![observation(
            1,
            1,
            2,
            400.0,
            TrafficState::PreSature,
            "[[2.0, 48.0], [2.3, 48.4]]",
            Some(1),
        )];
        let spec = FeatureSpec::default();
        let x = spec
            .build(&observations, &ResolvedFactors::default(), None)
            .unwrap();

        let names = spec.names();
        assert_eq!(x.n_cols(), names.len());
        let col = |name: &str| x.get(0, names.iter().position(|n| *n == name).unwrap());
        assert_eq!(col("state_factor"), 1.5);
        assert_eq!(col("occ_x_state"), 6.0);
        assert!((col("euclid_dist") - 0.5).abs() < 1e-9);
        assert_eq!(col("end_lat"), 48.4);
    }

    #[test]
    fn weather_join_fills_forward() {
        let observations = vec![
            observation(1, 1, 2, 400.0, TrafficState::Fluide, "[[2.0, 48.0], [2.1, 48.0]]", Some(5)),
            observation(2, 1, 2, 400.0, TrafficState::Fluide, "[[2.0, 48.0], [2.1, 48.0]]", Some(2)),
            observation(3, 1, 2, 400.0, TrafficState::Fluide, "[[2.0, 48.0], [2.1, 48.0]]", Some(9)),
        ];
        let table = WeatherTable::new([weather_day(1, 0.5), weather_day(2, 7.0)]);
        let spec = FeatureSpec {
            include_weather: true,
        };
        let x = spec
            .build(&observations, &ResolvedFactors::default(), Some(&table))
            .unwrap();

        let precip = spec.names().iter().position(|n| *n == "precip").unwrap();
        assert_eq!(x.get(0, precip), 0.5);
        assert_eq!(x.get(1, precip), 7.0);
        assert_eq!(x.get(2, precip), 7.0);

        assert!(spec.build(&observations, &ResolvedFactors::default(), None).is_err());
    }
}
