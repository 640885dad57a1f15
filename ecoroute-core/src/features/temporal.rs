//! Calendar features with cyclic encoding

use std::f64::consts::TAU;

use chrono::{Datelike, NaiveDateTime, Timelike};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeParts {
    pub hour: u32,
    /// Monday = 0
    pub weekday: u32,
    /// 1..=12
    pub month: u32,
}

impl From<NaiveDateTime> for TimeParts {
    fn from(value: NaiveDateTime) -> Self {
        Self {
            hour: value.hour(),
            weekday: value.weekday().num_days_from_monday(),
            month: value.month(),
        }
    }
}

/// Extracts time parts for a column of timestamps.
///
/// Missing timestamps take the previous row's value. Leading gaps take the
/// first valid row, and a column without any valid timestamp yields zeros.
pub fn fill_time_parts(timestamps: &[Option<NaiveDateTime>]) -> Vec<TimeParts> {
    let first_valid = timestamps
        .iter()
        .flatten()
        .next()
        .map(|ts| TimeParts::from(*ts))
        .unwrap_or_default();

    let mut last = first_valid;
    timestamps
        .iter()
        .map(|ts| {
            if let Some(ts) = ts {
                last = TimeParts::from(*ts);
            }
            last
        })
        .collect()
}

/// `(sin, cos)` of `value` on a circle of `period`
pub fn cyclic(value: f64, period: f64) -> (f64, f64) {
    let angle = TAU * value / period;
    (angle.sin(), angle.cos())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyclicTime {
    pub sin_hour: f64,
    pub cos_hour: f64,
    pub sin_weekday: f64,
    pub cos_weekday: f64,
    pub sin_month: f64,
    pub cos_month: f64,
}

impl From<TimeParts> for CyclicTime {
    fn from(parts: TimeParts) -> Self {
        let (sin_hour, cos_hour) = cyclic(f64::from(parts.hour), 24.0);
        let (sin_weekday, cos_weekday) = cyclic(f64::from(parts.weekday), 7.0);
        let (sin_month, cos_month) = cyclic(f64::from(parts.month), 12.0);
        Self {
            sin_hour,
            cos_hour,
            sin_weekday,
            cos_weekday,
            sin_month,
            cos_month,
        }
    }
}

impl CyclicTime {
    pub fn to_array(self) -> [f64; 6] {
        [
            self.sin_hour,
            self.cos_hour,
            self.sin_weekday,
            self.cos_weekday,
            self.sin_month,
            self.cos_month,
        ]
    }
}
