use crate::counts::{CountsTrait, EventsCounter};
use crate::error::WeightingError;
use crate::io::read_csv;
use crate::time_interval::TimeInterval;

use serde::Deserialize;
use std::path::Path;

/// Target time bin with the total number of events it contains
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CountedInterval {
    pub interval: TimeInterval,
    pub counts: f64,
}

/// Requested time bins, each with its total counts attached
#[derive(Clone, Debug, PartialEq)]
pub struct TimeIntervalTable {
    rows: Vec<CountedInterval>,
}

#[derive(Deserialize)]
struct TimeBinRecord {
    start: f64,
    stop: f64,
}

impl TimeIntervalTable {
    pub fn new(
        intervals: impl IntoIterator<Item = TimeInterval>,
        counter: &EventsCounter,
    ) -> Result<Self, WeightingError> {
        let rows = intervals
            .into_iter()
            .map(|interval| {
                let counts = counter.count(interval.start(), interval.stop())?;
                Ok(CountedInterval { interval, counts })
            })
            .collect::<Result<Vec<_>, WeightingError>>()?;
        Ok(Self { rows })
    }

    /// Read a CSV file with `start` and `stop` columns and count events in each bin
    pub fn from_csv(
        path: impl AsRef<Path>,
        counter: &EventsCounter,
    ) -> Result<Self, WeightingError> {
        let intervals = read_time_bins(path)?;
        Self::new(intervals, counter)
    }

    pub fn rows(&self) -> &[CountedInterval] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Span from the first bin start to the last bin stop
    pub fn span(&self) -> Option<(f64, f64)> {
        Some((
            self.rows.first()?.interval.start(),
            self.rows.last()?.interval.stop(),
        ))
    }
}

/// Time bins from a CSV file with `start` and `stop` columns
pub fn read_time_bins(path: impl AsRef<Path>) -> Result<Vec<TimeInterval>, WeightingError> {
    let records: Vec<TimeBinRecord> = read_csv(path)?;
    records
        .into_iter()
        .map(|r| Ok(TimeInterval::new(r.start, r.stop)?))
        .collect()
}
