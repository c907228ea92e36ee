use crate::error::{CountsError, IoError};
use crate::io::read_json;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const UNKNOWN_INSTRUMENT: &str = "UNKN-INSTRUME";

/// Layout of a counts document, derived from its `DATATYPE` marker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Discrete arrival times
    Events,
    /// Pre-binned count spectrum
    Spectrum,
}

impl DataType {
    pub fn from_marker(marker: &str) -> Self {
        if marker.contains("CSPEC") {
            Self::Spectrum
        } else {
            Self::Events
        }
    }
}

/// Per-row counts: either already summed or per energy channel
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChannelCounts {
    Total(f64),
    PerChannel(Vec<f64>),
}

impl ChannelCounts {
    pub fn total(&self) -> f64 {
        match self {
            Self::Total(x) => *x,
            Self::PerChannel(v) => v.iter().sum(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpectrumRow {
    #[serde(rename = "TIME")]
    pub start: f64,
    #[serde(rename = "ENDTIME")]
    pub stop: f64,
    #[serde(rename = "COUNTS", default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<ChannelCounts>,
    #[serde(rename = "RATE", default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<ChannelCounts>,
    #[serde(rename = "QUALITY", default)]
    pub quality: i32,
}

impl SpectrumRow {
    /// Counts of the row, converting rates with the row width when counts are absent
    fn counts(&self, row: usize) -> Result<f64, CountsError> {
        match (&self.counts, &self.rate) {
            (Some(counts), _) => Ok(counts.total()),
            (None, Some(rate)) => Ok(rate.total() * (self.stop - self.start)),
            (None, None) => Err(CountsError::MissingCounts { row }),
        }
    }
}

/// Counts document: time-tagged events or a binned spectrum, tagged by `DATATYPE`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CountsFile {
    #[serde(rename = "DATATYPE")]
    pub datatype: String,
    #[serde(rename = "INSTRUME", default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spectrum: Vec<SpectrumRow>,
}

impl CountsFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }

    pub fn data_type(&self) -> DataType {
        DataType::from_marker(&self.datatype)
    }

    pub fn instrument(&self) -> &str {
        self.instrument.as_deref().unwrap_or(UNKNOWN_INSTRUMENT)
    }

    /// Spectrum rows as `(start, stop, counts, quality)`
    pub(super) fn spectrum_rows(&self) -> Result<Vec<(f64, f64, f64, i32)>, CountsError> {
        self.spectrum
            .iter()
            .enumerate()
            .map(|(i, row)| Ok((row.start, row.stop, row.counts(i)?, row.quality)))
            .collect()
    }
}
