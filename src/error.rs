use crate::time_interval::TimeInterval;

/// Error returned from [crate::TimeInterval] constructors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TimeIntervalError {
    #[error("time interval is inverted: start {start} is after stop {stop}")]
    Inverted { start: f64, stop: f64 },

    #[error("time interval bounds must be finite, got [{start}, {stop}]")]
    NonFinite { start: f64, stop: f64 },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SortedArrayError {
    #[error("SortedArray constructors accept sorted arrays only")]
    Unsorted,

    #[error("SortedArray accepts finite values only")]
    NonFinite,
}

/// Error returned from [crate::EventsCounter] and its backing series
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CountsError {
    #[error("requested span [{t1}, {t2}] is not covered by the data extent [{min}, {max}]")]
    OutOfBounds { t1: f64, t2: f64, min: f64, max: f64 },

    #[error("requested span is inverted: t1 = {t1} is after t2 = {t2}")]
    InvertedInterval { t1: f64, t2: f64 },

    #[error("counts series is empty")]
    EmptySeries,

    #[error("spectrum bin [{start}, {stop}] has non-positive width")]
    ZeroWidthBin { start: f64, stop: f64 },

    #[error("spectrum row {row} carries neither counts nor rate")]
    MissingCounts { row: usize },

    #[error(transparent)]
    SortedArray(#[from] SortedArrayError),
}

/// Error returned while reading or writing documents
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON document {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed CSV document {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("cannot move finished output into {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },
}

/// Error returned from [crate::ResponseMatrixWeighter]
#[derive(Debug, thiserror::Error)]
pub enum WeightingError {
    #[error(transparent)]
    Counts(#[from] CountsError),

    #[error(transparent)]
    TimeInterval(#[from] TimeIntervalError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("no time intervals requested")]
    NoIntervals,

    #[error("calibration library contains no response matrices")]
    EmptyLibrary,

    #[error("no calibration matrix covers interval {interval}")]
    NoMatrixSelected { interval: TimeInterval },

    #[error("weights sum to {sum} before renormalization, drift exceeds tolerance {tolerance}")]
    WeightSumDrift { sum: f64, tolerance: f64 },

    #[error("header of {extname} lacks keyword {keyword}")]
    MissingKeyword { extname: String, keyword: String },

    #[error("matrices cannot be combined: {0}")]
    IncompatibleMatrices(String),

    #[error("matrix combination failed: {0}")]
    Combiner(String),
}

/// Error returned from [crate::LikelihoodProfiler]
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("likelihood evaluator failed: {0}")]
    Evaluator(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("photon index of exactly -1 makes the energy flux integral diverge")]
    PhotonIndexMinusOne,

    #[error("energy range [{emin}, {emax}] must be positive and increasing")]
    InvalidEnergyRange { emin: f64, emax: f64 },

    #[error("normalization bounds [{min}, {max}] must be positive, finite and increasing")]
    InvalidBounds { min: f64, max: f64 },

    #[error("likelihood evaluator returned no finite value anywhere in the allowed range")]
    NoFiniteSamples,

    #[error("ensemble sampler failed: {0}")]
    Sampler(String),

    #[error("invalid profiler settings: {0}")]
    InvalidSettings(&'static str),

    #[error("malformed likelihood profile: {0}")]
    MalformedProfile(&'static str),

    #[error(transparent)]
    Io(#[from] IoError),
}

impl ProfileError {
    pub fn evaluator<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Evaluator(Box::new(error))
    }
}
