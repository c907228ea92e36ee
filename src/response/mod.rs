//! Time-weighted detector response matrices
//!
//! A calibration library holds response matrices valid around discrete moments of time. For an
//! arbitrary time interval, the effective response is the combination of the matrices whose
//! claimed windows (see [coverage]) intersect the interval, each weighted by the share of the
//! interval's counts it covers. [ResponseMatrixWeighter] does this for a whole table of intervals
//! and assembles the results into a [WeightedResponse].

pub mod combiner;
pub use combiner::{MatrixCombiner, WeightedSum};

mod container;
pub use container::WeightedResponse;

pub mod coverage;
pub use coverage::{ClaimedWindow, MatrixCoverage};

mod header;
pub use header::{Header, HeaderValue};

mod matrix;
pub use matrix::{EnergyBounds, MATRIX_EXTNAMES, ResponseLibrary, ResponseMatrix, ResponseRow};

pub mod repair;

mod weighter;
pub use weighter::{IntervalPlan, ResponseMatrixWeighter, WeighterSettings};

pub mod weights;
pub use weights::{MatrixWeights, WeightingScheme};
