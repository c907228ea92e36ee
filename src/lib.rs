#![doc = include_str!("../README.md")]


pub mod counts;
pub use counts::{
    BinnedSpectrum, CountsFile, CountsTrait, DataType, EventList, EventsCounter, SpectrumBin,
};

mod error;
pub use error::{
    CountsError, IoError, ProfileError, SortedArrayError, TimeIntervalError, WeightingError,
};

mod io;

pub mod profile;
pub use profile::{
    LikelihoodEvaluator, LikelihoodProfile, LikelihoodProfiler, ModelDescriptor, ParameterKey,
    ProfilerSettings,
};

pub mod response;
pub use response::{
    EnergyBounds, Header, HeaderValue, ResponseLibrary, ResponseMatrix, ResponseMatrixWeighter,
    WeightedResponse, WeighterSettings,
};

mod sorted_array;
pub use sorted_array::SortedArray;

mod time_bins;
pub use time_bins::{CountedInterval, TimeIntervalTable, read_time_bins};

mod time_interval;
pub use time_interval::TimeInterval;

pub use ndarray;
