//! Event counting over arbitrary time sub-intervals
//!
//! Two physically different inputs answer the same question, "how many events occurred in
//! `[t1, t2]`": a list of discrete arrival times ([EventList]) and a pre-binned count spectrum
//! ([BinnedSpectrum]), where partially covered bins contribute proportionally to the covered
//! fraction. [EventsCounter] dispatches between them based on the `DATATYPE` marker of a
//! [CountsFile].

use crate::error::CountsError;

use enum_dispatch::enum_dispatch;

#[enum_dispatch]
pub trait CountsTrait {
    /// Minimum and maximum time covered by the data, `None` for an empty series
    fn extent(&self) -> Option<(f64, f64)>;

    /// Count assuming `t1 <= t2` and both within [CountsTrait::extent]
    fn count_within_extent(&self, t1: f64, t2: f64) -> f64;

    /// Number of events in `[t1, t2]`, both ends inclusive
    ///
    /// The span must be covered by the data: requesting anything before the first or after the
    /// last data point is an error rather than a truncated count.
    fn count(&self, t1: f64, t2: f64) -> Result<f64, CountsError> {
        if t1 > t2 {
            return Err(CountsError::InvertedInterval { t1, t2 });
        }
        let (min, max) = self.extent().ok_or(CountsError::EmptySeries)?;
        if t1 < min || t2 > max {
            return Err(CountsError::OutOfBounds { t1, t2, min, max });
        }
        Ok(self.count_within_extent(t1, t2))
    }
}

mod binned_spectrum;
pub use binned_spectrum::{BinnedSpectrum, SpectrumBin};

mod counts_file;
pub use counts_file::{ChannelCounts, CountsFile, DataType, SpectrumRow, UNKNOWN_INSTRUMENT};

mod event_list;
pub use event_list::EventList;

mod events_counter;
pub use events_counter::EventsCounter;
