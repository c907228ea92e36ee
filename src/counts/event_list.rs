use crate::counts::CountsTrait;
use crate::error::CountsError;
use crate::sorted_array::SortedArray;

/// Discrete photon arrival times, e.g. time-tagged events
#[derive(Clone, Debug, PartialEq)]
pub struct EventList {
    times: SortedArray,
}

impl EventList {
    /// Construct from arrival times in any order
    pub fn new(times: Vec<f64>) -> Result<Self, CountsError> {
        Ok(Self {
            times: SortedArray::from_unsorted(times)?,
        })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }
}

impl CountsTrait for EventList {
    fn extent(&self) -> Option<(f64, f64)> {
        Some((self.times.minimum()?, self.times.maximum()?))
    }

    #[allow(clippy::cast_precision_loss)]
    fn count_within_extent(&self, t1: f64, t2: f64) -> f64 {
        self.times.count_within(t1, t2) as f64
    }
}
