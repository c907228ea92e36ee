use crate::counts::{BinnedSpectrum, CountsFile, CountsTrait, DataType, EventList};
use crate::error::CountsError;

use enum_dispatch::enum_dispatch;
use log::{debug, warn};

/// Counts events in arbitrary time sub-intervals of either kind of input
///
/// ```
/// use grb_likelihood::{CountsTrait, EventList, EventsCounter};
///
/// let counter: EventsCounter = EventList::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap().into();
/// assert_eq!(counter.count(1.0, 2.5).unwrap(), 2.0);
/// ```
#[enum_dispatch(CountsTrait)]
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum EventsCounter {
    Events(EventList),
    Spectrum(BinnedSpectrum),
}

impl EventsCounter {
    /// Build the counter matching the document's `DATATYPE` marker
    pub fn from_counts_file(file: &CountsFile) -> Result<Self, CountsError> {
        match file.data_type() {
            DataType::Events => Ok(EventList::new(file.events.clone())?.into()),
            DataType::Spectrum => {
                let spectrum = BinnedSpectrum::from_rows(file.spectrum_rows()?)?;
                if !spectrum.is_contiguous() {
                    warn!("spectrum bins overlap or are unsorted, overlapping counts are summed");
                }
                debug!(
                    "{} spectrum bins with {} counts",
                    spectrum.bins().len(),
                    spectrum.total()
                );
                Ok(spectrum.into())
            }
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Events(_) => DataType::Events,
            Self::Spectrum(_) => DataType::Spectrum,
        }
    }
}
