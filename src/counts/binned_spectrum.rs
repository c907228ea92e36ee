use crate::counts::CountsTrait;
use crate::error::CountsError;

use itertools::Itertools;

/// A single row of a pre-binned count spectrum, channels already summed
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpectrumBin {
    pub start: f64,
    pub stop: f64,
    pub counts: f64,
}

impl SpectrumBin {
    #[inline]
    fn width(&self) -> f64 {
        self.stop - self.start
    }

    /// Fraction of the bin overlapped by `[t1, t2]`, assuming uniform event density inside the bin
    fn coverage_fraction(&self, t1: f64, t2: f64) -> f64 {
        (f64::min(t2, self.stop) - f64::max(t1, self.start)) / self.width()
    }
}

/// Pre-binned counts, e.g. a CSPEC spectrum
///
/// Bins flagged with bad quality are stored with zero counts.
#[derive(Clone, Debug, PartialEq)]
pub struct BinnedSpectrum {
    bins: Vec<SpectrumBin>,
}

impl BinnedSpectrum {
    pub fn new(bins: Vec<SpectrumBin>) -> Result<Self, CountsError> {
        if let Some(bin) = bins.iter().find(|bin| !(bin.width() > 0.0)) {
            return Err(CountsError::ZeroWidthBin {
                start: bin.start,
                stop: bin.stop,
            });
        }
        Ok(Self { bins })
    }

    /// Construct from per-row `(start, stop, counts, quality)`, non-zero quality zeroes the row
    pub fn from_rows(
        rows: impl IntoIterator<Item = (f64, f64, f64, i32)>,
    ) -> Result<Self, CountsError> {
        let bins = rows
            .into_iter()
            .map(|(start, stop, counts, quality)| SpectrumBin {
                start,
                stop,
                counts: if quality != 0 { 0.0 } else { counts },
            })
            .collect();
        Self::new(bins)
    }

    pub fn bins(&self) -> &[SpectrumBin] {
        &self.bins
    }

    /// Total counts of the spectrum
    pub fn total(&self) -> f64 {
        self.bins.iter().map(|bin| bin.counts).sum()
    }

    /// Whether bins are sorted by start time and don't overlap
    pub fn is_contiguous(&self) -> bool {
        self.bins
            .iter()
            .tuple_windows()
            .all(|(a, b)| a.stop <= b.start)
    }
}

impl CountsTrait for BinnedSpectrum {
    fn extent(&self) -> Option<(f64, f64)> {
        let min = self.bins.iter().map(|bin| bin.start).min_by(f64::total_cmp)?;
        let max = self.bins.iter().map(|bin| bin.stop).max_by(f64::total_cmp)?;
        Some((min, max))
    }

    fn count_within_extent(&self, t1: f64, t2: f64) -> f64 {
        self.bins
            .iter()
            .filter(|bin| bin.stop >= t1 && bin.start <= t2)
            .map(|bin| bin.coverage_fraction(t1, t2) * bin.counts)
            .sum()
    }
}
