//! Assignment of time coverage to calibration matrices
//!
//! Matrices are ordered by their nominal start time and each one claims the part of the
//! timeline closest to it:
//!
//! ```text
//!   header starts:  s1             s2             s3          stop3
//!                   |--------------|--------------|------------|
//!   claimed:        [s1, (s1+s2)/2][  .., (s2+s3)/2][   ..,     stop3]
//! ```
//!
//! The first window starts at the first header start, the last one stops at the last header
//! stop, and consecutive windows meet at the midpoints between header starts, so the windows tile
//! the whole library span without gaps or overlaps.

use crate::error::WeightingError;
use crate::time_interval::TimeInterval;

/// Part of the timeline attributed to a single calibration matrix
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClaimedWindow {
    /// Position among the library's response matrices
    pub index: usize,
    pub start: f64,
    pub stop: f64,
    /// Whether this is the last matrix of the library
    pub is_last: bool,
}

/// Portion of a requested interval attributed to a single matrix
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatrixCoverage {
    pub window: ClaimedWindow,
    pub coverage: TimeInterval,
    /// The library ends before the requested interval and the last matrix was stretched to its end
    pub force_extended: bool,
}

/// Claimed windows for matrices with the given `(TSTART, TSTOP)` header values, in order
pub fn claimed_windows(header_ranges: &[(f64, f64)]) -> Vec<ClaimedWindow> {
    let n = header_ranges.len();
    let mut windows = Vec::with_capacity(n);
    let mut prev_stop = None;
    for (index, &(header_start, header_stop)) in header_ranges.iter().enumerate() {
        let is_last = index + 1 == n;
        let start = prev_stop.unwrap_or(header_start);
        let stop = match header_ranges.get(index + 1) {
            Some(&(next_start, _)) => 0.5 * (header_start + next_start),
            None => header_stop,
        };
        prev_stop = Some(stop);
        windows.push(ClaimedWindow {
            index,
            start,
            stop,
            is_last,
        });
    }
    windows
}

/// Matrices whose claimed windows intersect `target`, with the sub-interval each one covers
///
/// Walks the windows in order and stops as soon as a window reaches the end of the target. The
/// last matrix of the library always covers up to the target's end, even if the library stops
/// earlier.
pub fn select_matrices(
    windows: &[ClaimedWindow],
    target: &TimeInterval,
) -> Result<Vec<MatrixCoverage>, WeightingError> {
    let mut selected = vec![];
    for window in windows {
        if !(window.stop >= target.start() && window.start <= target.stop()) {
            continue;
        }
        let true_start = f64::max(window.start, target.start());
        let (true_stop, force_extended) = if window.is_last {
            (target.stop(), target.stop() > window.stop)
        } else {
            (f64::min(window.stop, target.stop()), false)
        };
        selected.push(MatrixCoverage {
            window: *window,
            coverage: TimeInterval::new(true_start, true_stop)?,
            force_extended,
        });
        if window.stop >= target.stop() {
            break;
        }
    }
    Ok(selected)
}

#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;

    fn interval(a: f64, b: f64) -> TimeInterval {
        TimeInterval::new(a, b).unwrap()
    }

    fn bounds(windows: &[ClaimedWindow]) -> Vec<(f64, f64)> {
        windows.iter().map(|w| (w.start, w.stop)).collect()
    }

    #[test]
    fn three_matrices_tile_the_timeline() {
        let windows = claimed_windows(&[(0.0, 10.0), (10.0, 20.0), (20.0, 20.0)]);
        assert_eq!(bounds(&windows), [(0.0, 5.0), (5.0, 15.0), (15.0, 20.0)]);
        assert!(windows[2].is_last);
        assert!(!windows[1].is_last);
    }

    #[test]
    fn single_matrix_uses_its_header() {
        let windows = claimed_windows(&[(3.0, 7.0)]);
        assert_eq!(bounds(&windows), [(3.0, 7.0)]);
        assert!(windows[0].is_last);
    }

    #[test]
    fn windows_are_contiguous() {
        let ranges: Vec<_> = (0..20)
            .map(|i| (f64::from(i) * 3.7, f64::from(i + 1) * 3.7))
            .collect();
        let windows = claimed_windows(&ranges);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].stop, pair[1].start);
        }
        assert_eq!(windows[0].start, 0.0);
        assert_eq!(windows[19].stop, 20.0 * 3.7);
    }

    #[test]
    fn selection_clips_to_target() {
        let windows = claimed_windows(&[(0.0, 10.0), (10.0, 20.0), (20.0, 20.0)]);
        let selected = select_matrices(&windows, &interval(3.0, 18.0)).unwrap();
        let coverage: Vec<_> = selected
            .iter()
            .map(|c| (c.coverage.start(), c.coverage.stop()))
            .collect();
        assert_eq!(coverage, [(3.0, 5.0), (5.0, 15.0), (15.0, 18.0)]);
        assert!(selected.iter().all(|c| !c.force_extended));
    }

    #[test]
    fn selection_stops_early() {
        let windows = claimed_windows(&[(0.0, 10.0), (10.0, 20.0), (20.0, 30.0)]);
        let selected = select_matrices(&windows, &interval(1.0, 4.0)).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].window.index, 0);
    }

    #[test]
    fn last_matrix_is_force_extended() {
        let windows = claimed_windows(&[(0.0, 10.0), (10.0, 20.0)]);
        let selected = select_matrices(&windows, &interval(3.0, 25.0)).unwrap();
        assert_eq!(selected.len(), 2);
        assert!(!selected[0].force_extended);
        let last = selected[1];
        assert!(last.force_extended);
        assert_eq!(last.coverage, interval(5.0, 25.0));
    }

    #[test]
    fn target_outside_library() {
        let windows = claimed_windows(&[(0.0, 10.0), (10.0, 20.0)]);
        assert!(select_matrices(&windows, &interval(30.0, 40.0))
            .unwrap()
            .is_empty());
    }
}
