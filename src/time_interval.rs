use crate::error::TimeIntervalError;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed time span in mission elapsed time (MET) seconds
///
/// `start <= stop` always holds, both ends are finite. Zero-length intervals are allowed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "TimeIntervalParameters", into = "TimeIntervalParameters")]
pub struct TimeInterval {
    start: f64,
    stop: f64,
}

impl TimeInterval {
    pub fn new(start: f64, stop: f64) -> Result<Self, TimeIntervalError> {
        if !(start.is_finite() && stop.is_finite()) {
            return Err(TimeIntervalError::NonFinite { start, stop });
        }
        if start > stop {
            return Err(TimeIntervalError::Inverted { start, stop });
        }
        Ok(Self { start, stop })
    }

    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    #[inline]
    pub fn stop(&self) -> f64 {
        self.stop
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.stop - self.start
    }

    /// Whether the closed intervals share at least one point
    pub fn intersects(&self, other: &Self) -> bool {
        self.stop >= other.start && self.start <= other.stop
    }

    /// Clip `self` to `other`, `None` if they don't intersect
    pub fn clip(&self, other: &Self) -> Option<Self> {
        self.intersects(other).then(|| Self {
            start: f64::max(self.start, other.start),
            stop: f64::min(self.stop, other.stop),
        })
    }

    /// Same interval with both ends shifted back by `reference`, used for human-readable logs
    pub fn relative_to(&self, reference: f64) -> Self {
        Self {
            start: self.start - reference,
            stop: self.stop - reference,
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.stop)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename = "TimeInterval")]
struct TimeIntervalParameters {
    start: f64,
    stop: f64,
}

impl From<TimeInterval> for TimeIntervalParameters {
    fn from(interval: TimeInterval) -> Self {
        Self {
            start: interval.start,
            stop: interval.stop,
        }
    }
}

impl TryFrom<TimeIntervalParameters> for TimeInterval {
    type Error = TimeIntervalError;

    fn try_from(p: TimeIntervalParameters) -> Result<Self, Self::Error> {
        Self::new(p.start, p.stop)
    }
}

#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_is_rejected() {
        assert_eq!(
            TimeInterval::new(100.0, 50.0),
            Err(TimeIntervalError::Inverted {
                start: 100.0,
                stop: 50.0
            })
        );
    }

    #[test]
    fn non_finite_is_rejected() {
        assert!(matches!(
            TimeInterval::new(0.0, f64::INFINITY),
            Err(TimeIntervalError::NonFinite { .. })
        ));
        assert!(TimeInterval::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn clip_to_overlap() {
        let a = TimeInterval::new(0.0, 5.0).unwrap();
        let b = TimeInterval::new(3.0, 18.0).unwrap();
        let c = a.clip(&b).unwrap();
        assert_eq!(c.start(), 3.0);
        assert_eq!(c.stop(), 5.0);
        assert_eq!(c.duration(), 2.0);
    }

    #[test]
    fn touching_intervals_intersect() {
        let a = TimeInterval::new(0.0, 5.0).unwrap();
        let b = TimeInterval::new(5.0, 15.0).unwrap();
        assert!(a.intersects(&b));
        let c = TimeInterval::new(5.5, 15.0).unwrap();
        assert!(!a.intersects(&c));
        assert_eq!(a.clip(&c), None);
    }

    #[test]
    fn deserialization_validates() {
        let ok: TimeInterval = serde_json::from_str(r#"{"start": 1.0, "stop": 2.0}"#).unwrap();
        assert_eq!(ok.duration(), 1.0);
        let err = serde_json::from_str::<TimeInterval>(r#"{"start": 2.0, "stop": 1.0}"#);
        assert!(err.is_err());
    }
}
