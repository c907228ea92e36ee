use crate::error::SortedArrayError;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

// Underlying array is guaranteed to be sorted, contiguous and free of NaN and infinities
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SortedArray(Array1<f64>);

impl SortedArray {
    pub fn from_sorted(sorted_array: impl Into<Array1<f64>>) -> Result<Self, SortedArrayError> {
        let v = sorted_array.into().to_vec();
        if !v.iter().all(|x| x.is_finite()) {
            return Err(SortedArrayError::NonFinite);
        }
        if v.is_sorted() {
            Ok(Self(Array1::from_vec(v)))
        } else {
            Err(SortedArrayError::Unsorted)
        }
    }

    pub fn from_unsorted(mut v: Vec<f64>) -> Result<Self, SortedArrayError> {
        if !v.iter().all(|x| x.is_finite()) {
            return Err(SortedArrayError::NonFinite);
        }
        v.sort_unstable_by(f64::total_cmp);
        Ok(Self(Array1::from_vec(v)))
    }

    pub fn minimum(&self) -> Option<f64> {
        self.first().copied()
    }

    pub fn maximum(&self) -> Option<f64> {
        self.last().copied()
    }

    /// Number of elements `x` with `low <= x <= high`
    pub fn count_within(&self, low: f64, high: f64) -> usize {
        if low > high {
            return 0;
        }
        let first = self.partition_point(|&x| x < low);
        let last = self.partition_point(|&x| x <= high);
        last - first
    }
}

impl Deref for SortedArray {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        // Constructors keep the array in standard layout
        self.0.as_slice().unwrap_or(&[])
    }
}

impl AsRef<[f64]> for SortedArray {
    fn as_ref(&self) -> &[f64] {
        self
    }
}
