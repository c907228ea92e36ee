use crate::error::{IoError, WeightingError};
use crate::io::read_json;
use crate::response::Header;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extension names carrying a response matrix
pub const MATRIX_EXTNAMES: [&str; 2] = ["SPECRESP MATRIX", "MATRIX"];

/// 1-based position of the `CHANNEL` column in the EBOUNDS table
pub const CHANNEL_COLUMN: usize = 1;

/// 1-based position of the `F_CHAN` column in the matrix table
pub const F_CHAN_COLUMN: usize = 4;

pub(crate) fn tlmin(column: usize) -> String {
    format!("TLMIN{column}")
}

pub(crate) fn tlmax(column: usize) -> String {
    format!("TLMAX{column}")
}

/// Channel boundaries table (EBOUNDS extension)
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EnergyBounds {
    #[serde(default)]
    pub header: Header,
    #[serde(rename = "CHANNEL")]
    pub channel: Vec<i64>,
    #[serde(rename = "E_MIN")]
    pub e_min: Vec<f64>,
    #[serde(rename = "E_MAX")]
    pub e_max: Vec<f64>,
}

impl EnergyBounds {
    pub fn n_channels(&self) -> usize {
        self.channel.len()
    }
}

/// Single row of a response matrix: one true-energy bin, one channel group
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResponseRow {
    #[serde(rename = "ENERG_LO")]
    pub energ_lo: f64,
    #[serde(rename = "ENERG_HI")]
    pub energ_hi: f64,
    #[serde(rename = "F_CHAN")]
    pub f_chan: i64,
    #[serde(rename = "N_CHAN")]
    pub n_chan: i64,
    #[serde(rename = "MATRIX")]
    pub matrix: Vec<f64>,
}

impl ResponseRow {
    /// Expand the channel group into a full row of `n_channels` values
    ///
    /// `first_channel` is the number of the first channel, elements which don't fit into the
    /// row are dropped.
    pub fn to_dense(&self, n_channels: usize, first_channel: i64) -> Vec<f64> {
        let mut dense = vec![0.0; n_channels];
        let n_chan = usize::try_from(self.n_chan).unwrap_or(0);
        for (j, &value) in self.matrix.iter().take(n_chan).enumerate() {
            let index = self.f_chan - first_channel + j as i64;
            if let Some(x) = usize::try_from(index).ok().and_then(|i| dense.get_mut(i)) {
                *x = value;
            }
        }
        dense
    }

    /// Compress a full row into a single channel group spanning its non-zero elements
    pub fn from_dense(energ_lo: f64, energ_hi: f64, dense: &[f64], first_channel: i64) -> Self {
        let first = dense.iter().position(|&x| x != 0.0);
        let last = dense.iter().rposition(|&x| x != 0.0);
        match (first, last) {
            (Some(first), Some(last)) => Self {
                energ_lo,
                energ_hi,
                f_chan: first_channel + first as i64,
                n_chan: (last - first + 1) as i64,
                matrix: dense[first..=last].to_vec(),
            },
            _ => Self {
                energ_lo,
                energ_hi,
                f_chan: first_channel,
                n_chan: 0,
                matrix: vec![],
            },
        }
    }
}

/// Response matrix extension: header plus rows
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResponseMatrix {
    #[serde(rename = "EXTNAME")]
    pub extname: String,
    #[serde(default)]
    pub header: Header,
    pub rows: Vec<ResponseRow>,
}

impl ResponseMatrix {
    pub fn is_response(&self) -> bool {
        MATRIX_EXTNAMES.contains(&self.extname.as_str())
    }

    fn keyword_f64(&self, keyword: &str) -> Result<f64, WeightingError> {
        self.header
            .get_f64(keyword)
            .ok_or_else(|| WeightingError::MissingKeyword {
                extname: self.extname.clone(),
                keyword: keyword.to_owned(),
            })
    }

    /// Nominal validity window from the `TSTART` and `TSTOP` keywords
    pub fn header_range(&self) -> Result<(f64, f64), WeightingError> {
        Ok((self.keyword_f64("TSTART")?, self.keyword_f64("TSTOP")?))
    }

    pub fn instrument(&self) -> Option<&str> {
        self.header.get_str("INSTRUME")
    }

    /// Number of the first channel, from `TLMIN` of the `F_CHAN` column, 1 by default
    pub fn first_channel(&self) -> i64 {
        self.header.get_i64(&tlmin(F_CHAN_COLUMN)).unwrap_or(1)
    }
}

/// Library of calibration response matrices ordered by time
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResponseLibrary {
    #[serde(default)]
    pub primary: Header,
    #[serde(rename = "EBOUNDS")]
    pub ebounds: EnergyBounds,
    /// All extensions following EBOUNDS, only response extensions are used
    pub matrices: Vec<ResponseMatrix>,
}

impl ResponseLibrary {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }

    /// Response extensions in file order
    pub fn responses(&self) -> Vec<&ResponseMatrix> {
        self.matrices.iter().filter(|m| m.is_response()).collect()
    }
}

#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;

    fn row(f_chan: i64, matrix: Vec<f64>) -> ResponseRow {
        ResponseRow {
            energ_lo: 1.0,
            energ_hi: 2.0,
            f_chan,
            n_chan: matrix.len() as i64,
            matrix,
        }
    }

    #[test]
    fn dense_expansion() {
        let r = row(3, vec![0.5, 0.25]);
        assert_eq!(r.to_dense(5, 1), [0.0, 0.0, 0.5, 0.25, 0.0]);
        assert_eq!(r.to_dense(5, 0), [0.0, 0.0, 0.0, 0.5, 0.25]);
    }

    #[test]
    fn overflowing_elements_are_dropped() {
        let r = row(4, vec![1.0, 2.0, 3.0]);
        assert_eq!(r.to_dense(5, 1), [0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn dense_compression() {
        let r = ResponseRow::from_dense(1.0, 2.0, &[0.0, 0.1, 0.0, 0.3, 0.0], 1);
        assert_eq!(r.f_chan, 2);
        assert_eq!(r.n_chan, 3);
        assert_eq!(r.matrix, [0.1, 0.0, 0.3]);
        assert_eq!(r.to_dense(5, 1), [0.0, 0.1, 0.0, 0.3, 0.0]);
    }

    #[test]
    fn all_zero_row() {
        let r = ResponseRow::from_dense(1.0, 2.0, &[0.0; 4], 1);
        assert_eq!(r.n_chan, 0);
        assert!(r.matrix.is_empty());
        assert_eq!(r.to_dense(4, 1), [0.0; 4]);
    }

    #[test]
    fn header_range_requires_keywords() {
        let m = ResponseMatrix {
            extname: "SPECRESP MATRIX".into(),
            header: Header::new().with("TSTART", 1.0),
            rows: vec![],
        };
        assert!(m.is_response());
        assert!(matches!(
            m.header_range(),
            Err(WeightingError::MissingKeyword { keyword, .. }) if keyword == "TSTOP"
        ));
    }

    #[test]
    fn non_response_extensions_are_skipped() {
        let m = |extname: &str| ResponseMatrix {
            extname: extname.into(),
            header: Header::new(),
            rows: vec![],
        };
        let lib = ResponseLibrary {
            primary: Header::new(),
            ebounds: EnergyBounds::default(),
            matrices: vec![m("MATRIX"), m("GTI"), m("SPECRESP MATRIX")],
        };
        let names: Vec<_> = lib.responses().iter().map(|m| m.extname.as_str()).collect();
        assert_eq!(names, ["MATRIX", "SPECRESP MATRIX"]);
    }
}
