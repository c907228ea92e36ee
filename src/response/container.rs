use crate::error::IoError;
use crate::io::{read_json, write_json_atomic};
use crate::response::{EnergyBounds, Header, ResponseMatrix};
use crate::time_interval::TimeInterval;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Multi-extension response container, one matrix per requested interval
///
/// The primary header carries `DRM_NUM`, `TSTART` and `TSTOP` of the whole run; every matrix
/// carries its interval as `TSTART`/`TSTOP` and its 1-based position as `RSP_NUM` and `EXTVER`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WeightedResponse {
    pub primary: Header,
    pub ebounds: EnergyBounds,
    pub matrices: Vec<ResponseMatrix>,
}

impl WeightedResponse {
    /// Assemble the container from per-interval matrices
    ///
    /// `primary` is usually the library's primary header, its keywords are kept and the run
    /// keywords are stamped over them. `history` is appended to every matrix header.
    pub fn assemble(
        mut primary: Header,
        ebounds: EnergyBounds,
        matrices: impl IntoIterator<Item = (TimeInterval, ResponseMatrix)>,
        history: &str,
    ) -> Self {
        let mut tstart = None;
        let mut tstop = None;
        let matrices: Vec<_> = matrices
            .into_iter()
            .enumerate()
            .map(|(i, (interval, mut matrix))| {
                tstart.get_or_insert(interval.start());
                tstop = Some(interval.stop());
                matrix
                    .header
                    .set("TSTART", interval.start())
                    .set("TSTOP", interval.stop())
                    .set("RSP_NUM", i + 1)
                    .set("EXTVER", i + 1)
                    .add_history(history);
                matrix
            })
            .collect();

        primary.set("DRM_NUM", matrices.len());
        if let (Some(tstart), Some(tstop)) = (tstart, tstop) {
            primary.set("TSTART", tstart).set("TSTOP", tstop);
        }
        Self {
            primary,
            ebounds,
            matrices,
        }
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        write_json_atomic(self, path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }
}

#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn empty_matrix() -> ResponseMatrix {
        ResponseMatrix {
            extname: "SPECRESP MATRIX".into(),
            header: Header::new().with("TSTART", -1.0),
            rows: vec![],
        }
    }

    fn assembled() -> WeightedResponse {
        let intervals = [(0.0, 1.5), (1.5, 4.0), (4.0, 10.0)]
            .map(|(a, b)| (TimeInterval::new(a, b).unwrap(), empty_matrix()));
        WeightedResponse::assemble(
            Header::new()
                .with("TELESCOP", "GLAST")
                .with("DRM_NUM", 1i64),
            EnergyBounds::default(),
            intervals,
            "made in a test",
        )
    }

    #[test]
    fn keywords_are_stamped() {
        let response = assembled();
        assert_eq!(response.primary.get_i64("DRM_NUM"), Some(3));
        assert_eq!(response.primary.get_str("TELESCOP"), Some("GLAST"));
        assert_eq!(response.primary.get_f64("TSTART"), Some(0.0));
        assert_eq!(response.primary.get_f64("TSTOP"), Some(10.0));
        for (i, matrix) in response.matrices.iter().enumerate() {
            assert_eq!(matrix.header.get_i64("RSP_NUM"), Some(i as i64 + 1));
            assert_eq!(matrix.header.get_i64("EXTVER"), Some(i as i64 + 1));
            assert_eq!(matrix.header.history, ["made in a test"]);
        }
        assert_eq!(response.matrices[1].header.get_f64("TSTART"), Some(1.5));
        assert_eq!(response.matrices[1].header.get_f64("TSTOP"), Some(4.0));
    }

    #[test]
    fn empty_container() {
        let response = WeightedResponse::assemble(Header::new(), EnergyBounds::default(), [], "");
        assert!(response.is_empty());
        assert_eq!(response.primary.get_i64("DRM_NUM"), Some(0));
        assert_eq!(response.primary.get("TSTART"), None);
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weighted.rsp.json");
        let response = assembled();
        response.save(&path).unwrap();
        assert_eq!(WeightedResponse::load(&path).unwrap(), response);
    }
}
