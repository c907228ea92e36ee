use crate::counts::{CountsFile, EventsCounter};
use crate::error::WeightingError;
use crate::response::combiner::{MatrixCombiner, WeightedSum};
use crate::response::coverage::{ClaimedWindow, MatrixCoverage, claimed_windows, select_matrices};
use crate::response::repair::{needs_channel_repair, repair_ebounds, repair_matrix};
use crate::response::weights::{MatrixWeights, WeightingScheme, compute_weights};
use crate::response::{ResponseLibrary, ResponseMatrix, WeightedResponse};
use crate::time_bins::{CountedInterval, TimeIntervalTable};
use crate::time_interval::TimeInterval;

use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Drift of the raw weight sum that is still considered floating point noise
const SILENT_DRIFT: f64 = 1e-6;

/// [ResponseMatrixWeighter] settings
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct WeighterSettings {
    /// Reference time subtracted from times in log messages, it doesn't affect the results
    #[serde(default = "WeighterSettings::default_trigger_time")]
    pub trigger_time: Option<f64>,
    /// Maximum allowed `|1 - sum(weights)|` before renormalization
    ///
    /// [None] means any drift is corrected silently.
    #[serde(default = "WeighterSettings::default_weight_sum_tolerance")]
    pub weight_sum_tolerance: Option<f64>,
}

impl WeighterSettings {
    #[inline]
    pub fn default_trigger_time() -> Option<f64> {
        None
    }

    #[inline]
    pub fn default_weight_sum_tolerance() -> Option<f64> {
        None
    }
}

impl Default for WeighterSettings {
    fn default() -> Self {
        Self {
            trigger_time: Self::default_trigger_time(),
            weight_sum_tolerance: Self::default_weight_sum_tolerance(),
        }
    }
}

/// Matrices selected for a single interval and their weights
#[derive(Clone, Debug, PartialEq)]
pub struct IntervalPlan {
    pub interval: TimeInterval,
    pub coverages: Vec<MatrixCoverage>,
    pub weights: MatrixWeights,
}

impl IntervalPlan {
    /// Library matrix indices paired with their weights
    pub fn weighted_indices(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.coverages
            .iter()
            .zip(self.weights.weights.iter())
            .map(|(c, &w)| (c.window.index, w))
    }
}

/// Time-weighted response matrices from a library of calibration matrices
///
/// For every requested interval, the calibration matrices whose claimed windows intersect it are
/// weighted by the fraction of the interval's counts falling into their coverage (or by their
/// exposure fraction when the interval has no counts) and combined with a [MatrixCombiner].
/// The per-interval matrices are assembled into a single [WeightedResponse].
#[derive(Clone, Debug)]
pub struct ResponseMatrixWeighter<C = WeightedSum> {
    settings: WeighterSettings,
    combiner: C,
}

impl ResponseMatrixWeighter<WeightedSum> {
    pub fn new(settings: WeighterSettings) -> Self {
        Self::with_combiner(settings, WeightedSum)
    }
}

impl Default for ResponseMatrixWeighter<WeightedSum> {
    fn default() -> Self {
        Self::new(WeighterSettings::default())
    }
}

impl<C> ResponseMatrixWeighter<C>
where
    C: MatrixCombiner,
{
    pub fn with_combiner(settings: WeighterSettings, combiner: C) -> Self {
        Self { settings, combiner }
    }

    pub fn settings(&self) -> &WeighterSettings {
        &self.settings
    }

    fn relative(&self, interval: &TimeInterval) -> TimeInterval {
        interval.relative_to(self.settings.trigger_time.unwrap_or(0.0))
    }

    /// Select the matrices for one interval and weight them
    pub fn plan(
        &self,
        windows: &[ClaimedWindow],
        row: &CountedInterval,
        counter: &EventsCounter,
    ) -> Result<IntervalPlan, WeightingError> {
        let interval = row.interval;
        let coverages = select_matrices(windows, &interval)?;
        for c in coverages.iter().filter(|c| c.force_extended) {
            warn!(
                "calibration library ends at {}, matrix {} is extended to cover {}",
                c.window.stop - self.settings.trigger_time.unwrap_or(0.0),
                c.window.index,
                self.relative(&c.coverage),
            );
        }
        let weights = compute_weights(
            &interval,
            row.counts,
            &coverages,
            counter,
            self.settings.weight_sum_tolerance,
        )?;
        if (1.0 - weights.raw_sum).abs() > SILENT_DRIFT {
            warn!(
                "weights of interval {} summed to {}, renormalized",
                self.relative(&interval),
                weights.raw_sum
            );
        }
        if weights.scheme == WeightingScheme::Exposure {
            debug!(
                "no counts in {}, weighting by exposure",
                self.relative(&interval)
            );
        }
        for (c, w) in coverages.iter().zip(weights.weights.iter()) {
            debug!(
                "matrix {} covers {} with weight {w}",
                c.window.index,
                self.relative(&c.coverage)
            );
        }
        Ok(IntervalPlan {
            interval,
            coverages,
            weights,
        })
    }

    /// Weighted response for every interval of `table`
    ///
    /// `library_name` goes to the provenance records of the output matrices and `instrument` is
    /// the instrument of the counts data, which decides on the channel repair.
    pub fn run(
        &self,
        library: &ResponseLibrary,
        library_name: &str,
        table: &TimeIntervalTable,
        counter: &EventsCounter,
        instrument: &str,
    ) -> Result<WeightedResponse, WeightingError> {
        if table.is_empty() {
            return Err(WeightingError::NoIntervals);
        }
        let responses = library.responses();
        if responses.is_empty() {
            return Err(WeightingError::EmptyLibrary);
        }
        for matrix in &responses {
            if let Some(name) = matrix.instrument().filter(|&name| name != instrument) {
                warn!(
                    "calibration matrix {} is for {name}, while counts are from {instrument}",
                    matrix.extname
                );
            }
        }
        let header_ranges = responses
            .iter()
            .map(|m| m.header_range())
            .collect::<Result<Vec<_>, _>>()?;
        let windows = claimed_windows(&header_ranges);

        let repair = needs_channel_repair(instrument);
        let mut ebounds = library.ebounds.clone();
        if repair {
            repair_ebounds(&mut ebounds);
        }
        let n_channels = ebounds.n_channels();
        let constituent = |index: usize| -> ResponseMatrix {
            let mut matrix = responses[index].clone();
            if repair {
                let fixed = repair_matrix(&mut matrix, n_channels);
                if fixed > 0 {
                    debug!("{fixed} rows of matrix {index} had their first channel repaired");
                }
            }
            matrix
        };

        let mut combined = Vec::with_capacity(table.len());
        for row in table.rows() {
            let plan = self.plan(&windows, row, counter)?;
            info!(
                "interval {}: {} counts, {} matrices",
                self.relative(&plan.interval),
                row.counts,
                plan.coverages.len()
            );
            let inputs: Vec<_> = plan
                .weighted_indices()
                .map(|(index, weight)| (constituent(index), weight))
                .collect();
            let matrix = self.combiner.combine(&ebounds, &inputs)?;
            combined.push((plan.interval, matrix));
        }

        let history = format!(
            "This is a matrix computed by weighting applying matrices contained in {library_name}"
        );
        Ok(WeightedResponse::assemble(
            library.primary.clone(),
            ebounds,
            combined,
            &history,
        ))
    }

    /// Read all inputs from files, weight, and write the result to `out_path`
    ///
    /// Nothing is written to `out_path` unless every interval succeeds.
    pub fn run_files(
        &self,
        counts_path: impl AsRef<Path>,
        bins_path: impl AsRef<Path>,
        library_path: impl AsRef<Path>,
        out_path: impl AsRef<Path>,
    ) -> Result<WeightedResponse, WeightingError> {
        let counts = CountsFile::from_path(counts_path)?;
        let counter = EventsCounter::from_counts_file(&counts)?;
        let table = TimeIntervalTable::from_csv(bins_path, &counter)?;
        let library_path = library_path.as_ref();
        let library = ResponseLibrary::from_path(library_path)?;
        let library_name = match library_path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => library_path.display().to_string(),
        };

        let response = self.run(
            &library,
            &library_name,
            &table,
            &counter,
            counts.instrument(),
        )?;
        let out_path = out_path.as_ref();
        response.save(out_path)?;
        info!(
            "{} weighted matrices written to {}",
            response.len(),
            out_path.display()
        );
        Ok(response)
    }
}

#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::counts::{BinnedSpectrum, EventList};
    use crate::response::{EnergyBounds, Header, ResponseRow};

    use approx::assert_abs_diff_eq;
    use tempfile::TempDir;

    fn ebounds(channels: Vec<i64>) -> EnergyBounds {
        let n = channels.len();
        EnergyBounds {
            header: Header::new(),
            channel: channels,
            e_min: (0..n).map(|i| 10.0 * (i + 1) as f64).collect(),
            e_max: (0..n).map(|i| 10.0 * (i + 2) as f64).collect(),
        }
    }

    /// Matrix with a single row and a single element `value` in channel `f_chan`
    fn matrix(tstart: f64, tstop: f64, f_chan: i64, value: f64) -> ResponseMatrix {
        ResponseMatrix {
            extname: "SPECRESP MATRIX".into(),
            header: Header::new()
                .with("TSTART", tstart)
                .with("TSTOP", tstop)
                .with("INSTRUME", "GBM"),
            rows: vec![ResponseRow {
                energ_lo: 10.0,
                energ_hi: 20.0,
                f_chan,
                n_chan: 1,
                matrix: vec![value],
            }],
        }
    }

    fn library() -> ResponseLibrary {
        ResponseLibrary {
            primary: Header::new(),
            ebounds: ebounds(vec![1, 2]),
            matrices: vec![
                matrix(0.0, 10.0, 1, 1.0),
                matrix(10.0, 20.0, 1, 2.0),
                matrix(20.0, 20.0, 1, 3.0),
            ],
        }
    }

    fn spectrum() -> EventsCounter {
        BinnedSpectrum::from_rows([
            (0.0, 3.0, 0.0, 0),
            (3.0, 5.0, 2.0, 0),
            (5.0, 15.0, 10.0, 0),
            (15.0, 18.0, 3.0, 0),
            (18.0, 20.0, 0.0, 0),
        ])
        .unwrap()
        .into()
    }

    fn table(intervals: &[(f64, f64)], counter: &EventsCounter) -> TimeIntervalTable {
        TimeIntervalTable::new(
            intervals
                .iter()
                .map(|&(a, b)| TimeInterval::new(a, b).unwrap()),
            counter,
        )
        .unwrap()
    }

    #[test]
    fn counts_weighted_combination() {
        let counter = spectrum();
        let weighter = ResponseMatrixWeighter::default();
        let response = weighter
            .run(&library(), "lib.json", &table(&[(3.0, 18.0)], &counter), &counter, "LAT")
            .unwrap();
        assert_eq!(response.len(), 1);
        let row = &response.matrices[0].rows[0];
        assert_abs_diff_eq!(
            row.to_dense(2, 1)[0],
            (1.0 * 2.0 + 2.0 * 10.0 + 3.0 * 3.0) / 15.0,
            epsilon = 1e-12
        );
        let header = &response.matrices[0].header;
        assert_eq!(header.get_f64("TSTART"), Some(3.0));
        assert_eq!(header.get_f64("TSTOP"), Some(18.0));
        assert_eq!(header.get_i64("RSP_NUM"), Some(1));
        assert!(header.history.last().unwrap().ends_with("lib.json"));
    }

    #[test]
    fn plan_reports_weights() {
        let counter = spectrum();
        let weighter = ResponseMatrixWeighter::default();
        let windows = claimed_windows(&[(0.0, 10.0), (10.0, 20.0), (20.0, 20.0)]);
        let rows = table(&[(3.0, 18.0), (6.0, 8.0)], &counter);
        let plan = weighter.plan(&windows, &rows.rows()[0], &counter).unwrap();
        let weights: Vec<_> = plan.weighted_indices().collect();
        assert_eq!(weights.len(), 3);
        assert_abs_diff_eq!(weights[1].1, 10.0 / 15.0, epsilon = 1e-12);
        let plan = weighter.plan(&windows, &rows.rows()[1], &counter).unwrap();
        assert_eq!(plan.weights.scheme, WeightingScheme::Single);
        assert_eq!(plan.weighted_indices().collect::<Vec<_>>(), [(1, 1.0)]);
    }

    #[test]
    fn several_intervals() {
        let counter = spectrum();
        let response = ResponseMatrixWeighter::default()
            .run(
                &library(),
                "lib.json",
                &table(&[(0.0, 4.0), (4.0, 12.0), (12.0, 20.0)], &counter),
                &counter,
                "LAT",
            )
            .unwrap();
        assert_eq!(response.primary.get_i64("DRM_NUM"), Some(3));
        assert_eq!(response.primary.get_f64("TSTART"), Some(0.0));
        assert_eq!(response.primary.get_f64("TSTOP"), Some(20.0));
        let extver: Vec<_> = response
            .matrices
            .iter()
            .map(|m| m.header.get_i64("EXTVER").unwrap())
            .collect();
        assert_eq!(extver, [1, 2, 3]);
    }

    #[test]
    fn library_primary_keywords_are_kept() {
        let counter = spectrum();
        let mut library = library();
        library.primary = Header::new()
            .with("TELESCOP", "GLAST")
            .with("OBJECT", "GRB080916C")
            .with("TSTART", -100.0);
        let response = ResponseMatrixWeighter::default()
            .run(&library, "lib.json", &table(&[(3.0, 18.0)], &counter), &counter, "LAT")
            .unwrap();
        assert_eq!(response.primary.get_str("TELESCOP"), Some("GLAST"));
        assert_eq!(response.primary.get_str("OBJECT"), Some("GRB080916C"));
        assert_eq!(response.primary.get_f64("TSTART"), Some(3.0));
        assert_eq!(response.primary.get_f64("TSTOP"), Some(18.0));
        assert_eq!(response.primary.get_i64("DRM_NUM"), Some(1));
    }

    #[test]
    fn gbm_channels_are_repaired() {
        let counter: EventsCounter = EventList::new(vec![0.0, 1.0, 2.0]).unwrap().into();
        let library = ResponseLibrary {
            primary: Header::new(),
            ebounds: ebounds(vec![0, 1]),
            matrices: vec![matrix(0.0, 10.0, 2, 0.5)],
        };
        let rows = table(&[(0.0, 2.0)], &counter);
        let weighter = ResponseMatrixWeighter::default();

        let repaired = weighter
            .run(&library, "lib", &rows, &counter, "GBM")
            .unwrap();
        assert_eq!(repaired.ebounds.channel, [1, 2]);
        assert_eq!(repaired.matrices[0].rows[0].to_dense(2, 1), [0.5, 0.0]);

        let untouched = weighter
            .run(&library, "lib", &rows, &counter, "LAT")
            .unwrap();
        assert_eq!(untouched.ebounds.channel, [0, 1]);
        assert_eq!(untouched.matrices[0].rows[0].to_dense(2, 1), [0.0, 0.5]);
    }

    #[test]
    fn empty_inputs() {
        let counter = spectrum();
        let weighter = ResponseMatrixWeighter::default();
        let mut library = library();
        assert!(matches!(
            weighter.run(&library, "lib", &table(&[], &counter), &counter, "LAT"),
            Err(WeightingError::NoIntervals)
        ));
        for m in library.matrices.iter_mut() {
            m.extname = "GTI".into();
        }
        assert!(matches!(
            weighter.run(&library, "lib", &table(&[(1.0, 2.0)], &counter), &counter, "LAT"),
            Err(WeightingError::EmptyLibrary)
        ));
    }

    #[test]
    fn drift_tolerance_from_settings() {
        let counter: EventsCounter = EventList::new((0..=100).map(f64::from).collect())
            .unwrap()
            .into();
        let library = ResponseLibrary {
            primary: Header::new(),
            ebounds: ebounds(vec![1, 2]),
            matrices: vec![matrix(50.0, 60.0, 1, 1.0), matrix(60.0, 70.0, 1, 2.0)],
        };
        let rows = table(&[(0.0, 65.0)], &counter);
        let strict = ResponseMatrixWeighter::new(WeighterSettings {
            weight_sum_tolerance: Some(0.01),
            ..Default::default()
        });
        assert!(matches!(
            strict.run(&library, "lib", &rows, &counter, "LAT"),
            Err(WeightingError::WeightSumDrift { .. })
        ));
        assert!(ResponseMatrixWeighter::default()
            .run(&library, "lib", &rows, &counter, "LAT")
            .is_ok());
    }

    #[test]
    fn files_end_to_end() {
        let dir = TempDir::new().unwrap();
        let counts_path = dir.path().join("counts.json");
        let bins_path = dir.path().join("bins.csv");
        let library_path = dir.path().join("library.rsp.json");
        let out_path = dir.path().join("weighted.rsp.json");

        let counts = CountsFile {
            datatype: "TTE".into(),
            instrument: Some("LAT".into()),
            events: (0..=200).map(|i| f64::from(i) * 0.1).collect(),
            spectrum: vec![],
        };
        std::fs::write(&counts_path, serde_json::to_string(&counts).unwrap()).unwrap();
        std::fs::write(&bins_path, "start,stop\n0,7.5\n7.5,20\n").unwrap();
        std::fs::write(&library_path, serde_json::to_string(&library()).unwrap()).unwrap();

        let weighter = ResponseMatrixWeighter::default();
        let response = weighter
            .run_files(&counts_path, &bins_path, &library_path, &out_path)
            .unwrap();
        assert_eq!(response.len(), 2);
        assert_eq!(WeightedResponse::load(&out_path).unwrap(), response);
        assert!(response.matrices[0].header.history[0].ends_with("library.rsp.json"));
    }

    #[test]
    fn failure_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let counts_path = dir.path().join("counts.json");
        let bins_path = dir.path().join("bins.csv");
        let library_path = dir.path().join("library.rsp.json");
        let out_path = dir.path().join("weighted.rsp.json");

        let counts = CountsFile {
            datatype: "TTE".into(),
            instrument: None,
            events: (0..=100).map(f64::from).collect(),
            spectrum: vec![],
        };
        std::fs::write(&counts_path, serde_json::to_string(&counts).unwrap()).unwrap();
        // the library ends at 20
        std::fs::write(&bins_path, "start,stop\n0,10\n50,60\n").unwrap();
        std::fs::write(&library_path, serde_json::to_string(&library()).unwrap()).unwrap();

        let result = ResponseMatrixWeighter::default().run_files(
            &counts_path,
            &bins_path,
            &library_path,
            &out_path,
        );
        assert!(matches!(
            result,
            Err(WeightingError::NoMatrixSelected { .. })
        ));
        assert!(!out_path.exists());
    }

    #[test]
    fn missing_library() {
        let dir = TempDir::new().unwrap();
        let counts_path = dir.path().join("counts.json");
        let bins_path = dir.path().join("bins.csv");
        let counts = CountsFile {
            datatype: "TTE".into(),
            instrument: None,
            events: vec![0.0, 1.0],
            spectrum: vec![],
        };
        std::fs::write(&counts_path, serde_json::to_string(&counts).unwrap()).unwrap();
        std::fs::write(&bins_path, "start,stop\n0,1\n").unwrap();
        let result = ResponseMatrixWeighter::default().run_files(
            &counts_path,
            &bins_path,
            dir.path().join("absent.json"),
            dir.path().join("out.json"),
        );
        assert!(matches!(result, Err(WeightingError::Io(_))));
    }

    #[test]
    fn settings_defaults_from_empty_document() {
        let settings: WeighterSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, WeighterSettings::default());
    }
}
