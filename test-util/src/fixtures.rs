use grb_likelihood::counts::{ChannelCounts, SpectrumRow};
use grb_likelihood::response::ResponseRow;
use grb_likelihood::{CountsFile, EnergyBounds, Header, ResponseLibrary, ResponseMatrix};

use rand::prelude::*;
use rand_distr::Exp;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const GBM_INSTRUMENT: &str = "GBM";

/// Arrival times of a homogeneous Poisson process with `rate` events per second
pub fn poisson_arrival_times(rate: f64, start: f64, stop: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let exp = Exp::new(rate).unwrap();
    let mut t = start;
    let mut times = vec![];
    loop {
        t += exp.sample(&mut rng);
        if t > stop {
            break times;
        }
        times.push(t);
    }
}

pub fn event_counts(times: Vec<f64>, instrument: &str) -> CountsFile {
    CountsFile {
        datatype: "TTE".into(),
        instrument: Some(instrument.into()),
        events: times,
        spectrum: vec![],
    }
}

/// CSPEC document with contiguous bins between consecutive `edges`
pub fn binned_counts(edges: &[f64], counts: &[f64], instrument: &str) -> CountsFile {
    assert_eq!(edges.len(), counts.len() + 1);
    let spectrum = edges
        .windows(2)
        .zip(counts)
        .map(|(edge, &counts)| SpectrumRow {
            start: edge[0],
            stop: edge[1],
            counts: Some(ChannelCounts::Total(counts)),
            rate: None,
            quality: 0,
        })
        .collect();
    CountsFile {
        datatype: "CSPEC".into(),
        instrument: Some(instrument.into()),
        events: vec![],
        spectrum,
    }
}

/// Channels numbered from zero, as GBM calibration files have them
pub fn energy_bounds(n_channels: usize) -> EnergyBounds {
    let edges: Vec<_> = (0..=n_channels)
        .map(|i| 8.0 * 1.5_f64.powi(i as i32))
        .collect();
    EnergyBounds {
        header: Header::new()
            .with("TLMIN1", 0_i64)
            .with("TLMAX1", n_channels as i64 - 1),
        channel: (0..n_channels as i64).collect(),
        e_min: edges[..n_channels].to_vec(),
        e_max: edges[1..].to_vec(),
    }
}

/// Two-diagonal matrix: 80% of `value` in the channel matching the energy bin, 20% in the
/// channel below
pub fn banded_matrix(
    tstart: f64,
    tstop: f64,
    n_channels: usize,
    value: f64,
    instrument: &str,
) -> ResponseMatrix {
    let rows = (0..n_channels)
        .map(|i| {
            let energ_lo = 8.0 * 1.5_f64.powi(i as i32);
            let mut dense = vec![0.0; n_channels];
            dense[i] = 0.8 * value;
            if i > 0 {
                dense[i - 1] = 0.2 * value;
            }
            ResponseRow::from_dense(energ_lo, 1.5 * energ_lo, &dense, 1)
        })
        .collect();
    ResponseMatrix {
        extname: "SPECRESP MATRIX".into(),
        header: Header::new()
            .with("TSTART", tstart)
            .with("TSTOP", tstop)
            .with("INSTRUME", instrument)
            .with("TLMIN4", 1_i64)
            .with("TLMAX4", n_channels as i64),
        rows,
    }
}

/// Library of `n_matrices` banded matrices nominally valid for `step` seconds each from `start`
///
/// Matrix `k` has overall normalization `k + 1`.
pub fn response_library(
    n_matrices: usize,
    start: f64,
    step: f64,
    n_channels: usize,
    instrument: &str,
) -> ResponseLibrary {
    let matrices = (0..n_matrices)
        .map(|k| {
            let tstart = start + step * k as f64;
            banded_matrix(tstart, tstart + step, n_channels, (k + 1) as f64, instrument)
        })
        .collect();
    ResponseLibrary {
        primary: Header::new().with("INSTRUME", instrument),
        ebounds: energy_bounds(n_channels),
        matrices,
    }
}

#[derive(Serialize)]
struct TimeBinRecord {
    start: f64,
    stop: f64,
}

/// Temporary directory for input and output documents
pub struct FixtureDir {
    dir: TempDir,
}

impl FixtureDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }

    pub fn write_time_bins(&self, name: &str, bins: &[(f64, f64)]) -> PathBuf {
        let path = self.path(name);
        let mut writer = csv::Writer::from_path(&path).unwrap();
        for &(start, stop) in bins {
            writer.serialize(TimeBinRecord { start, stop }).unwrap();
        }
        writer.flush().unwrap();
        path
    }
}

impl Default for FixtureDir {
    fn default() -> Self {
        Self::new()
    }
}
