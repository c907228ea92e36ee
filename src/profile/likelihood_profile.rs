use crate::error::ProfileError;
use crate::io::{read_json, write_json_atomic};

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Profile of `-ln L` over the source normalization
///
/// `norm_values` are strictly increasing and finite, `mlog_like_values` has the same length and
/// finite values. If `energy_flux` is set, normalizations are energy fluxes: photon fluxes
/// multiplied by `conversion_factor`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(
    try_from = "LikelihoodProfileParameters",
    into = "LikelihoodProfileParameters"
)]
pub struct LikelihoodProfile {
    norm_values: Array1<f64>,
    mlog_like_values: Array1<f64>,
    conversion_factor: f64,
    photon_index: f64,
    energy_flux: bool,
}

impl LikelihoodProfile {
    pub fn new(
        norm_values: Array1<f64>,
        mlog_like_values: Array1<f64>,
        conversion_factor: f64,
        photon_index: f64,
        energy_flux: bool,
    ) -> Result<Self, ProfileError> {
        if norm_values.len() != mlog_like_values.len() {
            return Err(ProfileError::MalformedProfile(
                "normalization and likelihood arrays differ in length",
            ));
        }
        if norm_values.is_empty() {
            return Err(ProfileError::NoFiniteSamples);
        }
        if !norm_values.iter().chain(mlog_like_values.iter()).all(|x| x.is_finite()) {
            return Err(ProfileError::MalformedProfile("values must be finite"));
        }
        if !norm_values.windows(2).into_iter().all(|w| w[0] < w[1]) {
            return Err(ProfileError::MalformedProfile(
                "normalizations must be strictly increasing",
            ));
        }
        Ok(Self {
            norm_values,
            mlog_like_values,
            conversion_factor,
            photon_index,
            energy_flux,
        })
    }

    /// Build the profile from `(photon flux normalization, ln L)` samples in any order
    ///
    /// Samples with non-finite values are dropped, duplicate normalizations keep the first
    /// sample in input order.
    pub fn from_samples(
        samples: impl IntoIterator<Item = (f64, f64)>,
        conversion_factor: f64,
        photon_index: f64,
        energy_flux: bool,
    ) -> Result<Self, ProfileError> {
        let multiplier = if energy_flux { conversion_factor } else { 1.0 };
        let mut samples: Vec<_> = samples
            .into_iter()
            .map(|(norm, log_like)| (norm * multiplier, log_like))
            .filter(|(norm, log_like)| norm.is_finite() && log_like.is_finite())
            .collect();
        if samples.is_empty() {
            return Err(ProfileError::NoFiniteSamples);
        }
        // stable sort keeps the input order among equal normalizations
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        samples.dedup_by(|next, kept| next.0 == kept.0);

        let (norm_values, mlog_like_values): (Vec<_>, Vec<_>) = samples
            .into_iter()
            .map(|(norm, log_like)| (norm, -log_like))
            .unzip();
        Self::new(
            norm_values.into(),
            mlog_like_values.into(),
            conversion_factor,
            photon_index,
            energy_flux,
        )
    }

    pub fn len(&self) -> usize {
        self.norm_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norm_values.is_empty()
    }

    pub fn norm_values(&self) -> ArrayView1<'_, f64> {
        self.norm_values.view()
    }

    pub fn mlog_like_values(&self) -> ArrayView1<'_, f64> {
        self.mlog_like_values.view()
    }

    pub fn conversion_factor(&self) -> f64 {
        self.conversion_factor
    }

    pub fn photon_index(&self) -> f64 {
        self.photon_index
    }

    pub fn energy_flux(&self) -> bool {
        self.energy_flux
    }

    /// Normalization and `-ln L` of the sample with the smallest `-ln L`
    pub fn minimum(&self) -> (f64, f64) {
        let (i, &mlog_like) = self
            .mlog_like_values
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .unwrap_or((0, &f64::NAN));
        (self.norm_values[i], mlog_like)
    }

    /// `-ln L` shifted to be zero at the minimum
    pub fn delta_mlog_like(&self) -> Array1<f64> {
        let (_, min) = self.minimum();
        self.mlog_like_values.mapv(|x| x - min)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProfileError> {
        Ok(write_json_atomic(self, path)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let parameters: LikelihoodProfileParameters = read_json(path)?;
        parameters.try_into()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename = "LikelihoodProfile")]
struct LikelihoodProfileParameters {
    mlog_like_values: Vec<f64>,
    norm_values: Vec<f64>,
    conversion_factor: f64,
    photon_index: f64,
    #[serde(default)]
    energy_flux: bool,
}

impl From<LikelihoodProfile> for LikelihoodProfileParameters {
    fn from(p: LikelihoodProfile) -> Self {
        Self {
            mlog_like_values: p.mlog_like_values.to_vec(),
            norm_values: p.norm_values.to_vec(),
            conversion_factor: p.conversion_factor,
            photon_index: p.photon_index,
            energy_flux: p.energy_flux,
        }
    }
}

impl TryFrom<LikelihoodProfileParameters> for LikelihoodProfile {
    type Error = ProfileError;

    fn try_from(p: LikelihoodProfileParameters) -> Result<Self, Self::Error> {
        Self::new(
            p.norm_values.into(),
            p.mlog_like_values.into(),
            p.conversion_factor,
            p.photon_index,
            p.energy_flux,
        )
    }
}

#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;
    use rand::prelude::*;
    use rand_distr::StandardNormal;
    use tempfile::TempDir;

    #[test]
    fn sorted_and_deduplicated() {
        let samples = [
            (3.0, -1.0),
            (1.0, -5.0),
            (2.0, -2.0),
            (1.0, -7.0),
            (3.0, -9.0),
            (f64::NAN, -1.0),
            (4.0, f64::NEG_INFINITY),
        ];
        let profile = LikelihoodProfile::from_samples(samples, 1.0, -2.0, false).unwrap();
        assert_eq!(profile.norm_values(), array![1.0, 2.0, 3.0]);
        // the first of duplicates is kept
        assert_eq!(profile.mlog_like_values(), array![5.0, 2.0, 1.0]);
    }

    #[test]
    fn random_samples_with_duplicates() {
        let mut rng = StdRng::seed_from_u64(0);
        let samples: Vec<_> = (0..1000)
            .map(|_| {
                // coarse values produce plenty of duplicates
                let norm = f64::from(rng.random_range(0..200_u32)) * 0.5;
                let log_like = if rng.random_bool(0.05) {
                    f64::NEG_INFINITY
                } else {
                    -0.5 * rng.sample::<f64, _>(StandardNormal).powi(2)
                };
                (norm, log_like)
            })
            .collect();
        let profile = LikelihoodProfile::from_samples(samples, 1.0, -2.0, false).unwrap();
        assert_eq!(profile.norm_values().len(), profile.mlog_like_values().len());
        assert!(profile.norm_values().windows(2).into_iter().all(|w| w[0] < w[1]));
        assert!(profile.mlog_like_values().iter().all(|x| x.is_finite()));
    }

    #[test]
    fn no_finite_samples() {
        let samples = [(1.0, f64::NEG_INFINITY), (2.0, f64::NAN)];
        assert!(matches!(
            LikelihoodProfile::from_samples(samples, 1.0, -2.0, false),
            Err(ProfileError::NoFiniteSamples)
        ));
        assert!(matches!(
            LikelihoodProfile::from_samples([], 1.0, -2.0, false),
            Err(ProfileError::NoFiniteSamples)
        ));
    }

    #[test]
    fn energy_flux_conversion_applied() {
        let samples = [(1.0, -3.0), (2.0, -1.0)];
        let photon = LikelihoodProfile::from_samples(samples, 1e-3, -2.0, false).unwrap();
        assert_eq!(photon.norm_values(), array![1.0, 2.0]);
        let energy = LikelihoodProfile::from_samples(samples, 1e-3, -2.0, true).unwrap();
        assert_eq!(energy.norm_values(), array![1e-3, 2e-3]);
        assert_eq!(energy.conversion_factor(), 1e-3);
    }

    #[test]
    fn minimum_and_delta() {
        let profile = LikelihoodProfile::new(
            array![1.0, 2.0, 3.0, 4.0],
            array![10.0, 7.5, 8.0, 12.0],
            1.0,
            -2.0,
            false,
        )
        .unwrap();
        assert_eq!(profile.minimum(), (2.0, 7.5));
        assert_eq!(profile.delta_mlog_like(), array![2.5, 0.0, 0.5, 4.5]);
    }

    #[test]
    fn invariants_are_checked() {
        assert!(matches!(
            LikelihoodProfile::new(array![1.0, 1.0], array![0.0, 0.0], 1.0, -2.0, false),
            Err(ProfileError::MalformedProfile(_))
        ));
        assert!(matches!(
            LikelihoodProfile::new(array![1.0, 2.0], array![0.0], 1.0, -2.0, false),
            Err(ProfileError::MalformedProfile(_))
        ));
        assert!(matches!(
            LikelihoodProfile::new(array![1.0, 2.0], array![0.0, f64::NAN], 1.0, -2.0, false),
            Err(ProfileError::MalformedProfile(_))
        ));
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.json");
        let profile = LikelihoodProfile::new(
            array![1e-7, 2e-7, 5e-7],
            array![101.3, 100.0, 104.25],
            3.2e-4,
            -2.2,
            true,
        )
        .unwrap();
        profile.save(&path).unwrap();
        assert_eq!(LikelihoodProfile::load(&path).unwrap(), profile);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        for field in [
            "mlog_like_values",
            "norm_values",
            "conversion_factor",
            "photon_index",
            "energy_flux",
        ] {
            assert!(json.get(field).is_some(), "{field}");
        }
    }

    #[test]
    fn malformed_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(
            &path,
            r#"{"mlog_like_values": [1, 2], "norm_values": [2, 1], "conversion_factor": 1, "photon_index": -2}"#,
        )
        .unwrap();
        assert!(matches!(
            LikelihoodProfile::load(&path),
            Err(ProfileError::MalformedProfile(_))
        ));
    }
}
