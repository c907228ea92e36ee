use grb_likelihood::{LikelihoodEvaluator, ParameterKey};

use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum GaussianError {
    #[error("no parameter {0}")]
    NoSuchParameter(ParameterKey),

    #[error("{key} = {value} is out of its bounds")]
    OutOfBounds { key: ParameterKey, value: f64 },
}

#[derive(Clone, Debug, PartialEq)]
struct Parameter {
    value: f64,
    scale: f64,
    min: f64,
    max: f64,
    free: bool,
}

/// Power-law source whose `-ln L` is a Gaussian in `log10` of the normalization and in the index
///
/// Every refit moves the free parameters straight to their analytic optimum, which makes the
/// model cheap enough for benchmarks.
#[derive(Clone, Debug)]
pub struct GaussianLikelihood {
    source: String,
    params: BTreeMap<ParameterKey, Parameter>,
    peak_log_norm: f64,
    log_norm_sigma: f64,
    peak_index: f64,
    index_sigma: f64,
    fits: usize,
}

impl GaussianLikelihood {
    /// Normalization scale is `1e-7`, bounds span ten decades around the peak
    pub fn new(source: &str, peak_log_norm: f64, log_norm_sigma: f64, peak_index: f64) -> Self {
        let key = |name: &str| ParameterKey::new(source, name);
        let scale = 1e-7;
        let mut params = BTreeMap::new();
        params.insert(
            key("Integral"),
            Parameter {
                value: 1.0,
                scale,
                min: 10f64.powf(peak_log_norm - 5.0) / scale,
                max: 10f64.powf(peak_log_norm + 5.0) / scale,
                free: true,
            },
        );
        params.insert(
            key("Index"),
            Parameter {
                value: -2.0,
                scale: 1.0,
                min: -5.0,
                max: 0.0,
                free: true,
            },
        );
        for (name, value) in [("LowerLimit", 100.0), ("UpperLimit", 1e5)] {
            params.insert(
                key(name),
                Parameter {
                    value,
                    scale: 1.0,
                    min: 1.0,
                    max: 1e6,
                    free: false,
                },
            );
        }
        Self {
            source: source.to_owned(),
            params,
            peak_log_norm,
            log_norm_sigma,
            peak_index,
            index_sigma: 0.1,
            fits: 0,
        }
    }

    pub fn norm_key(&self) -> ParameterKey {
        ParameterKey::new(&self.source, "Integral")
    }

    pub fn index_key(&self) -> ParameterKey {
        ParameterKey::new(&self.source, "Index")
    }

    /// Number of refits so far
    pub fn fits(&self) -> usize {
        self.fits
    }

    /// Snapshot of every parameter as `(value, scale, min, max, free)`
    pub fn state(&self) -> Vec<(ParameterKey, f64, f64, f64, f64, bool)> {
        self.params
            .iter()
            .map(|(k, p)| (k.clone(), p.value, p.scale, p.min, p.max, p.free))
            .collect()
    }

    fn param(&self, key: &ParameterKey) -> Result<&Parameter, GaussianError> {
        self.params
            .get(key)
            .ok_or_else(|| GaussianError::NoSuchParameter(key.clone()))
    }

    fn param_mut(&mut self, key: &ParameterKey) -> Result<&mut Parameter, GaussianError> {
        self.params
            .get_mut(key)
            .ok_or_else(|| GaussianError::NoSuchParameter(key.clone()))
    }

    fn physical(&self, key: &ParameterKey) -> f64 {
        self.params.get(key).map_or(f64::NAN, |p| p.value * p.scale)
    }
}

impl LikelihoodEvaluator for GaussianLikelihood {
    type Error = GaussianError;

    fn parameters(&self) -> Vec<ParameterKey> {
        self.params.keys().cloned().collect()
    }

    fn value(&self, key: &ParameterKey) -> Result<f64, GaussianError> {
        Ok(self.param(key)?.value)
    }

    fn set_value(&mut self, key: &ParameterKey, value: f64) -> Result<(), GaussianError> {
        let p = self.param_mut(key)?;
        if value < p.min || value > p.max {
            return Err(GaussianError::OutOfBounds {
                key: key.clone(),
                value,
            });
        }
        p.value = value;
        Ok(())
    }

    fn is_free(&self, key: &ParameterKey) -> Result<bool, GaussianError> {
        Ok(self.param(key)?.free)
    }

    fn set_free(&mut self, key: &ParameterKey, free: bool) -> Result<(), GaussianError> {
        self.param_mut(key)?.free = free;
        Ok(())
    }

    fn bounds(&self, key: &ParameterKey) -> Result<(f64, f64), GaussianError> {
        let p = self.param(key)?;
        Ok((p.min, p.max))
    }

    fn set_bounds(&mut self, key: &ParameterKey, min: f64, max: f64) -> Result<(), GaussianError> {
        let p = self.param_mut(key)?;
        p.min = min;
        p.max = max;
        Ok(())
    }

    fn scale(&self, key: &ParameterKey) -> Result<f64, GaussianError> {
        Ok(self.param(key)?.scale)
    }

    fn set_scale(&mut self, key: &ParameterKey, scale: f64) -> Result<(), GaussianError> {
        self.param_mut(key)?.scale = scale;
        Ok(())
    }

    fn fit(&mut self, _verbosity: u32, _covariance: bool) -> Result<f64, GaussianError> {
        self.fits += 1;
        let (norm_key, index_key) = (self.norm_key(), self.index_key());
        let optima = [
            (norm_key.clone(), 10f64.powf(self.peak_log_norm)),
            (index_key.clone(), self.peak_index),
        ];
        for (key, optimum) in optima {
            let p = self.param_mut(&key)?;
            if p.free {
                p.value = (optimum / p.scale).clamp(p.min, p.max);
            }
        }
        let norm = (self.physical(&norm_key).log10() - self.peak_log_norm) / self.log_norm_sigma;
        let index = (self.physical(&index_key) - self.peak_index) / self.index_sigma;
        Ok(0.5 * (norm * norm + index * index))
    }
}
