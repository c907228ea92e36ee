use crate::error::ProfileError;
use crate::profile::{LikelihoodEvaluator, ParameterKey};

use std::cell::RefCell;
use std::collections::HashMap;

/// Profile log-likelihood of the target normalization
///
/// Every evaluation restores the other parameters to their best-fit values, freezes the target at
/// the trial normalization and refits the model. The target scale must be unity, so values and
/// bounds are physical.
pub struct ProfileObjective<'a, E>
where
    E: LikelihoodEvaluator,
{
    evaluator: RefCell<&'a mut E>,
    target: ParameterKey,
    /// Companion spectral index and the value it starts every fit from
    index: Option<(ParameterKey, f64)>,
    best_fit: Vec<(ParameterKey, f64)>,
    min: f64,
    max: f64,
    /// `ln L` by `log10(norm)` for the single precision positions of the ensemble sampler
    cache: RefCell<HashMap<u32, f64>>,
    error: RefCell<Option<ProfileError>>,
}

impl<'a, E> ProfileObjective<'a, E>
where
    E: LikelihoodEvaluator,
{
    /// `best_fit` lists the parameters restored before each evaluation, `(min, max)` are the
    /// physical bounds of the target normalization
    pub fn new(
        evaluator: &'a mut E,
        target: ParameterKey,
        index: Option<(ParameterKey, f64)>,
        best_fit: Vec<(ParameterKey, f64)>,
        (min, max): (f64, f64),
    ) -> Result<Self, ProfileError> {
        if !(min > 0.0 && min < max && max.is_finite()) {
            return Err(ProfileError::InvalidBounds { min, max });
        }
        Ok(Self {
            evaluator: RefCell::new(evaluator),
            target,
            index,
            best_fit,
            min,
            max,
            cache: RefCell::new(HashMap::new()),
            error: RefCell::new(None),
        })
    }

    /// `[log10(min), log10(max)]`
    pub fn log_bounds(&self) -> (f64, f64) {
        (self.min.log10(), self.max.log10())
    }

    pub fn contains(&self, log10_norm: f64) -> bool {
        let (lo, hi) = self.log_bounds();
        (lo..=hi).contains(&log10_norm)
    }

    /// `ln L` with the target normalization fixed at `10^log10_norm`
    ///
    /// Outside of the bounds this is negative infinity and the evaluator is not touched.
    pub fn log_profile(&self, log10_norm: f64) -> Result<f64, ProfileError> {
        if !self.contains(log10_norm) {
            return Ok(f64::NEG_INFINITY);
        }
        let norm = 10f64.powf(log10_norm).clamp(self.min, self.max);
        let mut evaluator = self.evaluator.borrow_mut();
        self.evaluate(&mut **evaluator, norm)
            .map_err(ProfileError::evaluator)
    }

    fn evaluate(&self, evaluator: &mut E, norm: f64) -> Result<f64, E::Error> {
        for (key, value) in &self.best_fit {
            evaluator.set_value(key, *value)?;
        }
        evaluator.set_free(&self.target, true)?;
        evaluator.set_value(&self.target, norm)?;
        evaluator.set_free(&self.target, false)?;
        if let Some((key, value)) = &self.index {
            evaluator.set_value(key, *value)?;
            evaluator.set_free(key, true)?;
        }
        let mlog_like = evaluator.fit(0, false)?;
        evaluator.set_free(&self.target, true)?;
        Ok(-mlog_like)
    }

    /// Cached [ProfileObjective::log_profile] for sampler positions
    ///
    /// The first failure is stored and every later call returns negative infinity, so the
    /// sampler finishes quickly and the error can be reported with [ProfileObjective::take_error].
    pub fn cached_log_profile(&self, log10_norm: f32) -> f64 {
        if self.error.borrow().is_some() {
            return f64::NEG_INFINITY;
        }
        let key = log10_norm.to_bits();
        if let Some(&value) = self.cache.borrow().get(&key) {
            return value;
        }
        match self.log_profile(f64::from(log10_norm)) {
            Ok(value) => {
                self.cache.borrow_mut().insert(key, value);
                value
            }
            Err(error) => {
                self.error.borrow_mut().get_or_insert(error);
                f64::NEG_INFINITY
            }
        }
    }

    /// Cached value for a position the sampler has visited
    pub fn cached(&self, log10_norm: f32) -> Option<f64> {
        self.cache.borrow().get(&log10_norm.to_bits()).copied()
    }

    pub fn take_error(&self) -> Option<ProfileError> {
        self.error.borrow_mut().take()
    }
}

impl<E> emcee::Prob for ProfileObjective<'_, E>
where
    E: LikelihoodEvaluator,
{
    #[allow(clippy::cast_possible_truncation)]
    fn lnlike(&self, params: &emcee::Guess) -> f32 {
        self.cached_log_profile(params.values[0]) as f32
    }

    fn lnprior(&self, params: &emcee::Guess) -> f32 {
        if self.error.borrow().is_none() && self.contains(f64::from(params.values[0])) {
            0.0
        } else {
            f32::NEG_INFINITY
        }
    }
}
