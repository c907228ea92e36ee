use serde::{Deserialize, Serialize};
use std::fmt;

/// Model parameter address: source name plus parameter name
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterKey {
    pub source: String,
    pub parameter: String,
}

impl ParameterKey {
    pub fn new(source: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            parameter: parameter.into(),
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.parameter)
    }
}

/// Likelihood model bound to data, as seen by [crate::LikelihoodProfiler]
///
/// Parameter values and bounds are in scaled units: the physical value is `value * scale`.
/// Implementations own all fitting machinery; the profiler only moves parameters around and asks
/// for a refit.
pub trait LikelihoodEvaluator {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All parameters of the model
    fn parameters(&self) -> Vec<ParameterKey>;

    fn value(&self, key: &ParameterKey) -> Result<f64, Self::Error>;

    fn set_value(&mut self, key: &ParameterKey, value: f64) -> Result<(), Self::Error>;

    fn is_free(&self, key: &ParameterKey) -> Result<bool, Self::Error>;

    fn set_free(&mut self, key: &ParameterKey, free: bool) -> Result<(), Self::Error>;

    /// `(min, max)` bounds of the parameter
    fn bounds(&self, key: &ParameterKey) -> Result<(f64, f64), Self::Error>;

    fn set_bounds(&mut self, key: &ParameterKey, min: f64, max: f64) -> Result<(), Self::Error>;

    fn scale(&self, key: &ParameterKey) -> Result<f64, Self::Error>;

    fn set_scale(&mut self, key: &ParameterKey, scale: f64) -> Result<(), Self::Error>;

    /// Optimize all free parameters, returns `-ln(likelihood)` at the optimum
    fn fit(&mut self, verbosity: u32, covariance: bool) -> Result<f64, Self::Error>;

    /// Physical value of the parameter
    fn physical_value(&self, key: &ParameterKey) -> Result<f64, Self::Error> {
        Ok(self.value(key)? * self.scale(key)?)
    }
}
