use crate::error::IoError;
use crate::io::read_json;
use crate::profile::ParameterKey;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Best-fit model description: which source is profiled and how its parameters are named
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub source: String,
    #[serde(default = "ModelDescriptor::default_normalization")]
    pub normalization: String,
    #[serde(default = "ModelDescriptor::default_index")]
    pub index: String,
    #[serde(default = "ModelDescriptor::default_lower_limit")]
    pub lower_limit: String,
    #[serde(default = "ModelDescriptor::default_upper_limit")]
    pub upper_limit: String,
}

impl ModelDescriptor {
    /// Descriptor of a power law with integral normalization
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            normalization: Self::default_normalization(),
            index: Self::default_index(),
            lower_limit: Self::default_lower_limit(),
            upper_limit: Self::default_upper_limit(),
        }
    }

    #[inline]
    pub fn default_normalization() -> String {
        "Integral".into()
    }

    #[inline]
    pub fn default_index() -> String {
        "Index".into()
    }

    #[inline]
    pub fn default_lower_limit() -> String {
        "LowerLimit".into()
    }

    #[inline]
    pub fn default_upper_limit() -> String {
        "UpperLimit".into()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }

    fn key(&self, parameter: &str) -> ParameterKey {
        ParameterKey::new(self.source.as_str(), parameter)
    }

    pub fn normalization_key(&self) -> ParameterKey {
        self.key(&self.normalization)
    }

    pub fn index_key(&self) -> ParameterKey {
        self.key(&self.index)
    }

    pub fn lower_limit_key(&self) -> ParameterKey {
        self.key(&self.lower_limit)
    }

    pub fn upper_limit_key(&self) -> ParameterKey {
        self.key(&self.upper_limit)
    }
}
