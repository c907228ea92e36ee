use crate::error::ProfileError;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// [crate::LikelihoodProfiler] settings
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ProfilerSettings {
    /// Number of ensemble walkers, even and at least two
    #[serde(default = "ProfilerSettings::default_nwalkers")]
    pub nwalkers: usize,
    /// Number of ensemble steps
    #[serde(default = "ProfilerSettings::default_nsteps")]
    pub nsteps: usize,
    /// Number of points of the logarithmic grid including both bounds, which are not evaluated
    #[serde(default = "ProfilerSettings::default_grid_points")]
    pub grid_points: usize,
    /// Relative spread of the initial walker positions around the best fit
    #[serde(default = "ProfilerSettings::default_walker_spread")]
    pub walker_spread: f64,
    /// Random seed of the walker initialization and the sampler, random if [None]
    #[serde(default)]
    pub seed: Option<u64>,
    /// Convert photon flux normalizations to energy fluxes
    #[serde(default = "ProfilerSettings::default_energy_flux")]
    pub energy_flux: bool,
    /// Photon index to fix during the profile fits instead of its best-fit value
    #[serde(default)]
    pub forced_photon_index: Option<f64>,
}

impl ProfilerSettings {
    #[inline]
    pub fn default_nwalkers() -> usize {
        30
    }

    #[inline]
    pub fn default_nsteps() -> usize {
        100
    }

    #[inline]
    pub fn default_grid_points() -> usize {
        1000
    }

    #[inline]
    pub fn default_walker_spread() -> f64 {
        0.02
    }

    #[inline]
    pub fn default_energy_flux() -> bool {
        false
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.nwalkers < 2 || self.nwalkers % 2 != 0 {
            return Err(ProfileError::InvalidSettings(
                "nwalkers must be even and at least two",
            ));
        }
        if self.grid_points < 3 {
            return Err(ProfileError::InvalidSettings(
                "grid_points must be at least three",
            ));
        }
        if !(self.walker_spread > 0.0 && self.walker_spread < 1.0) {
            return Err(ProfileError::InvalidSettings(
                "walker_spread must be in (0, 1)",
            ));
        }
        if self.forced_photon_index.is_some_and(|x| !x.is_finite()) {
            return Err(ProfileError::InvalidSettings(
                "forced_photon_index must be finite",
            ));
        }
        Ok(())
    }
}

impl Default for ProfilerSettings {
    fn default() -> Self {
        Self {
            nwalkers: Self::default_nwalkers(),
            nsteps: Self::default_nsteps(),
            grid_points: Self::default_grid_points(),
            walker_spread: Self::default_walker_spread(),
            seed: None,
            energy_flux: Self::default_energy_flux(),
            forced_photon_index: None,
        }
    }
}
