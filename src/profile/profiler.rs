use crate::error::ProfileError;
use crate::profile::flux::energy_flux_conversion;
use crate::profile::guard::WIDE_MAX;
use crate::profile::sampling::{ensemble_samples, grid_samples};
use crate::profile::{
    LikelihoodEvaluator, LikelihoodProfile, ModelDescriptor, ParameterGuard, ParameterKey,
    ProfileObjective, ProfilerSettings,
};

use log::{debug, info};
use std::path::Path;

/// Model state at the best fit, physical units for the target normalization
struct BestFit {
    mlog_like: f64,
    norm: f64,
    min: f64,
    max: f64,
    /// Scaled index value the profile fits start from
    index_value: f64,
    photon_index: f64,
    /// Energy range in MeV
    energy_range: (f64, f64),
    /// Free parameters other than the target normalization and the index
    others: Vec<(ParameterKey, f64)>,
}

impl BestFit {
    fn find<E>(
        evaluator: &mut E,
        descriptor: &ModelDescriptor,
        forced_photon_index: Option<f64>,
    ) -> Result<Self, E::Error>
    where
        E: LikelihoodEvaluator,
    {
        let target = descriptor.normalization_key();
        let index = descriptor.index_key();

        let mlog_like = evaluator.fit(0, false)?;
        let scale = evaluator.scale(&target)?;
        let (min, max) = evaluator.bounds(&target)?;

        let index_scale = evaluator.scale(&index)?;
        let (index_value, photon_index) = match forced_photon_index {
            Some(forced) => (forced / index_scale, forced),
            None => {
                let value = evaluator.value(&index)?;
                (value, value * index_scale)
            }
        };

        let mut others = vec![];
        for key in evaluator.parameters() {
            if key == target || key == index || !evaluator.is_free(&key)? {
                continue;
            }
            let value = evaluator.value(&key)?;
            others.push((key, value));
        }

        Ok(Self {
            mlog_like,
            norm: evaluator.value(&target)? * scale,
            min: min * scale,
            max: max * scale,
            index_value,
            photon_index,
            energy_range: (
                evaluator.physical_value(&descriptor.lower_limit_key())?,
                evaluator.physical_value(&descriptor.upper_limit_key())?,
            ),
            others,
        })
    }

    /// Switch the target to unit scale, so its value and bounds are physical
    ///
    /// Bounds are widened before the value moves and narrowed after, the current value must
    /// stay inside them at every step.
    fn to_unit_scale<E>(
        &self,
        evaluator: &mut E,
        target: &ParameterKey,
        norm: f64,
    ) -> Result<(), E::Error>
    where
        E: LikelihoodEvaluator,
    {
        let current = evaluator.value(target)?;
        evaluator.set_bounds(
            target,
            current.min(self.min).min(0.0),
            current.max(self.max).max(WIDE_MAX),
        )?;
        evaluator.set_scale(target, 1.0)?;
        evaluator.set_value(target, norm)?;
        evaluator.set_bounds(target, self.min, self.max)
    }
}

/// Profile likelihood of a source normalization
///
/// The profile is sampled twice: by a short ensemble MCMC run over `log10(norm)`, which puts
/// most samples near the maximum, and on a logarithmic grid spanning the whole allowed range.
/// Every sample is a full refit of the model with the normalization frozen. The evaluator is left
/// exactly as it was found, whatever the outcome.
#[derive(Clone, Debug, Default)]
pub struct LikelihoodProfiler {
    settings: ProfilerSettings,
}

impl LikelihoodProfiler {
    pub fn new(settings: ProfilerSettings) -> Result<Self, ProfileError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &ProfilerSettings {
        &self.settings
    }

    pub fn profile<E>(
        &self,
        evaluator: &mut E,
        descriptor: &ModelDescriptor,
    ) -> Result<LikelihoodProfile, ProfileError>
    where
        E: LikelihoodEvaluator,
    {
        let mut guard = ParameterGuard::acquire(evaluator, descriptor.normalization_key())?;
        let result = self.profile_unguarded(&mut *guard, descriptor);
        let restored = guard.restore();
        let profile = result?;
        restored?;
        Ok(profile)
    }

    /// Profile the model described in `descriptor_path` and save the result to `out_path`
    pub fn profile_to_file<E>(
        &self,
        evaluator: &mut E,
        descriptor_path: impl AsRef<Path>,
        out_path: impl AsRef<Path>,
    ) -> Result<LikelihoodProfile, ProfileError>
    where
        E: LikelihoodEvaluator,
    {
        let descriptor = ModelDescriptor::from_path(descriptor_path)?;
        let profile = self.profile(evaluator, &descriptor)?;
        let out_path = out_path.as_ref();
        profile.save(out_path)?;
        info!(
            "likelihood profile of {} written to {}",
            descriptor.source,
            out_path.display()
        );
        Ok(profile)
    }

    fn profile_unguarded<E>(
        &self,
        evaluator: &mut E,
        descriptor: &ModelDescriptor,
    ) -> Result<LikelihoodProfile, ProfileError>
    where
        E: LikelihoodEvaluator,
    {
        let settings = &self.settings;
        let target = descriptor.normalization_key();
        let best = BestFit::find(evaluator, descriptor, settings.forced_photon_index)
            .map_err(ProfileError::evaluator)?;
        if !(best.min > 0.0 && best.min < best.max && best.max.is_finite()) {
            return Err(ProfileError::InvalidBounds {
                min: best.min,
                max: best.max,
            });
        }
        let (emin, emax) = best.energy_range;
        let conversion_factor = energy_flux_conversion(best.photon_index, emin, emax)?;
        info!(
            "profiling {target} in [{:e}, {:e}], best fit {:e} with -lnL = {}, photon index {}",
            best.min, best.max, best.norm, best.mlog_like, best.photon_index
        );

        // physical units from now on
        let norm = best.norm.clamp(best.min, best.max);
        best.to_unit_scale(evaluator, &target, norm).map_err(ProfileError::evaluator)?;

        let objective = ProfileObjective::new(
            evaluator,
            target,
            Some((descriptor.index_key(), best.index_value)),
            best.others,
            (best.min, best.max),
        )?;
        let chain = ensemble_samples(&objective, norm, settings)?;
        let grid = grid_samples(&objective, settings.grid_points)?;
        debug!(
            "{} ensemble samples, {} grid samples",
            chain.len(),
            grid.len()
        );

        let profile = LikelihoodProfile::from_samples(
            chain.into_iter().chain(grid),
            conversion_factor,
            best.photon_index,
            settings.energy_flux,
        )?;
        info!("likelihood profile has {} points", profile.len());
        Ok(profile)
    }
}
