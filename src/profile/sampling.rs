use crate::error::ProfileError;
use crate::profile::{LikelihoodEvaluator, ProfileObjective, ProfilerSettings};

use emcee::{EnsembleSampler, Guess};
use emcee_rand::{Rng, SeedableRng, StdRng};
use ndarray::{Array1, s};

/// `(normalization, ln L)` of every walker position of a short ensemble run
///
/// Walkers start at the best-fit normalization randomly perturbed by the relative
/// `walker_spread`. Positions outside the bounds are dropped.
pub fn ensemble_samples<E>(
    objective: &ProfileObjective<'_, E>,
    best_fit_norm: f64,
    settings: &ProfilerSettings,
) -> Result<Vec<(f64, f64)>, ProfileError>
where
    E: LikelihoodEvaluator,
{
    #[allow(clippy::cast_possible_truncation)]
    let seed = settings
        .seed
        .map_or_else(emcee_rand::random::<usize>, |seed| seed as usize);
    let mut rng: StdRng = SeedableRng::from_seed(&[seed][..]);

    let (lo, hi) = objective.log_bounds();
    let spread = settings.walker_spread;
    let initial: Vec<_> = (0..settings.nwalkers)
        .map(|_| {
            let norm = best_fit_norm * (1.0 + rng.gen_range(-spread, spread));
            Guess::new(&[single_within(norm.log10(), lo, hi)])
        })
        .collect();

    let mut sampler = EnsembleSampler::new(settings.nwalkers, 1, objective)
        .map_err(|e| ProfileError::Sampler(e.to_string()))?;
    sampler.seed(&[seed]);
    let mut positions = Vec::with_capacity(settings.nwalkers * settings.nsteps);
    sampler
        .sample(&initial, settings.nsteps, |step| {
            positions.extend(step.pos.iter().map(|guess| guess.values[0]));
        })
        .map_err(|e| ProfileError::Sampler(e.to_string()))?;

    if let Some(error) = objective.take_error() {
        return Err(error);
    }
    Ok(positions
        .into_iter()
        .filter_map(|x| {
            let log_like = objective.cached(x)?;
            Some((10f64.powf(f64::from(x)), log_like))
        })
        .collect())
}

/// `x` clamped to `[lo, hi]` and rounded to single precision without leaving the range
fn single_within(x: f64, lo: f64, hi: f64) -> f32 {
    #[allow(clippy::cast_possible_truncation)]
    let mut y = x.clamp(lo, hi) as f32;
    if f64::from(y) < lo {
        y = next_up(y);
    } else if f64::from(y) > hi {
        y = next_down(y);
    }
    y
}

fn next_up(y: f32) -> f32 {
    if y == 0.0 {
        f32::from_bits(1)
    } else if y > 0.0 {
        f32::from_bits(y.to_bits() + 1)
    } else {
        f32::from_bits(y.to_bits() - 1)
    }
}

fn next_down(y: f32) -> f32 {
    -next_up(-y)
}

/// Interior nodes of a `grid_points`-node uniform grid over `[lo, hi]`
pub fn interior_grid(lo: f64, hi: f64, grid_points: usize) -> Array1<f64> {
    Array1::linspace(lo, hi, grid_points)
        .slice(s![1..-1])
        .to_owned()
}

/// `(normalization, ln L)` on the logarithmic grid between the bounds, bounds excluded
pub fn grid_samples<E>(
    objective: &ProfileObjective<'_, E>,
    grid_points: usize,
) -> Result<Vec<(f64, f64)>, ProfileError>
where
    E: LikelihoodEvaluator,
{
    let (lo, hi) = objective.log_bounds();
    interior_grid(lo, hi, grid_points)
        .iter()
        .map(|&x| Ok((10f64.powf(x), objective.log_profile(x)?)))
        .collect()
}
