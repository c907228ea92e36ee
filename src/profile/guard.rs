use crate::error::ProfileError;
use crate::profile::{LikelihoodEvaluator, ParameterKey};

use log::warn;
use std::ops::{Deref, DerefMut};

/// Upper bound of the temporary bounds used while a parameter is rescaled
pub(crate) const WIDE_MAX: f64 = 1e9;

/// Full state of the profiled parameter
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterSnapshot {
    pub value: f64,
    pub scale: f64,
    pub min: f64,
    pub max: f64,
    pub free: bool,
}

impl ParameterSnapshot {
    pub fn take<E>(evaluator: &E, key: &ParameterKey) -> Result<Self, E::Error>
    where
        E: LikelihoodEvaluator,
    {
        let (min, max) = evaluator.bounds(key)?;
        Ok(Self {
            value: evaluator.value(key)?,
            scale: evaluator.scale(key)?,
            min,
            max,
            free: evaluator.is_free(key)?,
        })
    }
}

/// Exclusive access to an evaluator which puts the model back as it was found
///
/// On acquisition the target parameter's value, scale, bounds and free flag are saved, as well as
/// values and free flags of all other parameters. They are restored by [ParameterGuard::restore],
/// or on drop if it was never called.
pub struct ParameterGuard<'a, E>
where
    E: LikelihoodEvaluator,
{
    evaluator: &'a mut E,
    target: ParameterKey,
    snapshot: ParameterSnapshot,
    others: Vec<(ParameterKey, f64, bool)>,
    restored: bool,
}

impl<'a, E> ParameterGuard<'a, E>
where
    E: LikelihoodEvaluator,
{
    pub fn acquire(evaluator: &'a mut E, target: ParameterKey) -> Result<Self, ProfileError> {
        let snapshot = ParameterSnapshot::take(evaluator, &target).map_err(ProfileError::evaluator)?;
        let others = evaluator
            .parameters()
            .into_iter()
            .filter(|key| *key != target)
            .map(|key| {
                let value = evaluator.value(&key)?;
                let free = evaluator.is_free(&key)?;
                Ok((key, value, free))
            })
            .collect::<Result<Vec<_>, E::Error>>()
            .map_err(ProfileError::evaluator)?;
        Ok(Self {
            evaluator,
            target,
            snapshot,
            others,
            restored: false,
        })
    }

    pub fn target(&self) -> &ParameterKey {
        &self.target
    }

    pub fn snapshot(&self) -> &ParameterSnapshot {
        &self.snapshot
    }

    /// Put every saved parameter back, consuming the guard
    pub fn restore(mut self) -> Result<(), ProfileError> {
        self.restored = true;
        self.restore_state().map_err(ProfileError::evaluator)
    }

    /// Attempts every step even if some fail, returns the first failure
    fn restore_state(&mut self) -> Result<(), E::Error> {
        let mut first_error = None;
        let mut check = |result: Result<(), E::Error>| {
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        };

        for (key, value, free) in &self.others {
            check(self.evaluator.set_value(key, *value));
            check(self.evaluator.set_free(key, *free));
        }

        let target = &self.target;
        let s = self.snapshot;
        check(self.evaluator.set_free(target, true));
        // the current value must stay valid while the scale changes back
        let current = self.evaluator.value(target).unwrap_or(s.value);
        let wide_min = s.min.min(current).min(0.0);
        let wide_max = s.max.max(current).max(WIDE_MAX);
        check(self.evaluator.set_bounds(target, wide_min, wide_max));
        check(self.evaluator.set_scale(target, s.scale));
        check(self.evaluator.set_value(target, s.value));
        check(self.evaluator.set_bounds(target, s.min, s.max));
        check(self.evaluator.set_free(target, s.free));

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<E> Deref for ParameterGuard<'_, E>
where
    E: LikelihoodEvaluator,
{
    type Target = E;

    fn deref(&self) -> &E {
        self.evaluator
    }
}

impl<E> DerefMut for ParameterGuard<'_, E>
where
    E: LikelihoodEvaluator,
{
    fn deref_mut(&mut self) -> &mut E {
        self.evaluator
    }
}

impl<E> Drop for ParameterGuard<'_, E>
where
    E: LikelihoodEvaluator,
{
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.restore_state() {
            warn!("cannot restore parameter {}: {e}", self.target);
        }
    }
}
