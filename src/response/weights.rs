use crate::counts::CountsTrait;
use crate::error::WeightingError;
use crate::response::coverage::MatrixCoverage;
use crate::time_interval::TimeInterval;

/// How the weights of an interval were obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeightingScheme {
    /// Only one matrix applies
    Single,
    /// No counts in the interval, weights are exposure fractions
    Exposure,
    /// Fraction of the interval's counts falling in each matrix coverage
    Counts,
}

/// Weights of the matrices selected for a single interval, summing to unity
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixWeights {
    pub scheme: WeightingScheme,
    pub weights: Vec<f64>,
    /// Counts within each matrix coverage, empty unless [WeightingScheme::Counts]
    pub counts: Vec<f64>,
    /// Sum of the weights before renormalization
    pub raw_sum: f64,
}

/// Fraction of `target` covered by each matrix
///
/// A zero-length target splits evenly between the matrices.
pub fn exposure_fractions(target: &TimeInterval, coverages: &[MatrixCoverage]) -> Vec<f64> {
    let duration = target.duration();
    if duration > 0.0 {
        coverages
            .iter()
            .map(|c| c.coverage.duration() / duration)
            .collect()
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = coverages.len() as f64;
        vec![n.recip(); coverages.len()]
    }
}

/// Spread the lacking weight `1 - sum(weights)` proportionally to the exposure fractions
///
/// Exposure fractions are normalized first, so the corrected weights sum to unity even when the
/// coverages don't tile the whole interval.
pub fn renormalize(weights: &mut [f64], exposure: &[f64]) {
    let sum: f64 = weights.iter().sum();
    if sum == 1.0 {
        return;
    }
    let lacking = 1.0 - sum;
    let exposure_sum: f64 = exposure.iter().sum();
    if exposure_sum > 0.0 {
        for (w, e) in weights.iter_mut().zip(exposure) {
            *w += e / exposure_sum * lacking;
        }
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = weights.len() as f64;
        for w in weights.iter_mut() {
            *w += lacking / n;
        }
    }
}

/// Weight each selected matrix for the interval `target` containing `total_counts` events
///
/// With `tolerance`, a pre-renormalization drift of the weight sum from unity larger than the
/// tolerance is an error instead of being silently corrected.
pub fn compute_weights<C>(
    target: &TimeInterval,
    total_counts: f64,
    coverages: &[MatrixCoverage],
    counter: &C,
    tolerance: Option<f64>,
) -> Result<MatrixWeights, WeightingError>
where
    C: CountsTrait,
{
    match coverages.len() {
        0 => return Err(WeightingError::NoMatrixSelected { interval: *target }),
        1 => {
            return Ok(MatrixWeights {
                scheme: WeightingScheme::Single,
                weights: vec![1.0],
                counts: vec![],
                raw_sum: 1.0,
            });
        }
        _ => {}
    }

    let exposure = exposure_fractions(target, coverages);
    let (scheme, mut weights, counts) = if total_counts <= 0.0 {
        (WeightingScheme::Exposure, exposure.clone(), vec![])
    } else {
        let counts = coverages
            .iter()
            .map(|c| counter.count(c.coverage.start(), c.coverage.stop()))
            .collect::<Result<Vec<_>, _>>()?;
        let weights = counts
            .iter()
            .map(|&n| if n > 0.0 { n / total_counts } else { 0.0 })
            .collect();
        (WeightingScheme::Counts, weights, counts)
    };

    let raw_sum: f64 = weights.iter().sum();
    if let Some(tolerance) = tolerance {
        if (1.0 - raw_sum).abs() > tolerance {
            return Err(WeightingError::WeightSumDrift {
                sum: raw_sum,
                tolerance,
            });
        }
    }
    renormalize(&mut weights, &exposure);

    Ok(MatrixWeights {
        scheme,
        weights,
        counts,
        raw_sum,
    })
}
