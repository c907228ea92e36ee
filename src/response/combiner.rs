use crate::error::WeightingError;
use crate::response::{EnergyBounds, ResponseMatrix, ResponseRow};

/// Primitive combining several response matrices into their weighted sum
///
/// Implementations may delegate to an external tool; they must not leave any intermediate
/// artifacts behind, whether they succeed or fail.
pub trait MatrixCombiner {
    fn combine(
        &self,
        ebounds: &EnergyBounds,
        inputs: &[(ResponseMatrix, f64)],
    ) -> Result<ResponseMatrix, WeightingError>;
}

/// In-process weighted sum of response matrices sharing the same energy grid
///
/// Every row is expanded to the full channel range, summed with the given weights and stored
/// back as a single channel group. The result keeps the header of the first input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WeightedSum;

impl WeightedSum {
    fn check_compatible(inputs: &[(ResponseMatrix, f64)]) -> Result<(), WeightingError> {
        let Some(((first, _), rest)) = inputs.split_first() else {
            return Err(WeightingError::Combiner("nothing to combine".into()));
        };
        for (matrix, _) in rest {
            if matrix.rows.len() != first.rows.len() {
                return Err(WeightingError::IncompatibleMatrices(format!(
                    "{} rows versus {} rows",
                    matrix.rows.len(),
                    first.rows.len()
                )));
            }
            let same_grid = matrix
                .rows
                .iter()
                .zip(first.rows.iter())
                .all(|(a, b)| a.energ_lo == b.energ_lo && a.energ_hi == b.energ_hi);
            if !same_grid {
                return Err(WeightingError::IncompatibleMatrices(
                    "true energy grids differ".into(),
                ));
            }
        }
        Ok(())
    }
}

impl MatrixCombiner for WeightedSum {
    fn combine(
        &self,
        ebounds: &EnergyBounds,
        inputs: &[(ResponseMatrix, f64)],
    ) -> Result<ResponseMatrix, WeightingError> {
        Self::check_compatible(inputs)?;
        let (first, _) = &inputs[0];
        let n_channels = ebounds.n_channels();
        let first_channel = first.first_channel();

        let rows = first
            .rows
            .iter()
            .enumerate()
            .map(|(i, template)| {
                let mut dense = vec![0.0; n_channels];
                for (matrix, weight) in inputs {
                    let row = matrix.rows[i].to_dense(n_channels, matrix.first_channel());
                    for (acc, x) in dense.iter_mut().zip(row) {
                        *acc += weight * x;
                    }
                }
                ResponseRow::from_dense(template.energ_lo, template.energ_hi, &dense, first_channel)
            })
            .collect();

        let mut header = first.header.clone();
        header.add_history(format!("Weighted sum of {} response matrices", inputs.len()));
        Ok(ResponseMatrix {
            extname: first.extname.clone(),
            header,
            rows,
        })
    }
}
