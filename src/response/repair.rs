//! Channel numbering repair for GBM calibration matrices
//!
//! GBM response files come with two known encoding defects: the EBOUNDS `CHANNEL` column is not
//! numbered 1..N, and some matrix rows declare `F_CHAN = N, N_CHAN = 1` while their single stored
//! element is really the first channel. Both are fixed on copies before the matrices are combined.

use crate::response::matrix::{CHANNEL_COLUMN, F_CHAN_COLUMN, tlmax, tlmin};
use crate::response::{EnergyBounds, ResponseMatrix};

/// Whether matrices of this instrument need the repair pass
pub fn needs_channel_repair(instrument: &str) -> bool {
    instrument.contains("GBM")
}

/// Renumber channels as 1..N
pub fn repair_ebounds(ebounds: &mut EnergyBounds) {
    let n = ebounds.n_channels();
    ebounds.channel = (1..=n as i64).collect();
    ebounds.header.set(tlmin(CHANNEL_COLUMN), 1_i64);
    ebounds.header.set(tlmax(CHANNEL_COLUMN), n);
}

/// Fix rows pointing to the last channel with an element that belongs to the first one
///
/// Returns the number of fixed rows.
pub fn repair_matrix(matrix: &mut ResponseMatrix, n_channels: usize) -> usize {
    let last_channel = n_channels as i64;
    let mut fixed = 0;
    for row in matrix.rows.iter_mut() {
        if row.f_chan == last_channel && row.n_chan == 1 && row.matrix.len() < n_channels {
            row.f_chan = 1;
            row.n_chan = 1;
            fixed += 1;
        }
    }
    matrix.header.set(tlmin(F_CHAN_COLUMN), 1_i64);
    matrix.header.set(tlmax(F_CHAN_COLUMN), n_channels);
    fixed
}
