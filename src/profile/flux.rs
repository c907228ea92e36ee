//! Photon flux to energy flux conversion for a power-law spectrum
//!
//! For $\mathrm{d}N/\mathrm{d}E \propto E^\Gamma$ between $E_\mathrm{min} = a$ and
//! $E_\mathrm{max} = b$, the energy flux is the photon flux multiplied by
//! $$
//! c = \frac{1 + \Gamma}{2 + \Gamma} \frac{b^{\Gamma + 2} - a^{\Gamma + 2}}{b^{\Gamma + 1} - a^{\Gamma + 1}},
//! $$
//! which has a removable singularity at $\Gamma = -2$, where
//! $c = \frac{a b}{b - a} \ln\frac{b}{a}$. At $\Gamma = -1$ the photon flux integral diverges.

use crate::error::ProfileError;

/// erg in one MeV
pub const MEV_TO_ERG: f64 = 1.60217646e-6;

/// Photon to energy flux conversion factor, energy limits in MeV, result in erg
#[allow(clippy::float_cmp)]
pub fn energy_flux_conversion(
    photon_index: f64,
    emin_mev: f64,
    emax_mev: f64,
) -> Result<f64, ProfileError> {
    if !(emin_mev > 0.0 && emin_mev < emax_mev && emax_mev.is_finite()) {
        return Err(ProfileError::InvalidEnergyRange {
            emin: emin_mev,
            emax: emax_mev,
        });
    }
    if photon_index == -1.0 {
        return Err(ProfileError::PhotonIndexMinusOne);
    }
    let a = emin_mev * MEV_TO_ERG;
    let b = emax_mev * MEV_TO_ERG;

    let factor = if photon_index == -2.0 {
        a * b / (b - a) * (b / a).ln()
    } else {
        let g = photon_index;
        (1.0 + g) / (2.0 + g) * (b.powf(g + 2.0) - a.powf(g + 2.0))
            / (b.powf(g + 1.0) - a.powf(g + 1.0))
    };
    Ok(factor)
}
