//! Physical and numerical constants shared by the solver (CGS units).

pub const PLANCK: f64 = 6.6260963e-27; // erg s
pub const SPEED_OF_LIGHT: f64 = 2.99792458e10; // cm/s
pub const BOLTZMANN: f64 = 1.3806505e-16; // erg/K

/// `h c / k` in K cm; converts a wavenumber in cm⁻¹ to an energy in kelvin.
pub const HC_OVER_K: f64 = 1.4387769;

/// `2 h c`, the prefactor of the Planck function when frequencies are in cm⁻¹.
pub const TWO_HC: f64 = 3.972_891_366_538_605_5e-16;

/// Gaussian line-shape factor `1.0645 · 8π` used for optical depths and fluxes.
pub const GAUSSIAN_FACTOR: f64 = 1.0645 * 8.0 * std::f64::consts::PI;

/// Ratio of the integrated area of a Gaussian to its peak times FWHM.
pub const GAUSSIAN_AREA: f64 = 1.0645;

/// Cosmic microwave background temperature used by the Galactic field.
pub const T_CMB: f64 = 2.725;

/// Small positive floor replacing exactly-zero intensities and seeding the
/// rate-matrix regularisation.
pub const EPS: f64 = 1.0e-30;

/// Exponent arguments at or above this value are treated as infinite.
pub const MAX_EXPONENT: f64 = 160.0;

/// Lower bound for any fractional level population.
pub const MIN_POPULATION: f64 = 1.0e-20;

pub const GHZ_TO_HZ: f64 = 1.0e9;
pub const KMS_TO_CMS: f64 = 1.0e5;

/// Converts a frequency in GHz into a wavenumber in cm⁻¹.
#[inline]
pub fn ghz_to_wavenumber(freq_ghz: f64) -> f64 {
    freq_ghz * GHZ_TO_HZ / SPEED_OF_LIGHT
}

/// Converts a wavenumber in cm⁻¹ into a frequency in GHz.
#[inline]
pub fn wavenumber_to_ghz(xnu: f64) -> f64 {
    xnu * SPEED_OF_LIGHT / GHZ_TO_HZ
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_constants_are_consistent_with_fundamental_ones() {
        let hc_over_k = PLANCK * SPEED_OF_LIGHT / BOLTZMANN;
        assert!((hc_over_k - HC_OVER_K).abs() / HC_OVER_K < 1e-6);
        let two_hc = 2.0 * PLANCK * SPEED_OF_LIGHT;
        assert!((two_hc - TWO_HC).abs() / TWO_HC < 1e-9);
    }

    #[test]
    fn frequency_wavenumber_conversion_round_trips_co_line() {
        let xnu = ghz_to_wavenumber(115.2712018);
        assert!((xnu - 3.845033).abs() < 1e-5);
        assert!((wavenumber_to_ghz(xnu) - 115.2712018).abs() < 1e-9);
    }
}
