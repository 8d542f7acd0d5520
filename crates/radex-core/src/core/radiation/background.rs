use crate::core::constants::{
    EPS, GHZ_TO_HZ, HC_OVER_K, MAX_EXPONENT, SPEED_OF_LIGHT, T_CMB, TWO_HC,
};
use crate::core::molecules::data::Transition;
use crate::core::warnings::{Warning, Warnings};
use std::f64::consts::PI;
use thiserror::Error;

/// Upper wavenumber (cm⁻¹) of the Galactic field fit.
pub const LYMAN_LIMIT: f64 = 109_678.77;

const SYNCHROTRON_LIMIT: f64 = 10.0;
const SYNCHROTRON_REFERENCE: f64 = 0.408 * GHZ_TO_HZ / SPEED_OF_LIGHT;
const SYNCHROTRON_TEMPERATURE: f64 = 20.0;
const SYNCHROTRON_INDEX: f64 = -2.75;

const DUST_TEMPERATURE: f64 = 23.3;
const DUST_REFERENCE: f64 = 100.0;
const DUST_OPACITY: f64 = 4.0e-6;
const DUST_INDEX: f64 = 1.65;

// Dilution factor and temperature of the three stellar components
// (Mathis, Mezger & Panagia 1983).
const STELLAR_COMPONENTS: [(f64, f64); 3] = [(1.0e-14, 7500.0), (1.0e-13, 4000.0), (4.0e-13, 3000.0)];

/// Shortest wavelength (µm) covered by the stellar blackbodies.
const UV_ONSET_MICRON: f64 = 0.246;

/// Incident radiation per transition.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundField {
    /// Mean intensity at each line frequency (erg s⁻¹ cm⁻² Hz⁻¹ sr⁻¹).
    pub intensity: Vec<f64>,
    /// Radiation temperature equivalent of `intensity`.
    pub brightness_temperature: Vec<f64>,
    /// Total field seen by the line; equal to `intensity` in the absence of
    /// internal continuum sources.
    pub total: Vec<f64>,
}

#[derive(Debug, Error)]
#[error("Background temperature must not be negative (got {0} K)")]
pub struct NegativeBackgroundTemperature(pub f64);

/// Planck intensity at wavenumber `xnu` (cm⁻¹). Returns the floor value when
/// `h nu / k T` reaches the exponent cutoff.
pub fn planck_intensity(xnu: f64, temperature: f64) -> f64 {
    if temperature <= 0.0 {
        return EPS;
    }
    let arg = HC_OVER_K * xnu / temperature;
    if arg >= MAX_EXPONENT {
        EPS
    } else {
        TWO_HC * xnu.powi(3) / arg.exp_m1()
    }
}

/// Temperature of the blackbody that has `intensity` at wavenumber `xnu`.
pub fn brightness_temperature(xnu: f64, intensity: f64) -> f64 {
    if intensity <= 0.0 {
        return 0.0;
    }
    HC_OVER_K * xnu / (TWO_HC * xnu.powi(3) / intensity).ln_1p()
}

fn rayleigh_jeans_intensity(xnu: f64, temperature: f64) -> f64 {
    TWO_HC / HC_OVER_K * xnu * xnu * temperature
}

fn ultraviolet_intensity(xnu: f64) -> f64 {
    let micron = 1.0e4 / xnu;
    // 4 pi J_lambda in erg s-1 cm-2 um-1
    let four_pi_j_lambda = if micron < 0.110 {
        38.57 * micron.powf(3.4172)
    } else if micron < 0.134 {
        2.045e-2
    } else {
        7.115e-4 * micron.powf(-1.6678)
    };
    let j_lambda = four_pi_j_lambda / (4.0 * PI) * 1.0e4;
    let lambda_cm = micron * 1.0e-4;
    j_lambda * lambda_cm * lambda_cm / SPEED_OF_LIGHT
}

/// Mean interstellar radiation field at wavenumber `xnu`. The flag is set
/// when `xnu` lies beyond the Lyman limit, where the fit is extrapolated.
pub fn galactic_intensity(xnu: f64) -> (f64, bool) {
    let mut intensity = planck_intensity(xnu, T_CMB);
    if xnu <= SYNCHROTRON_LIMIT {
        let temperature =
            SYNCHROTRON_TEMPERATURE * (xnu / SYNCHROTRON_REFERENCE).powf(SYNCHROTRON_INDEX);
        intensity += rayleigh_jeans_intensity(xnu, temperature);
    }
    let dust_opacity = DUST_OPACITY * (xnu / DUST_REFERENCE).powf(DUST_INDEX);
    intensity += dust_opacity * planck_intensity(xnu, DUST_TEMPERATURE);
    if xnu < 1.0e4 / UV_ONSET_MICRON {
        intensity += STELLAR_COMPONENTS
            .iter()
            .map(|&(dilution, temperature)| dilution * planck_intensity(xnu, temperature))
            .sum::<f64>();
    } else {
        intensity += ultraviolet_intensity(xnu);
    }
    (intensity, xnu > LYMAN_LIMIT)
}

/// Background field for every transition. `tbg > 0` selects a blackbody at
/// that temperature, `tbg == 0` the mean Galactic field.
pub fn field_at(
    transitions: &[Transition],
    tbg: f64,
    warnings: &mut Warnings,
) -> Result<BackgroundField, NegativeBackgroundTemperature> {
    if tbg < 0.0 {
        return Err(NegativeBackgroundTemperature(tbg));
    }
    let mut intensity = Vec::with_capacity(transitions.len());
    let mut brightness = Vec::with_capacity(transitions.len());
    for line in transitions {
        if tbg > 0.0 {
            intensity.push(planck_intensity(line.xnu, tbg));
            brightness.push(tbg);
        } else {
            let (value, extrapolated) = galactic_intensity(line.xnu);
            if extrapolated {
                warnings.push(Warning::BackgroundExtrapolated {
                    line: line.index,
                    wavenumber: line.xnu,
                });
            }
            intensity.push(value);
            brightness.push(brightness_temperature(line.xnu, value));
        }
    }
    Ok(BackgroundField {
        total: intensity.clone(),
        intensity,
        brightness_temperature: brightness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::ghz_to_wavenumber;

    fn line(index: usize, frequency_ghz: f64) -> Transition {
        Transition {
            index,
            upper: 1,
            lower: 0,
            einstein_a: 1.0e-6,
            frequency_ghz,
            upper_energy_k: 0.0,
            xnu: ghz_to_wavenumber(frequency_ghz),
        }
    }

    #[test]
    fn blackbody_background_reports_its_temperature() {
        let lines = [line(0, 115.2712018), line(1, 345.7959899)];
        let mut warnings = Warnings::new();
        let field = field_at(&lines, 2.73, &mut warnings).unwrap();
        for (i, l) in lines.iter().enumerate() {
            let expected = TWO_HC * l.xnu.powi(3) / ((HC_OVER_K * l.xnu / 2.73).exp() - 1.0);
            assert!((field.intensity[i] - expected).abs() / expected < 1e-12);
            assert_eq!(field.brightness_temperature[i], 2.73);
            assert_eq!(field.total[i], field.intensity[i]);
        }
        assert!(warnings.is_empty());
    }

    #[test]
    fn planck_intensity_uses_floor_for_large_exponent() {
        assert_eq!(planck_intensity(1.0e4, 10.0), EPS);
        assert!(planck_intensity(1.0, 10.0) > EPS);
    }

    #[test]
    fn brightness_temperature_inverts_planck_intensity() {
        for (xnu, t) in [(3.845, 2.73), (23.0, 50.0), (100.0, 300.0)] {
            let recovered = brightness_temperature(xnu, planck_intensity(xnu, t));
            assert!((recovered - t).abs() / t < 1e-10);
        }
    }

    #[test]
    fn galactic_field_is_close_to_cmb_at_millimetre_wavelengths() {
        let lines = [line(0, 115.2712018)];
        let mut warnings = Warnings::new();
        let field = field_at(&lines, 0.0, &mut warnings).unwrap();
        assert!((field.brightness_temperature[0] - T_CMB).abs() < 0.01);
        assert!(warnings.is_empty());
    }

    #[test]
    fn galactic_field_warns_beyond_lyman_limit() {
        let mut warnings = Warnings::new();
        let ultraviolet = Transition {
            xnu: 5.0e4,
            ..line(0, 1.0)
        };
        let extreme = Transition {
            xnu: 2.0e5,
            ..line(1, 1.0)
        };
        let field = field_at(&[ultraviolet, extreme], 0.0, &mut warnings).unwrap();
        assert!(field.intensity.iter().all(|&i| i > 0.0));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings.as_slice()[0],
            Warning::BackgroundExtrapolated { line: 1, .. }
        ));
    }

    #[test]
    fn ultraviolet_segments_join_at_their_boundaries() {
        for micron in [0.110, 0.134] {
            let xnu = 1.0e4 / micron;
            let below = ultraviolet_intensity(xnu * (1.0 + 1e-9));
            let above = ultraviolet_intensity(xnu * (1.0 - 1e-9));
            assert!((below - above).abs() / below < 0.01);
        }
    }

    #[test]
    fn negative_background_temperature_is_rejected() {
        let mut warnings = Warnings::new();
        assert!(field_at(&[line(0, 115.0)], -1.0, &mut warnings).is_err());
    }
}
