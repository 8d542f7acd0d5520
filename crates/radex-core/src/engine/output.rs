use super::state::LineState;
use crate::core::constants::{
    BOLTZMANN, GAUSSIAN_AREA, GAUSSIAN_FACTOR, HC_OVER_K, KMS_TO_CMS, MAX_EXPONENT,
    SPEED_OF_LIGHT, TWO_HC,
};
use crate::core::molecules::data::MolecularData;
use crate::core::radiation::background::BackgroundField;
use serde::Serialize;

/// Half-width added around a single requested frequency.
pub const FREQUENCY_MARGIN_GHZ: f64 = 0.01;
/// Half-width for hyperfine-resolved data, where components lie close together.
pub const HYPERFINE_MARGIN_GHZ: f64 = 1.0e-6;

/// Optical depths beyond this magnitude are treated as completely opaque.
const MAX_OPACITY: f64 = 300.0;

/// Rest-frequency selection for reported lines. Bounds are inclusive; a
/// degenerate window (`fmin == fmax`) is widened by a small margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyWindow {
    pub fmin_ghz: f64,
    pub fmax_ghz: f64,
}

impl FrequencyWindow {
    pub fn new(fmin_ghz: f64, fmax_ghz: f64, hyperfine_resolved: bool) -> Self {
        if fmin_ghz == fmax_ghz {
            let margin = if hyperfine_resolved {
                HYPERFINE_MARGIN_GHZ
            } else {
                FREQUENCY_MARGIN_GHZ
            };
            Self {
                fmin_ghz: fmin_ghz - margin,
                fmax_ghz: fmax_ghz + margin,
            }
        } else {
            Self { fmin_ghz, fmax_ghz }
        }
    }

    pub fn contains(&self, frequency_ghz: f64) -> bool {
        (self.fmin_ghz..=self.fmax_ghz).contains(&frequency_ghz)
    }
}

/// Observable quantities of one transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineResult {
    pub line: usize,
    pub upper: String,
    pub lower: String,
    pub upper_energy_k: f64,
    pub frequency_ghz: f64,
    pub wavelength_um: f64,
    pub tex: f64,
    pub tau: f64,
    /// Brightness temperature of the background at the line frequency.
    pub background_temperature: f64,
    /// Planck radiation temperature of the line over the background.
    pub radiation_temperature: f64,
    /// Rayleigh-Jeans equivalent intensity after background subtraction.
    pub antenna_temperature: f64,
    /// Integrated intensity in K km/s.
    pub flux_k_kms: f64,
    /// Integrated flux in erg s⁻¹ cm⁻².
    pub flux_cgs: f64,
}

/// Planck temperature corresponding to `intensity` at wavenumber `xnu`, with
/// a linear fall-back when the logarithm argument is not positive.
fn planck_temperature(xnu: f64, intensity: f64) -> f64 {
    if intensity == 0.0 {
        return 0.0;
    }
    let wh = TWO_HC * xnu.powi(3) / intensity + 1.0;
    if wh <= 0.0 {
        intensity / (TWO_HC * xnu * xnu / HC_OVER_K)
    } else {
        HC_OVER_K * xnu / wh.ln()
    }
}

fn source_function(xnu: f64, tex: f64) -> f64 {
    let arg = HC_OVER_K * xnu / tex;
    if arg >= MAX_EXPONENT {
        0.0
    } else {
        TWO_HC * xnu.powi(3) / arg.exp_m1()
    }
}

/// Computes the observables of every transition whose rest frequency lies in
/// `window`, in transition order.
pub fn synthesize(
    data: &MolecularData,
    lines: &[LineState],
    background: &BackgroundField,
    window: &FrequencyWindow,
    line_width_kms: f64,
) -> Vec<LineResult> {
    data.transitions
        .iter()
        .zip(lines)
        .filter(|(line, _)| window.contains(line.frequency_ghz))
        .map(|(line, state)| {
            let xnu = line.xnu;
            let backi = background.intensity[line.index];
            let bnutex = source_function(xnu, state.tex);
            let ftau = if state.tau.abs() <= MAX_OPACITY {
                (-state.tau).exp()
            } else {
                0.0
            };
            let toti = backi * ftau + bnutex * (1.0 - ftau);
            let tbl = planck_temperature(xnu, toti);
            let tback = if backi == 0.0 {
                0.0
            } else {
                HC_OVER_K * xnu / (TWO_HC * xnu.powi(3) / backi).ln_1p()
            };

            // Rayleigh-Jeans antenna temperature; the background is only
            // subtracted where it is not negligible.
            let excess = if (tback / (HC_OVER_K * xnu)).abs() <= 0.02 {
                toti
            } else {
                toti - backi
            };
            let ta = excess / (TWO_HC * xnu * xnu / HC_OVER_K);

            LineResult {
                line: line.index,
                upper: data.levels[line.upper].label.clone(),
                lower: data.levels[line.lower].label.clone(),
                upper_energy_k: line.upper_energy_k,
                frequency_ghz: line.frequency_ghz,
                wavelength_um: SPEED_OF_LIGHT / line.frequency_ghz / 1.0e5,
                tex: state.tex,
                tau: state.tau,
                background_temperature: tback,
                radiation_temperature: tbl - tback,
                antenna_temperature: ta,
                flux_k_kms: GAUSSIAN_AREA * line_width_kms * ta,
                flux_cgs: GAUSSIAN_FACTOR
                    * BOLTZMANN
                    * line_width_kms
                    * KMS_TO_CMS
                    * ta
                    * xnu.powi(3),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::molecules::lamda::LamdaFile;
    use crate::core::radiation::background::field_at;
    use crate::core::warnings::Warnings;

    const THREE_LINES: &str = "\
X
28.0
4
1 0.0 1.0 0
2 3.845033 3.0 1
3 11.535 5.0 2
4 23.07 7.0 3
3
1 2 1 7.2e-8 115.2712018 5.53
2 3 2 6.9e-7 230.538 16.6
3 4 3 2.5e-6 345.7959899 33.19
1
1 X-H2
1
1
20.0
1 2 1 3.0e-11
";

    fn data() -> MolecularData {
        MolecularData::from_raw("x.dat", LamdaFile::parse_str(THREE_LINES).unwrap()).unwrap()
    }

    fn selected(window: FrequencyWindow) -> Vec<usize> {
        let data = data();
        let background = field_at(&data.transitions, 2.73, &mut Warnings::new()).unwrap();
        let lines = vec![LineState { tau: 0.1, tex: 10.0 }; 3];
        synthesize(&data, &lines, &background, &window, 1.0)
            .iter()
            .map(|r| r.line)
            .collect()
    }

    #[test]
    fn window_bounds_are_inclusive() {
        assert_eq!(selected(FrequencyWindow::new(115.2712018, 230.538, false)), vec![0, 1]);
    }

    #[test]
    fn line_one_megahertz_outside_is_excluded() {
        assert_eq!(selected(FrequencyWindow::new(115.2722018, 400.0, false)), vec![1, 2]);
        assert_eq!(selected(FrequencyWindow::new(100.0, 345.7949899, false)), vec![0, 1]);
    }

    #[test]
    fn degenerate_window_uses_margin() {
        assert_eq!(selected(FrequencyWindow::new(230.535, 230.535, false)), vec![1]);
        assert!(selected(FrequencyWindow::new(230.535, 230.535, true)).is_empty());
    }

    #[test]
    fn line_at_background_temperature_has_no_emission() {
        let data = data();
        let background = field_at(&data.transitions, 10.0, &mut Warnings::new()).unwrap();
        let lines = vec![LineState { tau: 1.0, tex: 10.0 }; 3];
        let window = FrequencyWindow::new(0.0, 1000.0, false);
        for result in synthesize(&data, &lines, &background, &window, 1.0) {
            assert!(result.radiation_temperature.abs() < 1e-9);
            assert!(result.antenna_temperature.abs() < 1e-9);
            assert!((result.background_temperature - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn optically_thick_line_radiates_at_excitation_temperature() {
        let data = data();
        let background = field_at(&data.transitions, 2.73, &mut Warnings::new()).unwrap();
        let lines = vec![LineState { tau: 500.0, tex: 20.0 }; 3];
        let window = FrequencyWindow::new(0.0, 1000.0, false);
        let results = synthesize(&data, &lines, &background, &window, 2.0);
        let first = &results[0];
        assert!((first.radiation_temperature + first.background_temperature - 20.0).abs() < 1e-9);
        assert!(first.antenna_temperature > 0.0);
        assert!((first.flux_k_kms - GAUSSIAN_AREA * 2.0 * first.antenna_temperature).abs() < 1e-12);
        assert!((first.wavelength_um - 2600.757).abs() < 0.01);
    }
}
