use super::config::SolverSettings;
use super::error::RadexError;
use super::progress::{Progress, ProgressReporter};
use super::rate_matrix::RateMatrix;
use super::state::{LevelPopulation, LineState};
use crate::core::constants::{
    EPS, GAUSSIAN_FACTOR, HC_OVER_K, KMS_TO_CMS, MAX_EXPONENT, MIN_POPULATION, TWO_HC,
};
use crate::core::molecules::data::{CollisionRateMatrix, MolecularData, Transition};
use crate::core::radiation::background::BackgroundField;
use crate::core::radiation::escape::Geometry;
use crate::core::warnings::{Warning, Warnings};
use tracing::{debug, info};

/// Optical depth above which a converged line is reported as very thick.
pub const THICK_WARNING_TAU: f64 = 100.0;
/// Optical depth below which a converged line is reported as masing.
pub const MASER_WARNING_TAU: f64 = -0.1;

/// Everything a solve needs besides the settings; borrowed for its duration.
pub struct SolverInput<'a> {
    pub data: &'a MolecularData,
    pub collisions: &'a CollisionRateMatrix,
    pub background: &'a BackgroundField,
    pub column_density: f64,
    pub line_width_kms: f64,
    pub tkin: f64,
    pub total_density: f64,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    pub populations: LevelPopulation,
    pub lines: Vec<LineState>,
    pub iterations: usize,
    /// Final mean relative change of thick-line excitation temperatures.
    pub statistic: f64,
}

/// Planck function `2hν³/c²` with `ν` as a wavenumber, zero beyond the
/// exponent cutoff. Negative temperatures (inverted lines) are allowed.
fn source_function(xnu: f64, tex: f64) -> f64 {
    let arg = HC_OVER_K * xnu / tex;
    if arg >= MAX_EXPONENT {
        0.0
    } else {
        TWO_HC * xnu.powi(3) / arg.exp_m1()
    }
}

impl SolverInput<'_> {
    fn occupation_from_background(&self) -> Vec<f64> {
        self.data
            .transitions
            .iter()
            .map(|line| {
                let trj = self.background.brightness_temperature[line.index];
                if trj <= 0.0 {
                    return 0.0;
                }
                let arg = HC_OVER_K * line.xnu / trj;
                if arg >= MAX_EXPONENT { 0.0 } else { 1.0 / arg.exp_m1() }
            })
            .collect()
    }

    fn occupation_with_escape(&self, lines: &[LineState]) -> Vec<f64> {
        self.data
            .transitions
            .iter()
            .zip(lines)
            .map(|(line, state)| {
                let beta = self.geometry.escape_probability(state.tau);
                let internal = source_function(line.xnu, state.tex);
                let mean = self.background.total[line.index] * beta + (1.0 - beta) * internal;
                mean / (TWO_HC * line.xnu.powi(3))
            })
            .collect()
    }

    fn optical_depth(&self, line: &Transition, populations: &LevelPopulation) -> f64 {
        let levels = &self.data.levels;
        let (g_up, g_low) = (levels[line.upper].weight, levels[line.lower].weight);
        let inversion =
            populations.get(line.lower) * g_up / g_low - populations.get(line.upper);
        let line_width_cms = self.line_width_kms * KMS_TO_CMS;
        self.column_density / line_width_cms * inversion
            / (GAUSSIAN_FACTOR * line.xnu.powi(3) / line.einstein_a)
    }

    /// Excitation temperature from the level populations, or `None` when it
    /// is undefined (floored population or equal level occupancy).
    fn excitation_temperature(
        &self,
        line: &Transition,
        populations: &LevelPopulation,
    ) -> Option<f64> {
        let (n_up, n_low) = (populations.get(line.upper), populations.get(line.lower));
        if n_up <= MIN_POPULATION || n_low <= MIN_POPULATION {
            return None;
        }
        let levels = &self.data.levels;
        let ratio = n_low * levels[line.upper].weight / (n_up * levels[line.lower].weight);
        let log = ratio.ln();
        (log != 0.0 && log.is_finite()).then(|| HC_OVER_K * line.xnu / log)
    }

    fn populations_from_matrix(
        &self,
        occupation: &[f64],
        settings: &SolverSettings,
        iteration: usize,
    ) -> Result<LevelPopulation, RadexError> {
        let matrix = RateMatrix::assemble(self.data, self.collisions, occupation);
        matrix
            .solve(
                settings.strategy,
                &self.data.levels,
                self.tkin,
                EPS * self.total_density,
            )
            .and_then(|raw| LevelPopulation::from_solution(&raw))
            .ok_or(RadexError::SingularMatrix { iteration })
    }
}

/// Iterates statistical equilibrium and photon escape to convergence.
pub fn solve(
    input: &SolverInput,
    settings: &SolverSettings,
    reporter: &ProgressReporter,
    warnings: &mut Warnings,
) -> Result<SolverOutcome, RadexError> {
    let transitions = &input.data.transitions;

    // Iteration 0: radiative rates from the background only.
    let occupation = input.occupation_from_background();
    let mut populations = input.populations_from_matrix(&occupation, settings, 0)?;
    let mut lines: Vec<LineState> = transitions
        .iter()
        .map(|line| LineState {
            tex: input
                .excitation_temperature(line, &populations)
                .unwrap_or(input.background.brightness_temperature[line.index]),
            tau: input.optical_depth(line, &populations),
        })
        .collect();

    let mut iteration = 0;
    let mut statistic = 0.0;
    loop {
        iteration += 1;
        if iteration > settings.max_iterations {
            return Err(RadexError::Convergence {
                iterations: settings.max_iterations,
                statistic,
            });
        }

        let occupation = input.occupation_with_escape(&lines);
        let solved = input.populations_from_matrix(&occupation, settings, iteration)?;
        populations = populations.relax_towards(&solved, settings.relaxation);

        let mut change = 0.0;
        let mut thick = 0usize;
        for (line, state) in transitions.iter().zip(lines.iter_mut()) {
            let new_tex = input
                .excitation_temperature(line, &populations)
                .unwrap_or(state.tex);
            state.tau = input.optical_depth(line, &populations);
            if state.tau > settings.thick_line_threshold {
                thick += 1;
                change += ((new_tex - state.tex) / new_tex).abs();
            }
            state.tex = 0.5 * (new_tex + state.tex);
        }
        statistic = if thick == 0 { 0.0 } else { change / thick as f64 };

        debug!(iteration, thick_lines = thick, statistic, "Solver iteration");
        reporter.report(Progress::Iteration {
            index: iteration,
            statistic,
        });

        if iteration >= settings.min_iterations && (thick == 0 || statistic < settings.tolerance)
        {
            break;
        }
    }

    info!(iterations = iteration, statistic, "Solver converged");
    for (index, state) in lines.iter().enumerate() {
        if state.tau > THICK_WARNING_TAU {
            warnings.push(Warning::OpticallyThick {
                line: index,
                tau: state.tau,
            });
        } else if state.tau < MASER_WARNING_TAU {
            warnings.push(Warning::Maser {
                line: index,
                tau: state.tau,
            });
        }
    }

    Ok(SolverOutcome {
        populations,
        lines,
        iterations: iteration,
        statistic,
    })
}
