use crate::core::molecules::catalog::{self, MoleculeEntry, MoleculeId};
use crate::core::molecules::data::MolecularData;
use crate::core::molecules::partner::PartnerDensities;
use crate::core::molecules::source::MoleculeSource;
use crate::core::radiation::background::{self, BackgroundField};
use crate::core::warnings::{Warning, Warnings};
use crate::engine::config::SessionConfig;
use crate::engine::error::RadexError;
use crate::engine::output::{self, FrequencyWindow, LineResult};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::solver::{self, SolverInput, SolverOutcome};
use crate::engine::state::LineState;
use std::sync::Arc;
use tracing::{info, instrument};

/// Everything produced by one successful solve.
#[derive(Debug, Clone)]
struct Solution {
    molecule: MoleculeId,
    data: Arc<MolecularData>,
    background: BackgroundField,
    outcome: SolverOutcome,
    results: Vec<LineResult>,
    warnings: Warnings,
}

/// A RADEX calculation for one molecule and one set of physical conditions.
///
/// The session is solved on construction. Afterwards `config` may be edited
/// in place and [`RadexSession::update`] re-validates and re-solves. A failed
/// update leaves the previous results untouched.
pub struct RadexSession {
    pub config: SessionConfig,
    source: Box<dyn MoleculeSource>,
    solution: Solution,
}

impl RadexSession {
    pub fn new(
        config: SessionConfig,
        source: impl MoleculeSource + 'static,
    ) -> Result<Self, RadexError> {
        Self::with_reporter(config, source, &ProgressReporter::new())
    }

    pub fn with_reporter(
        config: SessionConfig,
        source: impl MoleculeSource + 'static,
        reporter: &ProgressReporter,
    ) -> Result<Self, RadexError> {
        let source: Box<dyn MoleculeSource> = Box::new(source);
        let solution = run(&config, source.as_ref(), None, reporter)?;
        Ok(Self {
            config,
            source,
            solution,
        })
    }

    /// Re-solves with the current contents of `config`.
    pub fn update(&mut self) -> Result<(), RadexError> {
        self.update_with_reporter(&ProgressReporter::new())
    }

    pub fn update_with_reporter(&mut self, reporter: &ProgressReporter) -> Result<(), RadexError> {
        let cached = Some((self.solution.molecule, Arc::clone(&self.solution.data)));
        self.solution = run(&self.config, self.source.as_ref(), cached, reporter)?;
        Ok(())
    }

    /// Results for the lines inside the configured frequency window.
    pub fn results(&self) -> &[LineResult] {
        &self.solution.results
    }

    /// The `index`-th selected line.
    pub fn result(&self, index: usize) -> Option<&LineResult> {
        self.solution.results.get(index)
    }

    pub fn warnings(&self) -> &Warnings {
        &self.solution.warnings
    }

    pub fn iterations(&self) -> usize {
        self.solution.outcome.iterations
    }

    /// Final fractional level populations.
    pub fn populations(&self) -> &[f64] {
        self.solution.outcome.populations.as_slice()
    }

    /// Optical depth and Tex of every transition, selected or not.
    pub fn line_states(&self) -> &[LineState] {
        &self.solution.outcome.lines
    }

    /// Molecule actually solved for, after any hyperfine substitution.
    pub fn effective_molecule(&self) -> MoleculeId {
        self.solution.molecule
    }

    pub fn background(&self) -> &BackgroundField {
        &self.solution.background
    }

    pub fn data(&self) -> &MolecularData {
        &self.solution.data
    }
}

fn effective_molecule(config: &SessionConfig, warnings: &mut Warnings) -> MoleculeId {
    match catalog::hyperfine_substitution(
        config.molecule,
        config.catalog,
        config.fmin_ghz,
        config.fmax_ghz,
    ) {
        Some(variant) => {
            let name = |id: MoleculeId| catalog::molecule(id).map_or("?", |m| m.name);
            warnings.push(Warning::HyperfineSubstitution {
                requested: name(config.molecule),
                substituted: name(variant.molecule),
                fmax_ghz: config.fmax_ghz,
            });
            variant.molecule
        }
        None => config.molecule,
    }
}

fn entry_for(id: MoleculeId) -> Result<&'static MoleculeEntry, RadexError> {
    catalog::molecule(id).ok_or_else(|| RadexError::InvalidConfiguration {
        field: "molecule",
        value: id.to_string(),
        reason: "not in the molecule catalog".into(),
    })
}

#[instrument(skip_all, name = "radex_session", fields(molecule = %config.molecule))]
fn run(
    config: &SessionConfig,
    source: &dyn MoleculeSource,
    cached: Option<(MoleculeId, Arc<MolecularData>)>,
    reporter: &ProgressReporter,
) -> Result<Solution, RadexError> {
    reporter.report(Progress::PhaseStart { name: "Validation" });
    config.check()?;
    let mut warnings = Warnings::new();
    let molecule = effective_molecule(config, &mut warnings);
    let entry = entry_for(molecule)?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Loading Molecular Data",
    });
    let data = match cached {
        Some((id, data)) if id == molecule => data,
        _ => Arc::new(MolecularData::load(source, entry)?),
    };
    info!(
        "Loaded {} from '{}': {} levels, {} lines, {} collision partner table(s).",
        entry.name,
        entry.data_file,
        data.nlev(),
        data.nline(),
        data.partners.len()
    );
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Preparing Rates",
    });
    let densities = PartnerDensities::from_pairs(&config.partners);
    let collisions = data.combined_rates(config.tkin, &densities, &mut warnings)?;
    let background = background::field_at(&data.transitions, config.tbg, &mut warnings)?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Solving" });
    let input = SolverInput {
        data: &data,
        collisions: &collisions,
        background: &background,
        column_density: config.column_density,
        line_width_kms: config.line_width,
        tkin: config.tkin,
        total_density: config.total_density(),
        geometry: config.geometry,
    };
    let outcome = solver::solve(&input, &config.solver, reporter, &mut warnings)?;
    reporter.report(Progress::PhaseFinish);

    let window = FrequencyWindow::new(config.fmin_ghz, config.fmax_ghz, entry.hyperfine_resolved);
    for warning in &warnings {
        reporter.report(Progress::Message(warning.to_string()));
    }
    let results = output::synthesize(
        &data,
        &outcome.lines,
        &background,
        &window,
        config.line_width,
    );
    info!(
        "Session complete after {} iterations: {} line(s) selected, {} warning(s).",
        outcome.iterations,
        results.len(),
        warnings.len()
    );

    Ok(Solution {
        molecule,
        data,
        background,
        outcome,
        results,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::molecules::catalog::{Catalog, N2H_PLUS_HFS_ID, N2H_PLUS_ID};
    use crate::core::molecules::partner::CollisionPartner;
    use crate::core::molecules::source::InMemorySource;
    use crate::engine::config::SessionConfigBuilder;

    const CO: &str = include_str!("../../tests/data/co.dat");

    const TWO_LEVEL: &str = "\
N2H+
29.0
2
1 0.0 1.0 0
2 3.1 3.0 1
1
1 2 1 3.6e-5 93.1737 4.47
1
1 N2H+-H2
1
1
20.0
1 2 1 2.0e-10
";

    fn co_source() -> InMemorySource {
        InMemorySource::new().with_file("co.dat", CO)
    }

    fn co_config() -> SessionConfig {
        SessionConfigBuilder::new()
            .molecule(MoleculeId(0))
            .column_density(1.0e13)
            .line_width(1.0)
            .tkin(30.0)
            .tbg(2.73)
            .partner(CollisionPartner::H2, 1.0e4)
            .frequency_range(100.0, 400.0)
            .build()
            .unwrap()
    }

    #[test]
    fn session_selects_lines_in_window() {
        let session = RadexSession::new(co_config(), co_source()).unwrap();
        let frequencies: Vec<f64> = session.results().iter().map(|r| r.frequency_ghz).collect();
        assert_eq!(frequencies, vec![115.2712018, 230.538, 345.7959899]);
        assert_eq!(session.line_states().len(), 10);
        assert!(session.result(3).is_none());
    }

    #[test]
    fn update_without_changes_is_idempotent() {
        let mut session = RadexSession::new(co_config(), co_source()).unwrap();
        let before = session.results().to_vec();
        let iterations = session.iterations();
        session.update().unwrap();
        assert_eq!(session.results(), before.as_slice());
        assert_eq!(session.iterations(), iterations);
    }

    #[test]
    fn update_applies_mutated_configuration() {
        let mut session = RadexSession::new(co_config(), co_source()).unwrap();
        let tex_before = session.result(0).unwrap().tex;
        session.config.partners = vec![(CollisionPartner::H2, 1.0e6)];
        session.update().unwrap();
        let tex_after = session.result(0).unwrap().tex;
        assert!((tex_after - tex_before).abs() > 0.1);
        assert!((tex_after - 30.0).abs() < 1.0);
    }

    #[test]
    fn failed_update_keeps_previous_results() {
        let mut session = RadexSession::new(co_config(), co_source()).unwrap();
        let before = session.results().to_vec();
        session.config.tkin = 0.05;
        let err = session.update().unwrap_err();
        assert!(matches!(err, RadexError::InvalidConfiguration { field: "tkin", .. }));
        assert_eq!(session.results(), before.as_slice());
    }

    #[test]
    fn missing_data_file_is_a_data_error() {
        let err = RadexSession::new(co_config(), InMemorySource::new())
            .err()
            .unwrap();
        assert!(matches!(err, RadexError::DataFormat { .. }));
        assert!(err.is_input_error());
    }

    #[test]
    fn partner_without_rate_table_is_reported() {
        let mut config = co_config();
        config.partners = vec![(CollisionPartner::Electron, 10.0)];
        let err = RadexSession::new(config, co_source()).err().unwrap();
        assert!(matches!(err, RadexError::NoCollisionPartner(_)));
    }

    #[test]
    fn n2h_plus_uses_hyperfine_data_for_lowest_line_only() {
        let source = InMemorySource::new()
            .with_file("n2h+@xpol.dat", TWO_LEVEL)
            .with_file("n2h+@hfs.dat", TWO_LEVEL);
        let mut config = co_config();
        config.molecule = N2H_PLUS_ID;
        config.catalog = Catalog::Jpl;
        config.fmin_ghz = 90.0;
        config.fmax_ghz = 99.0;
        let mut session = RadexSession::new(config, source).unwrap();
        assert_eq!(session.effective_molecule(), N2H_PLUS_HFS_ID);
        assert!(session
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::HyperfineSubstitution { .. })));
        assert_eq!(session.config.molecule, N2H_PLUS_ID);

        session.config.fmax_ghz = 200.0;
        session.update().unwrap();
        assert_eq!(session.effective_molecule(), N2H_PLUS_ID);
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn n2h_plus_window_above_lowest_line_keeps_requested_data() {
        let source = InMemorySource::new().with_file("n2h+@xpol.dat", TWO_LEVEL);
        let mut config = co_config();
        config.molecule = N2H_PLUS_ID;
        config.catalog = Catalog::Jpl;
        config.fmin_ghz = 95.0;
        config.fmax_ghz = 99.0;
        let session = RadexSession::new(config, source).unwrap();
        assert_eq!(session.effective_molecule(), N2H_PLUS_ID);
        assert!(session.warnings().is_empty());
        assert!(session.results().is_empty());
    }

    #[test]
    fn warnings_are_forwarded_as_progress_messages() {
        use std::sync::Mutex;
        let source = InMemorySource::new().with_file("n2h+@hfs.dat", TWO_LEVEL);
        let mut config = co_config();
        config.molecule = N2H_PLUS_ID;
        config.catalog = Catalog::Jpl;
        config.fmin_ghz = 90.0;
        config.fmax_ghz = 99.0;
        let messages = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Message(text) = event {
                messages.lock().unwrap().push(text);
            }
        }));
        let session = RadexSession::with_reporter(config, source, &reporter).unwrap();
        drop(reporter);

        let messages = messages.into_inner().unwrap();
        let expected: Vec<String> = session.warnings().iter().map(|w| w.to_string()).collect();
        assert!(!expected.is_empty());
        assert_eq!(messages, expected);
    }
}
