use super::error::RadexError;
use crate::core::molecules::catalog::{self, Catalog, MoleculeId};
use crate::core::molecules::partner::CollisionPartner;
use crate::core::radiation::escape::Geometry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TKIN_RANGE: (f64, f64) = (0.1, 1.0e4);
pub const TBG_RANGE: (f64, f64) = (0.0, 1.0e4);
pub const DENSITY_RANGE: (f64, f64) = (1.0e-3, 1.0e13);
pub const COLUMN_DENSITY_RANGE: (f64, f64) = (9.0e4, 1.0e25);
/// Line width limits in km/s (10 cm/s to 1000 km/s).
pub const LINE_WIDTH_RANGE: (f64, f64) = (1.0e-4, 1.0e3);
pub const MAX_FREQUENCY_GHZ: f64 = 3.0e7;
pub const MAX_COLLISION_PARTNERS: usize = 7;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// How the linear system of each iteration is solved.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SolveStrategy {
    /// Dense LU factorisation of the full system.
    #[default]
    Full,
    /// Eliminate levels whose energy exceeds `energy_cutoff · Tkin` through
    /// their Schur complement, then solve the low-lying block.
    Reduced {
        #[serde(rename = "energy-cutoff")]
        energy_cutoff: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct SolverSettings {
    pub max_iterations: usize,
    pub min_iterations: usize,
    /// Mean relative change of thick-line excitation temperatures below which
    /// the iteration is converged.
    pub tolerance: f64,
    /// Weight of the new solution in the under-relaxation step.
    pub relaxation: f64,
    pub thick_line_threshold: f64,
    pub strategy: SolveStrategy,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 9999,
            min_iterations: 10,
            tolerance: 1.0e-6,
            relaxation: 0.3,
            thick_line_threshold: 0.01,
            strategy: SolveStrategy::Full,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub molecule: MoleculeId,
    pub catalog: Catalog,
    /// Column density in cm⁻².
    pub column_density: f64,
    /// Line width (FWHM) in km/s.
    pub line_width: f64,
    pub tkin: f64,
    /// Background radiation temperature; 0 selects the mean Galactic field.
    pub tbg: f64,
    /// Collision partners with their number densities in cm⁻³.
    pub partners: Vec<(CollisionPartner, f64)>,
    pub fmin_ghz: f64,
    pub fmax_ghz: f64,
    pub geometry: Geometry,
    pub solver: SolverSettings,
}

fn out_of_range(field: &'static str, value: f64, (lo, hi): (f64, f64)) -> Option<RadexError> {
    (!(lo..=hi).contains(&value)).then(|| RadexError::InvalidConfiguration {
        field,
        value: format!("{}", value),
        reason: format!("must lie within [{}, {}]", lo, hi),
    })
}

impl SessionConfig {
    /// Validates every parameter, including the molecule's entry in the
    /// selected catalog. The first violation is returned.
    pub fn check(&self) -> Result<(), RadexError> {
        let entry = catalog::molecule(self.molecule).ok_or_else(|| {
            RadexError::InvalidConfiguration {
                field: "molecule",
                value: self.molecule.to_string(),
                reason: format!("index must be below {}", catalog::MOLECULES.len()),
            }
        })?;
        if entry.catalog_name(self.catalog).is_none() {
            return Err(RadexError::UnsupportedMolecule {
                molecule: entry.name.to_string(),
                catalog: self.catalog,
            });
        }

        if !(self.fmin_ghz >= 0.0) {
            return Err(RadexError::InvalidConfiguration {
                field: "fmin",
                value: format!("{}", self.fmin_ghz),
                reason: "must not be negative".into(),
            });
        }
        if !(self.fmax_ghz >= self.fmin_ghz && self.fmax_ghz <= MAX_FREQUENCY_GHZ) {
            return Err(RadexError::InvalidConfiguration {
                field: "fmax",
                value: format!("{}", self.fmax_ghz),
                reason: format!(
                    "must lie within [fmin = {}, {}]",
                    self.fmin_ghz, MAX_FREQUENCY_GHZ
                ),
            });
        }

        if let Some(err) = out_of_range("tkin", self.tkin, TKIN_RANGE) {
            return Err(err);
        }

        if self.partners.is_empty() || self.partners.len() > MAX_COLLISION_PARTNERS {
            return Err(RadexError::InvalidConfiguration {
                field: "partners",
                value: self.partners.len().to_string(),
                reason: format!("between 1 and {} collision partners are required", MAX_COLLISION_PARTNERS),
            });
        }
        for (i, &(partner, density)) in self.partners.iter().enumerate() {
            if self.partners[..i].iter().any(|&(p, _)| p == partner) {
                return Err(RadexError::InvalidConfiguration {
                    field: "partners",
                    value: partner.to_string(),
                    reason: "listed more than once".into(),
                });
            }
            if let Some(err) = out_of_range("density", density, DENSITY_RANGE) {
                return Err(err);
            }
        }

        if let Some(err) = out_of_range("tbg", self.tbg, TBG_RANGE) {
            return Err(err);
        }
        if let Some(err) = out_of_range("column_density", self.column_density, COLUMN_DENSITY_RANGE)
        {
            return Err(err);
        }
        if let Some(err) = out_of_range("line_width", self.line_width, LINE_WIDTH_RANGE) {
            return Err(err);
        }

        self.check_solver()
    }

    fn check_solver(&self) -> Result<(), RadexError> {
        let settings = &self.solver;
        let invalid = |field: &'static str, value: String, reason: &str| {
            Err(RadexError::InvalidConfiguration {
                field,
                value,
                reason: reason.to_string(),
            })
        };
        if settings.max_iterations < settings.min_iterations {
            return invalid(
                "solver.max_iterations",
                settings.max_iterations.to_string(),
                "must not be below solver.min_iterations",
            );
        }
        if !(settings.relaxation > 0.0 && settings.relaxation <= 1.0) {
            return invalid(
                "solver.relaxation",
                settings.relaxation.to_string(),
                "must lie within (0, 1]",
            );
        }
        if !(settings.tolerance > 0.0) {
            return invalid("solver.tolerance", settings.tolerance.to_string(), "must be positive");
        }
        if !(settings.thick_line_threshold >= 0.0) {
            return invalid(
                "solver.thick_line_threshold",
                settings.thick_line_threshold.to_string(),
                "must not be negative",
            );
        }
        if let SolveStrategy::Reduced { energy_cutoff } = settings.strategy {
            if !(energy_cutoff > 0.0) {
                return invalid(
                    "solver.strategy.energy_cutoff",
                    energy_cutoff.to_string(),
                    "must be positive",
                );
            }
        }
        Ok(())
    }

    /// Total density of all listed collision partners.
    pub fn total_density(&self) -> f64 {
        self.partners.iter().map(|&(_, n)| n).sum()
    }
}

#[derive(Default)]
pub struct SessionConfigBuilder {
    molecule: Option<MoleculeId>,
    catalog: Option<Catalog>,
    column_density: Option<f64>,
    line_width: Option<f64>,
    tkin: Option<f64>,
    tbg: Option<f64>,
    partners: Vec<(CollisionPartner, f64)>,
    fmin_ghz: Option<f64>,
    fmax_ghz: Option<f64>,
    geometry: Option<Geometry>,
    solver: Option<SolverSettings>,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn molecule(mut self, id: MoleculeId) -> Self {
        self.molecule = Some(id);
        self
    }
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }
    pub fn column_density(mut self, cm2: f64) -> Self {
        self.column_density = Some(cm2);
        self
    }
    pub fn line_width(mut self, kms: f64) -> Self {
        self.line_width = Some(kms);
        self
    }
    pub fn tkin(mut self, kelvin: f64) -> Self {
        self.tkin = Some(kelvin);
        self
    }
    pub fn tbg(mut self, kelvin: f64) -> Self {
        self.tbg = Some(kelvin);
        self
    }
    pub fn partner(mut self, partner: CollisionPartner, density: f64) -> Self {
        self.partners.push((partner, density));
        self
    }
    pub fn frequency_range(mut self, fmin_ghz: f64, fmax_ghz: f64) -> Self {
        self.fmin_ghz = Some(fmin_ghz);
        self.fmax_ghz = Some(fmax_ghz);
        self
    }
    pub fn geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }
    pub fn solver(mut self, settings: SolverSettings) -> Self {
        self.solver = Some(settings);
        self
    }

    pub fn build(self) -> Result<SessionConfig, ConfigError> {
        Ok(SessionConfig {
            molecule: self
                .molecule
                .ok_or(ConfigError::MissingParameter("molecule"))?,
            catalog: self.catalog.unwrap_or_default(),
            column_density: self
                .column_density
                .ok_or(ConfigError::MissingParameter("column_density"))?,
            line_width: self
                .line_width
                .ok_or(ConfigError::MissingParameter("line_width"))?,
            tkin: self.tkin.ok_or(ConfigError::MissingParameter("tkin"))?,
            tbg: self.tbg.unwrap_or(2.73),
            partners: self.partners,
            fmin_ghz: self.fmin_ghz.unwrap_or(0.0),
            fmax_ghz: self.fmax_ghz.unwrap_or(MAX_FREQUENCY_GHZ),
            geometry: self.geometry.unwrap_or_default(),
            solver: self.solver.unwrap_or_default(),
        })
    }
}
