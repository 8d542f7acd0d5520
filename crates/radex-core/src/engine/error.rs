use thiserror::Error;

use crate::core::molecules::catalog::Catalog;
use crate::core::molecules::data::NoCollisionPartnerError;
use crate::core::molecules::source::DataError;
use crate::core::radiation::background::NegativeBackgroundTemperature;

#[derive(Debug, Error)]
pub enum RadexError {
    #[error("Invalid configuration: {field} = {value} ({reason})")]
    InvalidConfiguration {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Molecule {molecule} has no entry in the {catalog} catalog")]
    UnsupportedMolecule { molecule: String, catalog: Catalog },

    #[error("Molecular data error: {source}")]
    DataFormat {
        #[from]
        source: DataError,
    },

    #[error(transparent)]
    NoCollisionPartner(#[from] NoCollisionPartnerError),

    #[error("Solver did not converge after {iterations} iterations (mean relative change {statistic:.3e})")]
    Convergence { iterations: usize, statistic: f64 },

    #[error("Rate matrix could not be solved at iteration {iteration}")]
    SingularMatrix { iteration: usize },
}

impl RadexError {
    /// True for errors caused by the request or the molecular data rather
    /// than by the numerical solve.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. }
                | Self::UnsupportedMolecule { .. }
                | Self::DataFormat { .. }
                | Self::NoCollisionPartner(_)
        )
    }
}

impl From<NegativeBackgroundTemperature> for RadexError {
    fn from(err: NegativeBackgroundTemperature) -> Self {
        Self::InvalidConfiguration {
            field: "tbg",
            value: err.0.to_string(),
            reason: "must not be negative".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_distinguished_from_solver_failures() {
        let invalid = RadexError::InvalidConfiguration {
            field: "tkin",
            value: "0.01".into(),
            reason: "too cold".into(),
        };
        assert!(invalid.is_input_error());
        assert!(!RadexError::Convergence { iterations: 10000, statistic: 1.0 }.is_input_error());
        assert!(!RadexError::SingularMatrix { iteration: 3 }.is_input_error());
    }

    #[test]
    fn negative_background_maps_to_invalid_tbg() {
        let err: RadexError = NegativeBackgroundTemperature(-2.0).into();
        assert!(matches!(err, RadexError::InvalidConfiguration { field: "tbg", .. }));
    }
}
