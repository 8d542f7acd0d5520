use super::molecules::partner::CollisionPartner;
use std::fmt;
use tracing::warn;

/// Non-fatal anomaly noticed while preparing or running a solve.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// Tkin lies outside the partner's tabulated temperatures; the nearest
    /// table edge was used instead.
    TemperatureClamped {
        partner: CollisionPartner,
        requested: f64,
        used: f64,
    },
    /// Total H2 density was split into ortho and para parts.
    OrthoParaSplit {
        total: f64,
        ortho: f64,
        para: f64,
        ratio: f64,
    },
    /// A hyperfine-resolved data set replaced the requested molecule.
    HyperfineSubstitution {
        requested: &'static str,
        substituted: &'static str,
        fmax_ghz: f64,
    },
    /// The Galactic background fit was evaluated beyond its valid range.
    BackgroundExtrapolated { line: usize, wavenumber: f64 },
    OpticallyThick { line: usize, tau: f64 },
    Maser { line: usize, tau: f64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TemperatureClamped {
                partner,
                requested,
                used,
            } => write!(
                f,
                "Tkin = {} K is outside the {} rate table; using rates at {} K",
                requested, partner, used
            ),
            Self::OrthoParaSplit {
                total,
                ortho,
                para,
                ratio,
            } => write!(
                f,
                "Split n(H2) = {:.3e} into o-H2 = {:.3e} and p-H2 = {:.3e} (ortho/para = {:.3})",
                total, ortho, para, ratio
            ),
            Self::HyperfineSubstitution {
                requested,
                substituted,
                fmax_ghz,
            } => write!(
                f,
                "Using hyperfine data {} instead of {} for fmax = {} GHz",
                substituted, requested, fmax_ghz
            ),
            Self::BackgroundExtrapolated { line, wavenumber } => write!(
                f,
                "Line {}: background field extrapolated beyond the Lyman limit ({} cm^-1)",
                line + 1,
                wavenumber
            ),
            Self::OpticallyThick { line, tau } => {
                write!(f, "Line {}: very high optical depth (tau = {:.3e})", line + 1, tau)
            }
            Self::Maser { line, tau } => {
                write!(f, "Line {}: population inversion (tau = {:.3e})", line + 1, tau)
            }
        }
    }
}

/// Per-session collector. Every pushed warning is also emitted as a
/// `tracing` event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.items.push(warning);
    }

    pub fn extend(&mut self, other: Warnings) {
        self.items.extend(other.items);
    }

    pub fn as_slice(&self) -> &[Warning] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a Warning;
    type IntoIter = std::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushed_warnings_are_kept_in_order() {
        let mut warnings = Warnings::new();
        warnings.push(Warning::Maser { line: 0, tau: -1.0 });
        warnings.push(Warning::OpticallyThick { line: 3, tau: 250.0 });
        assert_eq!(warnings.len(), 2);
        assert!(matches!(warnings.as_slice()[0], Warning::Maser { .. }));
        assert!(matches!(
            warnings.as_slice()[1],
            Warning::OpticallyThick { line: 3, .. }
        ));
    }

    #[test]
    fn display_uses_one_based_line_numbers() {
        let text = Warning::OpticallyThick { line: 0, tau: 120.0 }.to_string();
        assert!(text.starts_with("Line 1:"));
    }
}
