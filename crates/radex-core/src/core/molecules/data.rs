use super::lamda::{RawCollisionRate, RawMoleculeRecord};
use super::partner::{CollisionPartner, PartnerDensities};
use super::catalog::MoleculeEntry;
use super::source::{DataError, MoleculeSource};
use crate::core::constants::{HC_OVER_K, MAX_EXPONENT};
use crate::core::warnings::{Warning, Warnings};
use nalgebra::DMatrix;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub index: usize,
    /// Term energy in cm⁻¹.
    pub energy: f64,
    pub weight: f64,
    pub label: String,
}

impl Level {
    /// Term energy in kelvin.
    pub fn energy_k(&self) -> f64 {
        self.energy * HC_OVER_K
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub index: usize,
    pub upper: usize,
    pub lower: usize,
    /// Spontaneous emission coefficient in s⁻¹.
    pub einstein_a: f64,
    pub frequency_ghz: f64,
    pub upper_energy_k: f64,
    /// Energy difference of the two levels in cm⁻¹.
    pub xnu: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartnerRateTable {
    pub partner: CollisionPartner,
    pub description: String,
    pub temperatures: Vec<f64>,
    pub rates: Vec<RawCollisionRate>,
}

/// Where Tkin falls in a partner's temperature grid.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GridPoint {
    lower: usize,
    upper: usize,
    weight: f64,
    clamped_to: Option<f64>,
}

impl PartnerRateTable {
    fn locate(&self, tkin: f64) -> GridPoint {
        let temps = &self.temperatures;
        let last = temps.len() - 1;
        if last == 0 {
            return GridPoint {
                lower: 0,
                upper: 0,
                weight: 0.0,
                clamped_to: None,
            };
        }
        if tkin <= temps[0] {
            return GridPoint {
                lower: 0,
                upper: 0,
                weight: 0.0,
                clamped_to: (tkin < temps[0]).then_some(temps[0]),
            };
        }
        if tkin >= temps[last] {
            return GridPoint {
                lower: last,
                upper: last,
                weight: 0.0,
                clamped_to: (tkin > temps[last]).then_some(temps[last]),
            };
        }
        let upper = temps.partition_point(|&t| t <= tkin).min(last);
        let lower = upper - 1;
        GridPoint {
            lower,
            upper,
            weight: (tkin - temps[lower]) / (temps[upper] - temps[lower]),
            clamped_to: None,
        }
    }

    /// Downward rate coefficients (cm³ s⁻¹) interpolated at `tkin`, one per
    /// tabulated collisional transition.
    pub fn rates_at(&self, tkin: f64) -> Vec<f64> {
        let point = self.locate(tkin);
        self.rates
            .iter()
            .map(|entry| {
                let a = entry.rates[point.lower];
                let b = entry.rates[point.upper];
                a + point.weight * (b - a)
            })
            .collect()
    }
}

#[derive(Debug, Error)]
#[error("No collision partner has both a non-zero density and rate data (data provides: {available})")]
pub struct NoCollisionPartnerError {
    pub available: String,
}

/// Collision rates (s⁻¹) between every pair of levels at a fixed Tkin and
/// set of partner densities.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionRateMatrix {
    rates: DMatrix<f64>,
    totals: Vec<f64>,
}

impl CollisionRateMatrix {
    /// Rate from level `from` to level `to`.
    pub fn rate(&self, from: usize, to: usize) -> f64 {
        self.rates[(from, to)]
    }

    /// Total collisional rate out of level `i`.
    pub fn total_out(&self, i: usize) -> f64 {
        self.totals[i]
    }

    pub fn nlev(&self) -> usize {
        self.totals.len()
    }
}

/// Molecular data ready for the solver: validated levels, radiative
/// transitions and per-partner rate tables.
#[derive(Debug, Clone, PartialEq)]
pub struct MolecularData {
    pub name: String,
    pub molecular_weight: f64,
    pub levels: Vec<Level>,
    pub transitions: Vec<Transition>,
    pub partners: Vec<PartnerRateTable>,
}

impl MolecularData {
    pub fn from_raw(file_name: &str, raw: RawMoleculeRecord) -> Result<Self, DataError> {
        let invalid = |reason: String| DataError::Invalid {
            name: file_name.to_string(),
            reason,
        };

        if raw.levels.is_empty() {
            return Err(invalid("no energy levels".into()));
        }
        let levels: Vec<Level> = raw
            .levels
            .into_iter()
            .enumerate()
            .map(|(index, level)| Level {
                index,
                energy: level.energy,
                weight: level.weight,
                label: level.label,
            })
            .collect();
        if let Some(level) = levels.iter().find(|l| !(l.weight > 0.0)) {
            return Err(invalid(format!(
                "level {} has non-positive statistical weight {}",
                level.index + 1,
                level.weight
            )));
        }

        let nlev = levels.len();
        let mut transitions = Vec::with_capacity(raw.transitions.len());
        for (index, t) in raw.transitions.into_iter().enumerate() {
            if t.upper >= nlev || t.lower >= nlev {
                return Err(invalid(format!(
                    "transition {} refers to level {} -> {} outside 1..={}",
                    index + 1,
                    t.upper + 1,
                    t.lower + 1,
                    nlev
                )));
            }
            let xnu = levels[t.upper].energy - levels[t.lower].energy;
            if xnu <= 0.0 {
                return Err(invalid(format!(
                    "transition {} has upper level {} not above lower level {}",
                    index + 1,
                    t.upper + 1,
                    t.lower + 1
                )));
            }
            if !(t.einstein_a >= 0.0) || !(t.frequency_ghz > 0.0) {
                return Err(invalid(format!(
                    "transition {} has invalid A = {} or frequency = {}",
                    index + 1,
                    t.einstein_a,
                    t.frequency_ghz
                )));
            }
            transitions.push(Transition {
                index,
                upper: t.upper,
                lower: t.lower,
                einstein_a: t.einstein_a,
                frequency_ghz: t.frequency_ghz,
                upper_energy_k: t.upper_energy_k,
                xnu,
            });
        }

        let mut partners: Vec<PartnerRateTable> = Vec::with_capacity(raw.partners.len());
        for table in raw.partners {
            if partners.iter().any(|p| p.partner == table.partner) {
                return Err(invalid(format!("duplicate rate table for {}", table.partner)));
            }
            if table.temperatures.is_empty() {
                return Err(invalid(format!("{} rate table has no temperatures", table.partner)));
            }
            if table.temperatures.windows(2).any(|w| !(w[1] > w[0])) {
                return Err(invalid(format!(
                    "{} temperatures are not strictly increasing",
                    table.partner
                )));
            }
            for (k, entry) in table.rates.iter().enumerate() {
                if entry.upper >= nlev || entry.lower >= nlev {
                    return Err(invalid(format!(
                        "{} collision {} refers to level {} -> {} outside 1..={}",
                        table.partner,
                        k + 1,
                        entry.upper + 1,
                        entry.lower + 1,
                        nlev
                    )));
                }
                if entry.rates.len() != table.temperatures.len() {
                    return Err(invalid(format!(
                        "{} collision {} has {} rates for {} temperatures",
                        table.partner,
                        k + 1,
                        entry.rates.len(),
                        table.temperatures.len()
                    )));
                }
                if entry.upper == entry.lower
                    || levels[entry.upper].energy < levels[entry.lower].energy
                {
                    return Err(invalid(format!(
                        "{} collision {} is not a downward transition ({} -> {})",
                        table.partner,
                        k + 1,
                        entry.upper + 1,
                        entry.lower + 1
                    )));
                }
                if entry.rates.iter().any(|r| !(*r >= 0.0)) {
                    return Err(invalid(format!(
                        "{} collision {} has a negative rate coefficient",
                        table.partner,
                        k + 1
                    )));
                }
            }
            partners.push(PartnerRateTable {
                partner: table.partner,
                description: table.description,
                temperatures: table.temperatures,
                rates: table.rates,
            });
        }

        Ok(Self {
            name: raw.name,
            molecular_weight: raw.molecular_weight,
            levels,
            transitions,
            partners,
        })
    }

    /// Loads and validates the data file listed for a catalog entry.
    pub fn load(source: &dyn MoleculeSource, entry: &MoleculeEntry) -> Result<Self, DataError> {
        let raw = source.load(entry.data_file)?;
        Self::from_raw(entry.data_file, raw)
    }

    pub fn nlev(&self) -> usize {
        self.levels.len()
    }

    pub fn nline(&self) -> usize {
        self.transitions.len()
    }

    pub fn partner_table(&self, partner: CollisionPartner) -> Option<&PartnerRateTable> {
        self.partners.iter().find(|p| p.partner == partner)
    }

    /// Densities actually applied to the rate tables. Total H2 is split into
    /// ortho and para parts when the data only resolves the two spin species.
    pub fn effective_densities(
        &self,
        tkin: f64,
        densities: &PartnerDensities,
        warnings: &mut Warnings,
    ) -> PartnerDensities {
        let mut effective = *densities;
        let total = densities.get(CollisionPartner::H2);
        let resolved = self.partner_table(CollisionPartner::ParaH2).is_some()
            || self.partner_table(CollisionPartner::OrthoH2).is_some();
        if total > 0.0
            && densities.get(CollisionPartner::ParaH2) == 0.0
            && densities.get(CollisionPartner::OrthoH2) == 0.0
            && resolved
            && self.partner_table(CollisionPartner::H2).is_none()
        {
            let ratio = ortho_para_ratio(tkin);
            let para = total / (ratio + 1.0);
            let ortho = total / (1.0 + 1.0 / ratio);
            effective.set(CollisionPartner::H2, 0.0);
            effective.set(CollisionPartner::ParaH2, para);
            effective.set(CollisionPartner::OrthoH2, ortho);
            warnings.push(Warning::OrthoParaSplit {
                total,
                ortho,
                para,
                ratio,
            });
        }
        effective
    }

    /// Combines all partner tables into level-to-level rates at `tkin`.
    /// Upward rates follow from the downward ones by detailed balance.
    pub fn combined_rates(
        &self,
        tkin: f64,
        densities: &PartnerDensities,
        warnings: &mut Warnings,
    ) -> Result<CollisionRateMatrix, NoCollisionPartnerError> {
        let nlev = self.nlev();
        let effective = self.effective_densities(tkin, densities, warnings);
        let mut down = DMatrix::<f64>::zeros(nlev, nlev);
        let mut active = 0;

        for table in &self.partners {
            let density = effective.get(table.partner);
            if density <= 0.0 {
                continue;
            }
            active += 1;
            let point = table.locate(tkin);
            if let Some(used) = point.clamped_to {
                warnings.push(Warning::TemperatureClamped {
                    partner: table.partner,
                    requested: tkin,
                    used,
                });
            }
            for (entry, rate) in table.rates.iter().zip(table.rates_at(tkin)) {
                down[(entry.upper, entry.lower)] += density * rate;
            }
            debug!(
                partner = %table.partner,
                density,
                transitions = table.rates.len(),
                "Added collision partner rates"
            );
        }

        if active == 0 {
            let available = self
                .partners
                .iter()
                .map(|p| p.partner.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(NoCollisionPartnerError { available });
        }

        let mut rates = DMatrix::<f64>::zeros(nlev, nlev);
        for u in 0..nlev {
            for l in 0..nlev {
                let c = down[(u, l)];
                if u == l || c == 0.0 {
                    continue;
                }
                rates[(u, l)] += c;
                let (upper, lower) = (&self.levels[u], &self.levels[l]);
                rates[(l, u)] += upper.weight / lower.weight
                    * boltzmann_factor(upper.energy - lower.energy, tkin)
                    * c;
            }
        }
        let totals = (0..nlev).map(|i| rates.row(i).sum()).collect();

        Ok(CollisionRateMatrix { rates, totals })
    }
}

/// Thermal ortho-to-para ratio of H2, capped at the high-temperature limit.
pub fn ortho_para_ratio(tkin: f64) -> f64 {
    (9.0 * (-170.6 / tkin).exp()).min(3.0)
}

/// `exp(-hc·ΔE/kT)` for `ΔE` in cm⁻¹, exactly zero once the exponent reaches
/// the cutoff.
pub fn boltzmann_factor(delta_energy: f64, tkin: f64) -> f64 {
    let arg = HC_OVER_K * delta_energy / tkin;
    if arg >= MAX_EXPONENT { 0.0 } else { (-arg).exp() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::molecules::lamda::{RawLevel, RawPartnerTable, RawTransition};

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        (a - b).abs() <= TOLERANCE * a.abs().max(b.abs())
    }

    fn level(energy: f64, weight: f64) -> RawLevel {
        RawLevel {
            energy,
            weight,
            label: format!("{}", energy),
        }
    }

    fn table(partner: CollisionPartner, temperatures: Vec<f64>, rates: Vec<(usize, usize, Vec<f64>)>) -> RawPartnerTable {
        RawPartnerTable {
            partner,
            description: String::new(),
            temperatures,
            rates: rates
                .into_iter()
                .map(|(upper, lower, rates)| RawCollisionRate { upper, lower, rates })
                .collect(),
        }
    }

    fn three_level(partners: Vec<RawPartnerTable>) -> MolecularData {
        let raw = RawMoleculeRecord {
            name: "TEST".into(),
            molecular_weight: 28.0,
            levels: vec![level(0.0, 1.0), level(3.845, 3.0), level(11.535, 5.0)],
            transitions: vec![
                RawTransition {
                    upper: 1,
                    lower: 0,
                    einstein_a: 7.2e-8,
                    frequency_ghz: 115.27,
                    upper_energy_k: 5.53,
                },
                RawTransition {
                    upper: 2,
                    lower: 1,
                    einstein_a: 6.9e-7,
                    frequency_ghz: 230.54,
                    upper_energy_k: 16.6,
                },
            ],
            partners,
        };
        MolecularData::from_raw("test.dat", raw).unwrap()
    }

    fn h2_table() -> RawPartnerTable {
        table(
            CollisionPartner::H2,
            vec![10.0, 20.0, 40.0],
            vec![
                (1, 0, vec![1.0e-11, 2.0e-11, 4.0e-11]),
                (2, 0, vec![0.5e-11, 1.0e-11, 2.0e-11]),
                (2, 1, vec![2.0e-11, 3.0e-11, 5.0e-11]),
            ],
        )
    }

    fn h2_only(n: f64) -> PartnerDensities {
        PartnerDensities::from_pairs(&[(CollisionPartner::H2, n)])
    }

    #[test]
    fn transition_wavenumber_is_level_energy_difference() {
        let data = three_level(vec![h2_table()]);
        assert!(f64_approx_equal(data.transitions[1].xnu, 11.535 - 3.845));
        assert!(f64_approx_equal(data.levels[1].energy_k(), 3.845 * HC_OVER_K));
    }

    #[test]
    fn rates_are_interpolated_linearly_between_bracketing_temperatures() {
        let data = three_level(vec![h2_table()]);
        let rates = data.partners[0].rates_at(30.0);
        assert!(f64_approx_equal(rates[0], 3.0e-11));
        assert!(f64_approx_equal(rates[2], 4.0e-11));
        let exact = data.partners[0].rates_at(20.0);
        assert!(f64_approx_equal(exact[0], 2.0e-11));
    }

    #[test]
    fn out_of_range_temperature_clamps_with_warning() {
        let data = three_level(vec![h2_table()]);
        let mut warnings = Warnings::new();
        let matrix = data.combined_rates(100.0, &h2_only(1.0), &mut warnings).unwrap();
        assert!(f64_approx_equal(matrix.rate(1, 0), 4.0e-11));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings.as_slice()[0],
            Warning::TemperatureClamped { used, .. } if used == 40.0
        ));
    }

    #[test]
    fn table_edge_temperature_does_not_warn() {
        let data = three_level(vec![h2_table()]);
        let mut warnings = Warnings::new();
        data.combined_rates(10.0, &h2_only(1.0), &mut warnings).unwrap();
        data.combined_rates(40.0, &h2_only(1.0), &mut warnings).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn single_temperature_table_is_used_directly() {
        let single = table(CollisionPartner::H2, vec![20.0], vec![(1, 0, vec![7.0e-11])]);
        let data = three_level(vec![single]);
        let mut warnings = Warnings::new();
        let matrix = data.combined_rates(300.0, &h2_only(2.0), &mut warnings).unwrap();
        assert!(f64_approx_equal(matrix.rate(1, 0), 1.4e-10));
        assert!(warnings.is_empty());
    }

    #[test]
    fn upward_rates_satisfy_detailed_balance() {
        let data = three_level(vec![h2_table()]);
        let tkin = 25.0;
        let mut warnings = Warnings::new();
        let matrix = data.combined_rates(tkin, &h2_only(1.0e4), &mut warnings).unwrap();
        for (u, l) in [(1, 0), (2, 0), (2, 1)] {
            let (lu, ll) = (&data.levels[u], &data.levels[l]);
            let expected = lu.weight / ll.weight
                * (-HC_OVER_K * (lu.energy - ll.energy) / tkin).exp()
                * matrix.rate(u, l);
            assert!(f64_approx_equal(matrix.rate(l, u), expected));
        }
    }

    #[test]
    fn upward_rate_is_exactly_zero_when_boltzmann_exponent_is_too_large() {
        let data = three_level(vec![h2_table()]);
        let mut warnings = Warnings::new();
        // hc/k * 11.535 / 0.1 is far above the cutoff.
        let matrix = data.combined_rates(0.1, &h2_only(1.0), &mut warnings).unwrap();
        assert_eq!(matrix.rate(0, 2), 0.0);
        assert!(matrix.rate(2, 0) > 0.0);
        assert_eq!(boltzmann_factor(1000.0, 1.0), 0.0);
        assert!(boltzmann_factor(100.0, 1.0) > 0.0);
    }

    #[test]
    fn total_out_rate_sums_the_row() {
        let data = three_level(vec![h2_table()]);
        let mut warnings = Warnings::new();
        let matrix = data.combined_rates(20.0, &h2_only(1.0e3), &mut warnings).unwrap();
        for i in 0..3 {
            let sum: f64 = (0..3).map(|j| matrix.rate(i, j)).sum();
            assert!(f64_approx_equal(matrix.total_out(i), sum));
        }
    }

    #[test]
    fn total_h2_is_split_for_spin_resolved_data() {
        let para = table(CollisionPartner::ParaH2, vec![10.0, 100.0], vec![(1, 0, vec![1.0e-11, 1.0e-11])]);
        let ortho = table(CollisionPartner::OrthoH2, vec![10.0, 100.0], vec![(1, 0, vec![3.0e-11, 3.0e-11])]);
        let data = three_level(vec![para, ortho]);
        let tkin = 50.0;
        let mut warnings = Warnings::new();
        let matrix = data.combined_rates(tkin, &h2_only(1.0e4), &mut warnings).unwrap();

        let opr = ortho_para_ratio(tkin);
        let n_para = 1.0e4 / (opr + 1.0);
        let n_ortho = 1.0e4 / (1.0 + 1.0 / opr);
        assert!(f64_approx_equal(n_para + n_ortho, 1.0e4));
        assert!(f64_approx_equal(matrix.rate(1, 0), n_para * 1.0e-11 + n_ortho * 3.0e-11));
        assert!(matches!(warnings.as_slice()[0], Warning::OrthoParaSplit { .. }));
    }

    #[test]
    fn total_h2_is_not_split_when_total_table_exists() {
        let para = table(CollisionPartner::ParaH2, vec![10.0, 100.0], vec![(1, 0, vec![1.0e-11, 1.0e-11])]);
        let data = three_level(vec![h2_table(), para]);
        let mut warnings = Warnings::new();
        let effective = data.effective_densities(20.0, &h2_only(1.0e4), &mut warnings);
        assert_eq!(effective.get(CollisionPartner::H2), 1.0e4);
        assert_eq!(effective.get(CollisionPartner::ParaH2), 0.0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn ortho_para_ratio_saturates_at_three() {
        assert_eq!(ortho_para_ratio(1.0e4), 3.0);
        assert!(ortho_para_ratio(20.0) < 0.01);
    }

    #[test]
    fn missing_partner_data_is_an_error() {
        let data = three_level(vec![h2_table()]);
        let mut warnings = Warnings::new();
        let electrons = PartnerDensities::from_pairs(&[(CollisionPartner::Electron, 10.0)]);
        let err = data.combined_rates(20.0, &electrons, &mut warnings).unwrap_err();
        assert_eq!(err.available, "H2");
    }

    fn two_level_record(transition: RawTransition, partners: Vec<RawPartnerTable>) -> RawMoleculeRecord {
        RawMoleculeRecord {
            name: "BAD".into(),
            molecular_weight: 1.0,
            levels: vec![level(0.0, 1.0), level(1.0, 3.0)],
            transitions: vec![transition],
            partners,
        }
    }

    fn one_to_zero() -> RawTransition {
        RawTransition {
            upper: 1,
            lower: 0,
            einstein_a: 1.0e-6,
            frequency_ghz: 30.0,
            upper_energy_k: 1.44,
        }
    }

    fn assert_invalid(raw: RawMoleculeRecord, fragment: &str) {
        match MolecularData::from_raw("bad.dat", raw) {
            Err(DataError::Invalid { reason, .. }) => {
                assert!(reason.contains(fragment), "unexpected reason: {}", reason)
            }
            other => panic!("expected DataError::Invalid, got {:?}", other),
        }
    }

    #[test]
    fn from_raw_rejects_transition_level_outside_the_level_list() {
        let mut transition = one_to_zero();
        transition.upper = 5;
        assert_invalid(two_level_record(transition, vec![]), "outside 1..=2");
    }

    #[test]
    fn from_raw_rejects_collision_level_outside_the_level_list() {
        let partner = table(CollisionPartner::H2, vec![10.0], vec![(1, 7, vec![1.0e-11])]);
        assert_invalid(two_level_record(one_to_zero(), vec![partner]), "outside 1..=2");
    }

    #[test]
    fn from_raw_rejects_rate_table_without_temperatures() {
        let partner = table(CollisionPartner::H2, vec![], vec![(1, 0, vec![])]);
        assert_invalid(two_level_record(one_to_zero(), vec![partner]), "no temperatures");
    }

    #[test]
    fn from_raw_rejects_unordered_temperatures() {
        let partner = table(CollisionPartner::H2, vec![20.0, 10.0], vec![(1, 0, vec![1.0e-11, 2.0e-11])]);
        assert_invalid(two_level_record(one_to_zero(), vec![partner]), "strictly increasing");
    }

    #[test]
    fn from_raw_rejects_rate_row_shorter_than_temperature_grid() {
        let partner = table(CollisionPartner::H2, vec![10.0, 20.0, 40.0], vec![(1, 0, vec![1.0e-11])]);
        assert_invalid(two_level_record(one_to_zero(), vec![partner]), "1 rates for 3 temperatures");
    }

    #[test]
    fn from_raw_rejects_transition_with_inverted_energies() {
        let raw = RawMoleculeRecord {
            name: "BAD".into(),
            molecular_weight: 1.0,
            levels: vec![level(0.0, 1.0), level(1.0, 3.0)],
            transitions: vec![RawTransition {
                upper: 0,
                lower: 1,
                einstein_a: 1.0e-6,
                frequency_ghz: 30.0,
                upper_energy_k: 0.0,
            }],
            partners: vec![],
        };
        assert!(matches!(
            MolecularData::from_raw("bad.dat", raw),
            Err(DataError::Invalid { .. })
        ));
    }
}
