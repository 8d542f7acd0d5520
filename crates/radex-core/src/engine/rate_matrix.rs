use super::config::SolveStrategy;
use crate::core::molecules::data::{CollisionRateMatrix, Level, MolecularData};
use nalgebra::{DMatrix, DVector};

/// Statistical-equilibrium rate matrix. Entry `(i, i)` is the total rate out
/// of level `i`; entry `(i, j)` is the negated rate from level `j` into `i`,
/// so every column sums to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RateMatrix {
    rates: DMatrix<f64>,
}

impl RateMatrix {
    /// Builds the matrix from collisional rates and the photon occupation
    /// number `occupation[k]` driving each radiative transition.
    pub fn assemble(
        data: &MolecularData,
        collisions: &CollisionRateMatrix,
        occupation: &[f64],
    ) -> Self {
        let nlev = data.nlev();
        let mut rates = DMatrix::<f64>::zeros(nlev, nlev);

        for (line, &nbar) in data.transitions.iter().zip(occupation) {
            let (u, l) = (line.upper, line.lower);
            let weight_ratio = data.levels[u].weight / data.levels[l].weight;
            let down = line.einstein_a * (1.0 + nbar);
            let up = line.einstein_a * weight_ratio * nbar;
            rates[(u, u)] += down;
            rates[(l, l)] += up;
            rates[(u, l)] -= up;
            rates[(l, u)] -= down;
        }

        for i in 0..nlev {
            rates[(i, i)] += collisions.total_out(i);
            for j in 0..nlev {
                if i != j {
                    rates[(i, j)] -= collisions.rate(j, i);
                }
            }
        }

        Self { rates }
    }

    pub fn nlev(&self) -> usize {
        self.rates.nrows()
    }

    pub fn entry(&self, row: usize, col: usize) -> f64 {
        self.rates[(row, col)]
    }

    /// Solves for the (unnormalised) level populations. `regularisation` is
    /// added to every entry of the level block and to the balance-row
    /// right-hand side; the two cancel for any solution summing to one.
    /// Returns `None` if a factorisation is singular.
    pub fn solve(
        &self,
        strategy: SolveStrategy,
        levels: &[Level],
        tkin: f64,
        regularisation: f64,
    ) -> Option<Vec<f64>> {
        match strategy {
            SolveStrategy::Full => self.solve_full(regularisation),
            SolveStrategy::Reduced { energy_cutoff } => {
                self.solve_reduced(levels, energy_cutoff * tkin, regularisation)
            }
        }
    }

    fn solve_full(&self, regularisation: f64) -> Option<Vec<f64>> {
        let weights = DVector::from_element(self.nlev(), 1.0);
        let x = solve_bordered(&self.rates, &weights, regularisation)?;
        Some(x.iter().copied().collect())
    }

    fn solve_reduced(
        &self,
        levels: &[Level],
        cutoff_k: f64,
        regularisation: f64,
    ) -> Option<Vec<f64>> {
        let (low, high): (Vec<usize>, Vec<usize>) =
            (0..self.nlev()).partition(|&i| levels[i].energy_k() <= cutoff_k);
        if high.is_empty() || low.is_empty() {
            return self.solve_full(regularisation);
        }

        let block = |rows: &[usize], cols: &[usize]| {
            DMatrix::from_fn(rows.len(), cols.len(), |r, c| self.rates[(rows[r], cols[c])])
        };
        let m_ll = block(&low, &low);
        let m_lh = block(&low, &high);
        let m_hl = block(&high, &low);
        let m_hh = block(&high, &high);

        // High levels follow the low ones: x_H = -M_HH⁻¹ M_HL x_L.
        let coupling = m_hh.lu().solve(&m_hl)?;
        let schur = m_ll - m_lh * &coupling;
        let weights = DVector::from_fn(low.len(), |j, _| 1.0 - coupling.column(j).sum());

        let x_low = solve_bordered(&schur, &weights, regularisation)?;
        let x_high = -(&coupling * &x_low);

        let mut x = vec![0.0; self.nlev()];
        for (k, &i) in low.iter().enumerate() {
            x[i] = x_low[k];
        }
        for (k, &i) in high.iter().enumerate() {
            x[i] = x_high[k];
        }
        Some(x)
    }
}

/// Solves `block · x = 0` subject to `weightsᵀ · x = 1` through the square
/// system bordered by a column of ones and the normalisation row.
fn solve_bordered(
    block: &DMatrix<f64>,
    weights: &DVector<f64>,
    regularisation: f64,
) -> Option<DVector<f64>> {
    let n = block.nrows();
    let mut system = DMatrix::<f64>::zeros(n + 1, n + 1);
    let mut rhs = DVector::<f64>::zeros(n + 1);
    for i in 0..n {
        for j in 0..n {
            system[(i, j)] = block[(i, j)] + regularisation * weights[j];
        }
        system[(i, n)] = 1.0;
        rhs[i] = regularisation;
    }
    for j in 0..n {
        system[(n, j)] = weights[j];
    }
    rhs[n] = 1.0;

    let solution = system.lu().solve(&rhs)?;
    Some(solution.rows(0, n).into_owned())
}
