use crate::core::constants::MIN_POPULATION;

/// Fractional level populations. Entries are never below
/// [`MIN_POPULATION`] and sum to one up to that floor.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelPopulation {
    values: Vec<f64>,
}

impl LevelPopulation {
    /// Normalises a raw linear-system solution and applies the population
    /// floor. Returns `None` when the solution cannot be normalised.
    pub fn from_solution(raw: &[f64]) -> Option<Self> {
        let total: f64 = raw.iter().sum();
        if !(total.is_finite() && total > 0.0) || raw.iter().any(|x| !x.is_finite()) {
            return None;
        }
        let mut population = Self {
            values: raw.iter().map(|x| x / total).collect(),
        };
        population.clamp();
        Some(population)
    }

    /// Blends `self` (the previous iterate) with `new` as
    /// `weight · new + (1 - weight) · self`, then renormalises.
    pub fn relax_towards(&self, new: &LevelPopulation, weight: f64) -> LevelPopulation {
        let mut values: Vec<f64> = self
            .values
            .iter()
            .zip(&new.values)
            .map(|(old, new)| weight * new + (1.0 - weight) * old)
            .collect();
        let total: f64 = values.iter().sum();
        values.iter_mut().for_each(|x| *x /= total);
        let mut population = Self { values };
        population.clamp();
        population
    }

    fn clamp(&mut self) {
        for x in &mut self.values {
            if *x < MIN_POPULATION {
                *x = MIN_POPULATION;
            }
        }
    }

    pub fn get(&self, level: usize) -> f64 {
        self.values[level]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Optical depth and excitation temperature of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineState {
    pub tau: f64,
    pub tex: f64,
}
