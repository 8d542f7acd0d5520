use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Cloud geometry used to turn an optical depth into an escape probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Geometry {
    /// Static, uniform sphere (Osterbrock 1974).
    #[default]
    UniformSphere,
    /// Expanding sphere in the large velocity gradient approximation.
    ExpandingSphere,
    /// Plane-parallel slab (shock geometry).
    PlaneParallelSlab,
}

#[derive(Debug, Error)]
#[error("Invalid geometry string (expected 'sphere', 'lvg' or 'slab')")]
pub struct ParseGeometryError;

impl FromStr for Geometry {
    type Err = ParseGeometryError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sphere" | "uniform-sphere" | "uniform" => Ok(Self::UniformSphere),
            "lvg" | "expanding-sphere" => Ok(Self::ExpandingSphere),
            "slab" | "plane-parallel-slab" | "shock" => Ok(Self::PlaneParallelSlab),
            _ => Err(ParseGeometryError),
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UniformSphere => "uniform sphere",
            Self::ExpandingSphere => "expanding sphere (LVG)",
            Self::PlaneParallelSlab => "plane-parallel slab",
        };
        write!(f, "{}", name)
    }
}

// Taylor coefficients of the uniform-sphere escape probability in the
// optical radius.
const SPHERE_SERIES: [f64; 9] = [
    1.0,
    -0.75,
    0.4,
    -1.0 / 6.0,
    2.0 / 35.0,
    -1.0 / 60.0,
    4.0 / 945.0,
    -1.0 / 1050.0,
    2.0 / 10395.0,
];

// Taylor coefficients of (1 - e^-x) / x.
const EXP_SERIES: [f64; 7] = [
    1.0,
    -1.0 / 2.0,
    1.0 / 6.0,
    -1.0 / 24.0,
    1.0 / 120.0,
    -1.0 / 720.0,
    1.0 / 5040.0,
];

const LVG_SLOPE: f64 = 2.34;

/// Optical radius at which the LVG exponential and logarithmic forms meet:
/// `sqrt(pi) * exp(1.17^2)`.
pub const LVG_BREAK: f64 = 6.967_558_963_071_725;

fn polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

fn one_minus_exp_over_x(x: f64) -> f64 {
    if x.abs() < 0.1 {
        polynomial(&EXP_SERIES, x)
    } else {
        -(-x).exp_m1() / x
    }
}

impl Geometry {
    /// Probability that a photon emitted at line centre escapes the cloud,
    /// given the line-centre optical depth `tau`.
    ///
    /// Negative depths (population inversion) are treated as optically thin.
    pub fn escape_probability(self, tau: f64) -> f64 {
        if tau <= 0.0 {
            return 1.0;
        }
        match self {
            Self::UniformSphere => {
                let taur = 0.5 * tau;
                if taur < 0.1 {
                    polynomial(&SPHERE_SERIES, taur)
                } else if taur > 50.0 {
                    0.75 / taur * (1.0 - 1.0 / (2.0 * taur * taur))
                } else {
                    0.75 / taur
                        * (1.0 - 1.0 / (2.0 * taur * taur)
                            + (1.0 / taur + 1.0 / (2.0 * taur * taur)) * (-2.0 * taur).exp())
                }
            }
            Self::ExpandingSphere => {
                let taur = 0.5 * tau;
                if taur < LVG_BREAK {
                    one_minus_exp_over_x(LVG_SLOPE * taur)
                } else {
                    2.0 / (taur * 4.0 * (taur / std::f64::consts::PI.sqrt()).ln().sqrt())
                }
            }
            Self::PlaneParallelSlab => {
                let x = 3.0 * tau;
                if x > 50.0 {
                    1.0 / x
                } else {
                    one_minus_exp_over_x(x)
                }
            }
        }
    }
}
