//! # Core Module
//!
//! Stateless building blocks of the radiative-transfer solver.
//!
//! ## Architecture
//!
//! - **Constants** ([`constants`]) - Physical constants in CGS units and numerical floors
//! - **Molecular Data** ([`molecules`]) - LAMDA reader, molecule catalog, data sources,
//!   and the validated data store with collision-rate interpolation
//! - **Radiation** ([`radiation`]) - Background radiation field and photon escape probabilities
//! - **Diagnostics** ([`warnings`]) - Non-fatal anomalies collected during a solve
//!
//! Nothing in this module keeps state between calls; the [`crate::engine`]
//! layer owns everything that changes during an iteration.

pub mod constants;
pub mod molecules;
pub mod radiation;
pub mod warnings;
