//! # radexrs
//!
//! A non-LTE radiative transfer solver for molecular line emission, based on
//! the escape-probability method of RADEX.
//!
//! Given a molecule, a kinetic temperature, the densities of its collision
//! partners, a column density and a line width, the library computes the
//! statistical-equilibrium level populations of the molecule in a
//! homogeneous medium and the resulting excitation temperatures, optical
//! depths and line intensities.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Stateless data and physics: the LAMDA
//!   reader, the molecule catalog, validated molecular data with
//!   collision-rate interpolation, the background radiation field and the
//!   escape probabilities of the supported geometries.
//!
//! - **[`engine`]: The Logic Core.** The stateful solver: configuration and
//!   validation, rate-matrix assembly and solution, the under-relaxed
//!   iteration loop and the synthesis of observables.
//!
//! - **[`workflows`]: The Public API.** [`workflows::session::RadexSession`]
//!   runs a complete calculation and lets callers mutate the parameters and
//!   re-solve.

pub mod core;
pub mod engine;
pub mod workflows;
