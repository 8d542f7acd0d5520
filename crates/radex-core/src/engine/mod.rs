//! # Engine Module
//!
//! The stateful part of the solver: everything that runs once the molecular
//! data, collision rates and background field are known.
//!
//! ## Overview
//!
//! A solve alternates between two steps until the excitation temperatures of
//! the optically thick lines stop changing:
//!
//! 1. Assemble the statistical-equilibrium rate matrix from collisional rates
//!    and the radiation field seen by each line, and solve it for the level
//!    populations ([`rate_matrix`]).
//! 2. Recompute optical depths and excitation temperatures from the new
//!    populations, with under-relaxation between iterates ([`solver`]).
//!
//! The first iteration uses the background field alone; later ones weight the
//! internal line radiation by the escape probability of the chosen geometry.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Session parameters, solver settings, range checks
//! - **Errors** ([`error`]) - The `RadexError` taxonomy shared by all layers above `core`
//! - **State** ([`state`]) - Level populations and per-line optical depth/Tex
//! - **Linear algebra** ([`rate_matrix`]) - Matrix assembly, full and reduced solves
//! - **Iteration** ([`solver`]) - Convergence loop and post-solve diagnostics
//! - **Observables** ([`output`]) - Radiation temperatures, fluxes, frequency selection
//! - **Progress** ([`progress`]) - Callback-based progress events

pub mod config;
pub mod error;
pub mod output;
pub mod progress;
pub mod rate_matrix;
pub mod solver;
pub mod state;
