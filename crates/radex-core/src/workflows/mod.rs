//! # Workflows Module
//!
//! The public entry points of the library.
//!
//! ## Overview
//!
//! A [`session::RadexSession`] ties the [`crate::core`] and [`crate::engine`]
//! layers together: it validates a [`crate::engine::config::SessionConfig`],
//! resolves hyperfine substitutions, loads the molecular data through a
//! [`crate::core::molecules::source::MoleculeSource`], iterates the level
//! populations to convergence and keeps the per-line observables for the
//! requested frequency window.
//!
//! ## Architecture
//!
//! - **Session** ([`session`]) - Construct, query, mutate and `update()`
//! - **Export** ([`export`]) - CSV output of line results

pub mod export;
pub mod session;
