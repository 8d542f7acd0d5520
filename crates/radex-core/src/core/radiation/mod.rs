//! Radiation-field physics: the incident background at each line frequency
//! and the escape probability of line photons for the supported cloud
//! geometries. Both are pure functions of their inputs.

pub mod background;
pub mod escape;
