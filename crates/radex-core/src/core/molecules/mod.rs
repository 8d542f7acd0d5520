//! Molecular data: the LAMDA reader, the catalog of supported molecules, the
//! sources that provide data files, and the validated [`data::MolecularData`]
//! store that interpolates collision rates at the kinetic temperature.

pub mod catalog;
pub mod data;
pub mod lamda;
pub mod partner;
pub mod source;
