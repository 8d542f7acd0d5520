use crate::error::{CliError, Result};
use radexrs::engine::config::SolverSettings;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top level of a run file.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub solver: Option<SolverSettings>,
    #[serde(default)]
    pub run: Vec<FileRunConfig>,
}

/// One `[[run]]` table. Every field may also come from the command line.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRunConfig {
    pub molecule: Option<String>,
    pub catalog: Option<String>,
    pub tkin: Option<f64>,
    pub tbg: Option<f64>,
    pub column_density: Option<f64>,
    pub line_width: Option<f64>,
    /// Partner name to density in cm^-3, e.g. `{ H2 = 1e4, e = 10 }`.
    #[serde(default)]
    pub densities: BTreeMap<String, f64>,
    pub geometry: Option<String>,
    pub fmin: Option<f64>,
    pub fmax: Option<f64>,
    pub output: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading run file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
